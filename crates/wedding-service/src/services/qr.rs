//! QR codes linking each reception table to its photo upload page.

use crate::errors::WeddingError;
use crate::models::QrCodeResponse;
use qrcode::render::svg;
use qrcode::QrCode;

/// Number of codes generated when the admin does not say.
pub const DEFAULT_QR_TABLE_COUNT: i32 = 10;

/// Smallest rendered size in pixels.
pub const MIN_QR_DIMENSION: u32 = 200;

/// Upload page URL for a table: `<base>/photos/<table_number>`.
pub fn table_url(public_base_url: &str, table_number: i32) -> String {
    format!(
        "{}/photos/{}",
        public_base_url.trim_end_matches('/'),
        table_number
    )
}

/// Render a payload as an SVG document.
pub fn render_svg(payload: &str) -> Result<String, WeddingError> {
    let code = QrCode::new(payload.as_bytes()).map_err(|e| {
        tracing::error!(target: "wedding.services.qr", error = %e, "Failed to encode QR code");
        WeddingError::Internal
    })?;

    Ok(code
        .render::<svg::Color>()
        .min_dimensions(MIN_QR_DIMENSION, MIN_QR_DIMENSION)
        .dark_color(svg::Color("#000000"))
        .light_color(svg::Color("#ffffff"))
        .build())
}

/// QR code for one table.
pub fn table_qr_code(public_base_url: &str, table_number: i32) -> Result<QrCodeResponse, WeddingError> {
    let url = table_url(public_base_url, table_number);
    let svg = render_svg(&url)?;

    Ok(QrCodeResponse {
        table_number,
        url,
        svg,
    })
}

/// QR codes for tables `1..=count`.
pub fn table_qr_codes(public_base_url: &str, count: i32) -> Result<Vec<QrCodeResponse>, WeddingError> {
    (1..=count)
        .map(|table_number| table_qr_code(public_base_url, table_number))
        .collect()
}
