//! Wedding service models.
//!
//! Database rows, request bodies with their validation rules, and the JSON
//! shapes returned to clients. Wire names are camelCase.

use chrono::{DateTime, Utc};
use common::secret::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of person names, guest names and emails (characters).
pub const MAX_NAME_LENGTH: usize = 255;

/// Maximum email length (characters).
pub const MAX_EMAIL_LENGTH: usize = 255;

/// Maximum phone number length (characters).
pub const MAX_PHONE_LENGTH: usize = 50;

/// Maximum RSVP message length (characters).
pub const MAX_MESSAGE_LENGTH: usize = 2000;

/// Maximum gallery caption length (characters).
pub const MAX_CAPTION_LENGTH: usize = 500;

/// Maximum `uploadedBy` length on table photos (characters).
pub const MAX_UPLOADED_BY_LENGTH: usize = 100;

/// Maximum palette color name length (characters).
pub const MAX_COLOR_NAME_LENGTH: usize = 100;

/// Maximum witness photo length. Photos may be inline data URLs.
pub const MAX_WITNESS_PHOTO_LENGTH: usize = 1_000_000;

/// Largest party on a single RSVP.
pub const MAX_PARTY_SIZE: i32 = 20;

/// `uploadedBy` value recorded when the guest leaves the field empty.
pub const DEFAULT_UPLOADED_BY: &str = "guest";

// ============================================================================
// Shared helpers
// ============================================================================

/// Side of the couple a witness or contact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Bride,
    Groom,
}

impl Side {
    /// Returns the string stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Bride => "bride",
            Side::Groom => "groom",
        }
    }

    /// Parse a wire/database value (case-insensitive).
    pub fn parse(value: &str) -> Option<Side> {
        match value.trim().to_ascii_lowercase().as_str() {
            "bride" => Some(Side::Bride),
            "groom" => Some(Side::Groom),
            _ => None,
        }
    }
}

/// Check `#RRGGBB` / `#RGB` hex color syntax.
pub fn is_valid_hex_color(value: &str) -> bool {
    let Some(digits) = value.strip_prefix('#') else {
        return false;
    };

    matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
}

/// Presentation token derived from a palette color value.
pub fn style_token(value: &str) -> String {
    format!("bg-[{}]", value)
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && !domain.is_empty() && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    if email.is_empty() {
        return Err("Email is required");
    }
    if char_len(email) > MAX_EMAIL_LENGTH {
        return Err("Email must be at most 255 characters");
    }
    if !is_plausible_email(email) {
        return Err("Email must be a valid email address");
    }
    Ok(())
}

fn validate_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Name is required");
    }
    if char_len(name) > MAX_NAME_LENGTH {
        return Err("Name must be at most 255 characters");
    }
    Ok(())
}

fn validate_phone(phone: &str) -> Result<(), &'static str> {
    if char_len(phone.trim()) > MAX_PHONE_LENGTH {
        return Err("Phone must be at most 50 characters");
    }
    Ok(())
}

fn validate_required_phone(phone: &str) -> Result<(), &'static str> {
    if phone.trim().is_empty() {
        return Err("Phone is required");
    }
    validate_phone(phone)
}

fn validate_side(side: &str) -> Result<(), &'static str> {
    match Side::parse(side) {
        Some(_) => Ok(()),
        None => Err("Side must be 'bride' or 'groom'"),
    }
}

/// Trim an optional free-text field, mapping blank to `None`.
pub fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Trimmed, non-blank guest names in submission order.
pub fn normalize_guest_names(names: &[String]) -> Vec<String> {
    names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .collect()
}

// ============================================================================
// Operational responses
// ============================================================================

/// Readiness check response.
///
/// Returned by the `/ready` endpoint (readiness probe).
#[derive(Debug, Clone, Serialize)]
pub struct ReadinessResponse {
    /// Service readiness status ("ready" or "not_ready").
    pub status: &'static str,

    /// Database connectivity status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<&'static str>,

    /// Storage backend status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<&'static str>,

    /// Error message (generic, no infrastructure details).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// ============================================================================
// RSVP Models
// ============================================================================

/// RSVP database row.
#[derive(Debug, Clone)]
pub struct RsvpRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub attending: bool,
    pub party_size: i32,
    pub message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Guest database row, owned by one RSVP.
#[derive(Debug, Clone)]
pub struct GuestRow {
    pub id: Uuid,
    pub rsvp_id: Uuid,
    pub name: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// RSVP as returned to clients, with its guests in submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub attending: bool,
    pub party_size: i32,
    pub message: Option<String>,
    pub guest_names: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RsvpResponse {
    /// Combine an RSVP row with its guest rows.
    pub fn from_parts(row: RsvpRow, mut guests: Vec<GuestRow>) -> Self {
        guests.sort_by_key(|g| g.position);

        RsvpResponse {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            attending: row.attending,
            party_size: row.party_size,
            message: row.message,
            guest_names: guests.into_iter().map(|g| g.name).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Attendance totals for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpSummary {
    /// Number of RSVP records.
    pub total_responses: i64,

    /// RSVPs with `attending = true`.
    pub attending: i64,

    /// RSVPs with `attending = false`.
    pub not_attending: i64,

    /// Sum of party sizes over attending RSVPs.
    pub total_guests: i64,
}

/// Check party size against attendance and the number of named guests.
///
/// Named guests are the people accompanying the respondent, so an attending
/// party must be at least one larger than the guest list.
pub fn validate_party(
    attending: bool,
    party_size: i32,
    guest_count: usize,
) -> Result<(), &'static str> {
    if !(0..=MAX_PARTY_SIZE).contains(&party_size) {
        return Err("Party size must be between 0 and 20");
    }

    if attending {
        if party_size < 1 {
            return Err("Party size must be at least 1 when attending");
        }
        let party = usize::try_from(party_size).unwrap_or(0);
        if guest_count >= party {
            return Err("Party size must include the respondent and every named guest");
        }
    } else if guest_count > 0 {
        return Err("Guest names are only accepted when attending");
    }

    Ok(())
}

/// Party size used when the client does not send one.
pub fn derived_party_size(attending: bool, guest_count: usize) -> i32 {
    if attending {
        i32::try_from(guest_count)
            .unwrap_or(MAX_PARTY_SIZE)
            .saturating_add(1)
    } else {
        0
    }
}

fn default_attending() -> bool {
    true
}

/// Public RSVP form submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateRsvpRequest {
    pub name: String,

    pub email: String,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default = "default_attending")]
    pub attending: bool,

    /// Total people in the party, respondent included. Derived when absent.
    #[serde(default)]
    pub party_size: Option<i32>,

    #[serde(default)]
    pub message: Option<String>,

    /// Names of accompanying guests.
    #[serde(default)]
    pub guest_names: Vec<String>,
}

impl CreateRsvpRequest {
    /// Validate the request fields.
    ///
    /// # Returns
    ///
    /// - `Ok(())` if valid
    /// - `Err(message)` describing the first violated rule
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_name(&self.name)?;
        validate_email(&self.email)?;

        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }

        if let Some(message) = &self.message {
            if char_len(message.trim()) > MAX_MESSAGE_LENGTH {
                return Err("Message must be at most 2000 characters");
            }
        }

        for guest in &self.guest_names {
            if char_len(guest.trim()) > MAX_NAME_LENGTH {
                return Err("Guest names must be at most 255 characters");
            }
        }

        let guests = normalize_guest_names(&self.guest_names);
        validate_party(self.attending, self.resolved_party_size(), guests.len())
    }

    /// Party size as sent, or derived from attendance and guest names.
    pub fn resolved_party_size(&self) -> i32 {
        self.party_size.unwrap_or_else(|| {
            derived_party_size(self.attending, normalize_guest_names(&self.guest_names).len())
        })
    }
}

/// Admin partial update of an RSVP.
///
/// For `phone` and `message` an empty string clears the stored value.
/// `guestNames`, when present, replaces the whole guest list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateRsvpRequest {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    #[serde(default)]
    pub attending: Option<bool>,

    #[serde(default)]
    pub party_size: Option<i32>,

    #[serde(default)]
    pub message: Option<String>,

    #[serde(default)]
    pub guest_names: Option<Vec<String>>,
}

impl UpdateRsvpRequest {
    /// Returns true if at least one field is set.
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.email.is_some()
            || self.phone.is_some()
            || self.attending.is_some()
            || self.party_size.is_some()
            || self.message.is_some()
            || self.guest_names.is_some()
    }

    /// Validate the fields that are present. Cross-field rules are checked
    /// against the merged record with [`validate_party`].
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.has_changes() {
            return Err("At least one field must be provided");
        }

        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(phone) = &self.phone {
            validate_phone(phone)?;
        }
        if let Some(message) = &self.message {
            if char_len(message.trim()) > MAX_MESSAGE_LENGTH {
                return Err("Message must be at most 2000 characters");
            }
        }
        if let Some(guests) = &self.guest_names {
            if guests.iter().any(|g| char_len(g.trim()) > MAX_NAME_LENGTH) {
                return Err("Guest names must be at most 255 characters");
            }
        }

        Ok(())
    }
}

// ============================================================================
// Witness and Contact Models
// ============================================================================

/// Witness database row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessRow {
    pub id: Uuid,
    pub name: String,
    pub side: String,
    pub phone: String,
    pub email: String,
    pub photo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to add a witness.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateWitnessRequest {
    pub name: String,
    pub side: String,
    pub phone: String,
    pub email: String,

    /// Photo URL or inline data URL.
    #[serde(default)]
    pub photo: Option<String>,
}

impl CreateWitnessRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_name(&self.name)?;
        validate_side(&self.side)?;
        validate_required_phone(&self.phone)?;
        validate_email(&self.email)?;
        if let Some(photo) = &self.photo {
            validate_photo(photo)?;
        }
        Ok(())
    }
}

/// Admin partial update of a witness. An empty `photo` removes the photo.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateWitnessRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo: Option<String>,
}

impl UpdateWitnessRequest {
    pub fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.side.is_some()
            || self.phone.is_some()
            || self.email.is_some()
            || self.photo.is_some()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.has_changes() {
            return Err("At least one field must be provided");
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(side) = &self.side {
            validate_side(side)?;
        }
        if let Some(phone) = &self.phone {
            validate_required_phone(phone)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(photo) = &self.photo {
            validate_photo(photo)?;
        }
        Ok(())
    }
}

fn validate_photo(photo: &str) -> Result<(), &'static str> {
    if photo.len() > MAX_WITNESS_PHOTO_LENGTH {
        return Err("Photo must be at most 1000000 characters");
    }
    Ok(())
}

/// Contact database row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRow {
    pub id: Uuid,
    pub name: String,
    pub side: String,
    pub phone: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to add a contact person.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateContactRequest {
    pub name: String,
    pub side: String,
    pub phone: String,
    pub email: String,
}

impl CreateContactRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_name(&self.name)?;
        validate_side(&self.side)?;
        validate_required_phone(&self.phone)?;
        validate_email(&self.email)
    }
}

/// Admin partial update of a contact.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateContactRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UpdateContactRequest {
    pub fn has_changes(&self) -> bool {
        self.name.is_some() || self.side.is_some() || self.phone.is_some() || self.email.is_some()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.has_changes() {
            return Err("At least one field must be provided");
        }
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(side) = &self.side {
            validate_side(side)?;
        }
        if let Some(phone) = &self.phone {
            validate_required_phone(phone)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }
}

// ============================================================================
// Palette Models
// ============================================================================

/// Palette color database row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaletteColorRow {
    pub id: Uuid,
    pub name: String,
    pub value: String,
    pub style_token: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Admin request to add a palette color. The style token is derived.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreatePaletteColorRequest {
    pub name: String,
    pub value: String,
}

impl CreatePaletteColorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_color_name(&self.name)?;
        validate_color_value(&self.value)
    }
}

/// Admin partial update of a palette color.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdatePaletteColorRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
}

impl UpdatePaletteColorRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.is_none() && self.value.is_none() {
            return Err("At least one field must be provided");
        }
        if let Some(name) = &self.name {
            validate_color_name(name)?;
        }
        if let Some(value) = &self.value {
            validate_color_value(value)?;
        }
        Ok(())
    }
}

fn validate_color_name(name: &str) -> Result<(), &'static str> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Color name is required");
    }
    if char_len(name) > MAX_COLOR_NAME_LENGTH {
        return Err("Color name must be at most 100 characters");
    }
    Ok(())
}

fn validate_color_value(value: &str) -> Result<(), &'static str> {
    if !is_valid_hex_color(value.trim()) {
        return Err("Color value must be a hex color like #RRGGBB or #RGB");
    }
    Ok(())
}

// ============================================================================
// Gallery Models
// ============================================================================

/// Gallery image database row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageRow {
    pub id: Uuid,

    /// Storage key of the object.
    pub filename: String,

    pub caption: String,

    pub display_order: i32,

    /// Public URL of the image.
    pub path: String,

    pub created_at: DateTime<Utc>,
}

/// Admin caption edit.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateGalleryImageRequest {
    pub caption: String,
}

impl UpdateGalleryImageRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        validate_caption(&self.caption)
    }
}

/// Validate a gallery caption (may be empty).
pub fn validate_caption(caption: &str) -> Result<(), &'static str> {
    if char_len(caption.trim()) > MAX_CAPTION_LENGTH {
        return Err("Caption must be at most 500 characters");
    }
    Ok(())
}

/// New gallery order: every image id, first to last.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReorderGalleryRequest {
    pub ids: Vec<Uuid>,
}

impl ReorderGalleryRequest {
    /// Rejects duplicate ids. Unknown or missing ids are checked against
    /// the stored images inside the reorder transaction.
    pub fn validate(&self) -> Result<(), &'static str> {
        let mut seen = std::collections::HashSet::with_capacity(self.ids.len());
        if self.ids.iter().any(|id| !seen.insert(*id)) {
            return Err("Image ids must not contain duplicates");
        }
        Ok(())
    }
}

// ============================================================================
// Table Photo Models
// ============================================================================

/// Table photo database row.
#[derive(Debug, Clone)]
pub struct TablePhotoRow {
    pub id: Uuid,
    pub table_number: i32,
    pub image_url: String,
    pub storage_key: String,
    pub uploaded_by: String,
    pub original_filename: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

/// Table photo as returned to clients (storage key omitted).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TablePhotoResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub image_url: String,
    pub uploaded_by: String,
    pub original_filename: Option<String>,
    pub file_size: Option<i64>,
    pub file_type: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<TablePhotoRow> for TablePhotoResponse {
    fn from(row: TablePhotoRow) -> Self {
        TablePhotoResponse {
            id: row.id,
            table_number: row.table_number,
            image_url: row.image_url,
            uploaded_by: row.uploaded_by,
            original_filename: row.original_filename,
            file_size: row.file_size,
            file_type: row.file_type,
            uploaded_at: row.uploaded_at,
        }
    }
}

/// Query string for the admin photo listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhotoListQuery {
    /// Restrict to one table.
    pub table: Option<i32>,
}

// ============================================================================
// Admin Session Models
// ============================================================================

/// Password exchange for an admin session token.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdminSessionRequest {
    pub password: SecretString,
}

/// Issued admin session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSessionResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

// ============================================================================
// QR Code Models
// ============================================================================

/// Query string for the batch QR code endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QrCodesQuery {
    /// Number of tables, starting at 1.
    pub tables: Option<i32>,
}

/// QR code for one table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QrCodeResponse {
    pub table_number: i32,

    /// Upload page URL encoded in the code.
    pub url: String,

    /// Rendered SVG document.
    pub svg: String,
}
