//! Repository layer for database operations.
//!
//! One repository per table. All queries are parameterized and timed into
//! `wedding_db_query_duration_seconds`.

pub mod contacts;
pub mod gallery;
pub mod palette;
pub mod photos;
pub mod rsvps;
pub mod witnesses;

pub use contacts::ContactsRepository;
pub use gallery::GalleryRepository;
pub use palette::PaletteRepository;
pub use photos::TablePhotosRepository;
pub use rsvps::RsvpsRepository;
pub use witnesses::WitnessesRepository;

use crate::errors::WeddingError;
use crate::observability::metrics;
use std::time::Instant;

/// Record query metrics and convert the sqlx error.
pub(crate) fn observe<T>(
    operation: &'static str,
    start: Instant,
    result: Result<T, sqlx::Error>,
) -> Result<T, WeddingError> {
    let duration = start.elapsed();
    match result {
        Ok(value) => {
            metrics::record_db_query(operation, "success", duration);
            Ok(value)
        }
        Err(e) => {
            metrics::record_db_query(operation, "error", duration);
            Err(WeddingError::Database(e.to_string()))
        }
    }
}

/// Trim a patch value; an empty string clears the column.
pub(crate) fn clearable(value: Option<&str>) -> Option<Option<String>> {
    value.map(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
