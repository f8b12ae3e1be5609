//! Ingestion limits.

/// Maximum `POST /track` body size in bytes.
pub const MAX_TRACK_BODY_BYTES: usize = 16 * 1024;

/// Maximum length of `user_id` and `action` in bytes.
///
/// Checked in [`crate::TrackRequest::into_activity`]; the `length` rules on
/// the request only bound the char count.
pub const MAX_FIELD_BYTES: usize = 256;

/// Latest `created_at` the storage `DateTime` column can hold, in seconds
/// since the Unix epoch. Earlier than the epoch is not representable either.
pub const MAX_CREATED_AT_SECS: i64 = u32::MAX as i64;

/// Whether a timestamp fits the storage `DateTime` column.
pub fn created_at_in_range(ts: &chrono::DateTime<chrono::Utc>) -> bool {
    (0..=MAX_CREATED_AT_SECS).contains(&ts.timestamp())
}
