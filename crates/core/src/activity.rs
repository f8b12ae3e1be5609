//! Activity event and the tracking request it is built from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{Error, Result};
use crate::limits::{created_at_in_range, MAX_FIELD_BYTES};

/// A single user-activity event.
///
/// This is both the queue payload and the shape returned by the read path.
/// `created_at` is omitted from the payload when unset so the storage
/// default applies at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub user_id: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Activity {
    pub fn new(user_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            action: action.into(),
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Serializes the event into a queue payload.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a queue payload.
    ///
    /// Non-JSON bodies, missing fields and blank identifiers are all
    /// reported as [`Error::Deserialization`].
    pub fn from_payload(payload: &[u8]) -> Result<Self> {
        let activity: Activity = serde_json::from_slice(payload)
            .map_err(|e| Error::deserialization(e.to_string()))?;

        if is_blank(&activity.user_id) {
            return Err(Error::deserialization("user_id is empty"));
        }
        if is_blank(&activity.action) {
            return Err(Error::deserialization("action is empty"));
        }
        if let Some(ts) = activity.created_at.filter(|ts| !created_at_in_range(ts)) {
            return Err(Error::deserialization(format!(
                "created_at {} is out of range",
                ts.to_rfc3339()
            )));
        }

        Ok(activity)
    }
}

/// Body of `POST /track`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TrackRequest {
    #[validate(
        required(message = "user_id is required"),
        length(min = 1, max = 256, message = "user_id must be 1-256 bytes")
    )]
    pub user_id: Option<String>,

    #[validate(
        required(message = "action is required"),
        length(min = 1, max = 256, message = "action must be 1-256 bytes")
    )]
    pub action: Option<String>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl TrackRequest {
    /// Parses a raw request body.
    pub fn parse(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|e| Error::validation(format!("Invalid JSON: {}", e)))
    }

    /// Validates the request and builds the event to publish.
    ///
    /// `now` is assigned as `created_at` when the caller did not supply one.
    pub fn into_activity(self, now: DateTime<Utc>) -> Result<Activity> {
        if let Err(errors) = self.validate() {
            let details: Vec<String> = errors.to_string().lines().map(str::to_string).collect();
            return Err(Error::validation_with_details("Validation failed", details));
        }

        let (Some(user_id), Some(action)) = (self.user_id, self.action) else {
            return Err(Error::validation("user_id and action are required"));
        };

        let mut details = Vec::new();
        if is_blank(&user_id) {
            details.push("user_id must not be blank".to_string());
        }
        if is_blank(&action) {
            details.push("action must not be blank".to_string());
        }
        // `length` above counts chars; the storage limit is in bytes.
        if user_id.len() > MAX_FIELD_BYTES {
            details.push(format!("user_id must be at most {} bytes", MAX_FIELD_BYTES));
        }
        if action.len() > MAX_FIELD_BYTES {
            details.push(format!("action must be at most {} bytes", MAX_FIELD_BYTES));
        }
        if self.created_at.is_some_and(|ts| !created_at_in_range(&ts)) {
            details.push("created_at must be between 1970 and 2106".to_string());
        }
        if !details.is_empty() {
            return Err(Error::validation_with_details("Validation failed", details));
        }

        Ok(Activity {
            user_id,
            action,
            created_at: Some(self.created_at.unwrap_or(now)),
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
