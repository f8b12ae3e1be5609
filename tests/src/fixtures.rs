//! Test fixtures and payload generators.

use activity_core::Activity;
use chrono::{DateTime, TimeZone, Utc};

/// A valid `POST /track` body.
pub fn track_body(user_id: &str, action: &str) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "action": action,
    })
}

/// A valid `POST /track` body with an explicit timestamp.
pub fn track_body_at(user_id: &str, action: &str, created_at: DateTime<Utc>) -> serde_json::Value {
    serde_json::json!({
        "user_id": user_id,
        "action": action,
        "created_at": created_at.to_rfc3339(),
    })
}

/// A fixed point in time, `minutes` after 2024-05-01 12:00 UTC.
pub fn at_minute(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + chrono::Duration::minutes(minutes)
}

/// An activity stamped `minutes` after the fixed origin.
pub fn activity_at(user_id: &str, action: &str, minutes: i64) -> Activity {
    Activity::new(user_id, action).with_created_at(at_minute(minutes))
}

/// N distinct activities for user `u{i}`.
pub fn activities(n: usize) -> Vec<Activity> {
    (0..n)
        .map(|i| activity_at(&format!("u{}", i), "page_view", i as i64))
        .collect()
}

/// Payloads the worker must discard.
pub fn malformed_payloads() -> Vec<&'static [u8]> {
    vec![
        &b"not json"[..],
        &b"{}"[..],
        &br#"{"user_id":"u1"}"#[..],
        &br#"{"user_id":"","action":"login"}"#[..],
        &br#"{"user_id":"u1","action":"login","created_at":"yesterday"}"#[..],
    ]
}
