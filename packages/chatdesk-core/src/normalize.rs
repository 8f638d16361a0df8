//! Message normalizer: heterogeneous backend payloads into one shape.
//!
//! The backend has shipped several historical message schemas; records may
//! carry their body under `message_text`, `content`, `response_text`,
//! `message`, or `text`, and similar aliasing applies to timestamps and media
//! URLs. The normalizer resolves each field through a fixed priority list and
//! degrades malformed records to defaults instead of failing the batch.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::{parse_timestamp, Direction, Message, MessageKind};

/// Body candidates, most specific first.
const TEXT_FIELDS: [&str; 5] = ["message_text", "content", "response_text", "message", "text"];

/// Timestamp candidates.
const TIMESTAMP_FIELDS: [&str; 4] = ["timestamp", "created_at", "message_timestamp", "updated_at"];

/// Media URL candidates.
const MEDIA_FIELDS: [&str; 4] = ["media_url", "image_url", "audio_url", "url"];

/// Normalize a raw message payload into sorted [`Message`] records.
///
/// Non-array input yields an empty list. Output is sorted ascending by
/// resolved timestamp; records whose timestamp does not parse sort last,
/// and ties keep their input order. `now` supplies the default timestamp
/// and the synthetic-id prefix for records that lack their own.
pub fn normalize_messages(raw: &Value, now: DateTime<Utc>) -> Vec<Message> {
    let records = match raw.as_array() {
        Some(records) => records,
        None => return Vec::new(),
    };

    let now_millis = now.timestamp_millis();
    let now_stamp = now.to_rfc3339();

    let mut normalized: Vec<(Message, Option<i64>)> = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            let text = resolve_field(record, &TEXT_FIELDS).unwrap_or_default();
            let direction = resolve_direction(record);
            let kind = resolve_kind(record);
            let media_url = resolve_media_url(record);
            let timestamp =
                resolve_field(record, &TIMESTAMP_FIELDS).unwrap_or_else(|| now_stamp.clone());
            let sort_key = parse_timestamp(&timestamp);
            let id = resolve_id(record, now_millis, index);

            (
                Message {
                    id,
                    text,
                    direction,
                    kind,
                    media_url,
                    timestamp,
                },
                sort_key,
            )
        })
        .collect();

    // Stable sort: unparsable timestamps go last, input order breaks ties.
    normalized.sort_by_key(|(_, key)| key.unwrap_or(i64::MAX));
    normalized.into_iter().map(|(message, _)| message).collect()
}

/// Resolve a field through a priority list of candidate names.
///
/// Accepts the first candidate that is a non-empty string after trimming.
/// Numbers and booleans are coerced to their string form; objects, arrays,
/// and null never match.
fn resolve_field(record: &Value, candidates: &[&str]) -> Option<String> {
    for name in candidates {
        match record.get(*name) {
            Some(Value::String(s)) => {
                let trimmed = s.trim();
                if !trimmed.is_empty() {
                    return Some(trimmed.to_string());
                }
            }
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Bool(b)) => return Some(b.to_string()),
            _ => {}
        }
    }
    None
}

/// Infer the direction: explicit field, then role, then response presence.
fn resolve_direction(record: &Value) -> Direction {
    if let Some(direction) = record.get("direction").and_then(Value::as_str) {
        return if direction.eq_ignore_ascii_case("outgoing") {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };
    }

    match record.get("role").and_then(Value::as_str) {
        Some("assistant") | Some("system") => return Direction::Outgoing,
        Some("user") => return Direction::Incoming,
        _ => {}
    }

    // A bot response body marks the record as outgoing in the oldest schema
    let has_response = record
        .get("response_text")
        .and_then(Value::as_str)
        .map(|s| !s.trim().is_empty())
        .unwrap_or(false);
    if has_response {
        Direction::Outgoing
    } else {
        Direction::Incoming
    }
}

fn resolve_kind(record: &Value) -> MessageKind {
    resolve_field(record, &["message_type", "type"])
        .map(|kind| MessageKind::from_wire(&kind))
        .unwrap_or_default()
}

/// Resolve and validate the media URL.
///
/// Only absolute http(s) URLs and same-origin media paths are accepted;
/// anything else falls back to text-only rendering downstream.
fn resolve_media_url(record: &Value) -> Option<String> {
    let url = resolve_field(record, &MEDIA_FIELDS)?;
    if allowed_media_url(&url) {
        Some(url)
    } else {
        None
    }
}

fn allowed_media_url(url: &str) -> bool {
    url.starts_with("http://")
        || url.starts_with("https://")
        || url.starts_with("/media/")
        || url.starts_with("/static/media/")
}

/// Use the record's own id when present; otherwise derive a synthetic one
/// from the normalization instant and the record's position in the batch.
/// Synthetic ids are not stable across repeated fetches of the same record.
fn resolve_id(record: &Value, now_millis: i64, index: usize) -> String {
    match record.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("msg_{}_{}", now_millis, index),
    }
}
