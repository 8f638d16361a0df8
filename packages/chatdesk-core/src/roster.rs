//! Conversation-list reconciliation.
//!
//! `GET /api/conversations` historically returned one row per message rather
//! than per conversation, and its preview/timestamp fields moved between
//! schema revisions. The reconciler groups rows by phone number, keeps the
//! most recent row per conversation, and orders the roster newest-first.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::types::ConversationSummary;

const PREVIEW_FIELDS: [&str; 3] = ["last_message", "message_text", "response_text"];
const ACTIVITY_FIELDS: [&str; 2] = ["last_message_at", "created_at"];

/// Reconcile raw conversation rows into a deduplicated, sorted roster.
///
/// Rows without a phone number are dropped; non-array input yields an empty
/// roster. Within one phone number the row with the latest parseable
/// activity timestamp wins; a row whose timestamp does not parse never
/// replaces one already held.
pub fn reconcile_roster(raw: &Value, now: DateTime<Utc>) -> Vec<ConversationSummary> {
    let rows = match raw.as_array() {
        Some(rows) => rows,
        None => return Vec::new(),
    };

    let now_stamp = now.to_rfc3339();
    let mut grouped: HashMap<String, ConversationSummary> = HashMap::new();

    for row in rows {
        let phone = match row.get("phone_number").and_then(Value::as_str) {
            Some(phone) if !phone.trim().is_empty() => phone.trim().to_string(),
            _ => continue,
        };

        let summary = ConversationSummary {
            phone_number: phone.clone(),
            display_name: resolve_string(row, &["customer_name"]).unwrap_or_else(|| phone.clone()),
            last_message: resolve_string(row, &PREVIEW_FIELDS).unwrap_or_default(),
            last_message_at: resolve_string(row, &ACTIVITY_FIELDS)
                .unwrap_or_else(|| now_stamp.clone()),
            unread_count: row
                .get("unread_count")
                .and_then(Value::as_u64)
                .unwrap_or(0) as u32,
        };

        match grouped.get(&phone) {
            Some(existing) => {
                let replace = match (summary.activity_key(), existing.activity_key()) {
                    (Some(new_key), Some(old_key)) => new_key > old_key,
                    _ => false,
                };
                if replace {
                    grouped.insert(phone, summary);
                }
            }
            None => {
                grouped.insert(phone, summary);
            }
        }
    }

    let mut roster: Vec<ConversationSummary> = grouped.into_values().collect();
    roster.sort_by_key(|summary| std::cmp::Reverse(summary.activity_key().unwrap_or(i64::MIN)));
    roster
}

/// Case-insensitive substring search over name, phone, and preview.
pub fn filter_roster<'a>(
    roster: &'a [ConversationSummary],
    query: &str,
) -> Vec<&'a ConversationSummary> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return roster.iter().collect();
    }

    roster
        .iter()
        .filter(|summary| {
            summary.display_name.to_lowercase().contains(&needle)
                || summary.phone_number.to_lowercase().contains(&needle)
                || summary.last_message.to_lowercase().contains(&needle)
        })
        .collect()
}

fn resolve_string(row: &Value, candidates: &[&str]) -> Option<String> {
    for name in candidates {
        if let Some(value) = row.get(*name).and_then(Value::as_str) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}
