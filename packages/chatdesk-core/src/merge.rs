//! Chronological merge of message lists.
//!
//! The cache and each fetch (auto-refresh or older page) are merged through
//! this single function; it must therefore tolerate replays and interleaved
//! application order. Re-merging the same data is a no-op.

use std::collections::HashMap;

use crate::types::Message;

/// Merge `fetched` into `existing`, de-duplicated by id and sorted by time.
///
/// When both lists carry the same id, the fetched record wins (freshly
/// fetched data supersedes the cache). Records without an id are dropped;
/// they cannot be de-duplicated across fetches. The sort is stable and keys
/// on the parsed timestamp, so equal or unparsable timestamps keep
/// first-seen order.
pub fn merge_messages(existing: &[Message], fetched: &[Message]) -> Vec<Message> {
    let mut slots: HashMap<&str, usize> = HashMap::new();
    let mut merged: Vec<Message> = Vec::with_capacity(existing.len() + fetched.len());

    for message in existing.iter().chain(fetched) {
        if message.id.is_empty() {
            continue;
        }
        match slots.get(message.id.as_str()) {
            Some(&slot) => merged[slot] = message.clone(),
            None => {
                slots.insert(message.id.as_str(), merged.len());
                merged.push(message.clone());
            }
        }
    }

    merged.sort_by_key(|message| message.sort_key().unwrap_or(i64::MAX));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, MessageKind};

    fn message(id: &str, text: &str, timestamp: &str) -> Message {
        Message {
            id: id.to_string(),
            text: text.to_string(),
            direction: Direction::Incoming,
            kind: MessageKind::Text,
            media_url: None,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_merge_with_self_deduplicates() {
        let list = vec![
            message("1", "a", "2024-01-01T00:00:00Z"),
            message("2", "b", "2024-01-02T00:00:00Z"),
        ];
        let merged = merge_messages(&list, &list);
        assert_eq!(merged, list);
    }

    #[test]
    fn test_fetched_side_wins() {
        let existing = vec![
            message("1", "a", "2024-01-01T00:00:00Z"),
            message("2", "old body", "2024-01-02T00:00:00Z"),
            message("3", "c", "2024-01-03T00:00:00Z"),
        ];
        let fetched = vec![
            message("2", "new body", "2024-01-02T00:00:00Z"),
            message("4", "d", "2024-01-04T00:00:00Z"),
        ];

        let merged = merge_messages(&existing, &fetched);

        assert_eq!(merged.len(), 4);
        let updated = merged.iter().find(|m| m.id == "2").unwrap();
        assert_eq!(updated.text, "new body");
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3", "4"]);
    }

    #[test]
    fn test_older_page_sorts_before_cache() {
        let existing = vec![message("10", "recent", "2024-01-10T00:00:00Z")];
        let older_page = vec![
            message("1", "old", "2024-01-01T00:00:00Z"),
            message("2", "older still newer", "2024-01-02T00:00:00Z"),
        ];

        let merged = merge_messages(&existing, &older_page);
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "10"]);
    }

    #[test]
    fn test_records_without_id_are_dropped() {
        let existing = vec![message("", "anon", "2024-01-01T00:00:00Z")];
        let fetched = vec![message("1", "kept", "2024-01-02T00:00:00Z")];

        let merged = merge_messages(&existing, &fetched);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].id, "1");
    }

    #[test]
    fn test_equal_timestamps_keep_first_seen_order() {
        let existing = vec![
            message("a", "1", "2024-01-01T00:00:00Z"),
            message("b", "2", "2024-01-01T00:00:00Z"),
        ];
        let fetched = vec![
            message("c", "3", "2024-01-01T00:00:00Z"),
            message("b", "2 updated", "2024-01-01T00:00:00Z"),
        ];

        let merged = merge_messages(&existing, &fetched);
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(merged[1].text, "2 updated");
    }

    #[test]
    fn test_unparsable_timestamps_sort_last() {
        let existing = vec![message("odd", "?", "not a date")];
        let fetched = vec![message("1", "a", "2024-01-01T00:00:00Z")];

        let merged = merge_messages(&existing, &fetched);
        let ids: Vec<_> = merged.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "odd"]);
    }

    #[test]
    fn test_replay_is_idempotent() {
        let existing = vec![message("1", "a", "2024-01-01T00:00:00Z")];
        let fetched = vec![
            message("1", "a updated", "2024-01-01T00:00:00Z"),
            message("2", "b", "2024-01-02T00:00:00Z"),
        ];

        let once = merge_messages(&existing, &fetched);
        let twice = merge_messages(&once, &fetched);
        assert_eq!(once, twice);
    }
}
