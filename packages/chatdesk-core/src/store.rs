//! The client-side conversation store.
//!
//! One store instance backs one console session. It owns the roster, the
//! connection indicator, and the single currently-open conversation; every
//! cache mutation goes through an explicit operation here. Refresh and
//! pagination merges are keyed by phone number, so a fetch that was in
//! flight when the operator switched conversations is discarded instead of
//! overwriting the newly opened one.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::cursor::CursorTracker;
use crate::merge::merge_messages;
use crate::normalize::normalize_messages;
use crate::types::{
    ConnectionStatus, Conversation, ConversationSummary, Lead, Message,
};
use crate::{Error, Result};

/// One page of raw messages as returned by the conversation endpoint.
#[derive(Debug, Clone, Copy)]
pub struct MessagePage<'a> {
    /// Raw, schema-flexible message records (usually a JSON array)
    pub messages: &'a Value,
    /// Whether the server reports further (older) pages
    pub has_more: bool,
    /// Boundary cursor for the page, if any
    pub next_cursor: Option<&'a str>,
}

/// Client-side cache for one console session.
#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    roster: Vec<ConversationSummary>,
    connection: ConnectionStatus,
    current: Option<Conversation>,
}

impl ConversationStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reconciled conversation roster, most recent first.
    pub fn roster(&self) -> &[ConversationSummary] {
        &self.roster
    }

    /// Replace the roster with a freshly reconciled one.
    pub fn set_roster(&mut self, roster: Vec<ConversationSummary>) {
        self.roster = roster;
    }

    /// Last observed connection state.
    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    /// The currently open conversation, if any.
    pub fn current(&self) -> Option<&Conversation> {
        self.current.as_ref()
    }

    /// Open a conversation, replacing whatever was open before.
    ///
    /// The display name comes from the lead when it carries one, falling
    /// back to the phone number. The cursor tracker is seeded from this
    /// first page.
    pub fn open_conversation(
        &mut self,
        phone: &str,
        lead: Option<Lead>,
        page: MessagePage<'_>,
        now: DateTime<Utc>,
    ) -> &Conversation {
        let display_name = lead
            .as_ref()
            .and_then(|lead| lead.customer_name.as_deref())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| phone.to_string());

        let mut cursor = CursorTracker::new();
        cursor.observe(page.next_cursor, page.has_more);

        self.current.insert(Conversation {
            phone_number: phone.to_string(),
            display_name,
            messages: normalize_messages(page.messages, now),
            cursor,
            lead,
        })
    }

    /// Drop the open conversation (nothing selected).
    pub fn close_conversation(&mut self) {
        self.current = None;
    }

    /// Merge an auto-refresh fetch into the open conversation.
    ///
    /// Returns `false` without touching state when `phone` is not the
    /// currently open conversation; a response that outlived a conversation
    /// switch must not overwrite the new selection.
    pub fn apply_refresh(
        &mut self,
        phone: &str,
        page: MessagePage<'_>,
        now: DateTime<Utc>,
    ) -> bool {
        self.merge_page(phone, page, now)
    }

    /// Merge an older page into the open conversation.
    ///
    /// Same guard and merge semantics as [`Self::apply_refresh`]; the cursor
    /// tracker additionally walks toward the oldest boundary seen.
    pub fn apply_older_page(
        &mut self,
        phone: &str,
        page: MessagePage<'_>,
        now: DateTime<Utc>,
    ) -> bool {
        self.merge_page(phone, page, now)
    }

    fn merge_page(&mut self, phone: &str, page: MessagePage<'_>, now: DateTime<Utc>) -> bool {
        let conversation = match self.current.as_mut() {
            Some(conversation) if conversation.phone_number == phone => conversation,
            _ => return false,
        };

        let fetched = normalize_messages(page.messages, now);
        conversation.messages = merge_messages(&conversation.messages, &fetched);
        conversation.cursor.observe(page.next_cursor, page.has_more);
        true
    }

    /// Optimistically append an outgoing message after a successful send.
    ///
    /// The next refresh merge reconciles the optimistic record against the
    /// server's copy (same id wins last-write). Also updates the roster
    /// preview in place; returns whether the roster already had an entry for
    /// the conversation, so the caller knows to refresh the roster when not.
    pub fn append_outgoing(&mut self, message: Message) -> Result<bool> {
        let conversation = self.current.as_mut().ok_or(Error::NoActiveConversation)?;

        let preview = if message.text.is_empty() {
            message.kind.as_str().to_string()
        } else {
            message.text.clone()
        };
        let timestamp = message.timestamp.clone();
        let phone = conversation.phone_number.clone();
        conversation.messages.push(message);

        let entry = self
            .roster
            .iter_mut()
            .find(|summary| summary.phone_number == phone);
        let in_roster = entry.is_some();
        if let Some(summary) = entry {
            summary.last_message = preview;
            summary.last_message_at = timestamp;
        }
        Ok(in_roster)
    }

    /// Zero the unread counter for a conversation after mark-read.
    pub fn clear_unread(&mut self, phone: &str) {
        if let Some(summary) = self
            .roster
            .iter_mut()
            .find(|summary| summary.phone_number == phone)
        {
            summary.unread_count = 0;
        }
    }

    /// Mirror a successful bot-toggle onto the open conversation's lead.
    pub fn set_bot_enabled(&mut self, enabled: bool) -> Result<()> {
        let conversation = self.current.as_mut().ok_or(Error::NoActiveConversation)?;
        match conversation.lead.as_mut() {
            Some(lead) => lead.bot_enabled = enabled,
            None => {
                conversation.lead = Some(Lead {
                    phone_number: conversation.phone_number.clone(),
                    bot_enabled: enabled,
                    ..Default::default()
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Direction, MessageKind};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn page(messages: &Value) -> MessagePage<'_> {
        MessagePage {
            messages,
            has_more: false,
            next_cursor: None,
        }
    }

    fn outgoing(id: &str, text: &str, timestamp: &str) -> Message {
        Message {
            id: id.to_string(),
            text: text.to_string(),
            direction: Direction::Outgoing,
            kind: MessageKind::Text,
            media_url: None,
            timestamp: timestamp.to_string(),
        }
    }

    #[test]
    fn test_open_conversation_replaces_previous() {
        let mut store = ConversationStore::new();
        let first = json!([{"id": "1", "content": "a", "created_at": "2024-01-01T00:00:00Z"}]);
        let second = json!([{"id": "9", "content": "z", "created_at": "2024-02-01T00:00:00Z"}]);

        store.open_conversation("+561", None, page(&first), now());
        store.open_conversation("+562", None, page(&second), now());

        let current = store.current().unwrap();
        assert_eq!(current.phone_number, "+562");
        assert_eq!(current.messages.len(), 1);
        assert_eq!(current.messages[0].id, "9");
    }

    #[test]
    fn test_display_name_from_lead() {
        let mut store = ConversationStore::new();
        let lead = Lead {
            phone_number: "+561".to_string(),
            customer_name: Some("Ana".to_string()),
            ..Default::default()
        };
        store.open_conversation("+561", Some(lead), page(&json!([])), now());
        assert_eq!(store.current().unwrap().display_name, "Ana");

        store.open_conversation("+562", None, page(&json!([])), now());
        assert_eq!(store.current().unwrap().display_name, "+562");
    }

    #[test]
    fn test_refresh_merges_without_duplicates() {
        let mut store = ConversationStore::new();
        let initial = json!([
            {"id": "1", "content": "a", "created_at": "2024-01-01T00:00:00Z"},
            {"id": "2", "content": "b", "created_at": "2024-01-02T00:00:00Z"}
        ]);
        store.open_conversation("+561", None, page(&initial), now());

        let refresh = json!([
            {"id": "2", "content": "b edited", "created_at": "2024-01-02T00:00:00Z"},
            {"id": "3", "content": "c", "created_at": "2024-01-03T00:00:00Z"}
        ]);
        let applied = store.apply_refresh("+561", page(&refresh), now());

        assert!(applied);
        let messages = &store.current().unwrap().messages;
        let ids: Vec<_> = messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(messages[1].text, "b edited");
    }

    #[test]
    fn test_stale_refresh_for_other_phone_is_rejected() {
        let mut store = ConversationStore::new();
        store.open_conversation("+562", None, page(&json!([])), now());

        let stale = json!([{"id": "1", "content": "leak", "created_at": "2024-01-01T00:00:00Z"}]);
        let applied = store.apply_refresh("+561", page(&stale), now());

        assert!(!applied);
        assert!(store.current().unwrap().messages.is_empty());
    }

    #[test]
    fn test_refresh_with_no_conversation_is_rejected() {
        let mut store = ConversationStore::new();
        let applied = store.apply_refresh("+561", page(&json!([])), now());
        assert!(!applied);
    }

    #[test]
    fn test_older_page_walks_cursor_backward() {
        let mut store = ConversationStore::new();
        let initial = json!([{"id": "50", "created_at": "2024-01-05T00:00:00Z"}]);
        store.open_conversation(
            "+561",
            None,
            MessagePage {
                messages: &initial,
                has_more: true,
                next_cursor: Some("000050"),
            },
            now(),
        );

        let older = json!([{"id": "10", "created_at": "2024-01-01T00:00:00Z"}]);
        store.apply_older_page(
            "+561",
            MessagePage {
                messages: &older,
                has_more: true,
                next_cursor: Some("000010"),
            },
            now(),
        );

        let current = store.current().unwrap();
        assert_eq!(current.next_cursor(), Some("000010"));
        assert!(current.has_more());
        let ids: Vec<_> = current.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "50"]);
    }

    #[test]
    fn test_exhausted_pagination_clears_has_more() {
        let mut store = ConversationStore::new();
        store.open_conversation(
            "+561",
            None,
            MessagePage {
                messages: &json!([]),
                has_more: true,
                next_cursor: Some("000050"),
            },
            now(),
        );

        store.apply_older_page("+561", page(&json!([])), now());
        assert!(!store.current().unwrap().has_more());
        assert_eq!(store.current().unwrap().next_cursor(), None);
    }

    #[test]
    fn test_append_outgoing_updates_roster_preview() {
        let mut store = ConversationStore::new();
        store.set_roster(vec![ConversationSummary {
            phone_number: "+561".to_string(),
            display_name: "Ana".to_string(),
            last_message: "old preview".to_string(),
            last_message_at: "2024-01-01T00:00:00Z".to_string(),
            unread_count: 2,
        }]);
        store.open_conversation("+561", None, page(&json!([])), now());

        let in_roster = store
            .append_outgoing(outgoing("temp_1", "on our way", "2024-06-01T12:00:00Z"))
            .unwrap();

        assert!(in_roster);
        assert_eq!(store.current().unwrap().messages.len(), 1);
        assert_eq!(store.roster()[0].last_message, "on our way");
        assert_eq!(store.roster()[0].last_message_at, "2024-06-01T12:00:00Z");
    }

    #[test]
    fn test_append_outgoing_without_roster_entry() {
        let mut store = ConversationStore::new();
        store.open_conversation("+561", None, page(&json!([])), now());

        let in_roster = store
            .append_outgoing(outgoing("temp_1", "hello", "2024-06-01T12:00:00Z"))
            .unwrap();
        assert!(!in_roster);
    }

    #[test]
    fn test_append_outgoing_requires_open_conversation() {
        let mut store = ConversationStore::new();
        let result = store.append_outgoing(outgoing("temp_1", "x", "2024-06-01T12:00:00Z"));
        assert!(matches!(result, Err(Error::NoActiveConversation)));
    }

    #[test]
    fn test_optimistic_append_reconciled_by_refresh() {
        let mut store = ConversationStore::new();
        store.open_conversation("+561", None, page(&json!([])), now());
        store
            .append_outgoing(outgoing("42", "hello", "2024-06-01T12:00:00Z"))
            .unwrap();

        // The server copy of the same message arrives on the next refresh
        let refresh = json!([
            {"id": "42", "message_text": "hello", "direction": "outgoing",
             "timestamp": "2024-06-01T12:00:00Z"}
        ]);
        store.apply_refresh("+561", page(&refresh), now());

        assert_eq!(store.current().unwrap().messages.len(), 1);
    }

    #[test]
    fn test_clear_unread() {
        let mut store = ConversationStore::new();
        store.set_roster(vec![ConversationSummary {
            phone_number: "+561".to_string(),
            display_name: "Ana".to_string(),
            last_message: String::new(),
            last_message_at: "2024-01-01T00:00:00Z".to_string(),
            unread_count: 5,
        }]);

        store.clear_unread("+561");
        assert_eq!(store.roster()[0].unread_count, 0);
    }

    #[test]
    fn test_set_bot_enabled() {
        let mut store = ConversationStore::new();
        assert!(matches!(
            store.set_bot_enabled(true),
            Err(Error::NoActiveConversation)
        ));

        store.open_conversation("+561", None, page(&json!([])), now());
        store.set_bot_enabled(true).unwrap();
        let lead = store.current().unwrap().lead.as_ref().unwrap();
        assert!(lead.bot_enabled);
        assert_eq!(lead.phone_number, "+561");
    }

    #[test]
    fn test_connection_status() {
        let mut store = ConversationStore::new();
        assert_eq!(store.connection(), ConnectionStatus::Connecting);
        store.set_connection(ConnectionStatus::Connected);
        assert_eq!(store.connection(), ConnectionStatus::Connected);
    }
}
