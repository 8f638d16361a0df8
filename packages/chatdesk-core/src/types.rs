//! Core data types for the Chatdesk conversation cache.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::cursor::CursorTracker;

/// Message direction relative to the console operator.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// From the customer to us
    #[default]
    Incoming,
    /// From us (operator or bot) to the customer
    Outgoing,
}

/// Message content kind.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    Audio,
    Video,
    Document,
    /// Any kind the backend sends that we do not model explicitly
    Other(String),
}

impl MessageKind {
    /// Map a wire value to a kind. Empty or missing values mean text.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "text" => MessageKind::Text,
            "image" => MessageKind::Image,
            "audio" => MessageKind::Audio,
            "video" => MessageKind::Video,
            "document" => MessageKind::Document,
            other => MessageKind::Other(other.to_string()),
        }
    }

    /// The wire representation of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            MessageKind::Text => "text",
            MessageKind::Image => "image",
            MessageKind::Audio => "audio",
            MessageKind::Video => "video",
            MessageKind::Document => "document",
            MessageKind::Other(s) => s,
        }
    }
}

impl Serialize for MessageKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for MessageKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Ok(MessageKind::from_wire(&value))
    }
}

/// A message in its normalized form.
///
/// Produced by [`crate::normalize::normalize_messages`]; every field has been
/// resolved from the backend's schema-flexible payloads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique within a conversation; synthetic when the backend omitted it
    pub id: String,
    /// Human-readable body (may be empty for media-only messages)
    pub text: String,
    /// Incoming or outgoing
    pub direction: Direction,
    /// Content kind, defaulted to text
    #[serde(default)]
    pub kind: MessageKind,
    /// Validated media URL, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
    /// Timestamp as received (or the normalization instant when absent)
    pub timestamp: String,
}

impl Message {
    /// Chronological sort key in Unix milliseconds, when the timestamp parses.
    pub fn sort_key(&self) -> Option<i64> {
        parse_timestamp(&self.timestamp)
    }
}

/// Parse a wire timestamp into Unix milliseconds.
///
/// Accepts RFC 3339 and the naive `YYYY-MM-DD[ T]HH:MM:SS[.frac]` and
/// `YYYY-MM-DD` forms the backend has emitted historically; naive values are
/// treated as UTC. Returns `None` for anything else.
pub fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.timestamp_millis());
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(naive.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        let naive = date.and_hms_opt(0, 0, 0)?;
        return Some(naive.and_utc().timestamp_millis());
    }

    None
}

/// Lead qualification status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    PotentialClient,
    Customer,
    BadLead,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LeadStatus {
    /// Display label for the status.
    pub fn label(&self) -> &'static str {
        match self {
            LeadStatus::PotentialClient => "Potential Client",
            LeadStatus::Customer => "Customer",
            LeadStatus::BadLead => "Bad Lead",
            LeadStatus::Unknown => "Unknown",
        }
    }
}

/// A customer record keyed by phone number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Lead {
    /// Identity key
    #[serde(default)]
    pub phone_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    /// Whether the automated-reply bot is enabled for this lead
    #[serde(default)]
    pub bot_enabled: bool,
    #[serde(default)]
    pub lead_status: LeadStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact_at: Option<String>,
}

/// One entry in the conversation roster (the left-hand list).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationSummary {
    /// Identity key
    pub phone_number: String,
    /// Customer name, falling back to the phone number
    pub display_name: String,
    /// Preview of the most recent message
    pub last_message: String,
    /// Timestamp of the most recent activity, as received
    pub last_message_at: String,
    /// Messages not yet marked read
    #[serde(default)]
    pub unread_count: u32,
}

impl ConversationSummary {
    /// Sort key for most-recent-first ordering.
    pub fn activity_key(&self) -> Option<i64> {
        parse_timestamp(&self.last_message_at)
    }
}

/// Connection state toward the backend, as last observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Connecting,
    Connected,
    Disconnected,
}

/// The currently open conversation: the only message cache the client keeps.
///
/// Replaced wholesale when a different conversation is selected; merged into
/// by auto-refresh and pagination (see [`crate::store::ConversationStore`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conversation {
    /// Identity key
    pub phone_number: String,
    /// Customer name, falling back to the phone number
    pub display_name: String,
    /// Messages in chronological order
    pub messages: Vec<Message>,
    /// Oldest-boundary pagination state
    pub cursor: CursorTracker,
    /// Lead snapshot, when loaded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lead: Option<Lead>,
}

impl Conversation {
    /// Whether older pages may still exist on the server.
    pub fn has_more(&self) -> bool {
        self.cursor.has_more()
    }

    /// Cursor bounding the oldest page fetched so far.
    pub fn next_cursor(&self) -> Option<&str> {
        self.cursor.next_cursor()
    }
}
