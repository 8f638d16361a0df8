//! Chatdesk Core - Client-side message reconciliation library.
//!
//! This crate provides the data layer for the Chatdesk admin console:
//!
//! - **Message normalization**: heterogeneous backend payloads into one shape
//! - **Chronological merge**: de-duplicated, ordered merging of fetches
//! - **Cursor tracking**: oldest-boundary pagination cursors
//! - **Conversation store**: the client-side cache behind the console
//! - **Capture state machines**: recording and attachment flows, UI-free
//!
//! # Example
//!
//! ```rust
//! use chatdesk_core::normalize_messages;
//! use chrono::Utc;
//! use serde_json::json;
//!
//! let raw = json!([
//!     {"content": "hola", "role": "user", "created_at": "2024-01-01T00:00:00Z"},
//! ]);
//!
//! let messages = normalize_messages(&raw, Utc::now());
//! assert_eq!(messages[0].text, "hola");
//! ```

pub mod capture;
pub mod cursor;
pub mod merge;
pub mod normalize;
pub mod roster;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use types::{
    parse_timestamp, ConnectionStatus, Conversation, ConversationSummary, Direction, Lead,
    LeadStatus, Message, MessageKind,
};

// Re-export main functionality
pub use capture::{AttachmentDraft, AudioRecorder, DraftState, RecorderState};
pub use cursor::CursorTracker;
pub use merge::merge_messages;
pub use normalize::normalize_messages;
pub use roster::{filter_roster, reconcile_roster};
pub use store::{ConversationStore, MessagePage};

/// Error types for chatdesk-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Attachment too large: {size} bytes (limit {limit})")]
    AttachmentTooLarge { size: usize, limit: usize },

    #[error("No conversation is currently open")]
    NoActiveConversation,
}

/// Result type for chatdesk-core operations.
pub type Result<T> = std::result::Result<T, Error>;
