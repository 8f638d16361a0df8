//! Wire types for the console backend API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use chatdesk_core::Lead;

// ============================================================================
// Conversation Types
// ============================================================================

/// Response of `GET /api/conversations`.
///
/// Rows are kept raw; the core roster reconciler resolves their
/// schema-flexible fields.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationsResponse {
    #[serde(default)]
    pub conversations: Vec<Value>,
    #[serde(default)]
    pub total: Option<u32>,
}

/// Response of `GET /api/conversations/{phone}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConversationHistoryResponse {
    #[serde(default)]
    pub lead: Option<Lead>,
    /// Raw message records; historical payload shapes vary, so these stay
    /// untyped until normalization
    #[serde(default)]
    pub messages: Value,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Response of `GET /leads/{phone}`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LeadResponse {
    #[serde(default)]
    pub lead: Lead,
}

// ============================================================================
// Send Types
// ============================================================================

/// Request body for `POST /api/send-message`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl SendMessageRequest {
    /// A plain text message.
    pub fn text(to: &str, message: &str) -> Self {
        Self {
            to: to.to_string(),
            message: Some(message.to_string()),
            message_type: None,
            image_url: None,
            caption: None,
        }
    }

    /// An image referenced by URL, with an optional caption.
    pub fn image(to: &str, image_url: &str, caption: Option<&str>) -> Self {
        Self {
            to: to.to_string(),
            message: None,
            message_type: Some("image".to_string()),
            image_url: Some(image_url.to_string()),
            caption: caption.map(str::to_string),
        }
    }
}

/// Response of the send and upload-and-send endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SendMessageResponse {
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// ============================================================================
// Lead Types
// ============================================================================

/// Request body for `PUT /leads/{phone}/bot-toggle`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotToggleRequest {
    pub bot_enabled: bool,
}
