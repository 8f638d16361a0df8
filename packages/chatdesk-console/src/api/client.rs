//! Console API HTTP client implementation.

use anyhow::{anyhow, Result};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use chatdesk_core::Lead;

use super::types::*;

/// Smallest page the conversation endpoint accepts.
const MIN_PAGE_LIMIT: usize = 1;
/// Largest page the conversation endpoint accepts.
const MAX_PAGE_LIMIT: usize = 500;

/// HTTP client for the console backend.
#[derive(Debug, Clone)]
pub struct ConsoleApi {
    base_url: String,
    client: Client,
}

impl ConsoleApi {
    /// Create a new client with the given base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // ========================================================================
    // Internal HTTP Methods
    // ========================================================================

    /// Make a GET request
    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    /// Make a POST request
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    /// Make a POST request with a multipart form body
    async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(response.json().await?)
    }

    /// Make a PUT request
    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<()> {
        let response = self
            .client
            .put(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "Request failed: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            ));
        }

        Ok(())
    }

    // ========================================================================
    // Health API
    // ========================================================================

    /// Check if the backend is reachable and healthy
    pub async fn health(&self) -> Result<bool> {
        match self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await
        {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    // ========================================================================
    // Conversation API
    // ========================================================================

    /// List recent conversations
    pub async fn list_conversations(&self) -> Result<ConversationsResponse> {
        self.get("/api/conversations").await
    }

    /// Get one conversation's history, newest page first.
    ///
    /// `limit` is clamped to the backend's accepted range before it reaches
    /// the wire; `before` bounds the page to strictly older messages.
    pub async fn get_conversation(
        &self,
        phone: &str,
        limit: usize,
        before: Option<&str>,
    ) -> Result<ConversationHistoryResponse> {
        self.get(&conversation_path(phone, limit, before)).await
    }

    /// Mark a conversation's messages as read
    pub async fn mark_read(&self, phone: &str) -> Result<()> {
        self.put(&format!("/api/conversations/{}/mark-read", phone), &())
            .await
    }

    // ========================================================================
    // Lead API
    // ========================================================================

    /// Get the lead record behind a conversation
    pub async fn get_lead(&self, phone: &str) -> Result<Lead> {
        let response: LeadResponse = self.get(&format!("/leads/{}", phone)).await?;
        Ok(response.lead)
    }

    /// Enable or disable the automated-reply bot for a lead
    pub async fn set_bot_enabled(&self, phone: &str, enabled: bool) -> Result<()> {
        self.put(
            &format!("/leads/{}/bot-toggle", phone),
            &BotToggleRequest {
                bot_enabled: enabled,
            },
        )
        .await
    }

    // ========================================================================
    // Send API
    // ========================================================================

    /// Send a plain text message
    pub async fn send_text(&self, to: &str, message: &str) -> Result<SendMessageResponse> {
        self.post("/api/send-message", &SendMessageRequest::text(to, message))
            .await
    }

    /// Send an image already hosted somewhere, with an optional caption
    pub async fn send_image_url(
        &self,
        to: &str,
        image_url: &str,
        caption: Option<&str>,
    ) -> Result<SendMessageResponse> {
        self.post(
            "/api/send-message",
            &SendMessageRequest::image(to, image_url, caption),
        )
        .await
    }

    /// Upload an image and send it in one step
    pub async fn upload_and_send_image(
        &self,
        to: &str,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<SendMessageResponse> {
        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("to", to.to_string());
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        self.post_multipart("/api/upload-and-send-image", form).await
    }

    /// Upload an audio recording and send it in one step
    pub async fn upload_and_send_audio(
        &self,
        to: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<SendMessageResponse> {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("to", to.to_string());

        self.post_multipart("/api/upload-and-send-audio", form).await
    }
}

/// Build the conversation-history path with a clamped page limit.
fn conversation_path(phone: &str, limit: usize, before: Option<&str>) -> String {
    let limit = limit.clamp(MIN_PAGE_LIMIT, MAX_PAGE_LIMIT);
    let mut path = format!("/api/conversations/{}?limit={}", phone, limit);
    if let Some(cursor) = before {
        path.push_str("&before=");
        path.push_str(cursor);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversation_path_clamps_limit() {
        assert_eq!(
            conversation_path("+561", 0, None),
            "/api/conversations/+561?limit=1"
        );
        assert_eq!(
            conversation_path("+561", 50, None),
            "/api/conversations/+561?limit=50"
        );
        assert_eq!(
            conversation_path("+561", 9999, None),
            "/api/conversations/+561?limit=500"
        );
    }

    #[test]
    fn test_conversation_path_with_cursor() {
        assert_eq!(
            conversation_path("+561", 50, Some("000042")),
            "/api/conversations/+561?limit=50&before=000042"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let api = ConsoleApi::new("http://127.0.0.1:8000/");
        assert_eq!(api.base_url(), "http://127.0.0.1:8000");
    }
}
