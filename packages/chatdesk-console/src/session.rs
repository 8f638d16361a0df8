//! Polling session: drives the conversation store against the backend.
//!
//! The session owns the API client and the store and is the only writer to
//! the cache. Two timers share one cooperative task: the roster refreshes
//! every 10 seconds and the open conversation every 5 (both configurable).
//! The loop never runs two fetches at once, but a fetch can still complete
//! after the operator has moved on; the store's phone-keyed merges make that
//! harmless.
//!
//! User-initiated loads and sends propagate their errors (the caller retries
//! by re-invoking); background refresh failures are only logged. Nothing is
//! retried automatically.

use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use chatdesk_core::{
    reconcile_roster, ConnectionStatus, ConversationStore, Direction, Message, MessageKind,
    MessagePage,
};

use crate::api::{ConsoleApi, ConversationHistoryResponse};
use crate::config::ConsoleConfig;

/// A console session: one operator, one store, one backend.
#[derive(Debug)]
pub struct ConsoleSession {
    api: ConsoleApi,
    store: ConversationStore,
    config: ConsoleConfig,
}

impl ConsoleSession {
    /// Create a session from configuration.
    pub fn new(config: ConsoleConfig) -> Self {
        Self {
            api: ConsoleApi::new(&config.base_url),
            store: ConversationStore::new(),
            config,
        }
    }

    /// Read access to the underlying store.
    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    /// The session configuration.
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    // ========================================================================
    // Loads
    // ========================================================================

    /// Fetch and reconcile the conversation roster.
    ///
    /// Updates the connection indicator either way; the error propagates so
    /// user-initiated loads can surface it.
    pub async fn refresh_roster(&mut self) -> Result<()> {
        match self.api.list_conversations().await {
            Ok(response) => {
                let raw = serde_json::Value::Array(response.conversations);
                self.store.set_roster(reconcile_roster(&raw, Utc::now()));
                self.store.set_connection(ConnectionStatus::Connected);
                Ok(())
            }
            Err(error) => {
                self.store.set_connection(ConnectionStatus::Disconnected);
                Err(error)
            }
        }
    }

    /// Open a conversation, replacing whatever was open before.
    ///
    /// Loads the newest history page and the lead record, then marks the
    /// conversation read. A mark-read failure is logged rather than failing
    /// the selection.
    pub async fn select_conversation(&mut self, phone: &str) -> Result<()> {
        let response = self
            .api
            .get_conversation(phone, self.config.page_limit, None)
            .await?;

        let lead = match response.lead.clone() {
            Some(lead) => Some(lead),
            None => match self.api.get_lead(phone).await {
                Ok(lead) => Some(lead),
                Err(error) => {
                    tracing::warn!("Failed to load lead for {}: {}", phone, error);
                    None
                }
            },
        };

        self.store
            .open_conversation(phone, lead, page_of(&response), Utc::now());

        match self.api.mark_read(phone).await {
            Ok(()) => self.store.clear_unread(phone),
            Err(error) => tracing::warn!("Failed to mark {} read: {}", phone, error),
        }

        Ok(())
    }

    /// Background refresh of the open conversation.
    ///
    /// Failures are swallowed (logged at debug) so a flaky poll cycle never
    /// interrupts the operator. A response for a conversation that is no
    /// longer open is discarded by the store.
    pub async fn refresh_current(&mut self) {
        let Some(phone) = self.current_phone() else {
            return;
        };

        match self
            .api
            .get_conversation(&phone, self.config.page_limit, None)
            .await
        {
            Ok(response) => {
                if !self
                    .store
                    .apply_refresh(&phone, page_of(&response), Utc::now())
                {
                    tracing::debug!("Dropping refresh for {}: no longer open", phone);
                }
            }
            Err(error) => {
                tracing::debug!("Auto-refresh of {} failed: {}", phone, error);
            }
        }
    }

    /// Fetch and merge the page older than everything seen so far.
    ///
    /// Returns `Ok(false)` when the conversation has no further pages.
    pub async fn load_older(&mut self) -> Result<bool> {
        let Some(conversation) = self.store.current() else {
            bail!("no conversation selected");
        };
        if !conversation.has_more() {
            return Ok(false);
        }
        let phone = conversation.phone_number.clone();
        let before = conversation.next_cursor().map(str::to_string);

        let response = self
            .api
            .get_conversation(&phone, self.config.page_limit, before.as_deref())
            .await?;

        Ok(self
            .store
            .apply_older_page(&phone, page_of(&response), Utc::now()))
    }

    // ========================================================================
    // Sends
    // ========================================================================

    /// Send a text message to the open conversation.
    ///
    /// On success the message is appended optimistically; on failure nothing
    /// changes and the caller keeps the text for retry.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        let phone = self.require_phone()?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            bail!("refusing to send an empty message");
        }

        let response = self.api.send_text(&phone, trimmed).await?;
        self.record_outgoing(response.message_id, trimmed, MessageKind::Text, None)
            .await
    }

    /// Send an already-hosted image to the open conversation.
    pub async fn send_image_url(&mut self, image_url: &str, caption: Option<&str>) -> Result<()> {
        let phone = self.require_phone()?;
        let response = self.api.send_image_url(&phone, image_url, caption).await?;
        self.record_outgoing(
            response.message_id,
            caption.unwrap_or_default(),
            MessageKind::Image,
            Some(image_url.to_string()),
        )
        .await
    }

    /// Upload an image file and send it to the open conversation.
    pub async fn upload_image(
        &mut self,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let phone = self.require_phone()?;
        let response = self
            .api
            .upload_and_send_image(&phone, file_name, bytes, caption)
            .await?;
        self.record_outgoing(
            response.message_id,
            caption.unwrap_or_default(),
            MessageKind::Image,
            None,
        )
        .await
    }

    /// Upload an audio recording and send it to the open conversation.
    pub async fn upload_audio(&mut self, file_name: &str, bytes: Vec<u8>) -> Result<()> {
        let phone = self.require_phone()?;
        let response = self
            .api
            .upload_and_send_audio(&phone, file_name, bytes)
            .await?;
        self.record_outgoing(response.message_id, "", MessageKind::Audio, None)
            .await
    }

    /// Enable or disable the reply bot for the open conversation's lead.
    pub async fn toggle_bot(&mut self, enabled: bool) -> Result<()> {
        let phone = self.require_phone()?;
        self.api.set_bot_enabled(&phone, enabled).await?;
        self.store.set_bot_enabled(enabled)?;
        Ok(())
    }

    // ========================================================================
    // Polling Loop
    // ========================================================================

    /// Run the polling loop until `shutdown` resolves.
    ///
    /// One cooperative task, two timers; fetches interleave only at await
    /// points, never mid-merge.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        let mut roster_tick =
            tokio::time::interval(Duration::from_secs(self.config.roster_refresh_secs.max(1)));
        let mut conversation_tick = tokio::time::interval(Duration::from_secs(
            self.config.conversation_refresh_secs.max(1),
        ));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Console session shutting down");
                    break;
                }
                _ = roster_tick.tick() => {
                    if let Err(error) = self.refresh_roster().await {
                        tracing::warn!("Roster refresh failed: {}", error);
                    }
                }
                _ = conversation_tick.tick() => {
                    self.refresh_current().await;
                }
            }
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn current_phone(&self) -> Option<String> {
        self.store
            .current()
            .map(|conversation| conversation.phone_number.clone())
    }

    fn require_phone(&self) -> Result<String> {
        match self.current_phone() {
            Some(phone) => Ok(phone),
            None => bail!("no conversation selected"),
        }
    }

    /// Append the just-sent message optimistically and keep the roster
    /// preview current; falls back to a full roster refresh when the
    /// conversation was not listed yet.
    async fn record_outgoing(
        &mut self,
        message_id: Option<String>,
        text: &str,
        kind: MessageKind,
        media_url: Option<String>,
    ) -> Result<()> {
        let now = Utc::now();
        let message = outgoing_message(message_id, text, kind, media_url, now);
        let in_roster = self.store.append_outgoing(message)?;
        if !in_roster {
            if let Err(error) = self.refresh_roster().await {
                tracing::warn!("Roster refresh after send failed: {}", error);
            }
        }
        Ok(())
    }
}

/// Build the optimistic local record for a message we just sent.
///
/// Uses the server-assigned id when the response carried one, else a
/// temporary id the next refresh merge will replace.
fn outgoing_message(
    message_id: Option<String>,
    text: &str,
    kind: MessageKind,
    media_url: Option<String>,
    now: DateTime<Utc>,
) -> Message {
    let id = message_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("temp_{}", now.timestamp_millis()));

    Message {
        id,
        text: text.to_string(),
        direction: Direction::Outgoing,
        kind,
        media_url,
        timestamp: now.to_rfc3339(),
    }
}

fn page_of(response: &ConversationHistoryResponse) -> MessagePage<'_> {
    MessagePage {
        messages: &response.messages,
        has_more: response.has_more,
        next_cursor: response.next_cursor.as_deref(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_outgoing_message_uses_server_id() {
        let message = outgoing_message(
            Some("srv_9".to_string()),
            "hola",
            MessageKind::Text,
            None,
            now(),
        );
        assert_eq!(message.id, "srv_9");
        assert_eq!(message.direction, Direction::Outgoing);
        assert_eq!(message.timestamp, now().to_rfc3339());
    }

    #[test]
    fn test_outgoing_message_falls_back_to_temp_id() {
        let message = outgoing_message(None, "hola", MessageKind::Text, None, now());
        assert_eq!(message.id, format!("temp_{}", now().timestamp_millis()));

        let blank = outgoing_message(Some("  ".to_string()), "hola", MessageKind::Text, None, now());
        assert_eq!(blank.id, message.id);
    }

    #[test]
    fn test_page_of_maps_response() {
        let response = ConversationHistoryResponse {
            lead: None,
            messages: serde_json::json!([{"id": "1"}]),
            has_more: true,
            next_cursor: Some("000042".to_string()),
        };

        let page = page_of(&response);
        assert!(page.messages.is_array());
        assert!(page.has_more);
        assert_eq!(page.next_cursor, Some("000042"));
    }

    #[test]
    fn test_session_starts_empty() {
        let session = ConsoleSession::new(ConsoleConfig::default());
        assert!(session.store().current().is_none());
        assert!(session.store().roster().is_empty());
        assert_eq!(session.store().connection(), ConnectionStatus::Connecting);
    }
}
