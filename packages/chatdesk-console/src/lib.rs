//! Chatdesk Console - headless client for the WhatsApp admin console API.
//!
//! Wraps the backend REST API in a typed client ([`api::ConsoleApi`]) and
//! drives the reconciliation core (`chatdesk-core`) from a polling session
//! ([`session::ConsoleSession`]): the roster refreshes every 10 seconds and
//! the open conversation every 5, with all cache mutation delegated to the
//! core's merge semantics so replays and interleaved responses are safe.

pub mod api;
pub mod config;
pub mod session;

pub use api::{ConsoleApi, ConversationHistoryResponse, ConversationsResponse, SendMessageResponse};
pub use config::ConsoleConfig;
pub use session::ConsoleSession;
