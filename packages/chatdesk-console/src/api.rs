//! HTTP client for the console backend API.
//!
//! The backend contract is documented by the endpoints in
//! [`client::ConsoleApi`]; message payloads are deliberately schema-flexible
//! and stay as raw JSON until the core normalizer resolves them.

pub mod client;
pub mod types;

pub use client::*;
pub use types::*;
