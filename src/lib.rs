//! # Vora
//!
//! A voice-driven empathic commerce engine. Vora bridges a voice
//! assistant's transport stream to a reactive storefront session: prosody
//! readings drive an emotion-aware discount, assistant tool calls mutate
//! the session store, and completed purchases flow through a payment
//! gateway boundary with durable local records.
//!
//! ## Components
//!
//! - **Emotion scoring**: pure functions mapping an emotion vector to a
//!   discount percentage (0-25) and a Weighted Emotional Index stress
//!   score (0-100)
//! - **Market store**: catalog, filters, cart with stock guards, panel
//!   flags, bounded emotion history, snapshot persistence
//! - **Task store**: the Aura productivity profile — stress tracking and
//!   burnout task triage
//! - **Tool dispatch**: typed per-command parameters, one confirmation
//!   string per call
//! - **Session bridge**: NDJSON transport events on stdin, one tool
//!   response per call on stdout
//!
//! ## Architecture
//!
//! ```text
//! Voice Transport → Session Bridge (stdio) → Store + Dispatcher
//!                          ↓                       ↓
//!                   SQLite (snapshots,      Catalog / Payment
//!                   orders, analytics)      HTTP boundaries
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use vora::{AppState, Config, Profile, SessionServer};
//! use vora::catalog::CatalogClient;
//! use vora::checkout::CheckoutClient;
//! use vora::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let catalog = CatalogClient::new(&config.catalog, config.request.clone())?;
//!     let payments = CheckoutClient::new(&config.payments, config.request.clone())?;
//!     let state = Arc::new(AppState::new(config, storage, catalog, payments));
//!     let mut server = SessionServer::new(state, Profile::Market);
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Catalog provider boundary: products and stock.
pub mod catalog;
/// Payment gateway boundary and checkout completion.
pub mod checkout;
/// Configuration management.
pub mod config;
/// Tool-call dispatch and parameter validation.
pub mod dispatch;
/// Emotion vector and scoring functions.
pub mod emotion;
/// Error types and result aliases for the application.
pub mod error;
/// Transport types, shared state, and the stdio session server.
pub mod session;
/// SQLite storage layer for persistence.
pub mod storage;
/// The market session store.
pub mod store;
/// The Aura task store.
pub mod tasks;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use session::{AppState, Profile, SessionServer, SharedState};
