//! Voice session bridge: transport message types, the shared application
//! context, and the stdio server loop.
//!
//! The transport delivers newline-delimited JSON events on stdin. Exactly
//! one response is written to stdout per received tool call, in receipt
//! order. Everything else on stdout would corrupt the stream, so all
//! logging goes to stderr.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::catalog::CatalogClient;
use crate::checkout::{self, CheckoutClient};
use crate::config::Config;
use crate::dispatch::{dispatch_market, dispatch_tasks, Disposition};
use crate::emotion::{self, EmotionVector};
use crate::error::DispatchResult;
use crate::storage::{EmotionSnapshot, SqliteStorage, Storage};
use crate::store::MarketStore;
use crate::tasks::{TaskStore, VoiceState};

/// Which store profile the session runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Profile {
    /// Empathic storefront: catalog, cart, emotion discounts.
    Market,
    /// Task triage demo: stress score and burnout management.
    Aura,
}

/// Shared application state.
///
/// Holds configuration and the external-boundary clients. Store values are
/// owned by the [`SessionServer`], not shared.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Durable local storage.
    pub storage: SqliteStorage,
    /// Catalog provider client.
    pub catalog: CatalogClient,
    /// Payment gateway client.
    pub payments: CheckoutClient,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: Config,
        storage: SqliteStorage,
        catalog: CatalogClient,
        payments: CheckoutClient,
    ) -> Self {
        Self {
            config,
            storage,
            catalog,
            payments,
        }
    }
}

/// Thread-safe shared state handle.
pub type SharedState = Arc<AppState>;

/// Prosody model output attached to a user message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProsodyPayload {
    /// Emotion label to confidence score.
    #[serde(default)]
    pub scores: HashMap<String, f64>,
}

/// Model outputs bundled with a user message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelPayload {
    #[serde(default)]
    pub prosody: Option<ProsodyPayload>,
}

/// One event delivered by the voice transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransportEvent {
    /// A user utterance with prosody scores.
    UserMessage {
        #[serde(default)]
        models: ModelPayload,
        /// Interim transcripts carry provisional scores and are skipped.
        #[serde(default)]
        interim: bool,
    },
    /// The assistant invoked a tool.
    ToolCall {
        name: String,
        #[serde(default)]
        parameters: Option<Value>,
        #[serde(rename = "toolCallId", alias = "tool_call_id")]
        tool_call_id: String,
    },
    /// The assistant started speaking.
    AssistantMessage,
    /// The assistant finished speaking.
    AssistantEnd,
    /// The user interrupted the assistant.
    UserInterruption,
    /// Transport-level error report.
    Error {
        #[serde(default)]
        message: String,
    },
    /// The transport closed the session.
    Close,
    /// Anything this bridge does not consume.
    #[serde(other)]
    Unhandled,
}

/// Response written to stdout for a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ToolResponse {
    /// Successful dispatch.
    ToolResponse {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        content: String,
    },
    /// Dispatch failed; `error` is the machine-readable cause.
    ToolError {
        #[serde(rename = "toolCallId")]
        tool_call_id: String,
        error: String,
        content: String,
    },
}

/// Result of handling one transport event.
#[derive(Debug)]
pub struct SessionTurn {
    /// Response to flush to stdout, if the event was a tool call.
    pub response: Option<ToolResponse>,
    /// Whether the session tears down after the response is flushed.
    pub teardown: bool,
}

impl SessionTurn {
    fn silent() -> Self {
        Self {
            response: None,
            teardown: false,
        }
    }
}

/// Voice session server running over stdio.
pub struct SessionServer {
    state: SharedState,
    profile: Profile,
    session_id: String,
    market: MarketStore,
    tasks: TaskStore,
}

impl SessionServer {
    /// Create a new session server
    pub fn new(state: SharedState, profile: Profile) -> Self {
        let tasks = match profile {
            Profile::Aura => TaskStore::with_seed_tasks(),
            Profile::Market => TaskStore::new(),
        };
        Self {
            state,
            profile,
            session_id: Uuid::new_v4().to_string(),
            market: MarketStore::new(),
            tasks,
        }
    }

    /// The session's unique identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn market(&self) -> &MarketStore {
        &self.market
    }

    pub fn market_mut(&mut self) -> &mut MarketStore {
        &mut self.market
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Run the session loop over async stdio.
    pub async fn run(&mut self) -> std::io::Result<()> {
        info!(session = %self.session_id, profile = ?self.profile, "Voice session starting");

        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                self.teardown();
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(event = %trimmed, "Received event");

            let event = match serde_json::from_str::<TransportEvent>(trimmed) {
                Ok(event) => event,
                Err(e) => {
                    error!(error = %e, "Failed to parse transport event, skipping");
                    continue;
                }
            };

            let turn = self.handle_event(event).await;

            if let Some(response) = &turn.response {
                let response_json = serde_json::to_string(response)?;
                debug!(response = %response_json, "Sending response");

                stdout.write_all(response_json.as_bytes()).await?;
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }

            if turn.teardown {
                self.teardown();
                break;
            }
        }

        Ok(())
    }

    /// Handle one transport event, returning the response (if any) and
    /// whether the session should tear down once it is flushed.
    pub async fn handle_event(&mut self, event: TransportEvent) -> SessionTurn {
        match event {
            TransportEvent::UserMessage { models, interim } => {
                if interim {
                    return SessionTurn::silent();
                }
                let scores = models.prosody.map(|p| p.scores).unwrap_or_default();
                if scores.is_empty() {
                    return SessionTurn::silent();
                }
                self.apply_emotion(scores.into_iter().collect()).await;
                SessionTurn::silent()
            }
            TransportEvent::ToolCall {
                name,
                parameters,
                tool_call_id,
            } => {
                info!(tool = %name, "Handling tool call");
                let result = self.dispatch(&name, parameters).await;
                let (response, teardown) = match result {
                    Ok(disposition) => (
                        ToolResponse::ToolResponse {
                            tool_call_id,
                            content: disposition.content,
                        },
                        disposition.end_session,
                    ),
                    Err(e) => {
                        warn!(tool = %name, error = %e, "Tool call failed");
                        (
                            ToolResponse::ToolError {
                                tool_call_id,
                                error: e.to_string(),
                                content: "I wasn't able to do that.".to_string(),
                            },
                            false,
                        )
                    }
                };
                self.persist_market_snapshot().await;
                SessionTurn {
                    response: Some(response),
                    teardown,
                }
            }
            TransportEvent::AssistantMessage => {
                self.tasks.set_voice_state(VoiceState::Speaking);
                SessionTurn::silent()
            }
            TransportEvent::AssistantEnd => {
                self.tasks.set_voice_state(VoiceState::Idle);
                SessionTurn::silent()
            }
            TransportEvent::UserInterruption => {
                debug!("User interruption");
                self.tasks.set_voice_state(VoiceState::Listening);
                SessionTurn::silent()
            }
            TransportEvent::Error { message } => {
                error!(message = %message, "Transport error");
                SessionTurn::silent()
            }
            TransportEvent::Close => SessionTurn {
                response: None,
                teardown: true,
            },
            TransportEvent::Unhandled => SessionTurn::silent(),
        }
    }

    /// Route a tool call to the active profile's dispatcher. The checkout
    /// command completes the purchase inline: with no screen to hand off
    /// to, the bridge creates the gateway session itself and relays the
    /// redirect URL.
    async fn dispatch(
        &mut self,
        name: &str,
        parameters: Option<Value>,
    ) -> DispatchResult<Disposition> {
        match self.profile {
            Profile::Market => {
                let disposition = dispatch_market(&mut self.market, name, parameters)?;
                if name == "trigger_checkout" && !self.market.cart().is_empty() {
                    return Ok(self.run_checkout(disposition).await);
                }
                Ok(disposition)
            }
            Profile::Aura => dispatch_tasks(&mut self.tasks, name, parameters),
        }
    }

    async fn run_checkout(&mut self, opened: Disposition) -> Disposition {
        match checkout::complete_checkout(
            &mut self.market,
            &self.state.payments,
            &self.state.catalog,
            &self.state.storage,
            &self.session_id,
        )
        .await
        {
            Ok(outcome) => Disposition::reply(format!(
                "{} Your total is ${:.2}. Complete your purchase at {}",
                opened.content, outcome.total, outcome.redirect_url
            )),
            Err(e) => {
                warn!(error = %e, "Checkout failed");
                Disposition::reply(
                    "I couldn't complete the checkout right now. Your cart is unchanged."
                        .to_string(),
                )
            }
        }
    }

    /// Feed a prosody reading into the active store and record the
    /// analytics snapshot.
    async fn apply_emotion(&mut self, vector: EmotionVector) {
        let (cart_value, discount) = match self.profile {
            Profile::Market => {
                self.market.set_emotion_data(vector.clone());
                self.persist_market_snapshot().await;
                (self.market.cart_total(), self.market.emotion_discount())
            }
            Profile::Aura => {
                let stress = emotion::compute_stress(&vector);
                self.tasks.set_stress_score(stress);
                if let Some((label, score)) = vector.dominant() {
                    self.tasks
                        .set_current_emotion(format!("{} ({:.0}%)", label, score * 100.0));
                }
                (0.0, stress)
            }
        };

        let snapshot = EmotionSnapshot::new(&self.session_id, vector, cart_value, discount);
        if let Err(e) = self.state.storage.insert_emotion_snapshot(&snapshot).await {
            warn!(error = %e, "Emotion snapshot write failed");
        }
    }

    /// Persist the market store snapshot under the configured key.
    /// Failures are logged, never fatal.
    async fn persist_market_snapshot(&self) {
        if self.profile != Profile::Market {
            return;
        }
        let key = &self.state.config.session.storage_key;
        if let Err(e) = self
            .state
            .storage
            .save_snapshot(key, &self.market.snapshot())
            .await
        {
            warn!(error = %e, key = %key, "Snapshot persist failed");
        }
    }

    /// Deactivate both stores. Reads stay valid; mutations become no-ops.
    fn teardown(&mut self) {
        info!(session = %self.session_id, "Session teardown");
        self.tasks.set_voice_state(VoiceState::Idle);
        self.market.deactivate();
        self.tasks.deactivate();
    }
}
