//! Integration tests for the session bridge: transport events in, store
//! effects and tool responses out.
//!
//! These drive `SessionServer::handle_event` directly rather than the
//! stdio loop; the wire loop is a thin read/parse/flush shell around it.

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::json;

use vora::catalog::{CatalogClient, Product};
use vora::checkout::CheckoutClient;
use vora::config::{
    CatalogConfig, Config, DatabaseConfig, LogFormat, LoggingConfig, PaymentConfig, RequestConfig,
    SessionConfig,
};
use vora::session::{AppState, Profile, SessionServer, ToolResponse, TransportEvent};
use vora::storage::{SqliteStorage, Storage};

/// Clients point at a closed port; these tests never reach the network.
fn test_config() -> Config {
    Config {
        catalog: CatalogConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            project_id: "test-project".to_string(),
            dataset: "production".to_string(),
            token: None,
        },
        payments: PaymentConfig {
            api_key: "sk_test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            success_url: "http://localhost:3000/success".to_string(),
            cancel_url: "http://localhost:3000/".to_string(),
        },
        database: DatabaseConfig {
            path: PathBuf::from(":memory:"),
            max_connections: 1,
        },
        logging: LoggingConfig {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        },
        request: RequestConfig {
            timeout_ms: 1000,
            max_retries: 0,
            retry_delay_ms: 10,
        },
        session: SessionConfig::default(),
    }
}

async fn test_state() -> Arc<AppState> {
    let config = test_config();
    let storage = SqliteStorage::new_in_memory().await.unwrap();
    let catalog = CatalogClient::new(&config.catalog, config.request.clone()).unwrap();
    let payments = CheckoutClient::new(&config.payments, config.request.clone()).unwrap();
    Arc::new(AppState::new(config, storage, catalog, payments))
}

async fn market_server(state: Arc<AppState>) -> SessionServer {
    let mut server = SessionServer::new(state, Profile::Market);
    server
        .market_mut()
        .set_products(vec![Product::new("p1", "Blue Dress", 80.0, 3)]);
    server
}

fn tool_call(name: &str, parameters: serde_json::Value, id: &str) -> TransportEvent {
    serde_json::from_value(json!({
        "type": "tool_call",
        "name": name,
        "parameters": parameters,
        "toolCallId": id
    }))
    .unwrap()
}

fn prosody_message(scores: serde_json::Value) -> TransportEvent {
    serde_json::from_value(json!({
        "type": "user_message",
        "models": { "prosody": { "scores": scores } }
    }))
    .unwrap()
}

#[tokio::test]
async fn test_tool_call_produces_one_response() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let event = tool_call("add_to_cart", json!({ "product_id": "p1" }), "tc-1");
    let turn = server.handle_event(event).await;

    assert!(!turn.teardown);
    match turn.response {
        Some(ToolResponse::ToolResponse {
            tool_call_id,
            content,
        }) => {
            assert_eq!(tool_call_id, "tc-1");
            assert_eq!(content, "Added 1 Blue Dress to your cart.");
        }
        other => panic!("expected tool_response, got {:?}", other),
    }
    assert_eq!(server.market().cart().len(), 1);
}

#[tokio::test]
async fn test_tool_call_persists_market_snapshot() {
    let state = test_state().await;
    let mut server = market_server(state.clone()).await;

    let event = tool_call("add_to_cart", json!({ "product_id": "p1", "quantity": 2 }), "tc-1");
    server.handle_event(event).await;

    let snapshot = state
        .storage
        .load_snapshot("vora-storage")
        .await
        .unwrap()
        .expect("snapshot should be persisted after a tool call");
    assert_eq!(snapshot.cart.len(), 1);
    assert_eq!(snapshot.cart[0].quantity, 2);
}

#[tokio::test]
async fn test_unknown_command_yields_tool_error() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let turn = server
        .handle_event(tool_call("make_coffee", json!({}), "tc-9"))
        .await;

    match turn.response {
        Some(ToolResponse::ToolError {
            tool_call_id,
            error,
            ..
        }) => {
            assert_eq!(tool_call_id, "tc-9");
            assert!(error.contains("make_coffee"));
        }
        other => panic!("expected tool_error, got {:?}", other),
    }
    assert!(!turn.teardown);
}

#[tokio::test]
async fn test_malformed_parameters_yield_tool_error() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    // add_to_cart requires a product id.
    let turn = server
        .handle_event(tool_call("add_to_cart", json!({ "quantity": 1 }), "tc-2"))
        .await;

    assert!(matches!(
        turn.response,
        Some(ToolResponse::ToolError { .. })
    ));
    assert!(server.market().cart().is_empty());
}

#[tokio::test]
async fn test_prosody_scores_drive_market_discount() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let event = prosody_message(json!({ "Distress": 0.8, "Joy": 0.9 }));
    let turn = server.handle_event(event).await;

    assert!(turn.response.is_none());
    // round(25 * 0.8): joy does not participate.
    assert_eq!(server.market().emotion_discount(), 20);
}

#[tokio::test]
async fn test_interim_messages_are_skipped() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let event: TransportEvent = serde_json::from_value(json!({
        "type": "user_message",
        "interim": true,
        "models": { "prosody": { "scores": { "distress": 1.0 } } }
    }))
    .unwrap();
    server.handle_event(event).await;

    assert_eq!(server.market().emotion_discount(), 0);
}

#[tokio::test]
async fn test_prosody_scores_drive_aura_stress() {
    let state = test_state().await;
    let mut server = SessionServer::new(state, Profile::Aura);

    // WEI: 0.5*0.8 + 0.3*0.6 + 0.2*0 = 0.58
    let event = prosody_message(json!({ "distress": 0.8, "anxiety": 0.6 }));
    server.handle_event(event).await;

    assert_eq!(server.tasks().stress_score(), 58);
}

#[tokio::test]
async fn test_aura_burnout_tool_call() {
    let state = test_state().await;
    let mut server = SessionServer::new(state, Profile::Aura);

    let event = tool_call(
        "manage_burnout",
        json!({ "task_id": "1", "adjustment_type": "complete" }),
        "tc-3",
    );
    let turn = server.handle_event(event).await;

    match turn.response {
        Some(ToolResponse::ToolResponse { content, .. }) => {
            assert!(content.contains("Preparing to complete"));
            assert!(content.contains("Chemistry Lab Report"));
        }
        other => panic!("expected tool_response, got {:?}", other),
    }
}

#[tokio::test]
async fn test_end_call_response_flushed_before_teardown() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let turn = server.handle_event(tool_call("end_call", json!({}), "tc-4")).await;

    // The response is produced in the same turn that requests teardown,
    // so the loop flushes it before deactivating anything.
    match turn.response {
        Some(ToolResponse::ToolResponse { content, .. }) => {
            assert_eq!(content, "Ending session. Goodbye!");
        }
        other => panic!("expected tool_response, got {:?}", other),
    }
    assert!(turn.teardown);
}

#[tokio::test]
async fn test_close_event_requests_teardown_silently() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let turn = server.handle_event(TransportEvent::Close).await;

    assert!(turn.response.is_none());
    assert!(turn.teardown);
}

#[tokio::test]
async fn test_responses_in_receipt_order() {
    let state = test_state().await;
    let mut server = market_server(state).await;

    let mut ids = Vec::new();
    for i in 0..3 {
        let turn = server
            .handle_event(tool_call(
                "filter_products",
                json!({ "category": "dresses" }),
                &format!("tc-{}", i),
            ))
            .await;
        if let Some(ToolResponse::ToolResponse { tool_call_id, .. }) = turn.response {
            ids.push(tool_call_id);
        }
    }

    assert_eq!(ids, vec!["tc-0", "tc-1", "tc-2"]);
}
