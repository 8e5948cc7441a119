use axum::{
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use mintdesk_common::MintResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;

use super::api::SharedState;
use super::models::*;

/// How often to send WebSocket Ping frames.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// How long to wait for a Pong response before considering the connection dead.
const PONG_TIMEOUT: Duration = Duration::from_secs(60);

// ── WebSocket message types ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum WsMessage {
    ProjectCreated { project: Project },
    InvestorCreated { investor: Investor },
    SubscriptionCreated { subscription: Subscription },
    SubscriptionUpdated { subscription: Subscription },
    AllocationCreated { allocation: AllocationView },
    TokensMinted { result: MintResult },
}

impl WsMessage {
    /// Project the event belongs to. Investors are shared across projects,
    /// so their events reach every subscriber.
    pub fn project_id(&self) -> Option<&str> {
        match self {
            WsMessage::ProjectCreated { project } => Some(&project.id),
            WsMessage::InvestorCreated { .. } => None,
            WsMessage::SubscriptionCreated { subscription }
            | WsMessage::SubscriptionUpdated { subscription } => Some(&subscription.project_id),
            WsMessage::AllocationCreated { allocation } => Some(&allocation.record.project_id),
            WsMessage::TokensMinted { result } => Some(&result.project_id),
        }
    }
}

/// Serialized event plus the project it concerns, as carried on the
/// broadcast channel.
#[derive(Debug, Clone)]
pub struct WsEnvelope {
    pub project_id: Option<String>,
    pub payload: String,
}

impl WsEnvelope {
    fn visible_to(&self, filter: Option<&str>) -> bool {
        match (filter, self.project_id.as_deref()) {
            (Some(wanted), Some(actual)) => wanted == actual,
            _ => true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WsParams {
    pub project_id: Option<String>,
}

// ── WebSocket handler ────────────────────────────────────────────────

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<SharedState>,
) -> impl IntoResponse {
    let rx = state.ws_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, rx, params.project_id))
}

async fn handle_socket(
    socket: WebSocket,
    rx: broadcast::Receiver<WsEnvelope>,
    project_id: Option<String>,
) {
    tracing::debug!(project_id = ?project_id, "WebSocket client connected");
    let (sender, receiver) = socket.split();
    run_socket_loop(sender, receiver, rx, project_id.as_deref()).await;
    tracing::debug!("WebSocket client disconnected");
}

/// Core WebSocket loop with ping/pong keepalive.
///
/// Forwards broadcast events that pass the subscriber's project filter,
/// answers client frames, and pings periodically. If no Pong arrives within
/// [`PONG_TIMEOUT`] after a Ping, the connection is treated as dead.
async fn run_socket_loop(
    mut sender: SplitSink<WebSocket, Message>,
    mut receiver: SplitStream<WebSocket>,
    mut rx: broadcast::Receiver<WsEnvelope>,
    project_id: Option<&str>,
) {
    let mut ping_interval = tokio::time::interval(PING_INTERVAL);
    // The first tick completes immediately.
    ping_interval.tick().await;

    let mut last_pong = Instant::now();
    let mut awaiting_pong = false;

    loop {
        tokio::select! {
            _ = ping_interval.tick() => {
                if awaiting_pong && last_pong.elapsed() > PONG_TIMEOUT {
                    tracing::debug!("WebSocket pong timeout");
                    break;
                }
                if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
                awaiting_pong = true;
            }

            result = rx.recv() => {
                match result {
                    Ok(envelope) => {
                        if !envelope.visible_to(project_id) {
                            continue;
                        }
                        if sender.send(Message::Text(envelope.payload.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "WebSocket subscriber lagged; events dropped");
                        continue;
                    }
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Pong(_))) => {
                        last_pong = Instant::now();
                        awaiting_pong = false;
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    let _ = sender.send(Message::Close(None)).await;
}

// ── Broadcast helper ─────────────────────────────────────────────────

/// Serialize and broadcast an event to connected WebSocket clients.
/// Having no subscribers is not an error.
pub fn broadcast_message(tx: &broadcast::Sender<WsEnvelope>, msg: &WsMessage) {
    match serde_json::to_string(msg) {
        Ok(payload) => {
            let _ = tx.send(WsEnvelope {
                project_id: msg.project_id().map(str::to_string),
                payload,
            });
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize WsMessage");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use mintdesk_common::executor::TokenMint;

    fn project(id: &str) -> Project {
        Project {
            id: id.to_string(),
            name: "Fund".to_string(),
            description: None,
            created_at: "2026-01-01 00:00:00".to_string(),
            updated_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    fn minted(project_id: &str) -> WsMessage {
        WsMessage::TokensMinted {
            result: MintResult {
                project_id: project_id.to_string(),
                minted_at: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
                mints: vec![TokenMint {
                    token_type: "Equity".into(),
                    records_updated: 2,
                    amount: 300.0,
                    tx_ref: "mint-0001".into(),
                }],
            },
        }
    }

    #[test]
    fn test_project_created_serialization() {
        let msg = WsMessage::ProjectCreated { project: project("p1") };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "project_created");
        assert_eq!(json["data"]["project"]["id"], "p1");
    }

    #[test]
    fn test_tokens_minted_serialization() {
        let json: serde_json::Value = serde_json::to_value(minted("p1")).unwrap();
        assert_eq!(json["type"], "tokens_minted");
        assert_eq!(json["data"]["result"]["mints"][0]["tx_ref"], "mint-0001");
    }

    #[test]
    fn test_investor_events_are_not_project_scoped() {
        let msg = WsMessage::InvestorCreated {
            investor: Investor {
                id: "i1".into(),
                name: "Alice".into(),
                email: "a@example.com".into(),
                wallet_address: None,
                kyc_status: "pending".into(),
                created_at: "2026-01-01 00:00:00".into(),
            },
        };
        assert_eq!(msg.project_id(), None);
        assert_eq!(minted("p9").project_id(), Some("p9"));
    }

    #[test]
    fn test_envelope_filter() {
        let scoped = WsEnvelope {
            project_id: Some("p1".into()),
            payload: String::new(),
        };
        let global = WsEnvelope {
            project_id: None,
            payload: String::new(),
        };
        assert!(scoped.visible_to(None));
        assert!(scoped.visible_to(Some("p1")));
        assert!(!scoped.visible_to(Some("p2")));
        assert!(global.visible_to(Some("p2")));
    }

    #[tokio::test]
    async fn test_broadcast_channel_delivers_to_subscribers() {
        let (tx, _) = broadcast::channel::<WsEnvelope>(16);
        let mut rx1 = tx.subscribe();
        let mut rx2 = tx.subscribe();

        broadcast_message(&tx, &minted("p1"));

        let received1 = rx1.recv().await.unwrap();
        let received2 = rx2.recv().await.unwrap();
        assert_eq!(received1.project_id.as_deref(), Some("p1"));
        assert!(received1.payload.contains("tokens_minted"));
        assert_eq!(received1.payload, received2.payload);
    }

    #[tokio::test]
    async fn test_broadcast_no_receivers_does_not_panic() {
        let (tx, _) = broadcast::channel::<WsEnvelope>(16);
        broadcast_message(&tx, &minted("p1"));
    }

    #[test]
    fn test_keepalive_constants() {
        assert!(PONG_TIMEOUT > PING_INTERVAL);
    }
}
