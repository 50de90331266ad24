//! WebSocket feed of ledger events
//!
//! Clients receive every append and status change on the simulated chain,
//! optionally narrowed to a set of wallet addresses.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use uuid::Uuid;

use crate::ledger::{LedgerEvent, TransactionStore};

/// WebSocket server state
#[derive(Clone)]
pub struct WsState {
    ledger: Arc<TransactionStore>,
    /// Watched addresses per connected client; empty means everything
    clients: Arc<RwLock<HashMap<Uuid, Vec<String>>>>,
}

/// Client message types
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientMessage {
    Subscribe { addresses: Vec<String> },
    Unsubscribe { addresses: Vec<String> },
    Ping,
}

/// Server message types
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerMessage {
    Event { event: LedgerEvent },
    Subscribed { addresses: Vec<String> },
    Unsubscribed { addresses: Vec<String> },
    Pong,
    Error { message: String },
}

impl WsState {
    pub fn new(ledger: Arc<TransactionStore>) -> Self {
        Self {
            ledger,
            clients: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    async fn wants(&self, client_id: Uuid, event: &LedgerEvent) -> bool {
        let clients = self.clients.read().await;
        match clients.get(&client_id) {
            Some(addresses) if addresses.is_empty() => true,
            Some(addresses) => {
                let tx = event.transaction();
                addresses.iter().any(|a| tx.touches_address(a))
            }
            None => false,
        }
    }

    /// Apply a subscription change and return the watched set
    async fn update_subscriptions(
        &self,
        client_id: Uuid,
        added: &[String],
        removed: &[String],
    ) -> Vec<String> {
        let mut clients = self.clients.write().await;
        let watched = clients.entry(client_id).or_default();
        watched.retain(|a| !removed.contains(a));
        for address in added {
            if !watched.contains(address) {
                watched.push(address.clone());
            }
        }
        watched.clone()
    }
}

/// WebSocket handler - upgrades HTTP connection to WebSocket
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WsState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let client_id = Uuid::new_v4();
    state.clients.write().await.insert(client_id, Vec::new());
    tracing::info!(client = %client_id, "WebSocket client connected");

    let (mut sender, mut receiver) = socket.split();
    let (internal_tx, mut internal_rx) = mpsc::channel::<ServerMessage>(32);
    let mut events = state.ledger.subscribe();

    let send_state = state.clone();
    let mut send_task = tokio::spawn(async move {
        loop {
            let msg = tokio::select! {
                received = events.recv() => match received {
                    Ok(event) => {
                        if !send_state.wants(client_id, &event).await {
                            continue;
                        }
                        ServerMessage::Event { event }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(client = %client_id, skipped, "WebSocket client lagging");
                        ServerMessage::Error {
                            message: format!("{} events dropped", skipped),
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                Some(msg) = internal_rx.recv() => msg,
                else => break,
            };

            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to encode WebSocket message");
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            let text = match msg {
                Message::Text(text) => text,
                Message::Close(_) => break,
                _ => continue,
            };

            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Subscribe { addresses }) => {
                    let watched = recv_state
                        .update_subscriptions(client_id, &addresses, &[])
                        .await;
                    tracing::debug!(client = %client_id, watched = watched.len(), "Subscribed");
                    ServerMessage::Subscribed { addresses: watched }
                }
                Ok(ClientMessage::Unsubscribe { addresses }) => {
                    recv_state
                        .update_subscriptions(client_id, &[], &addresses)
                        .await;
                    ServerMessage::Unsubscribed { addresses }
                }
                Ok(ClientMessage::Ping) => ServerMessage::Pong,
                Err(e) => ServerMessage::Error {
                    message: format!("Invalid message: {}", e),
                },
            };

            if internal_tx.send(reply).await.is_err() {
                break;
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.clients.write().await.remove(&client_id);
    tracing::info!(client = %client_id, "WebSocket client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{NewTransaction, TransactionStatus, TransactionType};
    use crate::storage::MemoryStorage;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_address_filter() {
        let ledger = Arc::new(TransactionStore::load(Arc::new(MemoryStorage::new())));
        let state = WsState::new(ledger.clone());
        let client = Uuid::new_v4();
        state.clients.write().await.insert(client, Vec::new());

        let mut send = NewTransaction::new(
            TransactionType::Send,
            Decimal::from(5),
            TransactionStatus::Pending,
        );
        send.from = Some("0xaaa".to_string());
        send.to = Some("0xbbb".to_string());
        let event = LedgerEvent::Appended {
            transaction: ledger.append(send).await.unwrap(),
        };

        assert!(state.wants(client, &event).await);

        let watched = state
            .update_subscriptions(client, &["0xccc".to_string()], &[])
            .await;
        assert_eq!(watched, vec!["0xccc".to_string()]);
        assert!(!state.wants(client, &event).await);

        state
            .update_subscriptions(client, &["0xbbb".to_string()], &["0xccc".to_string()])
            .await;
        assert!(state.wants(client, &event).await);
        assert!(!state.wants(Uuid::new_v4(), &event).await);
    }

    #[test]
    fn test_client_message_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"subscribe","addresses":["0xabc"]}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Subscribe { addresses } if addresses.len() == 1));

        let text = serde_json::to_string(&ServerMessage::Pong).unwrap();
        assert_eq!(text, r#"{"type":"pong"}"#);
    }
}
