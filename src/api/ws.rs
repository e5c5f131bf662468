use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tokio::{select, sync::broadcast::error::RecvError};

use crate::api::routes::AppState;
use crate::feed::PriceTick;

// Subscription action enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionAction {
    Subscribe,
    Unsubscribe,
}

// Subscription message from client
#[derive(Debug, Deserialize)]
struct SubscriptionMessage {
    action: SubscriptionAction,
    symbol: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Success,
    Error,
}

/// Messages sent to the client.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsMessage {
    Ack {
        status: SubscriptionStatus,
        message: String,
        symbol: Option<String>,
    },
    Price(PriceTick),
}

// WebSocket handler - accepts upgrade and streams price ticks
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn send_json(socket: &mut WebSocket, msg: &WsMessage) -> bool {
    match serde_json::to_string(msg) {
        Ok(json) => socket.send(Message::Text(json.into())).await.is_ok(),
        Err(_) => true,
    }
}

fn ack(status: SubscriptionStatus, message: String, symbol: Option<String>) -> WsMessage {
    WsMessage::Ack {
        status,
        message,
        symbol,
    }
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let mut ticks = state.market.subscribe();
    let mut subscribed_symbols: HashSet<String> = HashSet::new();

    loop {
        select! {
            result = ticks.recv() => {
                match result {
                    Ok(tick) => {
                        if subscribed_symbols.contains(&tick.symbol)
                            && !send_json(&mut socket, &WsMessage::Price(tick)).await
                        {
                            return;
                        }
                    }
                    // Slow client: drop the missed ticks and carry on.
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => return,
                }
            }
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<SubscriptionMessage>(&text) {
                            Ok(sub_msg) => {
                                let symbol = sub_msg.symbol.to_uppercase();
                                match sub_msg.action {
                                    SubscriptionAction::Subscribe if state.market.has_symbol(&symbol) => {
                                        subscribed_symbols.insert(symbol.clone());
                                        ack(SubscriptionStatus::Success, format!("Subscribed to {}", symbol), Some(symbol))
                                    }
                                    SubscriptionAction::Subscribe => {
                                        ack(SubscriptionStatus::Error, format!("Symbol '{}' not found", symbol), None)
                                    }
                                    SubscriptionAction::Unsubscribe => {
                                        subscribed_symbols.remove(&symbol);
                                        ack(SubscriptionStatus::Success, format!("Unsubscribed from {}", symbol), Some(symbol))
                                    }
                                }
                            }
                            Err(_) => ack(
                                SubscriptionStatus::Error,
                                "Invalid message format. Expected: {\"action\": \"subscribe\", \"symbol\": \"AAPL\"}".to_string(),
                                None,
                            ),
                        };
                        if !send_json(&mut socket, &reply).await {
                            return;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    _ => {}
                }
            }
        }
    }
}
