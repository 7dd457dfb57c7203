use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use crate::app_state::AppState;
use crate::auth::CurrentUser;
use crate::db::Notification;

/// A notification pushed to the recipient's open websocket connections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveEvent {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl From<&Notification> for LiveEvent {
    fn from(notification: &Notification) -> Self {
        Self {
            notification_id: notification.id,
            user_id: notification.user_id,
            title: notification.title.clone(),
            body: notification.body.clone(),
            data: notification.data.0.clone(),
        }
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    user: CurrentUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let rx = state.live_tx.subscribe();
    ws.on_upgrade(move |socket| handle_socket(socket, user.user_id, rx))
}

async fn handle_socket(socket: WebSocket, user_id: Uuid, mut rx: broadcast::Receiver<LiveEvent>) {
    let (mut sender, mut receiver) = socket.split();

    // Only the recipient's own events are forwarded.
    let mut send_task = tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%user_id, skipped, "live channel lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            if event.user_id != user_id {
                continue;
            }
            let Ok(payload) = serde_json::to_string(&event) else {
                continue;
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    // Inbound frames are ignored; the loop only watches for the close.
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    }
    tracing::debug!(%user_id, "websocket closed");
}
