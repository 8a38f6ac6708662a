use std::sync::Arc;

use axum::{
    debug_handler,
    extract::{
        State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::warn;

use crate::db::RoomStore;

use super::{ClientEvent, SyncHub};

#[debug_handler(state = crate::AppState)]
pub async fn sync_ws(
    State(hub): State<Arc<SyncHub<crate::db::SqliteRoomStore>>>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(async move |socket| serve(socket, hub).await)
}

/// Runs one connection until its socket closes.
pub async fn serve<S: RoomStore>(socket: WebSocket, hub: Arc<SyncHub<S>>) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = hub.connect(tx);

    let outbound_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(err) => {
                    warn!(%id, "failed to encode outbound event: {err}");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => hub.handle(id, event).await,
            Err(err) => warn!(%id, "undecodable frame: {err}"),
        }
    }

    hub.disconnect(id).await;
    outbound_task.abort();
}
