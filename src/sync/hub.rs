//! Join/leave lifecycle and playback state hand-off.
//!
//! Every inbound event for a connection goes through [`SyncHub::handle`].
//! Precondition violations and lookup misses are dropped without a reply;
//! store failures are logged and never reach a client.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::db::RoomStore;

use super::{
    event::{ClientEvent, ConnectionId, JoinRequest, PlayerControl, ServerEvent, VideoStateResponse},
    registry::{Outbox, Registry},
    relay::Relay,
};

pub struct SyncHub<S> {
    registry: Arc<Registry>,
    relay: Relay,
    store: S,
}

impl<S: RoomStore> SyncHub<S> {
    pub fn new(store: S) -> Self {
        let registry = Arc::new(Registry::new());
        Self {
            relay: Relay::new(registry.clone()),
            registry,
            store,
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Registers a new anonymous connection and greets it with its id.
    pub fn connect(&self, outbox: Outbox) -> ConnectionId {
        let id = ConnectionId::new();
        self.registry.connect(id, outbox);
        self.relay.unicast(id, ServerEvent::Connected { socket_id: id });
        debug!(%id, "connection opened");
        id
    }

    pub async fn handle(&self, id: ConnectionId, event: ClientEvent) {
        debug!(%id, event = event.name(), "inbound");
        match event {
            ClientEvent::NewUserJoined(req) => self.join(id, req).await,
            ClientEvent::VideoStateResponse(resp) => self.video_state_response(id, resp),
            ClientEvent::PlayerControl(ctl) => self.player_control(id, ctl),
            ClientEvent::SendMessage(message) => self.send_message(id, message),
            ClientEvent::SendEmoji(emoji) => self.send_emoji(id, emoji),
            ClientEvent::LeaveRoom => self.leave(id).await,
        }
    }

    pub async fn join(&self, id: ConnectionId, JoinRequest { username, room_code }: JoinRequest) {
        let (Some(username), Some(room_code)) = (
            username.filter(|u| !u.is_empty()),
            room_code.filter(|r| !r.is_empty()),
        ) else {
            debug!(%id, "join without username or room code");
            return;
        };

        if !self.registry.begin_join(id) {
            debug!(%id, "join from a connection that is not anonymous");
            return;
        }

        match self.store.room_exists(&room_code).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(%id, %room_code, "join for unknown room");
                self.registry.abort_join(id);
                return;
            }
            Err(err) => {
                warn!(%id, %room_code, "room lookup failed: {err:#}");
                self.registry.abort_join(id);
                return;
            }
        }

        // the connection may have closed while the store was queried
        if let Err(err) = self.registry.bind(id, &username, &room_code) {
            debug!(%id, "join abandoned: {err}");
            return;
        }

        let roster = self.registry.roster(&room_code);
        info!(%id, %username, %room_code, members = roster.count(), "user joined");

        self.relay.broadcast_to_all(&room_code, ServerEvent::UserJoined {
            username,
            members: roster.count(),
            members_list: roster.usernames(),
        });

        if roster.count() > 1 {
            if let Some(responder) = roster.first_other(id) {
                self.relay.unicast(responder, ServerEvent::RequestVideoState {
                    requesting_socket_id: id,
                });
            }
        }
    }

    pub fn video_state_response(&self, id: ConnectionId, resp: VideoStateResponse) {
        if self.registry.lookup(id).is_none() {
            return;
        }
        let Some(requester) = resp.requesting_socket_id else {
            return;
        };

        self.relay.unicast(requester, ServerEvent::SyncVideoState {
            current_time: resp.current_time,
            is_playing: resp.is_playing,
        });
    }

    pub fn player_control(&self, id: ConnectionId, ctl: PlayerControl) {
        let Some((username, room_code)) = self.registry.lookup(id) else {
            return;
        };

        self.relay.broadcast_to_others(&room_code, id, ServerEvent::PlayerUpdate {
            username,
            message: ctl.message,
            current_time: ctl.current_time,
            is_playing: ctl.is_playing,
        });
    }

    pub fn send_message(&self, id: ConnectionId, message: Option<Value>) {
        let Some(message) = message.filter(is_truthy) else {
            return;
        };
        let Some((username, room_code)) = self.registry.lookup(id) else {
            return;
        };

        self.relay.broadcast_to_others(&room_code, id, ServerEvent::NewMessage { username, message });
    }

    pub fn send_emoji(&self, id: ConnectionId, emoji: Option<Value>) {
        let Some(emoji) = emoji.filter(is_truthy) else {
            return;
        };
        let Some((username, room_code)) = self.registry.lookup(id) else {
            return;
        };

        self.relay.broadcast_to_all(&room_code, ServerEvent::NewEmoji { username, emoji });
    }

    pub async fn leave(&self, id: ConnectionId) {
        if let Some((username, room_code)) = self.registry.unbind(id) {
            self.departed(username, room_code).await;
        }
    }

    /// Transport closed. Same as leaving, then the connection is forgotten.
    pub async fn disconnect(&self, id: ConnectionId) {
        debug!(%id, "connection closed");
        if let Some((username, room_code)) = self.registry.remove(id) {
            self.departed(username, room_code).await;
        }
    }

    async fn departed(&self, username: String, room_code: String) {
        let roster = self.registry.roster(&room_code);
        info!(%username, %room_code, members = roster.count(), "user left");

        if roster.is_empty() {
            match self.store.delete_room(&room_code).await {
                Ok(()) => info!(%room_code, "deleted empty room"),
                Err(err) => warn!(%room_code, "failed to delete empty room: {err:#}"),
            }
            return;
        }

        self.relay.broadcast_to_all(&room_code, ServerEvent::UserLeft {
            username,
            members: roster.count(),
            members_list: roster.usernames(),
        });
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
