use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    pub username: Option<String>,
    pub room_code: Option<String>,
}

// Playback fields are relayed as sent. Players report `null` before
// their media metadata has loaded.

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStateResponse {
    pub requesting_socket_id: Option<ConnectionId>,
    #[serde(default)]
    pub current_time: Value,
    #[serde(default)]
    pub is_playing: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerControl {
    #[serde(default)]
    pub message: Value,
    #[serde(default)]
    pub current_time: Value,
    #[serde(default)]
    pub is_playing: Value,
}

/// Everything a client may send over its socket, `{"event": .., "data": ..}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    NewUserJoined(JoinRequest),
    VideoStateResponse(VideoStateResponse),
    PlayerControl(PlayerControl),
    SendMessage(Option<Value>),
    SendEmoji(Option<Value>),
    LeaveRoom,
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewUserJoined(_) => "new-user-joined",
            Self::VideoStateResponse(_) => "video-state-response",
            Self::PlayerControl(_) => "player-control",
            Self::SendMessage(_) => "send-message",
            Self::SendEmoji(_) => "send-emoji",
            Self::LeaveRoom => "leave-room",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Connected { socket_id: ConnectionId },
    #[serde(rename_all = "camelCase")]
    UserJoined {
        username: String,
        members: usize,
        members_list: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    UserLeft {
        username: String,
        members: usize,
        members_list: Vec<String>,
    },
    #[serde(rename_all = "camelCase")]
    RequestVideoState { requesting_socket_id: ConnectionId },
    #[serde(rename_all = "camelCase")]
    SyncVideoState { current_time: Value, is_playing: Value },
    #[serde(rename_all = "camelCase")]
    PlayerUpdate {
        username: String,
        message: Value,
        current_time: Value,
        is_playing: Value,
    },
    NewMessage { username: String, message: Value },
    NewEmoji { username: String, emoji: Value },
}
