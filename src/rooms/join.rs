use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};

use crate::{db::SqliteRoomStore, AppError, AppResult, GetField};

#[debug_handler(state = crate::AppState)]
pub(crate) async fn join_room(
    State(store): State<SqliteRoomStore>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let room_code = body.get_str_field("roomCode").map(str::trim).unwrap_or_default();
    if room_code.is_empty() {
        return Err(AppError::bad_request("Room code is required"));
    }

    let Some(room) = store.find_room(room_code).await? else {
        return Err(AppError::bad_request("Room not found"));
    };

    Ok(Json(json!({
        "message": "success",
        "room": {
            "name": room.room_name,
            "code": room.room_code,
            "type": room.room_type,
            "files": room.files,
        },
    })))
}
