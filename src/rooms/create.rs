use axum::{debug_handler, extract::State, Json};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    db::{RoomFile, RoomRecord, RoomType, SqliteRoomStore},
    AppError, AppResult, GetField,
};

const MISSING_FIELDS: &str = "Please fill all missing fields";

#[debug_handler(state = crate::AppState)]
pub(crate) async fn create_room(
    State(store): State<SqliteRoomStore>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let room = validate_new_room(&body)?;

    if !store.create_room(&room).await? {
        return Err(AppError::bad_request("Room code already exists"));
    }
    info!(room_code = %room.room_code, room_type = %room.room_type, "created room");

    Ok(Json(json!({ "message": "success", "roomCode": room.room_code })))
}

fn non_blank(file: &Value, field: &str) -> Option<String> {
    file.get_str_field(field)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_owned)
}

/// Checks a create request and normalises it into a record. The first
/// failing rule is reported.
pub fn validate_new_room(body: &Value) -> AppResult<RoomRecord> {
    let room_name = body
        .get_str_field("roomName")
        .ok_or_else(|| AppError::bad_request("roomName must be a string"))?
        .trim();
    if room_name.is_empty() {
        return Err(AppError::bad_request("Room name is required"));
    }

    let room_code: String = body
        .get_str_field("roomCode")
        .ok_or_else(|| AppError::bad_request("Room code must be a string"))?
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if room_code.is_empty() {
        return Err(AppError::bad_request("Room code is required"));
    }

    let room_type = body
        .get_str_field("roomType")
        .and_then(|t| t.parse::<RoomType>().ok())
        .ok_or_else(|| AppError::bad_request(r#"Room type must be either "online" or "offline""#))?;

    let files = body
        .get_array_field("files")
        .ok_or_else(|| AppError::bad_request("Files must be an array"))?;
    if !files.iter().any(|f| f.get_str_field("type") == Some("video")) {
        return Err(AppError::bad_request("At least one video file is required"));
    }

    let files = match room_type {
        RoomType::Online => files
            .iter()
            .map(|file| match file.get_str_field("type") {
                Some("video") => Some(RoomFile::Video {
                    url: Some(non_blank(file, "url")?),
                    length: None,
                }),
                Some("caption") => Some(RoomFile::Caption {
                    label: non_blank(file, "label")?,
                    url: non_blank(file, "url")?,
                }),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))?,
        RoomType::Offline => {
            if files.len() > 1 {
                return Err(AppError::bad_request("Only one video file is allowed for offline rooms"));
            }
            let length = files[0]
                .get("length")
                .and_then(Value::as_u64)
                .filter(|len| *len > 0)
                .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))?;
            vec![RoomFile::Video { url: None, length: Some(length) }]
        }
    };

    Ok(RoomRecord {
        room_code,
        room_name: room_name.to_owned(),
        room_type,
        files,
    })
}
