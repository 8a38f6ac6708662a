use std::{fmt, future::Future, str::FromStr};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomType {
    Online,
    Offline,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        use RoomType::*;
        match self {
            Online => "online",
            Offline => "offline",
        }
    }
}

impl FromStr for RoomType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(Self::Online),
            "offline" => Ok(Self::Offline),
            _ => Err(anyhow!("unknown room type {s:?}")),
        }
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A video is either streamed from `url` (online) or played from each
/// viewer's local copy of known `length` (offline).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RoomFile {
    Video {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u64>,
    },
    Caption { label: String, url: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomRecord {
    pub room_code: String,
    pub room_name: String,
    pub room_type: RoomType,
    pub files: Vec<RoomFile>,
}

/// What the sync engine needs from durable room storage.
pub trait RoomStore: Send + Sync + 'static {
    fn room_exists(&self, code: &str) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Deleting a code that is already gone is not an error.
    fn delete_room(&self, code: &str) -> impl Future<Output = anyhow::Result<()>> + Send;
}

#[derive(Clone)]
pub struct SqliteRoomStore {
    db_pool: SqlitePool,
}

impl SqliteRoomStore {
    pub fn new(db_pool: SqlitePool) -> Self {
        Self { db_pool }
    }

    pub async fn migrate(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS rooms (
                room_code TEXT PRIMARY KEY NOT NULL,
                room_name TEXT NOT NULL,
                room_type TEXT NOT NULL,
                files TEXT NOT NULL
            )",
        )
        .execute(&self.db_pool)
        .await?;
        Ok(())
    }

    /// Returns false if the room code is taken.
    pub async fn create_room(&self, room: &RoomRecord) -> anyhow::Result<bool> {
        let result = sqlx::query("INSERT OR IGNORE INTO rooms (room_code,room_name,room_type,files) VALUES (?,?,?,?)")
            .bind(&room.room_code)
            .bind(&room.room_name)
            .bind(room.room_type.as_str())
            .bind(serde_json::to_string(&room.files)?)
            .execute(&self.db_pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn find_room(&self, code: &str) -> anyhow::Result<Option<RoomRecord>> {
        let Some((room_code, room_name, room_type, files)): Option<(String, String, String, String)> =
            sqlx::query_as("SELECT room_code,room_name,room_type,files FROM rooms WHERE room_code=?")
                .bind(code)
                .fetch_optional(&self.db_pool)
                .await?
        else {
            return Ok(None);
        };

        Ok(Some(RoomRecord {
            room_code,
            room_name,
            room_type: room_type.parse()?,
            files: serde_json::from_str(&files)?,
        }))
    }
}

impl RoomStore for SqliteRoomStore {
    async fn room_exists(&self, code: &str) -> anyhow::Result<bool> {
        let found: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM rooms WHERE room_code=?")
            .bind(code)
            .fetch_optional(&self.db_pool)
            .await?;
        Ok(found.is_some())
    }

    async fn delete_room(&self, code: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM rooms WHERE room_code=?")
            .bind(code)
            .execute(&self.db_pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use serde_json::json;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;

    pub(crate) async fn memory_store() -> SqliteRoomStore {
        let db_pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteRoomStore::new(db_pool);
        store.migrate().await.unwrap();
        store
    }

    fn online_room(code: &str) -> RoomRecord {
        RoomRecord {
            room_code: code.into(),
            room_name: "Movie night".into(),
            room_type: RoomType::Online,
            files: vec![
                RoomFile::Video { url: Some("https://example.com/a.mp4".into()), length: None },
                RoomFile::Caption { label: "English".into(), url: "https://example.com/a.vtt".into() },
            ],
        }
    }

    #[tokio::test]
    async fn create_find_delete() {
        let store = memory_store().await;
        let room = online_room("R1");

        assert!(!store.room_exists("R1").await.unwrap());
        assert!(store.create_room(&room).await.unwrap());
        assert!(store.room_exists("R1").await.unwrap());
        assert_eq!(store.find_room("R1").await.unwrap(), Some(room));

        store.delete_room("R1").await.unwrap();
        assert!(!store.room_exists("R1").await.unwrap());
        assert_eq!(store.find_room("R1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_code_is_rejected() {
        let store = memory_store().await;
        assert!(store.create_room(&online_room("R1")).await.unwrap());

        let mut other = online_room("R1");
        other.room_name = "Other".into();
        assert!(!store.create_room(&other).await.unwrap());
        assert_eq!(store.find_room("R1").await.unwrap().unwrap().room_name, "Movie night");
    }

    #[tokio::test]
    async fn deleting_absent_room_is_ok() {
        let store = memory_store().await;
        store.delete_room("ghost").await.unwrap();
        store.delete_room("ghost").await.unwrap();
    }

    #[test]
    fn file_wire_shape() {
        let offline = RoomFile::Video { url: None, length: Some(5400) };
        assert_eq!(serde_json::to_value(&offline).unwrap(), json!({ "type": "video", "length": 5400 }));

        let caption: RoomFile =
            serde_json::from_value(json!({ "type": "caption", "label": "FR", "url": "c.vtt" })).unwrap();
        assert_eq!(caption, RoomFile::Caption { label: "FR".into(), url: "c.vtt".into() });
    }
}
