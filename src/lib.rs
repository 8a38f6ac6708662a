pub mod appresult;
pub mod config;
pub mod db;
pub mod rooms;
pub mod sync;

use std::sync::Arc;

use axum::{extract::FromRef, http::StatusCode, response::IntoResponse, routing::get, Router};
use serde_json::Value;

pub use appresult::{AppError, AppResult};
use db::SqliteRoomStore;
use sync::SyncHub;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: SqliteRoomStore,
    pub hub: Arc<SyncHub<SqliteRoomStore>>,
}

impl AppState {
    pub fn new(store: SqliteRoomStore) -> Self {
        Self {
            hub: Arc::new(SyncHub::new(store.clone())),
            store,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/room", rooms::router())
        .route("/ws", get(sync::ws::sync_ws))
        .fallback(not_found)
        .with_state(state)
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "404 Not Found")
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> Option<&str>;
    fn get_array_field(&self, field: &str) -> Option<&Vec<Value>>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> Option<&str> {
        self.get(field)?.as_str()
    }

    fn get_array_field(&self, field: &str) -> Option<&Vec<Value>> {
        self.get(field)?.as_array()
    }
}
