mod create;
mod join;

use axum::{routing::post, Router};

use crate::AppState;

pub use create::validate_new_room;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/create", post(create::create_room))
        .route("/join", post(join::join_room))
}
