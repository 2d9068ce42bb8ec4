use axum::{routing::post, Router};

use crate::AppState;

mod webhook;

pub fn build_router() -> Router<AppState> {
    Router::new().route("/webhook/{state}", post(webhook::webhook))
}
