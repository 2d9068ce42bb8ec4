use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use wharfhook_core::{models::BuildState, AppError};
use wharfhook_registry::webhook::BuildPayload;

use crate::AppState;

/// Registry build notification. The reported state is encoded in the path;
/// a state outside the enumeration is rejected before any side effect.
pub async fn webhook(
    State(state): State<AppState>,
    Path(reported): Path<String>,
    Json(payload): Json<BuildPayload>,
) -> Result<Response, AppError> {
    let build_state = match BuildState::from_str(&reported) {
        Ok(build_state) => build_state,
        Err(err) => {
            tracing::warn!("Rejecting build notification: {err}");
            return Ok((StatusCode::BAD_REQUEST, "Unrecognized build state").into_response());
        }
    };
    tracing::info!("Received {} build notification for {}", build_state, payload.repository);

    let Some(event) = payload.into_event(build_state) else {
        return Ok((StatusCode::OK, "Ignoring manually triggered build").into_response());
    };
    state.handler.handle(&event).await?;
    Ok((StatusCode::OK, "Event processed").into_response())
}
