//! Operator admin API: the human half of the propose/apply split.
//!
//! ⚠️ SECURITY: this router applies changes without further checks. It must
//! only ever be bound to a loopback address; `ToolboxConfig::validate`
//! rejects anything else.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use confgate_common::{ApplyFailure, ApplyRequest, ApplyResponse, ChangeSummary};

use crate::application::ports::{ChangeStore, RemoteExecutor};
use crate::application::services::staged_changes::{ChangeManager, apply_response};
use crate::domain::{ActivationParams, validate_name};

pub struct AdminState<E, S> {
    changes: Arc<ChangeManager<E, S>>,
    default_container: Arc<str>,
}

// Derived `Clone` would require `E: Clone` and `S: Clone`.
impl<E, S> Clone for AdminState<E, S> {
    fn clone(&self) -> Self {
        Self {
            changes: Arc::clone(&self.changes),
            default_container: Arc::clone(&self.default_container),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Admin routes over `changes`. `default_container` is used when an apply
/// request does not name one.
pub fn router<E, S>(changes: Arc<ChangeManager<E, S>>, default_container: &str) -> Router
where
    E: RemoteExecutor + 'static,
    S: ChangeStore + 'static,
{
    Router::new()
        .route("/health", get(health))
        .route("/changes", get(list_changes::<E, S>))
        .route("/changes/{id}/apply", post(apply_change::<E, S>))
        .with_state(AdminState {
            changes,
            default_container: Arc::from(default_container),
        })
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn list_changes<E, S>(State(state): State<AdminState<E, S>>) -> Json<Vec<ChangeSummary>>
where
    E: RemoteExecutor + 'static,
    S: ChangeStore + 'static,
{
    Json(state.changes.pending())
}

async fn apply_change<E, S>(
    State(state): State<AdminState<E, S>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response
where
    E: RemoteExecutor + 'static,
    S: ChangeStore + 'static,
{
    // An empty body means "use the default container".
    let request: ApplyRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ApplyRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => return bad_request(format!("invalid request body: {e}")),
        }
    };

    let container = request
        .container
        .unwrap_or_else(|| state.default_container.to_string());
    if let Err(e) = validate_name("container", &container) {
        return bad_request(e.to_string());
    }

    tracing::info!(change_id = %id, %container, "operator apply requested");
    let activation = ActivationParams::for_container(&container);
    let outcome = state.changes.apply(&id, &activation).await;
    let response = apply_response(&id, &outcome);
    (status_for(&response), Json(response)).into_response()
}

/// HTTP status for an apply outcome.
#[must_use]
pub fn status_for(response: &ApplyResponse) -> StatusCode {
    match response {
        ApplyResponse::Applied { .. } => StatusCode::OK,
        ApplyResponse::Failed { reason, .. } => match reason {
            ApplyFailure::NotFound => StatusCode::NOT_FOUND,
            ApplyFailure::UnsupportedKind => StatusCode::UNPROCESSABLE_ENTITY,
            ApplyFailure::CommitFailed
            | ApplyFailure::ValidateFailed
            | ApplyFailure::ActivateFailed => StatusCode::BAD_GATEWAY,
        },
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorBody { error })).into_response()
}
