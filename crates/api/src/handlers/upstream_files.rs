use axum::{extract::State, http::StatusCode, response::Json};
use sluice_dns_domain::DomainError;
use tracing::{debug, error, info};

use crate::{
    dto::{
        AddUrlRequest, ErrorResponse, RefreshResponse, RemoveUrlRequest, SetUrlRequest,
        UpstreamFilesStatusResponse,
    },
    state::AppState,
};

/// HTTP status for a failed managed-file operation.
fn error_status(err: &DomainError) -> StatusCode {
    match err.root_cause() {
        DomainError::InvalidUrl(_)
        | DomainError::InvalidName(_)
        | DomainError::InvalidContent(_)
        | DomainError::InvalidUpstream(_) => StatusCode::BAD_REQUEST,
        DomainError::ManagedFileExists(_) => StatusCode::CONFLICT,
        DomainError::ManagedFileNotFound(_) => StatusCode::NOT_FOUND,
        DomainError::Network(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn failure(context: &str, err: DomainError) -> (StatusCode, String) {
    let status = error_status(&err);
    if status.is_server_error() {
        error!(error = %err, "{}", context);
    } else {
        debug!(error = %err, "{}", context);
    }
    (status, err.to_string())
}

pub async fn get_status(State(state): State<AppState>) -> Json<UpstreamFilesStatusResponse> {
    let snapshot = state.get_files.execute().await;
    debug!(count = snapshot.files.len(), "Upstream DNS files retrieved");
    Json(snapshot.into())
}

pub async fn add_url(
    State(state): State<AppState>,
    Json(req): Json<AddUrlRequest>,
) -> Result<String, (StatusCode, String)> {
    match state.add_file.execute(&req.name, &req.url).await {
        Ok(file) => {
            info!(url = %file.url, rules = file.rules_count, "Upstream DNS file added");
            Ok(format!("OK {} rules\n", file.rules_count))
        }
        Err(e) => Err(failure("Failed to add upstream DNS file", e)),
    }
}

pub async fn remove_url(
    State(state): State<AppState>,
    Json(req): Json<RemoveUrlRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match state.remove_file.execute(&req.url).await {
        Ok(file) => {
            info!(url = %file.url, "Upstream DNS file removed");
            Ok(StatusCode::OK)
        }
        Err(e) => Err(failure("Failed to remove upstream DNS file", e)),
    }
}

pub async fn set_url(
    State(state): State<AppState>,
    Json(req): Json<SetUrlRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    match state
        .set_file_properties
        .execute(&req.url, req.data.into())
        .await
    {
        Ok(file) => {
            info!(url = %file.url, enabled = file.enabled, "Upstream DNS file updated");
            Ok(StatusCode::OK)
        }
        Err(e) => Err(failure("Failed to update upstream DNS file", e)),
    }
}

pub async fn refresh(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.refresh_files.execute(true).await {
        Ok(Some(outcome)) => Ok(Json(RefreshResponse {
            updated: outcome.updated,
        })),
        Ok(None) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                message: DomainError::RefreshInProgress.to_string(),
            }),
        )),
        Err(e) => {
            let (status, message) = failure("Failed to refresh upstream DNS files", e);
            Err((status, Json(ErrorResponse { message })))
        }
    }
}
