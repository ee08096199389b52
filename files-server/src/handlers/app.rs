use crate::api::{ErrorResponse, StatsResponse, StatusResponse};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use tracing::warn;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// GET /status
pub async fn get_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        redis: state.cache.is_alive(),
        db: state.db.is_alive(),
    })
}

/// GET /stats
pub async fn get_stats(State(state): State<AppState>) -> Result<Json<StatsResponse>, ApiError> {
    let (users, files) = tokio::try_join!(state.db.count_users(), state.db.count_files())
        .map_err(into_api_error)?;

    Ok(Json(StatsResponse { users, files }))
}

fn into_api_error(err: shared::Error) -> ApiError {
    warn!(error = %err, "stats unavailable");
    let status = match err {
        shared::Error::NotConnected(_) | shared::Error::Connection(_) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
