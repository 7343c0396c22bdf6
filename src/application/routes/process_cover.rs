use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::application::auth::BearerToken;
use crate::application::errors::AppError;
use crate::application::state::AppState;
use crate::domain::processed_covers::ProcessedCover;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessCoverRequest {
    pub cover_url: String,
    pub book_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessCoverResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<ProcessedCover>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessCoverResponse {
    fn success(cover: ProcessedCover) -> Response {
        Json(Self {
            success: true,
            cover: Some(cover),
            error: None,
        })
        .into_response()
    }

    fn failure(status: StatusCode, error: impl Into<String>) -> Response {
        let body = Self {
            success: false,
            cover: None,
            error: Some(error.into()),
        };
        (status, Json(body)).into_response()
    }
}

#[tracing::instrument(skip(state, token, payload))]
pub(crate) async fn process_cover(
    State(state): State<AppState>,
    token: Result<BearerToken, AppError>,
    payload: Result<Json<ProcessCoverRequest>, JsonRejection>,
) -> Response {
    if let Err(err) = token {
        return ProcessCoverResponse::failure(err.status(), err.to_string());
    }

    let request = match payload {
        Ok(Json(request)) => request,
        Err(err) => return ProcessCoverResponse::failure(StatusCode::BAD_REQUEST, err.body_text()),
    };

    let cover_url = request.cover_url.trim();
    let book_id = request.book_id.trim();
    if cover_url.is_empty() || book_id.is_empty() {
        return ProcessCoverResponse::failure(
            StatusCode::BAD_REQUEST,
            "coverUrl and bookId are required",
        );
    }
    if book_id.contains('/') {
        return ProcessCoverResponse::failure(StatusCode::BAD_REQUEST, "invalid bookId");
    }

    match state.cover_processor.process(cover_url, book_id).await {
        Ok(cover) => ProcessCoverResponse::success(cover),
        Err(err) => {
            warn!(book_id, cover_url, error = %err, "cover processing failed");
            let status = if err.is_client_error() {
                StatusCode::BAD_REQUEST
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            ProcessCoverResponse::failure(status, err.to_string())
        }
    }
}
