use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use serde::Deserialize;
use tracing::{info, warn};

use crate::application::errors::AppError;
use crate::application::state::AppState;
use crate::domain::covers::{CoverSearchAttempt, CoverUrls, FileType};
use crate::infrastructure::google_images::GoogleSearchError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverSearchBody {
    #[serde(default)]
    query: String,
    file_type: Option<String>,
}

impl CoverSearchBody {
    fn into_attempt(self) -> Result<CoverSearchAttempt, AppError> {
        let query = self.query.trim().to_string();
        if query.is_empty() {
            return Err(AppError::validation("query is required"));
        }

        let file_type = match self.file_type.as_deref() {
            None => FileType::Jpg,
            Some(raw) => raw.parse::<FileType>().map_err(AppError::Validation)?,
        };

        Ok(CoverSearchAttempt { query, file_type })
    }
}

/// Proxy a single image search to Google, keeping the API key server side.
#[tracing::instrument(skip(state, payload))]
pub(crate) async fn search_cover(
    State(state): State<AppState>,
    payload: Result<Json<CoverSearchBody>, JsonRejection>,
) -> Result<Json<CoverUrls>, AppError> {
    let Json(body) = payload.map_err(|err| AppError::validation(err.body_text()))?;
    let attempt = body.into_attempt()?;

    if !state.image_search.is_configured() {
        return Err(AppError::unexpected("image search is not configured"));
    }

    match state.image_search.search_images(&attempt).await {
        Ok(urls) => {
            info!(
                query = %attempt.query,
                file_type = %attempt.file_type,
                found = urls.has_cover(),
                "cover search complete"
            );
            Ok(Json(urls))
        }
        Err(GoogleSearchError::QuotaExceeded { message, details }) => {
            warn!(query = %attempt.query, "Google image search quota exceeded");
            Err(AppError::QuotaExceeded { message, details })
        }
        Err(err) => Err(AppError::unexpected(err.to_string())),
    }
}
