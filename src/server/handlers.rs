use axum::Json;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use super::AppState;
use crate::extract::Upload;

const PROMPT_FIELD: &str = "user_prompt";
const FILES_FIELD: &str = "files";

/// Body of `POST /refine-prompt`.
///
/// A draft-stage failure is still a 200 carrying `error`, so clients read
/// one of the two keys without checking the status.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum RefineResponse {
    Refined { refined_prompt: String },
    Failed { error: String },
}

/// Client errors for malformed requests
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing required form field: {0}")]
    MissingField(&'static str),

    #[error("Invalid multipart body: {message}")]
    Multipart { status: StatusCode, message: String },
}

impl ApiError {
    /// Oversized bodies keep their 413; every other malformed form is a 422
    fn multipart(status: StatusCode, message: String) -> Self {
        let status = if status == StatusCode::PAYLOAD_TOO_LARGE {
            status
        } else {
            StatusCode::UNPROCESSABLE_ENTITY
        };
        Self::Multipart { status, message }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingField(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Multipart { status, .. } => *status,
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::multipart(e.status(), e.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(e: MultipartRejection) -> Self {
        Self::multipart(e.status(), e.body_text())
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        debug!("Rejecting request: {}", self);
        (
            self.status(),
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

/// Parsed form fields
#[derive(Debug)]
pub struct RefineForm {
    pub user_prompt: String,
    pub uploads: Vec<Upload>,
}

impl RefineForm {
    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut user_prompt = None;
        let mut uploads = Vec::new();

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                PROMPT_FIELD => {
                    user_prompt = Some(field.text().await?);
                }
                FILES_FIELD => {
                    let filename = field.file_name().unwrap_or_default().to_string();
                    let content_type = field.content_type().unwrap_or_default().to_string();
                    let bytes = field.bytes().await?;

                    // Browsers send an empty, nameless part when no file is chosen
                    if filename.is_empty() && bytes.is_empty() {
                        continue;
                    }
                    uploads.push(Upload::new(filename, content_type, bytes.to_vec()));
                }
                other => debug!("Ignoring form field '{}'", other),
            }
        }

        let user_prompt = user_prompt.ok_or(ApiError::MissingField(PROMPT_FIELD))?;
        Ok(Self {
            user_prompt,
            uploads,
        })
    }
}

/// `POST /refine-prompt`
pub async fn refine_prompt(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<RefineResponse>, ApiError> {
    let multipart = multipart?;
    let form = RefineForm::from_multipart(multipart).await?;

    let request_id = Uuid::new_v4();
    let span = info_span!("refine_prompt", %request_id);

    async move {
        info!(
            files = form.uploads.len(),
            prompt_chars = form.user_prompt.chars().count(),
            "Starting refinement"
        );

        let response = match state.pipeline.run(&form.user_prompt, form.uploads).await {
            Ok(outcome) => RefineResponse::Refined {
                refined_prompt: outcome.refined_prompt,
            },
            Err(e) => {
                error!("Draft stage failed: {}", e);
                RefineResponse::Failed {
                    error: format!("Gemini Error: {}", e),
                }
            }
        };

        Ok(Json(response))
    }
    .instrument(span)
    .await
}
