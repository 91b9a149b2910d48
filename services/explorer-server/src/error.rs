//! Server errors and their HTTP mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use labels::LabelError;
use renderer::RenderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("labels are not enabled for this folder")]
    LabelsDisabled,

    #[error(transparent)]
    Label(#[from] LabelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to open scene folder: {0}")]
    Startup(String),
}

impl ServerError {
    fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::LabelsDisabled => StatusCode::NOT_FOUND,
            Self::Label(LabelError::UnknownGroup(_)) => StatusCode::NOT_FOUND,
            Self::Label(LabelError::InvalidValue { .. } | LabelError::PosOutOfRange { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Render(RenderError::ColorMapLoad { .. } | RenderError::ColorMapNotLoaded(_)) => {
                StatusCode::NOT_FOUND
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
