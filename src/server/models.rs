use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::DictionaryError;

pub(crate) const MAX_PARAM_LENGTH: usize = 255;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub(crate) struct PhraseQuery {
    pub(crate) phrase: Option<String>,
    pub(crate) page: Option<usize>,
    /// Accepted for compatibility; fuzzy search always uses the configured size.
    #[allow(dead_code)]
    pub(crate) size: Option<usize>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct EntryIdQuery {
    pub(crate) entry_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ParamErrors {
    pub(crate) errors: Vec<String>,
}

#[derive(Debug)]
pub(crate) enum ServerError {
    /// Request parameters failed validation; answered with every message.
    Params(Vec<String>),
    Failure { status: StatusCode, message: String },
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        ServerError::Failure {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        ServerError::Failure {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        ServerError::Failure {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<DictionaryError> for ServerError {
    fn from(err: DictionaryError) -> Self {
        let status = match &err {
            DictionaryError::Validation(_) => StatusCode::BAD_REQUEST,
            DictionaryError::Authorization(_) => StatusCode::FORBIDDEN,
            DictionaryError::EntryNotFound(_) => StatusCode::NOT_FOUND,
            DictionaryError::IndexNotFound(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DictionaryError::Collaborator { .. } => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!("request failed: {}", err);
        } else {
            warn!("request rejected: {}", err);
        }
        ServerError::Failure {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Params(errors) => {
                (StatusCode::BAD_REQUEST, Json(ParamErrors { errors })).into_response()
            }
            ServerError::Failure { status, message } => {
                (status, Json(ErrorResponse { error: message })).into_response()
            }
        }
    }
}

/// Trimmed value of a required request parameter.
pub(crate) fn required_param(name: &str, value: Option<&str>) -> Result<String, ServerError> {
    let value = value.map(str::trim).unwrap_or_default();
    let mut errors = Vec::new();
    if value.is_empty() {
        errors.push(format!("{}: must not be empty", name));
    }
    if value.chars().count() > MAX_PARAM_LENGTH {
        errors.push(format!(
            "{}: size must be between 1 and {}",
            name, MAX_PARAM_LENGTH
        ));
    }
    if errors.is_empty() {
        Ok(value.to_string())
    } else {
        Err(ServerError::Params(errors))
    }
}
