//! HTTP error mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::error;
use serde_json::json;
use std::error::Error;
use std::fmt::{Display, Formatter};
use taskpulse_core::{ConfigError, RepoError, ServiceError, TaskValidationError};

/// Failure returned by a route handler as `(status, {"error": message})`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(value: ServiceError) -> Self {
        match value {
            ServiceError::NotFound(id) => {
                Self::new(StatusCode::NOT_FOUND, format!("task not found: {id}"))
            }
            ServiceError::Validation(err) => err.into(),
            ServiceError::Repo(err) => err.into(),
        }
    }
}

impl From<TaskValidationError> for ApiError {
    fn from(value: TaskValidationError) -> Self {
        Self::bad_request(value.to_string())
    }
}

impl From<RepoError> for ApiError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => err.into(),
            other => {
                error!("event=http_request module=server status=error error={other}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "storage unavailable")
            }
        }
    }
}

/// Startup failure of [`crate::run_server`].
#[derive(Debug)]
pub enum ServerError {
    Config(ConfigError),
    Repo(RepoError),
    Io(std::io::Error),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "failed to open task storage: {err}"),
            Self::Io(err) => write!(f, "server I/O error: {err}"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<RepoError> for ServerError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}
