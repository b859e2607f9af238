use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::db::StoreError;
use crate::origin::OriginError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Failed to parse clip")]
    BadRequest(#[source] serde_json::Error),
    #[error("Invalid request method")]
    MethodNotAllowed,
    #[error("Forbidden")]
    Forbidden,
    #[error("Clip with id {0:?} already exists")]
    DuplicateKey(String),
    #[error("Storage unavailable")]
    StorageUnavailable(#[source] StoreError),
    #[error("Failed to get local IP address")]
    NoLocalAddress(#[source] OriginError),
    #[error("Failed to get client IP address")]
    InvalidPeer(#[source] OriginError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::DuplicateKey(_) => StatusCode::CONFLICT,
            Self::StorageUnavailable(_)
            | Self::NoLocalAddress(_)
            | Self::InvalidPeer(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(id) => Self::DuplicateKey(id),
            other => Self::StorageUnavailable(other),
        }
    }
}

impl From<OriginError> for ApiError {
    fn from(err: OriginError) -> Self {
        match err {
            OriginError::InvalidPeer(_) => Self::InvalidPeer(err),
            OriginError::NoLocalAddress | OriginError::Interfaces(_) => Self::NoLocalAddress(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(source) => error!(%status, "{self}: {source}"),
                None => error!(%status, "{self}"),
            }
        } else {
            warn!(%status, "{self}");
        }
        (status, self.to_string()).into_response()
    }
}
