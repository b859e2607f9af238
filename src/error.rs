use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid port {0:?}")]
    InvalidPort(String),
    #[error("database error: {0}")]
    Store(#[from] crate::db::StoreError),
    #[error("failed to get local IP address: {0}")]
    Origin(#[from] crate::origin::OriginError),
    #[error("failed to load TLS certificate or key: {0}")]
    Tls(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
