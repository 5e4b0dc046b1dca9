use crate::core::types::ConnectionState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("DNS resolution failed for {host}: {message}")]
    DnsError { host: String, message: String },

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Protocol error: {status} {reason}")]
    ProtocolError { status: u16, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(#[from] crate::core::config::ConfigError),

    #[error("Stream already started (state: {0})")]
    AlreadyStarted(ConnectionState),
}

impl StreamError {
    /// Whether the error happened below HTTP (resolution, connect, TLS, socket)
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::DnsError { .. } | Self::NetworkError(_)
        )
    }
}
