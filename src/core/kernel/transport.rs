use crate::core::config::DnsSettings;
use crate::core::errors::StreamError;
use crate::core::kernel::dns::DnsResolver;
use crate::core::types::SignedRequest;
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use futures_util::StreamExt;
use reqwest::{Client, Method};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument};

/// Body chunks as they arrive; an `Err` item ends the stream with a failure
pub type ByteStream = BoxStream<'static, Result<Bytes, StreamError>>;

/// An open streaming response: status line first, then the body
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    pub body: ByteStream,
}

impl TransportResponse {
    /// Only `200 OK` opens a stream; any other status ends it
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

impl std::fmt::Debug for TransportResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportResponse")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .finish_non_exhaustive()
    }
}

/// Streaming transport trait
///
/// Opens one outbound request and hands back the response as soon as its
/// headers arrive. Body bytes are delivered by polling
/// [`TransportResponse::body`].
#[async_trait]
pub trait StreamTransport: Send + Sync {
    /// Write the request and wait for the response headers
    async fn open(&self, request: &SignedRequest) -> Result<TransportResponse, StreamError>;
}

/// Configuration for the streaming transport
#[derive(Clone, Debug)]
pub struct TransportConfig {
    /// Timeout for DNS + TCP connect + TLS handshake, in seconds
    pub connect_timeout_seconds: u64,
    /// TCP keep-alive interval, in seconds
    pub tcp_keepalive_seconds: u64,
    /// User agent string to include in requests
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout_seconds: 30,
            tcp_keepalive_seconds: 60,
            user_agent: "tweetstream/0.1".to_string(),
        }
    }
}

impl TransportConfig {
    /// Set the connect timeout
    pub fn with_connect_timeout(mut self, connect_timeout_seconds: u64) -> Self {
        self.connect_timeout_seconds = connect_timeout_seconds;
        self
    }

    /// Set the TCP keep-alive interval
    pub fn with_tcp_keepalive(mut self, tcp_keepalive_seconds: u64) -> Self {
        self.tcp_keepalive_seconds = tcp_keepalive_seconds;
        self
    }

    /// Set the user agent string
    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = user_agent;
        self
    }
}

/// Builder for creating transport instances
pub struct TransportBuilder {
    config: TransportConfig,
    resolver: Option<DnsResolver>,
}

impl TransportBuilder {
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            resolver: None,
        }
    }

    /// Resolve hostnames through the given resolver instead of the system one
    pub fn with_resolver(mut self, resolver: DnsResolver) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Resolve hostnames through the configured DNS server
    pub fn with_dns_settings(self, settings: &DnsSettings) -> Self {
        self.with_resolver(DnsResolver::from_settings(settings))
    }

    /// Build the transport
    ///
    /// No overall request timeout is set: the response body never ends on
    /// its own.
    pub fn build(self) -> Result<ReqwestTransport, StreamError> {
        let mut builder = Client::builder()
            .connect_timeout(Duration::from_secs(self.config.connect_timeout_seconds))
            .tcp_keepalive(Duration::from_secs(self.config.tcp_keepalive_seconds))
            .user_agent(&self.config.user_agent);

        if let Some(resolver) = self.resolver {
            builder = builder.dns_resolver(Arc::new(resolver));
        }

        let client = builder.build().map_err(|e| {
            StreamError::NetworkError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(ReqwestTransport {
            client,
            config: self.config,
        })
    }
}

/// Implementation of `StreamTransport` using reqwest
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Client,
    config: TransportConfig,
}

impl std::fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReqwestTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ReqwestTransport {
    /// Create a transport resolving through the given DNS settings
    pub fn new(dns: &DnsSettings) -> Result<Self, StreamError> {
        TransportBuilder::new(TransportConfig::default())
            .with_dns_settings(dns)
            .build()
    }

    fn map_send_error(e: reqwest::Error) -> StreamError {
        if e.is_connect() || e.is_timeout() {
            StreamError::NetworkError(format!("Connection failed: {}", e))
        } else {
            StreamError::HttpError(e)
        }
    }
}

#[async_trait]
impl StreamTransport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn open(&self, request: &SignedRequest) -> Result<TransportResponse, StreamError> {
        let method = Method::from_bytes(request.method.as_bytes()).map_err(|e| {
            StreamError::NetworkError(format!("Invalid HTTP method {}: {}", request.method, e))
        })?;

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .body(request.body.clone())
            .send()
            .await
            .map_err(Self::map_send_error)?;

        let status = response.status();
        debug!(status = status.as_u16(), "Received response headers");

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk.map_err(|e| StreamError::NetworkError(format!("Stream read failed: {}", e)))
            })
            .boxed();

        Ok(TransportResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;

    #[test]
    fn test_transport_config_builders() {
        let config = TransportConfig::default()
            .with_connect_timeout(5)
            .with_tcp_keepalive(15)
            .with_user_agent("test-agent".to_string());
        assert_eq!(config.connect_timeout_seconds, 5);
        assert_eq!(config.tcp_keepalive_seconds, 15);
        assert_eq!(config.user_agent, "test-agent");
    }

    #[tokio::test]
    async fn test_build_transport_with_custom_dns() {
        let transport = TransportBuilder::new(TransportConfig::default())
            .with_dns_settings(&DnsSettings::default())
            .build();
        assert!(transport.is_ok());
    }

    fn response(status: u16) -> TransportResponse {
        TransportResponse {
            status,
            reason: String::new(),
            body: stream::empty().boxed(),
        }
    }

    #[test]
    fn test_only_200_is_success() {
        assert!(response(200).is_success());
        assert!(!response(204).is_success());
        assert!(!response(206).is_success());
        assert!(!response(503).is_success());
        assert!(format!("{:?}", response(503)).contains("503"));
    }
}
