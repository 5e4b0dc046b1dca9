use crate::core::config::{validate, RawConfig, StreamConfig};
use crate::core::errors::StreamError;
use crate::core::kernel::signer::percent_encode;
use crate::core::kernel::{
    OAuth1Signer, Signer, StreamTransport, TransportBuilder, TransportConfig,
};
use crate::core::types::SignedRequest;
use crate::streams::twitter::connector::TwitterStream;
use crate::streams::twitter::STREAM_URL;
use std::sync::Arc;
use tracing::debug;

/// Builder for creating Twitter filter-stream connections
///
/// Validation and request signing both happen in [`build`](Self::build);
/// nothing touches the network until the stream is started.
pub struct TwitterStreamBuilder {
    raw: RawConfig,
    url: String,
    transport: Option<Arc<dyn StreamTransport>>,
    transport_config: TransportConfig,
}

impl TwitterStreamBuilder {
    pub fn new(raw: RawConfig) -> Self {
        Self {
            raw,
            url: STREAM_URL.to_string(),
            transport: None,
            transport_config: TransportConfig::default(),
        }
    }

    /// Override the endpoint URL
    pub fn with_url(mut self, url: String) -> Self {
        self.url = url;
        self
    }

    /// Use a custom transport instead of the reqwest one
    pub fn with_transport(mut self, transport: Arc<dyn StreamTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Configure the default reqwest transport
    pub fn with_transport_config(mut self, config: TransportConfig) -> Self {
        self.transport_config = config;
        self
    }

    pub fn build(self) -> Result<TwitterStream, StreamError> {
        let config = validate(self.raw)?;

        let signer = OAuth1Signer::new(config.credentials.clone());
        let request = build_request(&config, &signer, &self.url)?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(
                TransportBuilder::new(self.transport_config)
                    .with_dns_settings(&config.dns)
                    .build()?,
            ),
        };

        Ok(TwitterStream::new_with_transport(config, request, transport))
    }
}

/// Value of the `track` form field: each term percent-encoded, joined by `,`
pub fn encode_track(terms: &[String]) -> String {
    terms
        .iter()
        .map(|term| percent_encode(term))
        .collect::<Vec<_>>()
        .join(",")
}

/// Prepare the signed filter request
///
/// The signature covers the decoded `track` value; the body carries the
/// encoded form.
pub fn build_request(
    config: &StreamConfig,
    signer: &dyn Signer,
    url: &str,
) -> Result<SignedRequest, StreamError> {
    let body = format!("track={}", encode_track(config.search()));
    let params = vec![("track".to_string(), config.search().join(","))];

    let mut headers: Vec<(String, String)> =
        signer.sign_request("POST", url, &params)?.into_iter().collect();
    headers.sort();
    headers.push((
        "Content-Type".to_string(),
        "application/x-www-form-urlencoded".to_string(),
    ));
    headers.push(("Content-Length".to_string(), body.len().to_string()));

    debug!(terms = config.search().len(), body_len = body.len(), "Built filter request");

    Ok(SignedRequest {
        method: "POST".to_string(),
        url: url.to_string(),
        headers,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_config(search: serde_json::Value) -> RawConfig {
        RawConfig::from_value(json!({
            "dns": {},
            "twitter": {
                "consumer_key": "ck",
                "consumer_secret": "cs",
                "access_token": "at",
                "access_token_secret": "ats",
                "search": search
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_encode_track_joins_with_literal_comma() {
        let terms = vec!["foo".to_string(), "bar".to_string()];
        assert_eq!(encode_track(&terms), "foo,bar");

        let terms = vec!["hello world".to_string(), "a,b".to_string()];
        assert_eq!(encode_track(&terms), "hello%20world,a%2Cb");
    }

    #[test]
    fn test_build_request_headers_and_body() {
        let config = validate(raw_config(json!(["foo", "bar"]))).unwrap();
        let signer = OAuth1Signer::new(config.credentials.clone());
        let request = build_request(&config, &signer, STREAM_URL).unwrap();

        assert_eq!(request.method, "POST");
        assert_eq!(request.url, STREAM_URL);
        assert_eq!(request.body, "track=foo,bar");
        assert_eq!(request.header("Content-Length"), Some("13"));
        assert_eq!(
            request.header("Content-Type"),
            Some("application/x-www-form-urlencoded")
        );
        let auth = request.header("Authorization").unwrap();
        assert!(auth.starts_with("OAuth oauth_consumer_key=\"ck\""));
        assert!(auth.contains("oauth_token=\"at\""));
    }

    #[test]
    fn test_builder_fails_before_transport_on_bad_config() {
        let raw = RawConfig::from_value(json!({"twitter": {}})).unwrap();
        let err = TwitterStreamBuilder::new(raw).build().unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: missing dns settings");
    }
}
