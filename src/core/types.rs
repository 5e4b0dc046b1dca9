use crate::core::errors::StreamError;
use serde_json::Value;
use std::fmt;

/// One logical record recovered from the response body
#[derive(Debug)]
pub enum ClassifiedRecord {
    /// A data record, passed through unmodified
    Tweet(Value),
    /// A rate-limit notice (object carrying a `limit` field)
    Limit(Value),
    /// A blank keep-alive line
    EmptyKeepAlive,
    /// A line that did not decode as a JSON record
    Invalid(Vec<u8>),
    /// The stream ended with an error
    TerminalError(StreamError),
}

/// Caller-visible stream event
#[derive(Debug)]
pub enum StreamEvent {
    Tweet(Value),
    Limit(Value),
    EmptyData,
    InvalidData(Vec<u8>),
    /// Terminal event; `None` on a clean close
    Error(Option<StreamError>),
}

impl StreamEvent {
    /// Event name as exposed by the public contract
    pub fn name(&self) -> &'static str {
        match self {
            Self::Tweet(_) => "tweet",
            Self::Limit(_) => "limit",
            Self::EmptyData => "empty data",
            Self::InvalidData(_) => "invalid data",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl From<ClassifiedRecord> for StreamEvent {
    fn from(record: ClassifiedRecord) -> Self {
        match record {
            ClassifiedRecord::Tweet(value) => Self::Tweet(value),
            ClassifiedRecord::Limit(value) => Self::Limit(value),
            ClassifiedRecord::EmptyKeepAlive => Self::EmptyData,
            ClassifiedRecord::Invalid(raw) => Self::InvalidData(raw),
            ClassifiedRecord::TerminalError(err) => Self::Error(Some(err)),
        }
    }
}

/// Lifecycle of a single streaming connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Streaming,
    Closed,
    Errored,
}

impl ConnectionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Errored)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Closed => "closed",
            Self::Errored => "errored",
        };
        f.write_str(name)
    }
}

/// A fully prepared outbound request, written once per connection
#[derive(Clone)]
pub struct SignedRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

// The Authorization header is a credential; keep it out of logs
impl fmt::Debug for SignedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(k, _)| k.as_str()).collect();
        f.debug_struct("SignedRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("body", &self.body)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_event_names() {
        assert_eq!(StreamEvent::Tweet(json!({})).name(), "tweet");
        assert_eq!(StreamEvent::Limit(json!({})).name(), "limit");
        assert_eq!(StreamEvent::EmptyData.name(), "empty data");
        assert_eq!(StreamEvent::InvalidData(vec![]).name(), "invalid data");
        assert_eq!(StreamEvent::Error(None).name(), "error");
    }

    #[test]
    fn test_signed_request_debug_hides_header_values() {
        let request = SignedRequest {
            method: "POST".to_string(),
            url: "https://example.com".to_string(),
            headers: vec![("Authorization".to_string(), "OAuth secret".to_string())],
            body: "track=a".to_string(),
        };
        let debug = format!("{:?}", request);
        assert!(debug.contains("Authorization"));
        assert!(!debug.contains("OAuth secret"));
        assert_eq!(request.header("authorization"), Some("OAuth secret"));
    }
}
