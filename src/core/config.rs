use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, Serializer};
use std::env;
use std::net::{IpAddr, SocketAddr};

pub const DEFAULT_DNS_SERVER: &str = "8.8.8.8";
pub const DEFAULT_DNS_PORT: u16 = 53;

/// Configuration map as handed over by an external loader.
///
/// Every field is optional here; [`validate`] decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfig {
    pub dns: Option<RawDnsSettings>,
    pub twitter: Option<RawTwitterSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawDnsSettings {
    pub server: Option<String>,
    pub cached: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTwitterSettings {
    pub consumer_key: Option<String>,
    pub consumer_secret: Option<String>,
    pub access_token: Option<String>,
    pub access_token_secret: Option<String>,
    pub search: Option<SearchTerms>,
}

/// `twitter.search` accepts either one term or a list of terms
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SearchTerms {
    One(String),
    Many(Vec<String>),
}

impl From<&str> for SearchTerms {
    fn from(term: &str) -> Self {
        Self::One(term.to_string())
    }
}

impl From<Vec<String>> for SearchTerms {
    fn from(terms: Vec<String>) -> Self {
        Self::Many(terms)
    }
}

impl SearchTerms {
    fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(term) => vec![term],
            Self::Many(terms) => terms,
        }
    }
}

impl RawConfig {
    /// Deserialize from an already parsed configuration map
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        serde_json::from_value(value)
            .map_err(|e| ConfigError::InvalidConfiguration(format!("Malformed configuration: {}", e)))
    }

    /// Create configuration from environment variables
    ///
    /// Expected environment variables:
    /// - `TWITTER_CONSUMER_KEY`, `TWITTER_CONSUMER_SECRET`
    /// - `TWITTER_ACCESS_TOKEN`, `TWITTER_ACCESS_TOKEN_SECRET`
    /// - `TWITTER_SEARCH` (comma-separated terms)
    /// - `TWEETSTREAM_DNS_SERVER` (optional)
    /// - `TWEETSTREAM_DNS_CACHED` (optional, `true`/`false`)
    ///
    /// Missing variables are left unset so that [`validate`] reports them;
    /// a `TWEETSTREAM_DNS_CACHED` that is set but not a boolean is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let cached = match var("TWEETSTREAM_DNS_CACHED") {
            Some(value) => Some(value.trim().parse::<bool>().map_err(|_| {
                ConfigError::InvalidConfiguration(format!(
                    "TWEETSTREAM_DNS_CACHED must be true or false, got '{}'",
                    value
                ))
            })?),
            None => None,
        };
        let dns = RawDnsSettings {
            server: var("TWEETSTREAM_DNS_SERVER"),
            cached,
        };

        let search = var("TWITTER_SEARCH").map(|terms| {
            SearchTerms::Many(
                terms
                    .split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect(),
            )
        });

        Ok(Self {
            dns: Some(dns),
            twitter: Some(RawTwitterSettings {
                consumer_key: var("TWITTER_CONSUMER_KEY"),
                consumer_secret: var("TWITTER_CONSUMER_SECRET"),
                access_token: var("TWITTER_ACCESS_TOKEN"),
                access_token_secret: var("TWITTER_ACCESS_TOKEN_SECRET"),
                search,
            }),
        })
    }

    /// Load a `.env` file (if present) before reading the environment
    ///
    /// **Security Warning**: Never commit .env files to version control!
    #[cfg(feature = "env-file")]
    pub fn from_env_file(env_file_path: &str) -> Result<Self, ConfigError> {
        match dotenv::from_path(env_file_path) {
            Ok(_) => {}
            Err(dotenv::Error::Io(io_err)) if io_err.kind() == std::io::ErrorKind::NotFound => {
                // fall back to the process environment
            }
            Err(e) => {
                return Err(ConfigError::InvalidConfiguration(format!(
                    "Failed to load .env file '{}': {}",
                    env_file_path, e
                )));
            }
        }

        Self::from_env()
    }
}

/// Resolver settings after defaults are applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DnsSettings {
    pub server: SocketAddr,
    pub cached: bool,
}

impl Default for DnsSettings {
    fn default() -> Self {
        Self {
            server: SocketAddr::new(IpAddr::from([8, 8, 8, 8]), DEFAULT_DNS_PORT),
            cached: true,
        }
    }
}

/// Account and application credentials used for request signing
#[derive(Debug, Clone)]
pub struct OAuthCredentials {
    pub consumer_key: Secret<String>,
    pub consumer_secret: Secret<String>,
    pub access_token: Secret<String>,
    pub access_token_secret: Secret<String>,
}

impl OAuthCredentials {
    pub fn new(
        consumer_key: String,
        consumer_secret: String,
        access_token: String,
        access_token_secret: String,
    ) -> Self {
        Self {
            consumer_key: Secret::new(consumer_key),
            consumer_secret: Secret::new(consumer_secret),
            access_token: Secret::new(access_token),
            access_token_secret: Secret::new(access_token_secret),
        }
    }

    /// Get consumer key (use carefully - exposes secret)
    pub fn consumer_key(&self) -> &str {
        self.consumer_key.expose_secret()
    }

    /// Get consumer secret (use carefully - exposes secret)
    pub fn consumer_secret(&self) -> &str {
        self.consumer_secret.expose_secret()
    }

    /// Get access token (use carefully - exposes secret)
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Get access token secret (use carefully - exposes secret)
    pub fn access_token_secret(&self) -> &str {
        self.access_token_secret.expose_secret()
    }
}

// Never expose secrets in serialization
impl Serialize for OAuthCredentials {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("OAuthCredentials", 4)?;
        state.serialize_field("consumer_key", "[REDACTED]")?;
        state.serialize_field("consumer_secret", "[REDACTED]")?;
        state.serialize_field("access_token", "[REDACTED]")?;
        state.serialize_field("access_token_secret", "[REDACTED]")?;
        state.end()
    }
}

/// Validated, immutable stream configuration
#[derive(Debug, Clone, Serialize)]
pub struct StreamConfig {
    pub dns: DnsSettings,
    pub credentials: OAuthCredentials,
    search: Vec<String>,
}

impl StreamConfig {
    /// Search terms in configuration order; never empty
    pub fn search(&self) -> &[String] {
        &self.search
    }
}

/// Validate a raw configuration map, applying defaults.
///
/// Fails before any network activity when a required field is missing.
pub fn validate(raw: RawConfig) -> Result<StreamConfig, ConfigError> {
    let dns = raw.dns.ok_or(ConfigError::MissingDnsSettings)?;
    let dns = DnsSettings {
        server: parse_dns_server(dns.server.as_deref().unwrap_or(DEFAULT_DNS_SERVER))?,
        cached: dns.cached.unwrap_or(true),
    };

    let twitter = raw.twitter.ok_or(ConfigError::MissingTwitterSettings)?;
    let (Some(consumer_key), Some(consumer_secret), Some(access_token), Some(access_token_secret)) = (
        twitter.consumer_key,
        twitter.consumer_secret,
        twitter.access_token,
        twitter.access_token_secret,
    ) else {
        return Err(ConfigError::MissingTwitterSettings);
    };

    let search = twitter
        .search
        .map(SearchTerms::into_vec)
        .filter(|terms| !terms.is_empty())
        .ok_or(ConfigError::MissingSearchTerm)?;

    Ok(StreamConfig {
        dns,
        credentials: OAuthCredentials::new(
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
        ),
        search,
    })
}

fn parse_dns_server(server: &str) -> Result<SocketAddr, ConfigError> {
    if let Ok(ip) = server.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, DEFAULT_DNS_PORT));
    }
    server
        .parse::<SocketAddr>()
        .map_err(|_| ConfigError::InvalidDnsServer(server.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing dns settings")]
    MissingDnsSettings,

    #[error("missing twitter settings")]
    MissingTwitterSettings,

    #[error("missing search term")]
    MissingSearchTerm,

    #[error("invalid dns server: {0}")]
    InvalidDnsServer(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_config() -> serde_json::Value {
        json!({
            "dns": {},
            "twitter": {
                "consumer_key": "ck",
                "consumer_secret": "cs",
                "access_token": "at",
                "access_token_secret": "ats",
                "search": ["rust", "tokio"]
            }
        })
    }

    #[test]
    fn test_validate_applies_dns_defaults() {
        let config = validate(RawConfig::from_value(full_config()).unwrap()).unwrap();
        assert_eq!(config.dns, DnsSettings::default());
        assert_eq!(config.dns.server.to_string(), "8.8.8.8:53");
        assert!(config.dns.cached);
        assert_eq!(config.search(), ["rust", "tokio"]);
    }

    #[test]
    fn test_single_search_term_is_normalized() {
        let mut value = full_config();
        value["twitter"]["search"] = json!("hello");
        let config = validate(RawConfig::from_value(value).unwrap()).unwrap();
        assert_eq!(config.search(), ["hello"]);
    }

    #[test]
    fn test_missing_dns_section() {
        let mut value = full_config();
        value.as_object_mut().unwrap().remove("dns");
        let err = validate(RawConfig::from_value(value).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "missing dns settings");
    }

    #[test]
    fn test_missing_credential_field() {
        for field in [
            "consumer_key",
            "consumer_secret",
            "access_token",
            "access_token_secret",
        ] {
            let mut value = full_config();
            value["twitter"].as_object_mut().unwrap().remove(field);
            let err = validate(RawConfig::from_value(value).unwrap()).unwrap_err();
            assert_eq!(err.to_string(), "missing twitter settings", "field {}", field);
        }
    }

    #[test]
    fn test_missing_twitter_section() {
        let err = validate(RawConfig::from_value(json!({"dns": {}})).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingTwitterSettings));
    }

    #[test]
    fn test_missing_or_empty_search() {
        let mut value = full_config();
        value["twitter"].as_object_mut().unwrap().remove("search");
        let err = validate(RawConfig::from_value(value).unwrap()).unwrap_err();
        assert_eq!(err.to_string(), "missing search term");

        let mut value = full_config();
        value["twitter"]["search"] = json!([]);
        let err = validate(RawConfig::from_value(value).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSearchTerm));
    }

    #[test]
    fn test_custom_dns_server() {
        let mut value = full_config();
        value["dns"] = json!({"server": "1.1.1.1:5353", "cached": false});
        let config = validate(RawConfig::from_value(value).unwrap()).unwrap();
        assert_eq!(config.dns.server.to_string(), "1.1.1.1:5353");
        assert!(!config.dns.cached);

        let mut value = full_config();
        value["dns"] = json!({"server": "not-an-ip"});
        let err = validate(RawConfig::from_value(value).unwrap()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDnsServer(_)));
    }

    fn env_vars(cached: Option<&str>) -> impl Fn(&str) -> Option<String> {
        let cached = cached.map(str::to_string);
        move |key| match key {
            "TWEETSTREAM_DNS_CACHED" => cached.clone(),
            "TWITTER_CONSUMER_KEY" => Some("ck".to_string()),
            "TWITTER_CONSUMER_SECRET" => Some("cs".to_string()),
            "TWITTER_ACCESS_TOKEN" => Some("at".to_string()),
            "TWITTER_ACCESS_TOKEN_SECRET" => Some("ats".to_string()),
            "TWITTER_SEARCH" => Some("rust, tokio,".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_env_vars_are_validated() {
        let config = validate(RawConfig::from_vars(env_vars(None)).unwrap()).unwrap();
        assert!(config.dns.cached);
        assert_eq!(config.search(), ["rust", "tokio"]);

        let config = validate(RawConfig::from_vars(env_vars(Some("false"))).unwrap()).unwrap();
        assert!(!config.dns.cached);
    }

    #[test]
    fn test_malformed_env_cache_flag_is_rejected() {
        let err = RawConfig::from_vars(env_vars(Some("nope"))).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidConfiguration(_)));
        assert!(err.to_string().contains("nope"));
    }

    #[test]
    fn test_credentials_never_serialized() {
        let config = validate(RawConfig::from_value(full_config()).unwrap()).unwrap();
        let serialized = serde_json::to_string(&config).unwrap();
        assert!(serialized.contains("[REDACTED]"));
        assert!(!serialized.contains("\"cs\""));
        assert!(!format!("{:?}", config.credentials).contains("ats"));
    }
}
