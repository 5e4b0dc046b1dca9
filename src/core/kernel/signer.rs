use crate::core::config::OAuthCredentials;
use crate::core::errors::StreamError;
use base64::engine::general_purpose;
use base64::Engine;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;
use reqwest::Url;
use sha1::Sha1;
use std::collections::HashMap;
use zeroize::Zeroizing;

type HmacSha1 = Hmac<Sha1>;

/// Result type for signing operations: headers to attach to the request
pub type SignatureResult = Result<HashMap<String, String>, StreamError>;

/// RFC 3986 unreserved characters (`A-Z a-z 0-9 - . _ ~`) pass through untouched
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Signer trait for request authentication
///
/// Implementations turn a method, URL and parameter set into the headers
/// that authenticate the request.
pub trait Signer: Send + Sync {
    /// Sign a request and return the headers to include
    ///
    /// # Arguments
    /// * `method` - HTTP method (GET, POST, etc.)
    /// * `url` - Full request URL; any query string is folded into the signature
    /// * `params` - Unencoded body parameters
    fn sign_request(&self, method: &str, url: &str, params: &[(String, String)])
        -> SignatureResult;
}

/// OAuth 1.0a signer using the HMAC-SHA1 signature method
#[derive(Debug, Clone)]
pub struct OAuth1Signer {
    credentials: OAuthCredentials,
}

impl OAuth1Signer {
    pub fn new(credentials: OAuthCredentials) -> Self {
        Self { credentials }
    }

    /// Build the `Authorization` header value with a fresh nonce and timestamp
    pub fn sign(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> Result<String, StreamError> {
        let nonce = generate_nonce();
        let timestamp = chrono::Utc::now().timestamp();
        self.sign_with(method, url, params, &nonce, timestamp)
    }

    /// Build the `Authorization` header value for a fixed nonce and timestamp
    pub fn sign_with(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
        nonce: &str,
        timestamp: i64,
    ) -> Result<String, StreamError> {
        let mut oauth_params = vec![
            (
                "oauth_consumer_key".to_string(),
                self.credentials.consumer_key().to_string(),
            ),
            ("oauth_nonce".to_string(), nonce.to_string()),
            (
                "oauth_signature_method".to_string(),
                "HMAC-SHA1".to_string(),
            ),
            ("oauth_timestamp".to_string(), timestamp.to_string()),
            (
                "oauth_token".to_string(),
                self.credentials.access_token().to_string(),
            ),
            ("oauth_version".to_string(), "1.0".to_string()),
        ];

        let mut all_params = oauth_params.clone();
        all_params.extend(params.iter().cloned());

        let base_string = signature_base_string(method, url, &all_params)?;

        let signing_key = Zeroizing::new(format!(
            "{}&{}",
            percent_encode(self.credentials.consumer_secret()),
            percent_encode(self.credentials.access_token_secret())
        ));

        let signature = hmac_sha1(signing_key.as_bytes(), &base_string)?;
        oauth_params.push(("oauth_signature".to_string(), signature));
        oauth_params.sort();

        let header = oauth_params
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", percent_encode(k), percent_encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {}", header))
    }
}

impl Signer for OAuth1Signer {
    fn sign_request(
        &self,
        method: &str,
        url: &str,
        params: &[(String, String)],
    ) -> SignatureResult {
        let mut headers = HashMap::new();
        headers.insert("Authorization".to_string(), self.sign(method, url, params)?);
        Ok(headers)
    }
}

/// Signature base string: `METHOD&encoded(base url)&encoded(parameter string)`
pub fn signature_base_string(
    method: &str,
    url: &str,
    params: &[(String, String)],
) -> Result<String, StreamError> {
    let mut parsed =
        Url::parse(url).map_err(|e| StreamError::AuthError(format!("Invalid URL {}: {}", url, e)))?;

    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (percent_encode(k), percent_encode(v)))
        .collect();
    encoded.extend(
        parsed
            .query_pairs()
            .map(|(k, v)| (percent_encode(&k), percent_encode(&v))),
    );
    encoded.sort();

    parsed.set_query(None);
    parsed.set_fragment(None);

    let param_string = encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&");

    Ok(format!(
        "{}&{}&{}",
        method.to_uppercase(),
        percent_encode(parsed.as_str()),
        percent_encode(&param_string)
    ))
}

/// Percent-encode a string according to RFC 3986
pub fn percent_encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

/// Generate a random nonce: 16 random bytes, hex encoded
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hmac_sha1(key: &[u8], data: &str) -> Result<String, StreamError> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| StreamError::AuthError(format!("Invalid signing key: {}", e)))?;
    mac.update(data.as_bytes());
    Ok(general_purpose::STANDARD.encode(mac.finalize().into_bytes()))
}
