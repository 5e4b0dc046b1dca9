//! Kernel - transport, signing and framing for streaming endpoints
//!
//! The kernel contains no endpoint-specific logic. It is organized around
//! three components:
//!
//! ## Transport Layer
//! - `StreamTransport`: open one request and receive its body incrementally
//! - `ReqwestTransport`: reqwest-backed implementation
//! - `DnsResolver`: resolution against a configured server with an optional
//!   TTL cache
//!
//! ## Authentication
//! - `Signer`: pluggable request authentication
//! - `OAuth1Signer`: OAuth 1.0a with HMAC-SHA1
//!
//! ## Message Handling
//! - `LineCodec`: endpoint-specific classification of complete lines
//! - `FrameParser`: reassembles lines across arbitrary chunk boundaries
//!
//! # Example
//! ```rust,no_run
//! use tweetstream::core::config::OAuthCredentials;
//! use tweetstream::core::kernel::*;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let signer = OAuth1Signer::new(OAuthCredentials::new(
//!     "consumer_key".to_string(),
//!     "consumer_secret".to_string(),
//!     "access_token".to_string(),
//!     "access_token_secret".to_string(),
//! ));
//! let header = signer.sign(
//!     "POST",
//!     "https://stream.twitter.com/1.1/statuses/filter.json",
//!     &[("track".to_string(), "rust".to_string())],
//! )?;
//! assert!(header.starts_with("OAuth "));
//! # Ok(())
//! # }
//! ```
pub mod codec;
pub mod dns;
pub mod signer;
pub mod transport;

// Re-export key types for convenience
pub use codec::{FrameParser, LineCodec};
pub use dns::{DnsResolver, HickoryLookup, HostLookup, ResolvedHost};
pub use signer::{OAuth1Signer, SignatureResult, Signer};
pub use transport::{
    ByteStream, ReqwestTransport, StreamTransport, TransportBuilder, TransportConfig,
    TransportResponse,
};
