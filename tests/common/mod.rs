//! Shared helpers for stream integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::env;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tweetstream::core::kernel::{StreamTransport, TransportResponse};
use tweetstream::{RawConfig, SignedRequest, StreamError};

/// Test configuration utilities
pub struct TestConfig;

impl TestConfig {
    /// Check if live API tests should run (requires real credentials)
    pub fn should_run_live_tests() -> bool {
        env::var("RUN_LIVE_TESTS").unwrap_or_default() == "true"
    }

    /// Get test timeout duration
    pub fn test_timeout_seconds() -> u64 {
        env::var("TEST_TIMEOUT_SECONDS")
            .unwrap_or_default()
            .parse()
            .unwrap_or(30)
    }

    /// Safe raw configuration with dummy credentials
    pub fn raw_config(search: serde_json::Value) -> RawConfig {
        RawConfig::from_value(json!({
            "dns": {"server": "8.8.8.8", "cached": true},
            "twitter": {
                "consumer_key": "test_consumer_key",
                "consumer_secret": "test_consumer_secret",
                "access_token": "test_access_token",
                "access_token_secret": "test_access_token_secret",
                "search": search
            }
        }))
        .expect("valid test configuration")
    }
}

/// What a [`ScriptedTransport`] does when opened
pub enum Script {
    /// Opening fails before any response arrives
    Fail(StreamError),
    /// Headers arrive with `status`, then `chunks` are delivered
    Respond {
        status: u16,
        reason: &'static str,
        chunks: Vec<Result<Bytes, StreamError>>,
        /// Keep the body open after the last chunk instead of ending it
        hang: bool,
    },
}

impl Script {
    pub fn ok(chunks: &[&'static [u8]]) -> Self {
        Self::Respond {
            status: 200,
            reason: "OK",
            chunks: chunks.iter().map(|c| Ok(Bytes::from_static(c))).collect(),
            hang: false,
        }
    }

    pub fn ok_then_hang(chunks: &[&'static [u8]]) -> Self {
        match Self::ok(chunks) {
            Self::Respond {
                status,
                reason,
                chunks,
                ..
            } => Self::Respond {
                status,
                reason,
                chunks,
                hang: true,
            },
            other => other,
        }
    }
}

/// A transport that plays back one scripted response
pub struct ScriptedTransport {
    script: Mutex<Option<Script>>,
    opened: AtomicUsize,
    last_request: Mutex<Option<SignedRequest>>,
}

impl ScriptedTransport {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(Some(script)),
            opened: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn open_count(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub async fn last_request(&self) -> Option<SignedRequest> {
        self.last_request.lock().await.clone()
    }
}

#[async_trait]
impl StreamTransport for ScriptedTransport {
    async fn open(&self, request: &SignedRequest) -> Result<TransportResponse, StreamError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().await = Some(request.clone());

        let script = self
            .script
            .lock()
            .await
            .take()
            .ok_or_else(|| StreamError::NetworkError("script already consumed".to_string()))?;

        match script {
            Script::Fail(error) => Err(error),
            Script::Respond {
                status,
                reason,
                chunks,
                hang,
            } => {
                let body = if hang {
                    stream::iter(chunks).chain(stream::pending()).boxed()
                } else {
                    stream::iter(chunks).boxed()
                };
                Ok(TransportResponse {
                    status,
                    reason: reason.to_string(),
                    body,
                })
            }
        }
    }
}
