use crate::core::config::StreamConfig;
use crate::core::errors::StreamError;
use crate::core::kernel::{FrameParser, StreamTransport};
use crate::core::traits::{EventHandler, EventSource};
use crate::core::types::{ConnectionState, SignedRequest, StreamEvent};
use crate::streams::twitter::codec::TwitterCodec;
use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace, warn};

/// Cloneable trigger that ends a running stream
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask the stream to close; idempotent
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// A single streaming connection to the statuses/filter endpoint
///
/// Lifecycle: `Idle -> Connecting -> Streaming -> Closed`, or `Errored` when
/// opening fails, the status is not 200, or the body fails mid-stream. Both
/// end states are final; build a new instance to reconnect.
pub struct TwitterStream {
    config: StreamConfig,
    request: SignedRequest,
    transport: Arc<dyn StreamTransport>,
    parser: FrameParser<TwitterCodec>,
    state: ConnectionState,
    shutdown: ShutdownHandle,
}

impl std::fmt::Debug for TwitterStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterStream")
            .field("request", &self.request)
            .field("state", &self.state)
            .field("buffered", &self.parser.buffered_len())
            .finish_non_exhaustive()
    }
}

impl TwitterStream {
    pub fn new_with_transport(
        config: StreamConfig,
        request: SignedRequest,
        transport: Arc<dyn StreamTransport>,
    ) -> Self {
        Self {
            config,
            request,
            transport,
            parser: FrameParser::new(TwitterCodec),
            state: ConnectionState::Idle,
            shutdown: ShutdownHandle::new(),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn request(&self) -> &SignedRequest {
        &self.request
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run the stream on a background task, delivering events over a channel
    pub fn spawn(self, buffer: usize) -> StreamSubscription {
        let (tx, events) = mpsc::channel(buffer);
        let shutdown = self.shutdown_handle();
        let mut handler = ChannelHandler {
            tx,
            shutdown: shutdown.clone(),
        };

        let task = tokio::spawn(async move {
            let mut stream = self;
            stream.start_stream(&mut handler).await
        });

        StreamSubscription {
            events,
            shutdown,
            task,
        }
    }

    fn transition(&mut self, next: ConnectionState) {
        debug!(from = %self.state, to = %next, "Connection state change");
        self.state = next;
    }

    async fn fail<H: EventHandler>(&mut self, handler: &mut H, error: StreamError) {
        warn!(error = %error, "Stream terminated with error");
        self.transition(ConnectionState::Errored);
        handler.on_event(StreamEvent::Error(Some(error))).await;
    }

    async fn close<H: EventHandler>(&mut self, handler: &mut H) {
        let partial = self.parser.take_partial();
        if !String::from_utf8_lossy(&partial).trim().is_empty() {
            handler.on_event(StreamEvent::InvalidData(partial)).await;
        }
        info!("Stream closed");
        self.transition(ConnectionState::Closed);
        handler.on_event(StreamEvent::Error(None)).await;
    }
}

#[async_trait]
impl EventSource for TwitterStream {
    #[instrument(skip(self, handler), fields(url = %self.request.url))]
    async fn start_stream<H: EventHandler>(&mut self, handler: &mut H) -> ConnectionState {
        if self.state != ConnectionState::Idle {
            handler
                .on_event(StreamEvent::Error(Some(StreamError::AlreadyStarted(
                    self.state,
                ))))
                .await;
            return self.state;
        }

        let mut shutdown = self.shutdown.subscribe();
        self.transition(ConnectionState::Connecting);

        let opened = tokio::select! {
            result = self.transport.open(&self.request) => Some(result),
            () = wait_for_shutdown(&mut shutdown) => None,
        };

        let response = match opened {
            Some(Ok(response)) => response,
            Some(Err(e)) => {
                self.fail(handler, e).await;
                return self.state;
            }
            None => {
                self.close(handler).await;
                return self.state;
            }
        };

        if !response.is_success() {
            let error = StreamError::ProtocolError {
                status: response.status,
                reason: response.reason.clone(),
            };
            self.fail(handler, error).await;
            return self.state;
        }

        info!(status = response.status, "Stream connected");
        self.transition(ConnectionState::Streaming);

        let mut body = response.body;
        loop {
            tokio::select! {
                chunk = body.next() => match chunk {
                    Some(Ok(bytes)) => {
                        trace!(len = bytes.len(), "Received chunk");
                        for record in self.parser.feed(&bytes) {
                            handler.on_event(record.into()).await;
                        }
                    }
                    Some(Err(e)) => {
                        self.fail(handler, e).await;
                        break;
                    }
                    None => {
                        self.close(handler).await;
                        break;
                    }
                },
                () = wait_for_shutdown(&mut shutdown) => {
                    debug!("Shutdown requested");
                    self.close(handler).await;
                    break;
                }
            }
        }

        self.state
    }

    fn state(&self) -> ConnectionState {
        self.state
    }
}

/// Handle to a stream running on a background task
#[derive(Debug)]
pub struct StreamSubscription {
    pub events: mpsc::Receiver<StreamEvent>,
    pub shutdown: ShutdownHandle,
    pub task: JoinHandle<ConnectionState>,
}

struct ChannelHandler {
    tx: mpsc::Sender<StreamEvent>,
    shutdown: ShutdownHandle,
}

#[async_trait]
impl EventHandler for ChannelHandler {
    async fn on_event(&mut self, event: StreamEvent) {
        if self.tx.send(event).await.is_err() {
            // Receiver dropped
            self.shutdown.shutdown();
        }
    }
}
