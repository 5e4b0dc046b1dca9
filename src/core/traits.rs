use crate::core::types::{ConnectionState, StreamEvent};
use async_trait::async_trait;

/// Receives every event produced by a stream, in arrival order
#[async_trait]
pub trait EventHandler: Send {
    async fn on_event(&mut self, event: StreamEvent);
}

#[async_trait]
impl<F> EventHandler for F
where
    F: FnMut(StreamEvent) + Send,
{
    async fn on_event(&mut self, event: StreamEvent) {
        (self)(event);
    }
}

/// A source of streaming events
#[async_trait]
pub trait EventSource {
    /// Run the stream to completion, delivering events to `handler`
    async fn start_stream<H: EventHandler>(&mut self, handler: &mut H) -> ConnectionState;

    /// Current lifecycle state
    fn state(&self) -> ConnectionState;
}
