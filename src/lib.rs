pub mod core;
pub mod streams;

pub use core::{
    config::{validate, RawConfig, StreamConfig},
    errors::StreamError,
    traits::{EventHandler, EventSource},
    types::*,
};
pub use streams::twitter::{TwitterStream, TwitterStreamBuilder};
