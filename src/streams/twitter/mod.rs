pub mod builder;
pub mod codec;
pub mod connector;

/// The public statuses/filter streaming endpoint
pub const STREAM_URL: &str = "https://stream.twitter.com/1.1/statuses/filter.json";

// Re-export main components
pub use builder::{build_request, encode_track, TwitterStreamBuilder};
pub use codec::TwitterCodec;
pub use connector::{ShutdownHandle, StreamSubscription, TwitterStream};
