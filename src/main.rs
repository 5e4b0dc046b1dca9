use anyhow::Context;
use tracing_subscriber::EnvFilter;
use tweetstream::core::config::RawConfig;
use tweetstream::{EventSource, StreamEvent, TwitterStreamBuilder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Credentials come from TWITTER_* variables, optionally via a .env file
    #[cfg(feature = "env-file")]
    let raw = RawConfig::from_env_file(".env").context("loading configuration")?;
    #[cfg(not(feature = "env-file"))]
    let raw = RawConfig::from_env().context("loading configuration")?;

    let mut stream = TwitterStreamBuilder::new(raw)
        .build()
        .context("building stream")?;

    let shutdown = stream.shutdown_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.shutdown();
        }
    });

    let mut print_tweets = |event: StreamEvent| match event {
        StreamEvent::Tweet(tweet) => {
            let screen_name = tweet["user"]["screen_name"].as_str().unwrap_or("unknown");
            let text = tweet["text"].as_str().unwrap_or_default();
            println!("@{}: {}", screen_name, text);
        }
        StreamEvent::Limit(limit) => eprintln!("limit notice: {}", limit),
        StreamEvent::Error(Some(e)) => eprintln!("stream error: {}", e),
        _ => {}
    };

    let state = stream.start_stream(&mut print_tweets).await;
    println!("Stream finished ({})", state);

    Ok(())
}
