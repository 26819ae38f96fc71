use std::env;

use bytes::BytesMut;
use config::{DEFAULT_CONFIG_PATH, load_config};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod render;

fn main() -> anyhow::Result<()> {
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("DNSPACK_CONFIG").ok())
        .unwrap_or(DEFAULT_CONFIG_PATH.to_string());

    let config = load_config(&config_path)?;

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(LevelFilter::from(config.output.log_level)),
        )
        .init();

    let mut buf = BytesMut::new();
    let summary = render::render(&config, &mut buf)?;

    tracing::info!(
        "built {} byte message with {} records{}",
        summary.size,
        summary.records,
        if summary.truncated { " (truncated)" } else { "" }
    );

    println!("{}", hex::encode(&buf));
    Ok(())
}
