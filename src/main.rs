//! funcserve binary.
//!
//! Serves the demo uppercase transform on the configured address. Overrides
//! are passed as `key=value` tokens, e.g. `funcserve server.port=9090`.

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use funcserve::Transform;

#[derive(Parser)]
#[command(name = "funcserve")]
#[command(about = "HTTP endpoint server for a single string transform", long_about = None)]
struct Cli {
    /// Configuration overrides in key=value form (e.g. server.port=9090).
    #[arg(value_name = "KEY=VALUE", allow_hyphen_values = true)]
    overrides: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "funcserve=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let transform: Transform = Arc::new(|body: String| body.to_uppercase());
    let bootstrap = funcserve::compose(&cli.overrides, transform)?;

    tracing::info!(
        host = %bootstrap.address().host,
        port = bootstrap.address().port,
        "Configuration resolved"
    );

    // The process stays alive exactly as long as the serving worker.
    bootstrap.start().join().await?;
    Ok(())
}
