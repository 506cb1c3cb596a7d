use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use querier::{AllowAll, HttpHandler};
use tower_http::trace::TraceLayer;

#[derive(Debug, Parser)]
struct Args {
    /// Path to a TOML configuration file. Falls back to `KARPS_*` environment
    /// variables when omitted.
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "0.0.0.0:8000")]
    addr: SocketAddr,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_target(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    tracing::info!("starting karps querier");
    let ctx = context::AppContext::new(args.config.as_deref()).await?;
    tracing::info!(resources = ctx.resources.len(), "context ready");

    let handler = HttpHandler::new(ctx, Arc::new(AllowAll));
    let router = handler.router().layer(TraceLayer::new_for_http());

    tracing::info!(address = %args.addr, "listening");
    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
