//! Luma summarization relay entry point.
//!
//! Sits between the accessibility front end and a hosted language model:
//! accepts `POST /summarize-text` with the extracted document text and
//! answers with a condensed rendition. One upstream exchange per request,
//! no retries — failures come back as a 500 with a textual body for the
//! front end to surface inline.

mod routes;
mod upstream;

use std::net::SocketAddr;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "luma-relay",
    about = "HTTP relay between the Luma front end and a hosted language model"
)]
struct Args {
    /// Port to listen on.
    #[arg(long, default_value_t = 3000, env = "LUMA_RELAY_PORT")]
    port: u16,

    /// Base URL of the model server.
    #[arg(
        long,
        default_value = "http://127.0.0.1:11434",
        env = "LUMA_MODEL_URL"
    )]
    model_url: String,

    /// Model name to request.
    #[arg(long, default_value = "llama3.2", env = "LUMA_MODEL_NAME")]
    model: String,

    /// Upstream request timeout in seconds.
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let upstream = upstream::ModelClient::new(&args.model_url, &args.model, args.timeout_secs)?;
    let app = routes::create_router(routes::AppState::new(upstream));

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    info!(%addr, model = %args.model, "summarization relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
