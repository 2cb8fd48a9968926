use std::env;
use tokio::net::TcpListener;
use tracing::{info, Level};

/// Bind address; the client's default base URL points at port 5000.
const DEFAULT_ADDR: &str = "0.0.0.0:5000";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .compact()
        .init();
    let addr = env::var("AGRO_STUB_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let app = agro_stub::app(agro_stub::StubState::default());
    let listener = TcpListener::bind(&addr).await?;
    info!("stub inference service listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
