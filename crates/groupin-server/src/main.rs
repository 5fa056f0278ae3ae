mod config;

use std::net::SocketAddr;

use tracing::info;

use groupin_gateway::{ClockIdentities, Dispatcher, IdentityRegistry, IdentitySource, RandomIdentities};

use crate::config::{IdentitySourceKind, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "groupin=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::from_env()?;

    let source: Box<dyn IdentitySource> = match config.identity_source {
        IdentitySourceKind::Clock => Box::new(ClockIdentities),
        IdentitySourceKind::Random => Box::new(RandomIdentities),
    };
    let dispatcher = Dispatcher::new(IdentityRegistry::new(config.identity_space, source));
    let app = groupin_gateway::router(dispatcher, config.heartbeat);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!(
        "GroupIn relay listening on {} ({} identities, {:?} source)",
        addr, config.identity_space, config.identity_source
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
