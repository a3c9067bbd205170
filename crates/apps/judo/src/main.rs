use std::env;

use judo::{HostServer, Judo, JudoConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "judo=debug,binding=debug,resolver_feature=debug,typedefs_feature=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = JudoConfig::from_env()?;
    info!(prisma = %config.prisma.url, "Configuration loaded");

    // Build the server instance and install it on the host
    let host = HostServer::new();
    let judo = Judo::get_or_init(config, &host)?;
    let endpoint = judo.config().endpoint.clone();
    let playground = judo.config().playground.clone();

    // Start server
    let addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:4000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("GraphQL Playground: http://{}{}", addr, playground);
    info!("GraphQL endpoint: http://{}{}", addr, endpoint);
    info!("Subscriptions: ws://{}{}", addr, endpoint);

    axum::serve(listener, host.router()).await?;

    Ok(())
}
