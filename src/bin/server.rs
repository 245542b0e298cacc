//! rolemask HTTP server
//!
//! Run with: cargo run --features server --bin rolemask-server
//!
//! Endpoints:
//!   GET  /health             - Liveness and version
//!   GET  /permissions        - Registry listing with dependencies
//!   POST /effective          - Effective mask of a subject
//!   POST /check              - Check one or more permissions
//!   POST /grant              - Own mask with a permission added
//!   POST /revoke             - Own mask with a permission removed (dependency guarded)
//!   POST /mask               - Mask from permission names
//!   POST /parse              - Validate a wire mask and list its names
//!   POST /authorize-update   - Admin permission-update guard

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use rolemask::config::{ServerConfig, USAGE};
use rolemask::server::router;
use rolemask::Engine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = ServerConfig::from_env()?;
    if config.help {
        println!("{USAGE}");
        return Ok(());
    }

    let registry = Arc::new(config.load_registry()?);
    tracing::info!(
        permissions = registry.len(),
        source = ?config.registry_path,
        "permission registry loaded"
    );

    let app = router(Arc::new(Engine::from_shared(registry)));

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("rolemask-server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);
    axum::serve(listener, app).await?;
    Ok(())
}
