//! # Clinica Server
//!
//! HTTP API for the clinic: authentication for patients and staff plus
//! appointment (consulta) management.
//!
//! ## Environment Setup
//! Configuration comes from the environment, optionally through a `.env` file:
//! ```bash
//! PORT=3001
//! APP_ENV=development
//! JWT_SECRET=change-me
//! ```
//!
//! ## Running the Server
//! ```bash
//! cargo run --bin clinica-server
//! curl http://localhost:3001/health
//! ```

use clinica::{config::Config, logging, server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logging::init_tracing("info");

    tracing::info!("Starting Clinica server...");
    tracing::info!("Package: {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Build profile: {}",
        if cfg!(debug_assertions) { "debug" } else { "release" }
    );

    let config = Config::from_env()?;
    server::start(config).await
}
