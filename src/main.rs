//! Entry point for the Obra Engine binary.
//!
//! Running this binary starts an HTTP server exposing the cost
//! estimator and the PILA calculator.  Configuration is read from
//! `OBRA_*` environment variables; see [`obra_engine::config`].

use obra_engine::config::EngineConfig;
use obra_engine::telemetry::init_tracing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = EngineConfig::from_env();
    init_tracing(&config);
    tracing::info!("obra_engine v{}", env!("CARGO_PKG_VERSION"));
    if let Err(err) = obra_engine::api::serve(&config).await {
        tracing::error!(error = %err, "server terminated");
        return Err(err);
    }
    Ok(())
}
