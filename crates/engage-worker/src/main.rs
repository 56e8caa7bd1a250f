//! Engagement worker entry point
//!
//! Run with:
//! ```bash
//! cargo run -p engage-worker < events.ndjson
//! ```
//!
//! Configuration is loaded from environment variables. Events are read from
//! stdin, one JSON object per line.

use engage_common::{try_init_tracing, try_init_tracing_with_config, AppConfig, TracingConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    // Load configuration first so the log format can follow APP_ENV
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            if let Err(e) = try_init_tracing() {
                eprintln!("Warning: Failed to initialize tracing: {e}");
            }
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.app.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        name = %config.app.name,
        env = ?config.app.env,
        worker_id = config.engagement.worker_id,
        "Configuration loaded"
    );

    if let Err(e) = engage_worker::run(config).await {
        error!(error = %e, code = e.error_code(), "Worker failed");
        std::process::exit(1);
    }
}
