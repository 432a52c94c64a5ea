//! Tracing initialization.
//!
//! Log output goes to stderr so it never mixes with results printed on stdout. The level is
//! controlled through `RUST_LOG` and defaults to `info`:
//!
//! ```bash
//! RUST_LOG=upctl=debug upctl upload --file questions.xlsx --app-id 12
//! ```

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Initialize tracing with an env filter and a stderr fmt layer.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    tracing::debug!("Telemetry initialized");
    Ok(())
}
