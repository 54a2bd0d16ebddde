// Logging setup shared by the server and the demo binaries
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,narration_core=info,narration_server=info";

/// Install a `fmt` subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter`. Fails if a global subscriber is already set.
pub fn init_tracing(default_filter: &str) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()?;

    info!(target: "telemetry", "Tracing initialized");
    Ok(())
}
