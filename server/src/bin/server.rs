use narration_core::telemetry::{init_tracing, DEFAULT_FILTER};
use narration_core::NarrationConfig;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // .env is optional
    let _ = dotenvy::dotenv();
    init_tracing(DEFAULT_FILTER)?;

    // A missing API key stops startup here, never per request
    let cfg = NarrationConfig::from_env()?;
    info!(
        target: "server",
        voice = %cfg.default_voice_id,
        model = %cfg.default_model_id,
        storage = cfg.storage.kind(),
        "Loaded configuration"
    );

    narration_server::serve(&cfg).await
}
