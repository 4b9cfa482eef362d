use anyhow::Context;
use nuvem_chat::ai::{ModelAdapter, providers};
use nuvem_chat::chat::ChatApp;
use nuvem_chat::config::Settings;
use tracing_subscriber::EnvFilter;

fn load_dotenv() {
    // A local .env is optional; bundled defaults cover the rest.
    if let Err(err) = dotenvy::dotenv()
        && !err.not_found()
    {
        tracing::warn!(error = %err, "failed to load .env");
    }
}

fn init_tracing() {
    // Logs go to stderr so they never interleave with the streamed answer.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    load_dotenv();

    let settings = Settings::from_env().context("invalid configuration")?;
    let backend = providers::backend_from_settings(&settings).await;
    let adapter = ModelAdapter::new(backend, settings.locale);

    nuvem_chat::ui::run(ChatApp::new(adapter, settings.persona)).await
}
