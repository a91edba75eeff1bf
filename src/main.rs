use demolition_sandbox::config::SandboxConfig;
use demolition_sandbox::engine::Engine;
use tracing_subscriber::EnvFilter;

const CONFIG_PATH: &str = "config/sandbox.json";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    tracing::info!("=== Demolition Sandbox Starting ===");
    let config = SandboxConfig::load_or_default(CONFIG_PATH);
    let engine = Engine::new(config)?;
    tracing::info!("Window created, starting frame loop");
    engine.run()?;
    Ok(())
}
