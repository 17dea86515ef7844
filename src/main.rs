use anyhow::Result;
use csvloader::{config, pipeline};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) load settings & run the batch ────────────────────────────
    let settings = config::load()?;

    // Per-file failures are logged and counted in the summary; the process
    // still exits 0. Only startup failures (settings, connection) abort.
    pipeline::run(&settings).await?;
    Ok(())
}
