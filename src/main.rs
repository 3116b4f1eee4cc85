use anyhow::Result;
use transifex_langpack::cancel::CancelSource;
use transifex_langpack::{config, Synchronizer};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in CI)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("transifex_langpack=info".parse()?),
        )
        .init();

    info!("Starting language pack build");

    let config = config::Config::from_env()?;
    let synchronizer = Synchronizer::from_config(&config)?;

    // Ctrl-C stops the poll loop without writing partial output
    let cancel = CancelSource::new();
    let token = cancel.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling");
            cancel.cancel();
        }
    });

    match synchronizer.run(token).await {
        Ok(report) => {
            if !report.failures.is_empty() {
                warn!(
                    "{} resource/language pairs were skipped, see warnings above",
                    report.failures.len()
                );
            }
            info!("✓ Wrote {} language files", report.written.len());
            Ok(())
        }
        Err(e) => {
            error!("Language pack build failed: {}", e);
            Err(e.into())
        }
    }
}
