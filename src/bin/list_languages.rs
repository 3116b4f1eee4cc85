use anyhow::Result;
use tracing::info;
use transifex_langpack::{client::TransifexClient, config, languages};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("list_languages=info".parse()?)
                .add_directive("transifex_langpack=info".parse()?),
        )
        .init();

    let config = config::Config::from_env()?;
    let client = TransifexClient::from_config(&config)?;
    let project = config.project();

    info!("Listing languages of {}", project.remote_id());
    let languages =
        languages::list_languages(&client, &project, &config.source_language).await?;

    for language in &languages {
        println!("{}\t{}", language.code, language.id);
    }

    info!("✓ {} target languages", languages.len());
    Ok(())
}
