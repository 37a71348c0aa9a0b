use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pricetap::app::AppContext;
use pricetap::cli::{commands, Cli, Commands};
use pricetap::config::Config;
use pricetap::scraper::ChromeSession;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::default_config_path()?,
    };
    if let Commands::ConfigPath = cli.command {
        println!("{}", config_path.display());
        return Ok(());
    }

    let mut config = Config::load_from(&config_path)?;
    if let Some(batch_size) = cli.batch_size {
        config.browser.batch_size = batch_size;
    }
    let ctx = AppContext::new(config, config_path, cli.telegram)?;

    if !cli.command.needs_browser() {
        commands::list_targets(&ctx)?;
        return Ok(());
    }

    let session = ChromeSession::launch(&ctx.config.browser).await?;
    let result = match cli.command {
        Commands::Quote => commands::quote(&ctx, &session).await.map(|_| ()),
        Commands::Watch => commands::watch(&ctx, &session).await.map(|_| ()),
        Commands::Matrix => commands::matrix(&ctx, &session).await.map(|_| ()),
        Commands::Targets | Commands::ConfigPath => Ok(()),
    };
    session.shutdown().await;

    result?;
    Ok(())
}
