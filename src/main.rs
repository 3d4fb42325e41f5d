//! semdex CLI entry point.

use anyhow::Result;
use clap::Parser;

use semdex::cli::{dispatch, handle_error, AppContext, Cli};
use semdex::infrastructure::config::ConfigLoader;
use semdex::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(&err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&LogConfig::from_settings(&config.logging))?;

    let ctx = AppContext::open(config).await?;
    let result = dispatch(cli.command, &ctx, cli.json).await;
    let closed = ctx.close().await;
    result?;
    closed
}
