use clap::Parser;

mod cli;
mod commands;
mod config;
mod script;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let config = config::AppConfig::load(cli.config.as_deref())?;

    tracing_subscriber::fmt()
        .with_max_level(config.max_level(cli.verbose)?)
        .with_writer(std::io::stderr)
        .init();

    let format = cli.format.unwrap_or(config.format);
    commands::run_command(cli.command, config, format).await
}
