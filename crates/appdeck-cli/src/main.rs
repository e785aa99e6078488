mod cli;
mod commands;
mod config;
mod observability;
mod output;
mod runtime;

use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;
use runtime::Runtime;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let format = cli.format.unwrap_or_default();

    let config = config::loader::load_config(cli.config.as_deref())
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;
    observability::init_tracing_with_level(&config.logging.level);

    if let Commands::Config = cli.command {
        println!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let state = cli
        .state
        .clone()
        .unwrap_or_else(|| config.storage.snapshot_path.clone());
    let runtime = Runtime::open(&config, &state)
        .await?
        .with_actor(cli.actor.clone());

    match &cli.command {
        Commands::Install(args) => commands::apps::install(&runtime, &args.manifest, format).await?,
        Commands::Update(args) => commands::apps::update(&runtime, &args.manifest, format).await?,
        Commands::Uninstall(args) => commands::apps::uninstall(&runtime, &args.name).await?,
        Commands::List => commands::apps::list(&runtime, format).await?,
        Commands::Routes(args) => commands::webhooks::routes(&runtime, &args.event, format).await?,
        Commands::Buttons(args) => {
            commands::buttons::buttons(&runtime, &args.entity, &args.view, format).await?
        }
        Commands::Dispatch(args) => {
            commands::webhooks::dispatch(
                &runtime,
                &args.event,
                &args.payload,
                &config.webhooks.shop_url,
                format,
            )
            .await?
        }
        Commands::Config => {}
    }

    Ok(())
}
