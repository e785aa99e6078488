use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "appdeck")]
#[command(about = "Appdeck CLI: install, update and inspect apps from their manifests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./appdeck.toml when present)
    #[arg(short, long, global = true, env = "APPDECK_CONFIG")]
    pub config: Option<PathBuf>,

    /// State snapshot file (overrides storage.snapshot_path)
    #[arg(long, global = true, env = "APPDECK_STATE")]
    pub state: Option<PathBuf>,

    /// Operator name recorded in lifecycle logs
    #[arg(long, global = true, env = "APPDECK_ACTOR")]
    pub actor: Option<String>,

    /// Output format
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,
}

#[derive(Clone, Copy, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install an app from its manifest
    Install(ManifestArgs),
    /// Reconcile an installed app with a new manifest
    Update(ManifestArgs),
    /// Remove an app and everything it owns
    Uninstall(UninstallArgs),
    /// List installed apps
    List,
    /// Show webhook subscribers of an event
    Routes(RoutesArgs),
    /// Show action buttons of an entity view
    Buttons(ButtonsArgs),
    /// Build the webhook deliveries for an event without sending them
    Dispatch(DispatchArgs),
    /// Show the effective configuration
    Config,
}

#[derive(clap::Args)]
pub struct ManifestArgs {
    /// Path to the manifest JSON file
    pub manifest: PathBuf,
}

#[derive(clap::Args)]
pub struct UninstallArgs {
    /// App name
    pub name: String,
}

#[derive(clap::Args)]
pub struct RoutesArgs {
    /// Event name (e.g. checkout.order.placed)
    pub event: String,
}

#[derive(clap::Args)]
pub struct ButtonsArgs {
    /// Entity name (e.g. product)
    pub entity: String,
    /// View name (e.g. list, detail)
    pub view: String,
}

#[derive(clap::Args)]
pub struct DispatchArgs {
    /// Event name (e.g. checkout.order.placed)
    pub event: String,
    /// Event payload as JSON
    #[arg(long, default_value = "{}")]
    pub payload: String,
}
