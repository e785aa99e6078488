use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use appdeck_lifecycle::Manifest;
use colored::Colorize;

use crate::cli::OutputFormat;
use crate::output::{print_apps, print_report, print_success};
use crate::runtime::Runtime;

fn read_manifest(path: &Path) -> Result<Manifest> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    Manifest::from_json(&content).with_context(|| format!("Invalid manifest: {}", path.display()))
}

pub async fn install(runtime: &Runtime, path: &Path, format: OutputFormat) -> Result<()> {
    let manifest = read_manifest(path)?;
    let report = runtime
        .lifecycle
        .install(&manifest, &runtime.context())
        .await?;
    runtime.persist().await?;

    print_success(&format!(
        "Installed {} {} ({})",
        manifest.name.cyan(),
        manifest.version,
        report.app.app_id()
    ));
    print_report(&report, format)
}

pub async fn update(runtime: &Runtime, path: &Path, format: OutputFormat) -> Result<()> {
    let manifest = read_manifest(path)?;
    let Some(app) = runtime.lifecycle.find_by_name(&manifest.name).await? else {
        anyhow::bail!(
            "App {} is not installed. Run: appdeck install {}",
            manifest.name,
            path.display()
        );
    };

    let report = runtime
        .lifecycle
        .update(app.app_id(), &manifest, &runtime.context())
        .await?;
    runtime.persist().await?;

    print_success(&format!(
        "Updated {} {} -> {}",
        manifest.name.cyan(),
        app.version,
        manifest.version
    ));
    print_report(&report, format)
}

pub async fn uninstall(runtime: &Runtime, name: &str) -> Result<()> {
    let Some(app) = runtime.lifecycle.find_by_name(name).await? else {
        println!("App {} is not installed, nothing to do.", name.cyan());
        return Ok(());
    };

    let removed = runtime
        .lifecycle
        .delete(app.app_id(), &runtime.context())
        .await?;
    runtime.persist().await?;

    print_success(&format!(
        "Uninstalled {} ({} rows removed)",
        name.cyan(),
        removed.len()
    ));
    Ok(())
}

pub async fn list(runtime: &Runtime, format: OutputFormat) -> Result<()> {
    let apps = runtime.lifecycle.list().await?;
    print_apps(&apps, format)
}
