use anyhow::Result;
use appdeck_lifecycle::entities::AppEntity;
use appdeck_lifecycle::{ActionButtonView, ReconcileReport, WebhookDelivery, WebhookRoute};
use colored::Colorize;
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_table(builder: Builder) {
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{table}");
}

pub fn print_report(report: &ReconcileReport, format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(report);
    }
    let mut builder = Builder::default();
    builder.push_record(["Kind", "Created", "Updated", "Deleted"]);
    for (kind, changes) in &report.changes {
        builder.push_record([
            kind.to_string(),
            changes.created.len().to_string(),
            changes.updated.len().to_string(),
            changes.deleted.len().to_string(),
        ]);
    }
    print_table(builder);
    Ok(())
}

pub fn print_apps(apps: &[AppEntity], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(&apps);
    }
    if apps.is_empty() {
        println!("No apps installed.");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Name", "Version", "Label"]);
    for app in apps {
        builder.push_record([
            app.app_id(),
            app.name.as_str(),
            app.version.as_str(),
            app.label.display(),
        ]);
    }
    print_table(builder);
    Ok(())
}

pub fn print_routes(event: &str, routes: &[WebhookRoute], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(&routes);
    }
    if routes.is_empty() {
        println!("No subscribers for {}.", event.cyan());
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["Webhook", "App", "Version", "URL"]);
    for route in routes {
        builder.push_record([
            route.webhook_id.as_str(),
            route.app_name.as_str(),
            route.app_version.as_str(),
            route.url.as_str(),
        ]);
    }
    print_table(builder);
    Ok(())
}

pub fn print_buttons(buttons: &[ActionButtonView], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(&buttons);
    }
    if buttons.is_empty() {
        println!("No action buttons.");
        return Ok(());
    }
    let mut builder = Builder::default();
    builder.push_record(["App", "Action", "Label", "URL", "New tab"]);
    for button in buttons {
        builder.push_record([
            button.app.clone(),
            button.action.clone(),
            button.label.display().to_string(),
            button.url.clone(),
            button.open_new_tab.to_string(),
        ]);
    }
    print_table(builder);
    Ok(())
}

pub fn print_deliveries(deliveries: &[WebhookDelivery], format: OutputFormat) -> Result<()> {
    if matches!(format, OutputFormat::Json) {
        return print_json(&deliveries);
    }
    for delivery in deliveries {
        println!("{} {}", "POST".cyan(), delivery.url);
        println!("{}", serde_json::to_string_pretty(&delivery.body)?);
    }
    Ok(())
}
