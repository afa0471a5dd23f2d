//! Offline plugin inspection.
//!
//! Reads the plugin root and each `PluginInfo.json` without loading any
//! module, so it is safe to run next to a live host.

use anyhow::Result;
use clap::{Args, Subcommand};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use hotplug_core::plugins::{DescriptorStore, PluginDescriptor, PluginLayout};

use super::HostArgs;

/// Plugin inspection arguments
#[derive(Args)]
pub struct PluginArgs {
    #[command(flatten)]
    pub host: HostArgs,

    #[command(subcommand)]
    pub command: PluginCommands,
}

/// Plugin subcommands
#[derive(Subcommand)]
pub enum PluginCommands {
    /// List installed plugins
    List,
    /// Show plugin details
    Info {
        /// Plugin name
        name: String,
    },
}

/// Run plugin command
pub fn run(args: PluginArgs) -> Result<()> {
    let host = args.host.resolve()?;
    let layout = PluginLayout::new(&host.plugin_dir);

    match args.command {
        PluginCommands::List => list_plugins(&layout, host.api_version),
        PluginCommands::Info { name } => show_plugin_info(&layout, host.api_version, &name),
    }
}

/// One row of `plugin list`
struct PluginRow {
    name: String,
    descriptor: Option<PluginDescriptor>,
    error: Option<String>,
    has_module: bool,
    staged: bool,
}

fn inspect(layout: &PluginLayout, store: &DescriptorStore, name: &str) -> PluginRow {
    let (descriptor, error) = match store.read_descriptor(name) {
        Ok(descriptor) => (Some(descriptor), None),
        Err(e) => (None, Some(e.to_string())),
    };
    PluginRow {
        name: name.to_string(),
        descriptor,
        error,
        has_module: layout.has_module(name),
        staged: layout.has_staged(name),
    }
}

fn status(row: &PluginRow, api_version: f32) -> (&'static str, Color) {
    match &row.descriptor {
        _ if !row.has_module => ("no module", Color::Red),
        None => ("bad manifest", Color::Red),
        Some(d) if d.requires_newer_api(api_version) => ("needs newer API", Color::Yellow),
        Some(_) if row.staged => ("update staged", Color::Cyan),
        Some(_) => ("ready", Color::Green),
    }
}

fn list_plugins(layout: &PluginLayout, api_version: f32) -> Result<()> {
    let names = layout.discover()?;

    if names.is_empty() {
        println!("No plugins installed");
        println!();
        println!("Plugin directory: {}", layout.root().display());
        println!();
        println!("To install a plugin:");
        println!("  1. Create a plugin directory: mkdir -p <plugin-dir>/my-plugin");
        println!(
            "  2. Copy the module: cp libmy_plugin.{ext} <plugin-dir>/my-plugin/my-plugin.{ext}",
            ext = std::env::consts::DLL_EXTENSION
        );
        return Ok(());
    }

    let store = DescriptorStore::new(layout.clone());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Plugin", "Version", "Min API", "Status", "Description"]);

    for name in &names {
        let row = inspect(layout, &store, name);
        let (label, color) = status(&row, api_version);
        let (display, version, min_api, description) = match &row.descriptor {
            Some(d) => (
                d.display_name().to_string(),
                format!("{:.1}", d.version),
                format!("{:.1}", d.min_api_version),
                d.description.clone(),
            ),
            None => (
                row.name.clone(),
                "-".to_string(),
                "-".to_string(),
                row.error.clone().unwrap_or_default(),
            ),
        };
        table.add_row(vec![
            Cell::new(display),
            Cell::new(version),
            Cell::new(min_api),
            Cell::new(label).fg(color),
            Cell::new(description),
        ]);
    }

    println!("{table}");
    println!();
    println!("{} plugin(s) in {}", names.len(), layout.root().display());
    Ok(())
}

fn show_plugin_info(layout: &PluginLayout, api_version: f32, name: &str) -> Result<()> {
    if !layout.plugin_dir(name).is_dir() {
        println!("Plugin '{}' not found", name);
        println!();
        println!("Run 'hotplug plugin list' to see installed plugins.");
        return Ok(());
    }

    let store = DescriptorStore::new(layout.clone());
    let row = inspect(layout, &store, name);
    let (label, _) = status(&row, api_version);

    println!("Name:        {}", name);
    if let Some(d) = &row.descriptor {
        println!("Full name:   {}", d.display_name());
        println!("Version:     {:.1}", d.version);
        println!("Min API:     {:.1} (host {:.1})", d.min_api_version, api_version);
        println!("Description: {}", d.description);
        if d.dependencies.is_empty() {
            println!("Depends on:  none");
        } else {
            println!("Depends on:  {}", d.dependencies.join(", "));
        }
    }
    if let Some(error) = &row.error {
        println!("Manifest:    {}", error);
    }
    println!();
    println!("Module:      {}", layout.module_path(name).display());
    println!("Status:      {}", label);

    Ok(())
}
