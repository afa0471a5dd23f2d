//! `hotplug run`: host loop.
//!
//! Loads every plugin, drives the reload watcher in the background and reads
//! operator commands from stdin until EOF, `quit` or Ctrl-C.

use std::process::Command;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use hotplug_core::plugins::commands::{self, NoticeLevel, OperatorNotifier};
use hotplug_core::plugins::{HotReloadWatcher, PluginManager, StateCheckpoint, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::HostArgs;

/// Host run arguments
#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub host: HostArgs,

    /// Watcher tick in milliseconds (overrides `tick_millis`)
    #[arg(long, value_name = "MILLIS")]
    pub tick_millis: Option<u64>,

    /// Shell command run to checkpoint host state before a reload
    #[arg(long, value_name = "CMD")]
    pub checkpoint_cmd: Option<String>,
}

/// Prints operator notices to the console
struct ConsoleNotifier;

impl OperatorNotifier for ConsoleNotifier {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Success => println!("✓ {}", message),
            NoticeLevel::Failure => println!("✗ {}", message),
        }
    }
}

/// Checkpoints by running a shell command; non-zero exit is a failure
struct ShellCheckpoint {
    command: String,
}

impl StateCheckpoint for ShellCheckpoint {
    fn checkpoint(&self) -> Result<(), String> {
        let status = shell(&self.command)
            .status()
            .map_err(|e| format!("failed to spawn '{}': {}", self.command, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("'{}' exited with {}", self.command, status))
        }
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

/// Console input other than plugin commands
#[derive(Debug, PartialEq, Eq)]
enum ConsoleInput<'a> {
    Empty,
    List,
    Reload(&'a str),
    Quit,
    Other(&'a str),
}

fn classify(line: &str) -> ConsoleInput<'_> {
    let line = line.trim();
    let mut tokens = line.split_whitespace();
    match (tokens.next(), tokens.next()) {
        (None, _) => ConsoleInput::Empty,
        (Some("list"), _) | (Some("plugins.list"), _) => ConsoleInput::List,
        (Some("plugins.reload"), Some(name)) => ConsoleInput::Reload(name),
        (Some("quit"), _) | (Some("exit"), _) => ConsoleInput::Quit,
        _ => ConsoleInput::Other(line),
    }
}

fn print_loaded(manager: &PluginManager) {
    let plugins = manager.list();
    if plugins.is_empty() {
        println!("No plugins loaded");
        return;
    }
    for plugin in plugins {
        let d = &plugin.descriptor;
        println!("  {} V{:.1}    {}", d.display_name(), d.version, d.description);
    }
}

/// Run the host until stdin closes or Ctrl-C
pub async fn run(args: RunArgs) -> Result<()> {
    let mut host = args.host.resolve()?;
    if let Some(tick) = args.tick_millis {
        host.tick_millis = tick;
    }

    info!(
        plugin_dir = %host.plugin_dir.display(),
        api_version = host.api_version,
        "Starting plugin host"
    );

    let manager = Arc::new(PluginManager::new(host.manager_config()));

    let startup = Arc::clone(&manager);
    let report = tokio::task::spawn_blocking(move || startup.load_all())
        .await
        .context("plugin startup panicked")??;
    for (name, error) in &report.failed {
        println!("✗ {}: {}", name, error);
    }
    println!(
        "Loaded {} plugin(s), {} failed",
        report.loaded.len(),
        report.failed.len()
    );

    let mut watcher = HotReloadWatcher::new(Arc::clone(&manager), Arc::new(SystemClock));
    if let Some(command) = args.checkpoint_cmd {
        watcher = watcher.with_checkpoint(Arc::new(ShellCheckpoint { command }));
    }

    let shutdown = CancellationToken::new();
    let watcher_task = Arc::new(watcher).spawn(host.tick(), shutdown.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        match classify(&line) {
            ConsoleInput::Empty => {}
            ConsoleInput::Quit => break,
            ConsoleInput::List => print_loaded(&manager),
            ConsoleInput::Reload(name) => {
                let manager = Arc::clone(&manager);
                let name = name.to_string();
                match tokio::task::spawn_blocking(move || manager.reload(&name)).await? {
                    Ok(info) => println!("✓ Reloaded {}", info.descriptor.display_name()),
                    Err(e) => println!("✗ {}", e),
                }
            }
            ConsoleInput::Other(line) => {
                let manager = Arc::clone(&manager);
                let input = line.to_string();
                let handled = tokio::task::spawn_blocking(move || {
                    commands::dispatch(&manager, &input, &ConsoleNotifier)
                })
                .await?;
                if !handled {
                    warn!(command = %first_token(line), "Unknown command");
                    println!("Commands: plugins.load <name>, plugins.unload <name>, plugins.reload <name>, list, quit");
                }
            }
        }
    }

    shutdown.cancel();
    if let Err(e) = watcher_task.await {
        warn!(error = %e, "Reload watcher ended abnormally");
    }

    info!("Shutting down plugin host");
    tokio::task::spawn_blocking(move || manager.unload_all()).await?;
    Ok(())
}

fn first_token(line: &str) -> &str {
    line.split_whitespace().next().unwrap_or_default()
}
