//! Operator commands: `plugins.load <name>` and `plugins.unload <name>`
//!
//! Parsing of the raw console line into a command is the only dispatch done
//! here; routing console input to [`dispatch`] is up to the host.

use super::error::PluginManagerError;
use super::lifecycle::PluginManager;

/// Console command that loads a plugin
pub const LOAD_COMMAND: &str = "plugins.load";

/// Console command that unloads a plugin
pub const UNLOAD_COMMAND: &str = "plugins.unload";

/// Severity of a notice sent back to the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Failure,
}

/// Channel back to whoever issued a command
pub trait OperatorNotifier {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// A parsed operator command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperatorCommand {
    Load { name: String },
    Unload { name: String },
}

impl OperatorCommand {
    /// Parse a raw console line such as `plugins.load Foo`.
    ///
    /// Returns `None` for other commands, and for a known command with no
    /// plugin name. Tokens after the name are ignored.
    pub fn parse(line: &str) -> Option<Self> {
        let mut tokens = line.split_whitespace();
        let command = tokens.next()?;
        let name = tokens.next()?.to_string();

        match command {
            LOAD_COMMAND => Some(Self::Load { name }),
            UNLOAD_COMMAND => Some(Self::Unload { name }),
            _ => None,
        }
    }

    pub fn plugin_name(&self) -> &str {
        match self {
            Self::Load { name } | Self::Unload { name } => name,
        }
    }
}

/// Run a command against the manager, reporting to the operator and the log
pub fn execute(
    manager: &PluginManager,
    command: &OperatorCommand,
    notifier: &dyn OperatorNotifier,
) -> Result<(), PluginManagerError> {
    let name = command.plugin_name();

    let (result, verb) = match command {
        OperatorCommand::Load { .. } => (manager.load(name).map(|_| ()), "load"),
        OperatorCommand::Unload { .. } => (manager.unload(name), "unload"),
    };

    match &result {
        Ok(()) => {
            notifier.notify(
                NoticeLevel::Success,
                &format!("Successfully {}ed plugin", verb),
            );
        }
        Err(e) => {
            notifier.notify(
                NoticeLevel::Failure,
                &format!("Failed to {} plugin - {}", verb, e),
            );
            tracing::warn!(plugin = %name, error = %e, "{}", e);
        }
    }

    result
}

/// Parse and run a console line.
///
/// Returns `false` if the line is not a plugin command.
pub fn dispatch(manager: &PluginManager, line: &str, notifier: &dyn OperatorNotifier) -> bool {
    let Some(command) = OperatorCommand::parse(line) else {
        return false;
    };
    // Failures have already been reported to the operator and the log
    let _ = execute(manager, &command, notifier);
    true
}
