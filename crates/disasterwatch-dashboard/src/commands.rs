//! Interactive commands accepted on stdin while watching.

use std::path::PathBuf;

use disasterwatch_types::{EventId, SeverityFilter, TypesError};

/// Help text listing the interactive commands.
pub const HELP: &str = "\
Commands:
  filter <all|high|medium|low>   show only one severity
  focus <id>                     fly the map to an event
  delete <id>                    delete an event (admin)
  mute | unmute                  toggle audible alerts
  export <path>                  write a report, .json or text (admin)
  reload                         reread the session, fetch the snapshot again
  help                           show this help
  quit                           leave the dashboard
";

/// One parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchCommand {
    /// Change the severity filter.
    Filter(SeverityFilter),
    /// Fly to an event.
    Focus(EventId),
    /// Delete an event after confirmation.
    Delete(EventId),
    /// Silence audible alerts.
    Mute,
    /// Re-enable audible alerts.
    Unmute,
    /// Write a report.
    Export(PathBuf),
    /// Refetch the snapshot.
    Reload,
    /// Print the command list.
    Help,
    /// Stop watching.
    Quit,
}

/// Errors parsing a command line.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command {0:?}, type `help` for the list")]
    Unknown(String),

    /// The command needs an argument.
    #[error("`{0}` needs an argument")]
    MissingArgument(&'static str),

    /// The filter argument is not a severity.
    #[error(transparent)]
    Filter(#[from] TypesError),
}

/// Parse one line. Blank lines yield `None`.
pub fn parse(line: &str) -> Result<Option<WatchCommand>, CommandError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map_or((line, ""), |(w, r)| (w, r.trim()));
    let argument = |name: &'static str| {
        if rest.is_empty() {
            Err(CommandError::MissingArgument(name))
        } else {
            Ok(rest)
        }
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "filter" => WatchCommand::Filter(argument("filter")?.parse()?),
        "focus" => WatchCommand::Focus(EventId::from(argument("focus")?)),
        "delete" | "rm" => WatchCommand::Delete(EventId::from(argument("delete")?)),
        "mute" => WatchCommand::Mute,
        "unmute" => WatchCommand::Unmute,
        "export" => WatchCommand::Export(PathBuf::from(argument("export")?)),
        "reload" => WatchCommand::Reload,
        "help" | "?" => WatchCommand::Help,
        "quit" | "exit" | "q" => WatchCommand::Quit,
        other => return Err(CommandError::Unknown(other.to_owned())),
    };
    Ok(Some(command))
}
