//! Session command parsing

use std::fmt;

/// One line of session input
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Pull a record from a known table
    Pull { table: String, sys_id: String },
    /// Pull a record, searching every registered table
    PullId { sys_id: String },
    /// Push local edits
    Push { sys_id: String },
    /// Re-read files and report status
    Status { sys_id: String },
    /// Run coherence and legacy-syntax checks
    Validate { sys_id: String },
    /// List tracked artifacts
    List,
    /// Remove an artifact directory
    Cleanup { sys_id: String, force: bool },
    /// List supported tables
    Tables,
    /// Print usage
    Help,
    /// End the session
    Quit,
}

/// Why a line was not understood
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ParseError {
    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

pub(crate) const HELP: &str = "\
commands:
  pull <table> <sys_id>      materialize a record as local files
  pull-id <sys_id>           same, searching every supported table
  push <sys_id>              send changed fields back
  status <sys_id>            compare files with their baselines
  validate <sys_id>          run coherence and legacy-syntax checks
  list                       tracked artifacts
  cleanup <sys_id> [--force] delete a local artifact
  tables                     supported tables
  help                       this text
  quit                       end the session";

/// Parse one input line; blank lines and `#` comments yield `None`
pub(crate) fn parse_command(line: &str) -> Result<Option<Command>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let args: Vec<&str> = words.collect();

    let command = match (verb.to_ascii_lowercase().as_str(), args.as_slice()) {
        ("pull", [table, sys_id]) => Command::Pull {
            table: (*table).to_string(),
            sys_id: (*sys_id).to_string(),
        },
        ("pull", _) => return Err(ParseError::Usage("pull <table> <sys_id>")),
        ("pull-id", [sys_id]) => Command::PullId {
            sys_id: (*sys_id).to_string(),
        },
        ("pull-id", _) => return Err(ParseError::Usage("pull-id <sys_id>")),
        ("push", [sys_id]) => Command::Push {
            sys_id: (*sys_id).to_string(),
        },
        ("push", _) => return Err(ParseError::Usage("push <sys_id>")),
        ("status", [sys_id]) => Command::Status {
            sys_id: (*sys_id).to_string(),
        },
        ("status", _) => return Err(ParseError::Usage("status <sys_id>")),
        ("validate", [sys_id]) => Command::Validate {
            sys_id: (*sys_id).to_string(),
        },
        ("validate", _) => return Err(ParseError::Usage("validate <sys_id>")),
        ("cleanup", rest) => parse_cleanup(rest)?,
        ("list" | "ls", []) => Command::List,
        ("tables", []) => Command::Tables,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit", []) => Command::Quit,
        ("list" | "ls" | "tables" | "quit" | "exit", _) => {
            return Err(ParseError::Usage("this command takes no arguments"))
        }
        (other, _) => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(Some(command))
}

fn parse_cleanup(args: &[&str]) -> Result<Command, ParseError> {
    const USAGE: &str = "cleanup <sys_id> [--force]";
    let mut sys_id = None;
    let mut force = false;
    for arg in args {
        match *arg {
            "--force" | "-f" => force = true,
            flag if flag.starts_with('-') => return Err(ParseError::Usage(USAGE)),
            id if sys_id.is_none() => sys_id = Some(id.to_string()),
            _ => return Err(ParseError::Usage(USAGE)),
        }
    }
    sys_id
        .map(|sys_id| Command::Cleanup { sys_id, force })
        .ok_or(ParseError::Usage(USAGE))
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pull { table, sys_id } => write!(f, "pull {table} {sys_id}"),
            Self::PullId { sys_id } => write!(f, "pull-id {sys_id}"),
            Self::Push { sys_id } => write!(f, "push {sys_id}"),
            Self::Status { sys_id } => write!(f, "status {sys_id}"),
            Self::Validate { sys_id } => write!(f, "validate {sys_id}"),
            Self::List => f.write_str("list"),
            Self::Cleanup { sys_id, force } => {
                write!(f, "cleanup {sys_id}{}", if *force { " --force" } else { "" })
            }
            Self::Tables => f.write_str("tables"),
            Self::Help => f.write_str("help"),
            Self::Quit => f.write_str("quit"),
        }
    }
}
