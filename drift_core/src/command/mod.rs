//! Command parsing and dispatch - the player-facing surface of the engine.

mod session;

pub use session::*;

use thiserror::Error;

/// A raw line that could not be tokenized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Malformed command.")]
    Malformed,
}

/// A parsed player command.
///
/// Argument presence is checked by the handlers so each command can answer
/// with its own usage line, the way the shell talks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Scan,
    Connect(Option<String>),
    Ls,
    Cat(Option<String>),
    Download(Option<String>),
    Run(Option<String>),
    Decode {
        cipher: Option<String>,
        payload: Option<String>,
    },
    Inventory,
    Profile,
    Log,
    Home,
    Save,
    Load,
    Exfiltrate,
    Restore,
    Quit,
    Unknown(String),
}

impl Command {
    /// Tokenize a raw input line (shell-style quoting) and resolve the
    /// command word, honoring the shorthand aliases. Blank lines parse to
    /// `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let tokens = shlex::split(line).ok_or(ParseError::Malformed)?;
        let mut tokens = tokens.into_iter();
        let Some(word) = tokens.next() else {
            return Ok(None);
        };
        let args: Vec<String> = tokens.collect();
        let first = args.first().cloned();

        let command = match word.to_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "scan" => Command::Scan,
            "connect" | "go" => Command::Connect(first),
            "ls" => Command::Ls,
            "cat" | "read" => Command::Cat(first),
            "download" => Command::Download(first),
            "run" => Command::Run(first),
            "decode" => {
                let mut args = args.into_iter();
                let cipher = args.next();
                let payload = args.collect::<Vec<_>>().join(" ");
                let payload = payload.trim().to_string();
                Command::Decode {
                    cipher,
                    payload: if payload.is_empty() { None } else { Some(payload) },
                }
            }
            "inventory" | "inv" => Command::Inventory,
            "profile" => Command::Profile,
            "log" => Command::Log,
            "home" => Command::Home,
            "save" => Command::Save,
            "load" => Command::Load,
            "exfiltrate" => Command::Exfiltrate,
            "restore" => Command::Restore,
            "quit" | "exit" | "q" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        };
        Ok(Some(command))
    }
}
