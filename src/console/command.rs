//! Console command parsing.

use std::time::Duration;

use crate::error::{ProxyError, Result};

/// Usage text printed by `help` and before the first prompt.
pub const USAGE: &str = "Commands: clear-cache, show-cache, stats, remove <key>, \
set-expiration <ms>, set-expiration-file <key> <ms>, run <key>, help, exit";

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    ClearCache,
    ShowCache,
    Stats,
    Remove(String),
    SetExpiration(Duration),
    SetExpirationFile(String, Duration),
    Run(String),
    Help,
    Exit,
    /// Input that names no known command
    Unknown(String),
}

/// Parses one console line.
///
/// Known commands with missing or malformed arguments fail with
/// [`ProxyError::InvalidCommand`]; unrecognised words yield
/// [`Command::Unknown`].
pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "clear-cache" => Command::ClearCache,
        "show-cache" => Command::ShowCache,
        "stats" => Command::Stats,
        "help" => Command::Help,
        "exit" => Command::Exit,
        "remove" => Command::Remove(single_key(rest, "remove <key>")?),
        "run" => Command::Run(single_key(rest, "run <key>")?),
        "set-expiration" => Command::SetExpiration(millis(rest, "set-expiration <ms>")?),
        "set-expiration-file" => {
            let usage = "set-expiration-file <key> <ms>";
            let mut args = rest.split_whitespace();
            match (args.next(), args.next(), args.next()) {
                (Some(key), Some(ms), None) => {
                    Command::SetExpirationFile(key.to_string(), millis(ms, usage)?)
                }
                _ => return Err(usage_error(usage)),
            }
        }
        _ => Command::Unknown(line.to_string()),
    };

    Ok(command)
}

fn single_key(rest: &str, usage: &str) -> Result<String> {
    if rest.is_empty() || rest.contains(char::is_whitespace) {
        return Err(usage_error(usage));
    }
    Ok(rest.to_string())
}

fn millis(raw: &str, usage: &str) -> Result<Duration> {
    raw.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|_| usage_error(usage))
}

fn usage_error(usage: &str) -> ProxyError {
    ProxyError::InvalidCommand(format!("usage: {}", usage))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_commands() {
        assert_eq!(parse_command("clear-cache").unwrap(), Command::ClearCache);
        assert_eq!(parse_command("  SHOW-CACHE \n").unwrap(), Command::ShowCache);
        assert_eq!(parse_command("stats").unwrap(), Command::Stats);
        assert_eq!(parse_command("exit").unwrap(), Command::Exit);
        assert_eq!(parse_command("help").unwrap(), Command::Help);
    }

    #[test]
    fn test_parse_key_commands() {
        assert_eq!(
            parse_command("remove a.txt").unwrap(),
            Command::Remove("a.txt".to_string())
        );
        assert_eq!(
            parse_command("run docs/index.html").unwrap(),
            Command::Run("docs/index.html".to_string())
        );
    }

    #[test]
    fn test_parse_expiration_commands() {
        assert_eq!(
            parse_command("set-expiration 5000").unwrap(),
            Command::SetExpiration(Duration::from_millis(5000))
        );
        assert_eq!(
            parse_command("set-expiration-file a.txt 250").unwrap(),
            Command::SetExpirationFile("a.txt".to_string(), Duration::from_millis(250))
        );
    }

    #[test]
    fn test_parse_usage_errors() {
        for line in [
            "remove",
            "run   ",
            "remove a b",
            "set-expiration",
            "set-expiration soon",
            "set-expiration -5",
            "set-expiration-file a.txt",
            "set-expiration-file a.txt x",
            "set-expiration-file a.txt 1 2",
        ] {
            assert!(
                matches!(parse_command(line), Err(ProxyError::InvalidCommand(_))),
                "expected usage error for {:?}",
                line
            );
        }
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(
            parse_command("flush everything").unwrap(),
            Command::Unknown("flush everything".to_string())
        );
        assert_eq!(parse_command("").unwrap(), Command::Unknown(String::new()));
    }
}
