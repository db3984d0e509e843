//! Operator Console
//!
//! Reads commands line by line and dispatches them into the
//! [`ResolutionService`]. The binary wires it to stdin/stdout; tests drive it
//! with in-memory buffers.

mod command;

pub use command::{parse_command, Command, USAGE};

use std::ops::ControlFlow;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::info;

use crate::cache::timestamp_to_utc;
use crate::service::{Outcome, ResolutionService};

/// Why [`run_console`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleEnd {
    /// The operator typed `exit`
    Exit,
    /// The input reached end of file
    InputClosed,
}

/// Runs the console until `exit` or end of input.
///
/// Lines are decoded leniently: bytes that are not valid UTF-8 become
/// replacement characters and the line is handled like any other.
pub async fn run_console<R, W>(
    mut reader: R,
    mut writer: W,
    service: &ResolutionService,
) -> std::io::Result<ConsoleEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer.write_all(format!("{}\n", USAGE).as_bytes()).await?;
    writer.flush().await?;

    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }

        let reply = match parse_command(&line) {
            Ok(command) => execute(service, command).await,
            Err(e) => ControlFlow::Continue(e.to_string()),
        };

        let (message, end) = match reply {
            ControlFlow::Continue(message) => (message, false),
            ControlFlow::Break(message) => (message, true),
        };
        writer.write_all(format!("{}\n", message).as_bytes()).await?;
        writer.flush().await?;
        if end {
            return Ok(ConsoleEnd::Exit);
        }
    }

    info!("Console input closed");
    Ok(ConsoleEnd::InputClosed)
}

/// Executes one command and returns the text to show the operator.
///
/// `Break` carries the farewell message of `exit`.
pub async fn execute(service: &ResolutionService, command: Command) -> ControlFlow<String, String> {
    let message = match command {
        Command::ClearCache => {
            let removed = service.clear().await;
            format!("Cache cleared ({} entries removed).", removed)
        }
        Command::ShowCache => render_entries(service).await,
        Command::Stats => {
            let report = service.report().await;
            format!(
                "entries={} bytes={}/{} ttl={}ms hits={} misses={} admitted={} rejected={} swept={}",
                report.total_entries,
                report.total_bytes,
                report.max_total_bytes,
                report.ttl_ms,
                report.stats.hits,
                report.stats.misses,
                report.stats.admitted,
                report.stats.rejected,
                report.stats.swept,
            )
        }
        Command::Remove(key) => match service.remove(&key).await {
            Ok(()) => format!("Removed '{}' from the cache.", key),
            Err(e) => e.to_string(),
        },
        Command::SetExpiration(ttl) => {
            service.set_expiration(ttl).await;
            format!("Global expiration set to {} ms.", ttl.as_millis())
        }
        Command::SetExpirationFile(key, requested) => {
            match service.set_expiration_file(&key, requested).await {
                Ok(()) => format!("Expiration window for '{}' restarted.", key),
                Err(e) => e.to_string(),
            }
        }
        Command::Run(key) => match service.resolve(&key).await {
            Ok(resolution) => {
                let how = match resolution.outcome {
                    Outcome::Hit => "served from cache".to_string(),
                    Outcome::Cached => "fetched from upstream and cached".to_string(),
                    Outcome::NotCached { reason } => {
                        format!("fetched from upstream, not cached: {}", reason)
                    }
                };
                format!("'{}': {} bytes, {}.", key, resolution.payload.len(), how)
            }
            Err(e) => e.to_string(),
        },
        Command::Help => USAGE.to_string(),
        Command::Exit => return ControlFlow::Break("Shutting down proxy...".to_string()),
        Command::Unknown(input) => format!("Unknown command: {}", input),
    };

    ControlFlow::Continue(message)
}

async fn render_entries(service: &ResolutionService) -> String {
    let entries = service.show().await;
    if entries.is_empty() {
        return "Cache is empty.".to_string();
    }

    let mut out = String::from("Cache contents:");
    for entry in entries {
        out.push_str(&format!(
            "\n - {} ({} bytes, stored {}, {})",
            entry.key,
            entry.size,
            timestamp_to_utc(entry.stored_at).to_rfc3339(),
            if entry.fresh { "fresh" } else { "stale" }
        ));
    }
    out
}
