//! vfsbus CLI — replay event logs against an in-memory file tree.
//!
//! Input is newline-delimited JSON, one `{eventType, data}` record per line.
//! Events the tree emits (content responses on the server side) are written
//! to stdout in the same format, so a server replay can be piped straight
//! into a client replay:
//!
//! ```bash
//! vfsbus replay session.ndjson | vfsbus replay --role client --dump
//! ```

pub mod config;

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use vfsbus_kernel::{
    EventEmitter, EventType, MemoryVirtualFile, NodeKind, Outcome, Role, TopicBus, VfsEvent,
};

/// Command-line interface.
#[derive(Debug, Parser)]
#[command(name = "vfsbus", version, about = "Replay virtual file events")]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/vfsbus/config.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply an NDJSON event log to an empty in-memory tree.
    Replay {
        /// Dispatch rules: `server` or `client`.
        #[arg(long)]
        role: Option<Role>,
        /// Print the final tree after replaying.
        #[arg(long)]
        dump: bool,
        /// Log every published event.
        #[arg(long)]
        echo: bool,
        /// Event log; stdin when absent or `-`.
        input: Option<PathBuf>,
    },
    /// List every event topic.
    Topics,
}

/// Options for a single replay.
#[derive(Debug, Clone, Default)]
pub struct ReplayOptions {
    pub role: Role,
    pub dump: bool,
    pub echo_published: bool,
}

/// Counts from a replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaySummary {
    pub events: usize,
    pub applied: usize,
    pub responded: usize,
    pub ignored: usize,
    pub failed: usize,
    pub malformed: usize,
}

/// Replay every event in `input`, writing emitted events (and the tree
/// with `dump`) to `out`.
///
/// Malformed lines and failed applications are logged and counted; they
/// don't stop the replay.
pub async fn replay<R, W>(input: R, out: &mut W, opts: &ReplayOptions) -> Result<ReplaySummary>
where
    R: BufRead,
    W: Write,
{
    let bus = TopicBus::new();
    let (emit_tx, mut emitted) = mpsc::unbounded_channel();
    let emitter = EventEmitter::with_bus(bus.clone(), move |event| {
        // Receiver lives until the end of this function.
        let _ = emit_tx.send(event);
    });
    let vfs = MemoryVirtualFile::new(emitter);

    if opts.echo_published {
        for kind in EventType::ALL {
            bus.subscribe(kind.topic(), |event: &VfsEvent| {
                tracing::info!(
                    event_type = %event.event_type(),
                    path = event.virtual_path().unwrap_or(""),
                    "published"
                );
            });
        }
    }

    let mut summary = ReplaySummary::default();
    for (index, raw) in input.split(b'\n').enumerate() {
        let line_no = index + 1;
        let raw = raw.with_context(|| format!("reading line {line_no}"))?;
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping line that isn't UTF-8");
                summary.malformed += 1;
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let event = match VfsEvent::from_json(trimmed) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "skipping malformed event");
                summary.malformed += 1;
                continue;
            }
        };

        summary.events += 1;
        match opts.role.exec(&event, &vfs).await {
            Ok(Outcome::Applied) => summary.applied += 1,
            Ok(Outcome::Responded) => summary.responded += 1,
            Ok(Outcome::Ignored) => summary.ignored += 1,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "event failed");
                summary.failed += 1;
            }
        }

        while let Ok(response) = emitted.try_recv() {
            let json = response.to_json().context("serializing emitted event")?;
            writeln!(out, "{json}").context("writing emitted event")?;
        }
    }

    if opts.dump {
        for entry in vfs.entries().await {
            match entry.kind {
                NodeKind::Directory => writeln!(out, "d {}", entry.path.display())?,
                NodeKind::File => {
                    writeln!(out, "f {} ({} bytes)", entry.path.display(), entry.size)?
                }
            }
        }
    }

    out.flush()?;
    Ok(summary)
}

/// Write every topic, one per line.
pub fn write_topics<W: Write>(out: &mut W) -> Result<()> {
    for kind in EventType::ALL {
        writeln!(out, "{kind}")?;
    }
    Ok(())
}
