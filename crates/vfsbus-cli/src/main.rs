//! vfsbus entry point.
//!
//! ```bash
//! cargo run -p vfsbus-cli -- replay --role server session.ndjson
//! ```

use std::io::Cursor;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vfsbus_cli::config::Config;
use vfsbus_cli::{replay, write_topics, Cli, Command, ReplayOptions};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // RUST_LOG wins over the config file.
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log)
            .with_context(|| format!("invalid log filter: {}", config.log))?,
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Command::Topics => write_topics(&mut out),
        Command::Replay {
            role,
            dump,
            echo,
            input,
        } => {
            let opts = ReplayOptions {
                role: role.unwrap_or(config.role),
                dump,
                echo_published: echo || config.echo_published,
            };
            tracing::debug!(role = %opts.role, "starting replay");

            // Read through tokio so the runtime worker never blocks on stdin or disk.
            let bytes = match input.filter(|p| p.as_os_str() != "-") {
                Some(path) => tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("opening event log: {}", path.display()))?,
                None => {
                    let mut buf = Vec::new();
                    tokio::io::stdin()
                        .read_to_end(&mut buf)
                        .await
                        .context("reading events from stdin")?;
                    buf
                }
            };
            let summary = replay(Cursor::new(bytes), &mut out, &opts).await?;

            tracing::info!(
                events = summary.events,
                applied = summary.applied,
                responded = summary.responded,
                ignored = summary.ignored,
                failed = summary.failed,
                malformed = summary.malformed,
                "replay complete"
            );
            Ok(())
        }
    }
}
