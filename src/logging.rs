//! Tracing subscriber setup

use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AstroViewConfig;

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over the configured level; `verbose` raises
/// the default to `debug`.
pub fn init_logging(config: &AstroViewConfig, verbose: bool) -> Result<()> {
    let level = if verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };

    let filter = EnvFilter::builder()
        .with_default_directive(
            level
                .parse()
                .with_context(|| format!("Invalid log level '{level}'"))?,
        )
        .from_env_lossy();

    let json = config.logging.format == "json";

    if config.logging.output == "file" {
        let path = config.log_file();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("Failed to open log file {}", path.display()))?;
        let writer = Mutex::new(file);

        if json {
            let layer = fmt::layer().json().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        } else {
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            tracing_subscriber::registry().with(filter).with(layer).try_init()?;
        }
    } else if json {
        let layer = fmt::layer().json().with_writer(std::io::stderr);
        tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    } else {
        let layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
        tracing_subscriber::registry().with(filter).with(layer).try_init()?;
    }

    Ok(())
}
