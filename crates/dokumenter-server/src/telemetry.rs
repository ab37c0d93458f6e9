//! Tracing setup.
//!
//! Stdout gets JSON lines filtered by `RUST_LOG`. Events on the
//! `secure_log` target carry citizen data and downstream payloads; they never
//! go to stdout and are written to `SECURE_LOG_PATH` when it is set.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::filter::{filter_fn, Targets};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

pub const SECURE_LOG_TARGET: &str = "secure_log";

pub fn init(secure_log_path: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let stdout = fmt::layer()
        .json()
        .with_filter(filter_fn(|meta| meta.target() != SECURE_LOG_TARGET))
        .with_filter(env_filter);

    let secure = match secure_log_path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open secure log {}", path.display()))?;
            Some(
                fmt::layer()
                    .json()
                    .with_writer(Mutex::new(file))
                    .with_filter(Targets::new().with_target(SECURE_LOG_TARGET, LevelFilter::DEBUG)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout)
        .with(secure)
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(())
}
