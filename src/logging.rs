//! Tracing subscriber setup for the CLI.
//!
//! Diagnostics go to stderr so generator output and the run summary on stdout
//! stay clean. `GENDATA_LOG` takes an `EnvFilter` directive and wins over the
//! `--log-level` flag.
use anyhow::{anyhow, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable holding an explicit filter directive.
pub const LOG_ENV: &str = "GENDATA_LOG";

const LEVELS: &[&str] = &["trace", "debug", "info", "warn", "warning", "error", "off"];

/// Install the global subscriber. Call once, before any work is done.
pub fn init_logging(level: &str) -> Result<()> {
    let filter = build_filter(level, std::env::var(LOG_ENV).ok().as_deref())?;
    Registry::default()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .try_init()
        .map_err(|err| anyhow!("initialize logging: {err}"))
}

fn build_filter(level: &str, env: Option<&str>) -> Result<EnvFilter> {
    if let Some(directive) = env.filter(|directive| !directive.trim().is_empty()) {
        return EnvFilter::try_new(directive)
            .map_err(|err| anyhow!("invalid {LOG_ENV} value {directive:?}: {err}"));
    }
    let normalized = level.trim().to_ascii_lowercase();
    if !LEVELS.contains(&normalized.as_str()) {
        return Err(anyhow!(
            "invalid log level {level:?} (expected one of trace, debug, info, warn, error, off)"
        ));
    }
    let directive = match normalized.as_str() {
        "warning" => "warn",
        other => other,
    };
    EnvFilter::try_new(directive).map_err(|err| anyhow!("invalid log level {level:?}: {err}"))
}
