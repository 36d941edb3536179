//! Logging initialization for the logscope CLI.
//!
//! Configures `tracing-subscriber` from the `[general]` section of `LogscopeConfig`.
//! Logs always go to stderr so stdout only carries command output.

use anyhow::Result;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use logscope_core::config::GeneralConfig;

/// Pick the filter directive: `--log-level`, then `RUST_LOG`, then `general.log_level`.
fn build_filter(config: &GeneralConfig, level_override: Option<&str>) -> EnvFilter {
    match level_override {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
    }
}

/// Initialize the global tracing subscriber.
///
/// Must be called once, before any command runs.
///
/// # Formats
///
/// * `"json"` - JSON lines
/// * `"pretty"` - Human-readable multi-line output
pub fn init_tracing(config: &GeneralConfig, level_override: Option<&str>) -> Result<()> {
    let fmt_layer = match config.log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        "pretty" => tracing_subscriber::fmt::layer()
            .pretty()
            .with_writer(std::io::stderr)
            .boxed(),
        other => {
            anyhow::bail!("unknown log format '{other}', expected 'json' or 'pretty'");
        }
    };

    tracing_subscriber::registry()
        .with(build_filter(config, level_override))
        .with(fmt_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing subscriber: {e}"))?;

    Ok(())
}
