//! Command handlers -- one module per subcommand

pub mod config;
pub mod entries;
pub mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use logscope_core::config::LogscopeConfig;
use logscope_log_index::{IndexConfig, LogSession, OpenedLog};

use crate::error::CliError;

/// Load the effective configuration.
///
/// Without `--config` the defaults plus `LOGSCOPE_*` environment overrides are used.
pub async fn load_config(path: Option<&Path>) -> Result<LogscopeConfig, CliError> {
    let config = match path {
        Some(path) => LogscopeConfig::load(path).await?,
        None => {
            debug!("no config file given, using defaults and environment");
            LogscopeConfig::from_env()?
        }
    };
    Ok(config)
}

/// Open and index a log file on the blocking pool.
pub(crate) async fn open_log(
    config: IndexConfig,
    path: PathBuf,
) -> Result<(LogSession, Arc<OpenedLog>), CliError> {
    tokio::task::spawn_blocking(move || -> Result<_, CliError> {
        let mut session = LogSession::new(config)?;
        let opened = session.open(&path)?;
        Ok((session, opened))
    })
    .await
    .map_err(|e| CliError::Command(format!("indexing task failed: {e}")))?
}
