//! `logscope entries` command handler

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use logscope_core::TimelineView;
use logscope_core::config::LogscopeConfig;
use logscope_core::types::{LogEntry, Severity};
use logscope_log_index::{IndexConfig, LogFormat, ParserSelector};

use crate::cli::EntriesArgs;
use crate::commands::open_log;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `entries` command.
///
/// `--offset` reads without indexing the file; `--at` indexes it first to find the bucket offset.
pub async fn execute(
    args: EntriesArgs,
    config: &LogscopeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let index_config = IndexConfig::from_core(&config.index);
    let max = args.max.unwrap_or(index_config.max_entries);

    let (offset, entries) = match (args.offset, args.at) {
        (Some(offset), _) => {
            let entries = read_at_offset(index_config, args.file.clone(), offset, max).await?;
            (offset, entries)
        }
        (None, Some(at)) => {
            let (session, opened) = open_log(index_config, args.file.clone()).await?;
            let view = TimelineView::at_level(Arc::clone(&opened.tree), args.level, args.scope);
            let bucket = view.bucket_at(at).ok_or_else(|| {
                CliError::Command(format!(
                    "no {} bucket at {}",
                    args.level,
                    at.format("%Y-%m-%dT%H:%M:%S%.3fZ")
                ))
            })?;
            debug!(offset = bucket.offset, count = bucket.count, "bucket located");

            let entries = tokio::task::spawn_blocking(move || {
                session.read_entries(bucket.offset, Some(max))
            })
            .await
            .map_err(|e| CliError::Command(format!("read task failed: {e}")))??;
            (bucket.offset, entries)
        }
        (None, None) => {
            return Err(CliError::Command(
                "either --offset or --at is required".to_owned(),
            ));
        }
    };

    let report = EntriesReport {
        file: args.file.display().to_string(),
        format: LogFormat::from_path(&args.file).to_string(),
        offset,
        entries,
    };
    info!(file = %report.file, offset, returned = report.entries.len(), "entries read");
    writer.render(&report)
}

/// Re-read from a known offset without building a tree.
async fn read_at_offset(
    config: IndexConfig,
    path: PathBuf,
    offset: u64,
    max: usize,
) -> Result<Vec<LogEntry>, CliError> {
    tokio::task::spawn_blocking(move || -> Result<_, CliError> {
        let selector = ParserSelector::with_config(&config)?;
        let parser = selector.select(&path);
        let mut file = File::open(&path)?;
        Ok(parser.read_entries(&mut file, offset, max)?)
    })
    .await
    .map_err(|e| CliError::Command(format!("read task failed: {e}")))?
}

/// Entries re-read from one offset.
#[derive(Debug, Serialize)]
pub struct EntriesReport {
    pub file: String,
    pub format: String,
    pub offset: u64,
    pub entries: Vec<LogEntry>,
}

impl Render for EntriesReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "Entries: {} from offset {} ({} returned)",
            self.file.bold(),
            self.offset,
            self.entries.len()
        )?;

        for entry in &self.entries {
            let tag = format!("{:<7}", entry.severity.to_string());
            let tag = match entry.severity {
                Severity::Fatal | Severity::Error => tag.red().bold(),
                Severity::Warning => tag.yellow(),
                Severity::Info => tag.green(),
                Severity::Debug => tag.blue(),
                Severity::None => tag.dimmed(),
            };
            writeln!(w)?;
            writeln!(w, "{} {}", tag, entry.id.dimmed())?;
            for line in entry.message.lines() {
                writeln!(w, "  {line}")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> EntriesReport {
        EntriesReport {
            file: "app.log".to_owned(),
            format: "text".to_owned(),
            offset: 0,
            entries: vec![
                LogEntry::new(
                    "2024-03-01 10:00:00",
                    Severity::Error,
                    "2024-03-01 10:00:00 ERROR boom\n  at frame",
                ),
                LogEntry::new("", Severity::None, "orphan"),
            ],
        }
    }

    #[test]
    fn test_render_text_indents_message_lines() {
        let mut buffer = Vec::new();
        report().render_text(&mut buffer).expect("render");
        let output = String::from_utf8(buffer).expect("utf8");

        assert!(output.contains("2 returned"));
        assert!(output.contains("  2024-03-01 10:00:00 ERROR boom"));
        assert!(output.contains("    at frame"));
        assert!(output.contains("  orphan"));
    }

    #[test]
    fn test_report_json_shape() {
        let json = serde_json::to_value(report()).expect("serializable");
        assert_eq!(json["offset"], 0);
        assert_eq!(json["entries"][0]["severity"], "error");
        assert_eq!(json["entries"][1]["id"], "");
    }
}
