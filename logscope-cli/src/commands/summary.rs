//! `logscope summary` command handler

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use logscope_core::config::LogscopeConfig;
use logscope_core::types::TimeBucket;
use logscope_core::{TimeLevel, TimelineView};
use logscope_log_index::{IndexConfig, OpenedLog};

use crate::cli::SummaryArgs;
use crate::commands::open_log;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Width of the longest histogram bar in text output.
const BAR_WIDTH: u64 = 40;

/// Execute the `summary` command.
pub async fn execute(
    args: SummaryArgs,
    config: &LogscopeConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let (_session, opened) = open_log(IndexConfig::from_core(&config.index), args.file).await?;

    let tree = Arc::clone(&opened.tree);
    let view = match args.level {
        Some(level) => TimelineView::at_level(tree, level, args.scope),
        None if args.auto_zoom || config.index.auto_zoom => {
            TimelineView::auto_zoomed(tree, config.index.auto_zoom_floor)
        }
        None => TimelineView::new(tree),
    };

    let report = SummaryReport::build(&opened, &view);
    info!(
        file = %report.file,
        level = %report.level,
        buckets = report.buckets.len(),
        "summary ready"
    );
    writer.render(&report)
}

/// Axis range of the visible buckets.
#[derive(Debug, Serialize)]
pub struct RangeReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Bucket counts at one level.
#[derive(Debug, Serialize)]
pub struct SummaryReport {
    pub file: String,
    pub format: String,
    pub level: TimeLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<DateTime<Utc>>,
    /// Events in the whole file
    pub total_events: u64,
    /// Events inside the visible buckets
    pub visible_events: u64,
    pub range: Option<RangeReport>,
    pub buckets: Vec<TimeBucket>,
}

impl SummaryReport {
    pub fn build(opened: &OpenedLog, view: &TimelineView) -> Self {
        let buckets = view.buckets();
        Self {
            file: opened.path.display().to_string(),
            format: opened.format.to_string(),
            level: view.level(),
            scope: view.context(),
            total_events: opened.tree.total_count(),
            visible_events: buckets.iter().map(|b| b.count).sum(),
            range: view
                .date_range()
                .map(|(start, end)| RangeReport { start, end }),
            buckets,
        }
    }
}

fn bar(count: u64, max: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let len = (count * BAR_WIDTH).div_ceil(max);
    "#".repeat(len as usize)
}

impl Render for SummaryReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Log: {} ({})", self.file.bold(), self.format)?;
        write!(w, "  Level: {}", self.level.to_string().cyan())?;
        if let Some(scope) = self.scope {
            write!(w, "  Scope: {}", scope.format("%Y-%m-%dT%H:%M:%S%.3fZ"))?;
        }
        writeln!(w)?;
        writeln!(
            w,
            "  Events: {} visible / {} total",
            self.visible_events.to_string().bold(),
            self.total_events
        )?;
        if let Some(range) = &self.range {
            writeln!(
                w,
                "  Range: {} .. {}",
                range.start.format("%Y-%m-%d %H:%M:%S"),
                range.end.format("%Y-%m-%d %H:%M:%S")
            )?;
        }
        writeln!(w)?;

        if self.buckets.is_empty() {
            writeln!(w, "  {}", "(no events)".dimmed())?;
            return Ok(());
        }

        writeln!(w, "{:<26} {:>10} {:>20}", "BUCKET", "COUNT", "OFFSET")?;
        writeln!(w, "{}", "-".repeat(58))?;

        let max = self.buckets.iter().map(|b| b.count).max().unwrap_or(0);
        for bucket in &self.buckets {
            writeln!(
                w,
                "{:<26} {:>10} {:>20}  {}",
                bucket.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
                bucket.count,
                bucket.offset,
                bar(bucket.count, max).green()
            )?;
        }

        Ok(())
    }
}
