//! 로그 세션 -- 현재 열린 로그 파일과 그 집계 트리
//!
//! [`LogSession`]은 파일을 열어 트리를 구축하고, 이후 질의와 재읽기를 같은 파서로 처리합니다.
//! 트리는 `Arc`로 공유되며, 새 파일 열기가 성공했을 때만 교체됩니다.
//! 파싱이 실패하면 이전 트리가 그대로 남습니다.
//!
//! # 사용 예시
//! ```no_run
//! use logscope_log_index::{IndexConfig, LogSession};
//!
//! # fn example() -> Result<(), logscope_core::LogscopeError> {
//! let mut session = LogSession::new(IndexConfig::default())?;
//! let log = session.open("/var/log/app.log")?;
//! println!("{} events", log.tree.total_count());
//!
//! if let Some(view) = session.view() {
//!     for bucket in view.buckets() {
//!         let entries = session.read_entries(bucket.offset, None)?;
//!         println!("{bucket}: {} entries", entries.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use logscope_core::error::{LogscopeError, ReadError};
use logscope_core::types::LogEntry;
use logscope_core::{TimelineTree, TimelineView};
use tracing::{debug, info, warn};

use crate::config::IndexConfig;
use crate::error::LogIndexError;
use crate::parser::{LogFormat, ParserSelector};

/// 파싱이 끝난 로그 파일
#[derive(Debug)]
pub struct OpenedLog {
    pub path: PathBuf,
    pub format: LogFormat,
    pub tree: Arc<TimelineTree>,
}

/// 로그 세션
#[derive(Debug)]
pub struct LogSession {
    selector: ParserSelector,
    config: IndexConfig,
    current: Option<Arc<OpenedLog>>,
}

impl LogSession {
    pub fn new(config: IndexConfig) -> Result<Self, LogIndexError> {
        Ok(Self {
            selector: ParserSelector::with_config(&config)?,
            config,
            current: None,
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// 현재 열린 로그
    pub fn current(&self) -> Option<Arc<OpenedLog>> {
        self.current.clone()
    }

    /// 파일을 열어 트리를 구축하고 현재 로그로 교체합니다.
    ///
    /// # Errors
    ///
    /// 파일을 열 수 없거나 파싱에 실패하면 에러를 반환하며, 이전 로그는 유지됩니다.
    pub fn open(&mut self, path: impl AsRef<Path>) -> Result<Arc<OpenedLog>, LogscopeError> {
        let path = path.as_ref();
        let format = LogFormat::from_path(path);
        let parser = self.selector.parser_for(format);
        debug!(path = %path.display(), %format, "opening log file");

        let mut file = File::open(path)?;
        let tree = parser.parse_and_build_tree(&mut file).inspect_err(|e| {
            warn!(path = %path.display(), error = %e, "failed to index log file, keeping previous tree");
        })?;

        let opened = Arc::new(OpenedLog {
            path: path.to_path_buf(),
            format,
            tree: Arc::new(tree),
        });
        info!(
            path = %path.display(),
            %format,
            events = opened.tree.total_count(),
            "log file opened"
        );
        self.current = Some(Arc::clone(&opened));
        Ok(opened)
    }

    /// 현재 트리의 탐색 뷰. 설정에 따라 자동 줌이 적용됩니다.
    pub fn view(&self) -> Option<TimelineView> {
        let log = self.current.as_ref()?;
        let tree = Arc::clone(&log.tree);
        Some(if self.config.auto_zoom {
            TimelineView::auto_zoomed(tree, self.config.auto_zoom_floor)
        } else {
            TimelineView::new(tree)
        })
    }

    /// 현재 로그 파일을 다시 열어 `offset`부터 엔트리를 읽습니다.
    ///
    /// `max_count`가 `None`이면 설정의 `max_entries`를 사용합니다.
    pub fn read_entries(
        &self,
        offset: u64,
        max_count: Option<usize>,
    ) -> Result<Vec<LogEntry>, LogscopeError> {
        let log = self.current.as_ref().ok_or(ReadError::NoOpenLog)?;
        let parser = self.selector.parser_for(log.format);
        let mut file = File::open(&log.path)?;
        parser.read_entries(
            &mut file,
            offset,
            max_count.unwrap_or(self.config.max_entries),
        )
    }

    /// 뷰에서 선택한 버킷의 엔트리를 읽습니다. 보이지 않는 타임스탬프면 빈 결과입니다.
    pub fn read_bucket(
        &self,
        view: &TimelineView,
        selected: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>, LogscopeError> {
        match view.bucket_at(selected) {
            Some(bucket) => self.read_entries(bucket.offset, None),
            None => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn open_builds_tree_and_view() {
        let log = write_log(
            ".log",
            "2024-03-01 10:00:00 INFO a\n2024-03-01 11:00:00 INFO b\n",
        );
        let mut session = LogSession::new(IndexConfig::default()).unwrap();
        let opened = session.open(log.path()).unwrap();
        assert_eq!(opened.format, LogFormat::Text);
        assert_eq!(opened.tree.total_count(), 2);

        let view = session.view().unwrap();
        assert_eq!(view.level(), logscope_core::TimeLevel::Hour);
    }

    #[test]
    fn failed_open_keeps_previous_tree() {
        let good = write_log(".log", "2024-03-01 10:00:00 INFO a\n");
        let bad = write_log(".log", "2024-13-01 10:00:00 INFO a\n");

        let mut session = LogSession::new(IndexConfig::default()).unwrap();
        let first = session.open(good.path()).unwrap();
        assert!(session.open(bad.path()).is_err());

        let current = session.current().unwrap();
        assert!(Arc::ptr_eq(&first, &current));
    }

    #[test]
    fn read_without_open_log_fails() {
        let session = LogSession::new(IndexConfig::default()).unwrap();
        let err = session.read_entries(0, None).unwrap_err();
        assert!(matches!(err, LogscopeError::Read(ReadError::NoOpenLog)));
    }

    #[test]
    fn read_bucket_uses_bucket_offset() {
        let log = write_log(
            ".log",
            "2024-03-01 10:00:00 INFO a\n2024-03-02 10:00:00 WARN b\n  more\n",
        );
        let config = IndexConfig {
            auto_zoom: false,
            ..IndexConfig::default()
        };
        let mut session = LogSession::new(config).unwrap();
        session.open(log.path()).unwrap();

        let mut view = session.view().unwrap();
        view.zoom_in(view.buckets()[0].timestamp).unwrap();
        view.zoom_in(view.buckets()[0].timestamp).unwrap();
        let second_day = view.buckets()[1].timestamp;

        let entries = session.read_bucket(&view, second_day).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "2024-03-02 10:00:00 WARN b\n  more");
    }
}
