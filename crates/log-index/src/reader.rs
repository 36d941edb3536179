//! 오프셋 기반 엔트리 재읽기
//!
//! [`EntryReader`]는 집계 트리에 기록된 바이트 오프셋으로 이동한 뒤 라인을 읽어
//! 원본 로그 엔트리를 재조립합니다. 파일 전체를 메모리에 올리지 않습니다.
//!
//! # 재조립 규칙
//! - 타임스탬프 라인이 새 엔트리를 시작합니다.
//! - 타임스탬프가 없는 라인은 직전 엔트리의 메시지에 `\n`으로 이어 붙습니다.
//! - 첫 타임스탬프 라인 이전의 라인들은 id가 빈 문자열이고 심각도가 `None`인 엔트리가 됩니다.
//! - 스트림 끝에 걸친 엔트리도 반환됩니다.

use std::io::{BufRead, BufReader, SeekFrom};

use logscope_core::metrics as m;
use logscope_core::parser::ReadSeek;
use logscope_core::types::{LogEntry, Severity};
use tracing::debug;

use crate::error::LogIndexError;
use crate::parser::strip_bom;
use crate::parser::text::{LineMatcher, strip_terminator};

/// 조립 중인 엔트리
struct PendingEntry {
    id: String,
    severity: Severity,
    lines: Vec<String>,
}

impl PendingEntry {
    fn finish(self) -> LogEntry {
        LogEntry::new(self.id, self.severity, self.lines.join("\n"))
    }
}

/// 텍스트 로그 엔트리 재읽기
pub struct EntryReader<'a> {
    matcher: &'a LineMatcher,
}

impl<'a> EntryReader<'a> {
    pub fn new(matcher: &'a LineMatcher) -> Self {
        Self { matcher }
    }

    /// `offset`부터 최대 `max_count`개의 엔트리를 파일 순서대로 읽습니다.
    ///
    /// # Errors
    ///
    /// `offset`이 스트림 길이보다 크면 `LogIndexError::OffsetOutOfRange`를 반환합니다.
    /// 오프셋이 스트림 길이와 같으면 빈 결과를 반환합니다.
    pub fn read_entries(
        &self,
        stream: &mut dyn ReadSeek,
        offset: u64,
        max_count: usize,
    ) -> Result<Vec<LogEntry>, LogIndexError> {
        let length = stream.seek(SeekFrom::End(0))?;
        if offset > length {
            return Err(LogIndexError::OffsetOutOfRange { offset, length });
        }
        if max_count == 0 {
            return Ok(Vec::new());
        }

        stream.seek(SeekFrom::Start(offset))?;
        let mut reader = BufReader::new(stream);
        let mut entries = Vec::with_capacity(max_count.min(1024));
        let mut pending: Option<PendingEntry> = None;
        let mut buf = Vec::with_capacity(256);
        let mut at_file_start = offset == 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let mut raw = strip_terminator(&buf);
            if std::mem::take(&mut at_file_start) {
                raw = strip_bom(raw);
            }
            let line = String::from_utf8_lossy(raw).into_owned();

            match self.matcher.match_line(&line) {
                Some(found) => {
                    let next = PendingEntry {
                        id: found.token().to_owned(),
                        severity: found.severity(),
                        lines: Vec::new(),
                    };
                    if let Some(done) = pending.replace(next) {
                        entries.push(done.finish());
                        if entries.len() == max_count {
                            pending = None;
                            break;
                        }
                    }
                }
                None if pending.is_none() => {
                    pending = Some(PendingEntry {
                        id: String::new(),
                        severity: Severity::None,
                        lines: Vec::new(),
                    });
                }
                None => {}
            }

            if let Some(entry) = pending.as_mut() {
                entry.lines.push(line);
            }
        }

        if let Some(last) = pending {
            entries.push(last.finish());
        }

        metrics::counter!(m::READER_ENTRIES_READ_TOTAL).increment(entries.len() as u64);
        debug!(offset, max_count, returned = entries.len(), "entries re-read");
        Ok(entries)
    }
}
