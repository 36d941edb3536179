//! 텍스트 로그 파서
//!
//! 줄 맨 앞에 `YYYY-MM-DD[ T]HH:MM:SS[.,fff]` 타임스탬프가 있는 라인을 이벤트로 인식합니다.
//! 타임스탬프가 없는 라인은 직전 엔트리의 연속 라인으로 취급되어 트리에는 반영되지 않습니다.
//!
//! # 오프셋 계산
//! 파일 앞부분에서 줄바꿈 길이(`\r\n` = 2, `\n` = 1)를 한 번만 판별하고,
//! 각 라인의 원본 바이트 길이 + 줄바꿈 길이만큼 오프셋을 누적합니다.
//!
//! # 사용 예시
//! ```
//! use logscope_log_index::parser::text::LineMatcher;
//! use logscope_core::Severity;
//!
//! let matcher = LineMatcher::new()?;
//! let m = matcher.match_line("2024-03-01 10:20:30 INFO hello").unwrap();
//! assert_eq!(m.normalized(), "2024-03-01T10:20:30.000Z");
//! assert_eq!(m.severity(), Severity::Info);
//! # Ok::<(), logscope_log_index::LogIndexError>(())
//! ```

use std::io::{BufRead, BufReader, Read, SeekFrom};
use std::time::Instant;

use chrono::{DateTime, NaiveDate, Utc};
use logscope_core::error::{LogscopeError, TimelineError};
use logscope_core::metrics as m;
use logscope_core::parser::{LogFileParser, ReadSeek};
use logscope_core::types::{LogEntry, Severity};
use logscope_core::{TimeLevel, TimelineTree};
use regex::Regex;
use tracing::{debug, info};

use crate::config::IndexConfig;
use crate::error::LogIndexError;
use crate::parser::strip_bom;
use crate::reader::EntryReader;

/// 텍스트 파서 형식 이름
pub const TEXT_FORMAT: &str = "text";

/// 줄 맨 앞 타임스탬프. `\d` 대신 `[0-9]`로 ASCII 숫자만 허용한다.
const TIMESTAMP_PATTERN: &str =
    r"^([0-9]{4})-([0-9]{2})-([0-9]{2})[ T]([0-9]{2}):([0-9]{2}):([0-9]{2})(?:[.,]([0-9]+))?";

const SEVERITY_PATTERN: &str = r"(?i)\b(INFO|WARN(?:ING)?|DEBUG|ERROR|FATAL)\b";

/// 라인 단위 타임스탬프/심각도 인식기
///
/// 트리 구축과 엔트리 재읽기가 공유합니다.
#[derive(Debug, Clone)]
pub struct LineMatcher {
    timestamp: Regex,
    severity: Regex,
}

impl LineMatcher {
    pub fn new() -> Result<Self, LogIndexError> {
        Ok(Self {
            timestamp: Regex::new(TIMESTAMP_PATTERN)?,
            severity: Regex::new(SEVERITY_PATTERN)?,
        })
    }

    /// 라인이 타임스탬프로 시작하면 매칭 결과를 반환합니다.
    pub fn match_line<'a>(&self, line: &'a str) -> Option<LineMatch<'a>> {
        let caps = self.timestamp.captures(line)?;
        let token = caps.get(0)?;

        let mut components = [0i64; 7];
        for (i, slot) in components.iter_mut().take(6).enumerate() {
            *slot = caps.get(i + 1)?.as_str().parse().ok()?;
        }
        components[6] = caps.get(7).map_or(0, |frac| fraction_to_millis(frac.as_str()));

        // 타임스탬프 뒤에서만 찾는다. find_at은 앞 문맥을 보고 \b를 판정한다.
        let severity = self
            .severity
            .find_at(line, token.end())
            .map_or(Severity::None, |s| Severity::from_token(s.as_str()));

        Some(LineMatch {
            token: token.as_str(),
            components,
            severity,
        })
    }
}

/// 소수부를 정확히 3자리로 맞춘 밀리초 값 (뒤를 0으로 채우거나 잘라냄)
fn fraction_to_millis(digits: &str) -> i64 {
    digits
        .bytes()
        .chain(std::iter::repeat(b'0'))
        .take(3)
        .fold(0, |acc, b| acc * 10 + i64::from(b - b'0'))
}

/// 타임스탬프 라인 매칭 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    token: &'a str,
    /// 연, 월, 일, 시, 분, 초, 밀리초
    components: [i64; 7],
    severity: Severity,
}

impl<'a> LineMatch<'a> {
    /// 원본에서 매칭된 타임스탬프 토큰
    pub fn token(&self) -> &'a str {
        self.token
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    /// 정규화된 타임스탬프 문자열 (`YYYY-MM-DDTHH:MM:SS.fffZ`)
    pub fn normalized(&self) -> String {
        let [y, mo, d, h, mi, s, ms] = self.components;
        format!("{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}.{ms:03}Z")
    }

    /// UTC 타임스탬프로 변환합니다.
    ///
    /// # Errors
    ///
    /// 성분이 레벨 범위를 벗어나거나 존재하지 않는 날짜(2월 30일 등)이면
    /// `TimelineError::InvalidTimestampComponent`를 반환합니다.
    pub fn to_datetime(&self) -> Result<DateTime<Utc>, TimelineError> {
        let mut parts = [0; 7];
        for level in TimeLevel::ALL {
            parts[level.depth()] = level.validate(self.components[level.depth()])?;
        }
        // 검증을 통과한 성분은 모두 0 이상이다
        let [_, mo, d, h, mi, s, ms] = parts.map(|p| p.unsigned_abs());

        let date = NaiveDate::from_ymd_opt(parts[0], mo, d).ok_or(
            TimelineError::InvalidTimestampComponent {
                level: TimeLevel::Day,
                value: i64::from(d),
            },
        )?;
        date.and_hms_milli_opt(h, mi, s, ms)
            .map(|naive| naive.and_utc())
            .ok_or(TimelineError::InvalidTimestampComponent {
                level: TimeLevel::Millisecond,
                value: i64::from(ms),
            })
    }
}

/// 라인에서 타임스탬프를 찾아 정규화된 문자열로 반환합니다.
pub fn normalize_timestamp(matcher: &LineMatcher, line: &str) -> Option<String> {
    matcher.match_line(line).map(|m| m.normalized())
}

/// 원본 라인 바이트에서 줄바꿈(`\n`, 그 앞의 `\r` 하나)을 제거합니다.
pub(crate) fn strip_terminator(mut line: &[u8]) -> &[u8] {
    if let Some(rest) = line.strip_suffix(b"\n") {
        line = rest;
    }
    if let Some(rest) = line.strip_suffix(b"\r") {
        line = rest;
    }
    line
}

/// 텍스트 로그 파서
///
/// core의 [`LogFileParser`] trait을 구현합니다.
#[derive(Debug, Clone)]
pub struct TextLogParser {
    matcher: LineMatcher,
    /// 줄바꿈 판별 샘플 크기 (바이트)
    line_break_sample_bytes: usize,
}

impl TextLogParser {
    /// 기본 설정으로 새 파서를 생성합니다.
    pub fn new() -> Result<Self, LogIndexError> {
        Self::with_config(&IndexConfig::default())
    }

    pub fn with_config(config: &IndexConfig) -> Result<Self, LogIndexError> {
        config.validate()?;
        Ok(Self {
            matcher: LineMatcher::new()?,
            line_break_sample_bytes: config.line_break_sample_bytes,
        })
    }

    pub fn matcher(&self) -> &LineMatcher {
        &self.matcher
    }

    /// 파일 앞부분을 샘플링하여 줄바꿈 길이를 판별합니다.
    fn detect_line_break_length(&self, stream: &mut dyn ReadSeek) -> Result<u64, LogIndexError> {
        stream.seek(SeekFrom::Start(0))?;

        let mut sample = Vec::with_capacity(self.line_break_sample_bytes);
        (&mut *stream)
            .take(self.line_break_sample_bytes as u64)
            .read_to_end(&mut sample)?;

        match sample.iter().position(|&b| b == b'\n') {
            Some(i) if i > 0 && sample[i - 1] == b'\r' => Ok(2),
            Some(_) => Ok(1),
            None => Err(LogIndexError::NoLineTerminator {
                sampled: sample.len(),
            }),
        }
    }

    fn build_tree(&self, stream: &mut dyn ReadSeek) -> Result<TimelineTree, LogIndexError> {
        let line_break = self.detect_line_break_length(stream)?;
        debug!(line_break, "detected line terminator length");

        stream.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(stream);
        let mut tree = TimelineTree::new();
        let mut buf = Vec::with_capacity(256);
        let mut offset = 0u64;
        let mut lines = 0u64;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            lines += 1;

            let raw = strip_terminator(&buf);
            let text = if offset == 0 { strip_bom(raw) } else { raw };
            let line = String::from_utf8_lossy(text);
            if let Some(found) = self.matcher.match_line(&line) {
                tree.insert(found.to_datetime()?, offset)?;
            }

            offset += raw.len() as u64 + line_break;
        }

        metrics::counter!(m::INDEX_LINES_SCANNED_TOTAL, m::LABEL_PARSER_FORMAT => TEXT_FORMAT)
            .increment(lines);
        metrics::counter!(m::INDEX_EVENTS_INDEXED_TOTAL, m::LABEL_PARSER_FORMAT => TEXT_FORMAT)
            .increment(tree.total_count());
        Ok(tree)
    }
}

impl LogFileParser for TextLogParser {
    fn format_name(&self) -> &str {
        TEXT_FORMAT
    }

    fn parse_and_build_tree(&self, stream: &mut dyn ReadSeek) -> Result<TimelineTree, LogscopeError> {
        let started = Instant::now();
        match self.build_tree(stream) {
            Ok(tree) => {
                let elapsed = started.elapsed();
                metrics::histogram!(m::INDEX_PARSE_DURATION_SECONDS, m::LABEL_PARSER_FORMAT => TEXT_FORMAT)
                    .record(elapsed.as_secs_f64());
                info!(
                    events = tree.total_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "text log indexed"
                );
                Ok(tree)
            }
            Err(e) => {
                metrics::counter!(m::INDEX_PARSE_FAILURES_TOTAL, m::LABEL_PARSER_FORMAT => TEXT_FORMAT)
                    .increment(1);
                Err(e.into())
            }
        }
    }

    fn read_entries(
        &self,
        stream: &mut dyn ReadSeek,
        offset: u64,
        max_count: usize,
    ) -> Result<Vec<LogEntry>, LogscopeError> {
        Ok(EntryReader::new(&self.matcher).read_entries(stream, offset, max_count)?)
    }
}
