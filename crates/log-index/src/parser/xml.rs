//! Windows 이벤트 로그 XML 파서
//!
//! 루트 요소 아래에 이벤트 레코드가 나열된 XML 내보내기를 파싱합니다.
//! 각 레코드의 타임스탬프는 이벤트 네임스페이스의 첫 `TimeCreated` 자손 요소의
//! `SystemTime` 속성에서 가져옵니다.
//!
//! # 합성 오프셋
//! XML 레코드는 바이트 오프셋 대신 `line * 1_000_000_000 + column` 형식의 합성 오프셋을
//! 사용합니다 (레코드 여는 `<`의 1부터 시작하는 줄 번호와 바이트 열 번호).
//!
//! # 예시 입력
//! ```text
//! <Events>
//!   <Event xmlns="http://schemas.microsoft.com/win/2004/08/events/event">
//!     <System>
//!       <Level>2</Level>
//!       <TimeCreated SystemTime="2024-03-01T10:20:30.1234567Z"/>
//!     </System>
//!   </Event>
//! </Events>
//! ```

use std::io::{BufRead, BufReader, Read, SeekFrom};
use std::time::Instant;

use chrono::{DateTime, NaiveDateTime, Utc};
use logscope_core::error::LogscopeError;
use logscope_core::metrics as m;
use logscope_core::parser::{LogFileParser, ReadSeek};
use logscope_core::types::{LogEntry, Severity};
use logscope_core::TimelineTree;
use quick_xml::events::{BytesStart, Event as XmlEvent};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::{NsReader, Reader};
use tracing::{debug, info};

use crate::error::LogIndexError;
use crate::parser::UTF8_BOM;

/// XML 파서 형식 이름
pub const XML_FORMAT: &str = "event-xml";

/// 이벤트 스키마 네임스페이스
pub const EVENT_NAMESPACE: &[u8] = b"http://schemas.microsoft.com/win/2004/08/events/event";

/// 합성 오프셋의 줄 번호 배수
pub const LINE_MULTIPLIER: u64 = 1_000_000_000;

/// 스트림의 줄바꿈 위치 색인
///
/// 바이트 위치와 (줄, 열) 사이를 변환합니다.
#[derive(Debug, Clone, Default)]
struct LineIndex {
    /// 각 `\n`의 바이트 위치
    newlines: Vec<u64>,
    /// 스트림 길이
    len: u64,
}

impl LineIndex {
    fn build(stream: &mut dyn ReadSeek) -> Result<Self, LogIndexError> {
        stream.seek(SeekFrom::Start(0))?;
        let mut reader = BufReader::new(stream);
        let mut index = Self::default();

        loop {
            let chunk = reader.fill_buf()?;
            if chunk.is_empty() {
                break;
            }
            let base = index.len;
            index.newlines.extend(
                chunk
                    .iter()
                    .enumerate()
                    .filter(|(_, b)| **b == b'\n')
                    .map(|(i, _)| base + i as u64),
            );
            let consumed = chunk.len();
            index.len += consumed as u64;
            reader.consume(consumed);
        }
        Ok(index)
    }

    /// 1부터 시작하는 줄 번호의 시작 바이트 위치
    fn line_start(&self, line: u64) -> Option<u64> {
        match line {
            0 => None,
            1 => Some(0),
            n => self
                .newlines
                .get(usize::try_from(n - 2).ok()?)
                .map(|nl| nl + 1),
        }
    }

    /// 줄 끝 (줄바꿈 위치 또는 스트림 끝, 미포함)
    fn line_end(&self, line: u64) -> u64 {
        usize::try_from(line - 1)
            .ok()
            .and_then(|i| self.newlines.get(i).copied())
            .unwrap_or(self.len)
    }

    fn to_offset(&self, position: u64) -> u64 {
        let line = self.newlines.partition_point(|&nl| nl < position) as u64 + 1;
        let start = self.line_start(line).unwrap_or(0);
        line * LINE_MULTIPLIER + (position - start + 1)
    }

    /// 합성 오프셋을 바이트 위치로 되돌립니다. 문서 밖을 가리키면 `None`입니다.
    fn to_position(&self, offset: u64) -> Option<u64> {
        let line = offset / LINE_MULTIPLIER;
        let column = offset % LINE_MULTIPLIER;
        if column == 0 {
            return None;
        }
        let position = self.line_start(line)? + column - 1;
        (position < self.line_end(line)).then_some(position)
    }
}

/// `SystemTime` 속성 값을 UTC로 해석합니다. 시간대 표기가 없으면 UTC로 간주합니다.
fn parse_system_time(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// `SystemTime` 속성의 원본 값
fn system_time_attr(element: &BytesStart<'_>) -> Result<Option<String>, String> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        if attr.key.local_name().as_ref() == b"SystemTime" {
            let value = attr.unescape_value().map_err(|e| e.to_string())?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// 파싱 중인 레코드
struct RecordScan {
    position: u64,
    timestamp: Option<DateTime<Utc>>,
}

/// 레코드 하나의 재읽기 정보
struct RecordSpan {
    start: u64,
    end: u64,
    id: String,
    severity: Severity,
}

/// Windows 이벤트 로그 XML 파서
///
/// core의 [`LogFileParser`] trait을 구현합니다.
#[derive(Debug, Clone, Default)]
pub struct EventLogXmlParser;

impl EventLogXmlParser {
    pub fn new() -> Self {
        Self
    }

    /// 문서 순서대로 (바이트 위치, 타임스탬프) 목록을 수집합니다.
    fn scan_records(
        &self,
        stream: &mut dyn ReadSeek,
    ) -> Result<Vec<(u64, DateTime<Utc>)>, LogIndexError> {
        let base = skip_bom(stream)?;
        let mut reader = NsReader::from_reader(BufReader::new(stream));
        let mut buf = Vec::with_capacity(1024);
        let mut records = Vec::new();
        let mut current: Option<RecordScan> = None;
        let mut depth = 0usize;
        let mut roots = 0usize;

        loop {
            buf.clear();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(LogIndexError::malformed(
                        XML_FORMAT,
                        base + reader.error_position(),
                        e.to_string(),
                    ));
                }
            };

            match event {
                XmlEvent::Start(ref e) | XmlEvent::Empty(ref e) => {
                    let is_empty = matches!(event, XmlEvent::Empty(_));
                    let position = base + tag_start(reader.buffer_position(), e, is_empty);
                    match depth {
                        0 => {
                            roots += 1;
                            if roots > 1 {
                                return Err(LogIndexError::malformed(
                                    XML_FORMAT,
                                    position,
                                    "multiple root elements",
                                ));
                            }
                        }
                        1 => {
                            current = Some(RecordScan {
                                position,
                                timestamp: None,
                            });
                        }
                        _ => {
                            if let Some(record) = current.as_mut() {
                                if record.timestamp.is_none() && is_time_created(&reader, e) {
                                    record.timestamp =
                                        Some(Self::timestamp_of(e, position)?);
                                }
                            }
                        }
                    }

                    if is_empty {
                        if depth == 1 {
                            Self::finish_record(current.take(), &mut records)?;
                        }
                    } else {
                        depth += 1;
                    }
                }
                XmlEvent::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        Self::finish_record(current.take(), &mut records)?;
                    }
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        if roots == 0 {
            return Err(LogIndexError::malformed(XML_FORMAT, 0, "document has no root element"));
        }
        if depth != 0 {
            return Err(LogIndexError::malformed(
                XML_FORMAT,
                base + reader.buffer_position(),
                "unexpected end of document",
            ));
        }
        Ok(records)
    }

    fn timestamp_of(element: &BytesStart<'_>, position: u64) -> Result<DateTime<Utc>, LogIndexError> {
        let raw = system_time_attr(element)
            .map_err(|reason| LogIndexError::malformed(XML_FORMAT, position, reason))?
            .ok_or_else(|| {
                LogIndexError::malformed(XML_FORMAT, position, "TimeCreated without SystemTime")
            })?;
        parse_system_time(&raw).ok_or_else(|| {
            LogIndexError::malformed(XML_FORMAT, position, format!("invalid SystemTime '{raw}'"))
        })
    }

    fn finish_record(
        record: Option<RecordScan>,
        records: &mut Vec<(u64, DateTime<Utc>)>,
    ) -> Result<(), LogIndexError> {
        let Some(record) = record else {
            return Ok(());
        };
        let timestamp = record.timestamp.ok_or_else(|| {
            LogIndexError::malformed(XML_FORMAT, record.position, "event record has no TimeCreated")
        })?;
        records.push((record.position, timestamp));
        Ok(())
    }

    fn build_tree(&self, stream: &mut dyn ReadSeek) -> Result<TimelineTree, LogIndexError> {
        let mut records = self.scan_records(stream)?;
        let lines = LineIndex::build(stream)?;
        debug!(records = records.len(), lines = lines.newlines.len() + 1, "event records scanned");

        // 같은 타임스탬프는 문서 순서를 유지한다
        records.sort_by_key(|(_, timestamp)| *timestamp);

        let mut tree = TimelineTree::new();
        for (position, timestamp) in &records {
            tree.insert(*timestamp, lines.to_offset(*position))?;
        }

        metrics::counter!(m::INDEX_LINES_SCANNED_TOTAL, m::LABEL_PARSER_FORMAT => XML_FORMAT)
            .increment(records.len() as u64);
        metrics::counter!(m::INDEX_EVENTS_INDEXED_TOTAL, m::LABEL_PARSER_FORMAT => XML_FORMAT)
            .increment(tree.total_count());
        Ok(tree)
    }

    /// `start` 위치 이후에 시작하는 레코드를 최대 `max_count`개 찾습니다.
    fn find_spans(
        &self,
        stream: &mut dyn ReadSeek,
        start: u64,
        max_count: usize,
    ) -> Result<Vec<RecordSpan>, LogIndexError> {
        let base = skip_bom(stream)?;
        let mut reader = Reader::from_reader(BufReader::new(stream));
        let mut buf = Vec::with_capacity(1024);
        let mut spans = Vec::new();
        let mut current: Option<RecordSpan> = None;
        let mut in_level = false;
        let mut depth = 0usize;

        while spans.len() < max_count {
            buf.clear();
            let event = match reader.read_event_into(&mut buf) {
                Ok(event) => event,
                Err(e) => {
                    return Err(LogIndexError::malformed(
                        XML_FORMAT,
                        base + reader.error_position(),
                        e.to_string(),
                    ));
                }
            };

            match event {
                XmlEvent::Start(ref e) | XmlEvent::Empty(ref e) => {
                    let is_empty = matches!(event, XmlEvent::Empty(_));
                    let position = base + tag_start(reader.buffer_position(), e, is_empty);
                    if depth == 1 && position >= start {
                        current = Some(RecordSpan {
                            start: position,
                            end: position,
                            id: String::new(),
                            severity: Severity::None,
                        });
                    } else if let Some(span) = current.as_mut() {
                        match e.local_name().as_ref() {
                            b"TimeCreated" if span.id.is_empty() => {
                                span.id = system_time_attr(e)
                                    .map_err(|reason| {
                                        LogIndexError::malformed(XML_FORMAT, position, reason)
                                    })?
                                    .unwrap_or_default();
                            }
                            b"Level" if !is_empty => in_level = true,
                            _ => {}
                        }
                    }

                    if is_empty {
                        if depth == 1 {
                            if let Some(mut span) = current.take() {
                                span.end = base + reader.buffer_position();
                                spans.push(span);
                            }
                        }
                    } else {
                        depth += 1;
                    }
                }
                XmlEvent::Text(ref t) if in_level => {
                    if let Some(span) = current.as_mut() {
                        let text = String::from_utf8_lossy(t.as_ref());
                        if let Ok(level) = text.trim().parse::<u8>() {
                            span.severity = Severity::from_event_level(level);
                        }
                    }
                }
                XmlEvent::End(_) => {
                    in_level = false;
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some(mut span) = current.take() {
                            span.end = base + reader.buffer_position();
                            spans.push(span);
                        }
                    }
                }
                XmlEvent::Eof => break,
                _ => {}
            }
        }

        Ok(spans)
    }

    fn read_records(
        &self,
        stream: &mut dyn ReadSeek,
        offset: u64,
        max_count: usize,
    ) -> Result<Vec<LogEntry>, LogIndexError> {
        let lines = LineIndex::build(stream)?;
        let start = lines
            .to_position(offset)
            .ok_or(LogIndexError::OffsetOutOfRange {
                offset,
                length: lines.len,
            })?;
        if max_count == 0 {
            return Ok(Vec::new());
        }

        let spans = self.find_spans(stream, start, max_count)?;
        let mut entries = Vec::with_capacity(spans.len());
        for span in spans {
            stream.seek(SeekFrom::Start(span.start))?;
            let mut raw = Vec::with_capacity((span.end - span.start) as usize);
            (&mut *stream)
                .take(span.end - span.start)
                .read_to_end(&mut raw)?;
            entries.push(LogEntry::new(
                span.id,
                span.severity,
                String::from_utf8_lossy(&raw),
            ));
        }

        metrics::counter!(m::READER_ENTRIES_READ_TOTAL).increment(entries.len() as u64);
        debug!(offset, start, returned = entries.len(), "event records re-read");
        Ok(entries)
    }
}

/// 선행 UTF-8 BOM을 건너뛰고 문서 본문의 시작 바이트 위치를 반환합니다.
///
/// 스트림은 반환된 위치로 이동한 상태가 됩니다. XML 리더의 위치는 이 값을 더해야
/// 원본 바이트 위치가 됩니다.
fn skip_bom(stream: &mut dyn ReadSeek) -> Result<u64, LogIndexError> {
    stream.seek(SeekFrom::Start(0))?;
    let mut head = Vec::with_capacity(UTF8_BOM.len());
    (&mut *stream)
        .take(UTF8_BOM.len() as u64)
        .read_to_end(&mut head)?;
    let base = if head == UTF8_BOM { head.len() as u64 } else { 0 };
    stream.seek(SeekFrom::Start(base))?;
    Ok(base)
}

/// 방금 읽은 시작 태그의 여는 `<` 위치
///
/// `after`는 태그를 읽은 직후의 위치입니다. `BytesStart` 내용은 `<`, `>`, 빈 요소의 `/`를 제외합니다.
fn tag_start(after: u64, element: &BytesStart<'_>, is_empty: bool) -> u64 {
    let delimiters = if is_empty { 3 } else { 2 };
    after.saturating_sub(element.len() as u64 + delimiters)
}

/// 이벤트 네임스페이스의 `TimeCreated` 요소인지 확인합니다.
fn is_time_created<R>(reader: &NsReader<R>, element: &BytesStart<'_>) -> bool {
    let (ns, local) = reader.resolve_element(element.name());
    local.as_ref() == b"TimeCreated"
        && matches!(ns, ResolveResult::Bound(Namespace(uri)) if uri == EVENT_NAMESPACE)
}

impl LogFileParser for EventLogXmlParser {
    fn format_name(&self) -> &str {
        XML_FORMAT
    }

    fn parse_and_build_tree(&self, stream: &mut dyn ReadSeek) -> Result<TimelineTree, LogscopeError> {
        let started = Instant::now();
        match self.build_tree(stream) {
            Ok(tree) => {
                let elapsed = started.elapsed();
                metrics::histogram!(m::INDEX_PARSE_DURATION_SECONDS, m::LABEL_PARSER_FORMAT => XML_FORMAT)
                    .record(elapsed.as_secs_f64());
                info!(
                    events = tree.total_count(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "event log xml indexed"
                );
                Ok(tree)
            }
            Err(e) => {
                metrics::counter!(m::INDEX_PARSE_FAILURES_TOTAL, m::LABEL_PARSER_FORMAT => XML_FORMAT)
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
        Ok(self.read_records(stream, offset, max_count)?)
    }
}
