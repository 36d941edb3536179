//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::histogram!()`
//! 매크로를 호출합니다. 전역 레코더가 설치되지 않았다면 기록은 무시됩니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logscope_`
//! - 모듈명: `index_`, `reader_`
//! - 접미어: `_total` (counter), `_seconds` (histogram)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(logscope_core::metrics::INDEX_EVENTS_INDEXED_TOTAL).increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 파서 형식 레이블 키 (text, event-xml)
pub const LABEL_PARSER_FORMAT: &str = "format";

// ─── Log Index 메트릭 ──────────────────────────────────────────────

/// Log Index: 스캔한 라인/레코드 수 (counter, label: format)
pub const INDEX_LINES_SCANNED_TOTAL: &str = "logscope_index_lines_scanned_total";

/// Log Index: 트리에 삽입된 이벤트 수 (counter, label: format)
pub const INDEX_EVENTS_INDEXED_TOTAL: &str = "logscope_index_events_indexed_total";

/// Log Index: 실패한 파싱 수 (counter, label: format)
pub const INDEX_PARSE_FAILURES_TOTAL: &str = "logscope_index_parse_failures_total";

/// Log Index: 파일 하나의 파싱 소요 시간 (histogram, 초, label: format)
pub const INDEX_PARSE_DURATION_SECONDS: &str = "logscope_index_parse_duration_seconds";

// ─── Entry Reader 메트릭 ───────────────────────────────────────────

/// Entry Reader: 재읽기로 반환된 엔트리 수 (counter)
pub const READER_ENTRIES_READ_TOTAL: &str = "logscope_reader_entries_read_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 파싱 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 120s 범위 (대용량 로그 파일 전체 스캔 포함)
pub const PARSE_DURATION_BUCKETS: [f64; 9] = [0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0, 120.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        INDEX_LINES_SCANNED_TOTAL,
        "Total number of lines or records scanned while indexing log files"
    );
    describe_counter!(
        INDEX_EVENTS_INDEXED_TOTAL,
        "Total number of timestamped events inserted into timeline trees"
    );
    describe_counter!(
        INDEX_PARSE_FAILURES_TOTAL,
        "Total number of log file parses aborted by an error"
    );
    describe_histogram!(
        INDEX_PARSE_DURATION_SECONDS,
        "Time spent parsing one log file and building its timeline tree"
    );
    describe_counter!(
        READER_ENTRIES_READ_TOTAL,
        "Total number of log entries returned by offset re-reads"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metric_names_use_prefix_and_suffix_conventions() {
        for name in [
            INDEX_LINES_SCANNED_TOTAL,
            INDEX_EVENTS_INDEXED_TOTAL,
            INDEX_PARSE_FAILURES_TOTAL,
            READER_ENTRIES_READ_TOTAL,
        ] {
            assert!(name.starts_with("logscope_"), "{name}");
            assert!(name.ends_with("_total"), "{name}");
        }
        assert!(INDEX_PARSE_DURATION_SECONDS.ends_with("_seconds"));
    }

    #[test]
    fn duration_buckets_are_sorted() {
        assert!(PARSE_DURATION_BUCKETS.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn describe_all_without_recorder_is_noop() {
        describe_all();
    }
}
