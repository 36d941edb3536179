//! 에러 타입 -- 도메인별 에러 정의

use crate::level::TimeLevel;

/// logscope 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum LogscopeError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 로그 파일 파싱 에러
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// 집계 트리/레벨 에러
    #[error("timeline error: {0}")]
    Timeline(#[from] TimelineError),

    /// 오프셋 기반 재읽기 에러
    #[error("read error: {0}")]
    Read(#[from] ReadError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 파싱 에러
///
/// 파싱 에러는 항상 전체 파싱을 중단시킵니다. 부분적으로 구축된 트리는 반환되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// 타임스탬프가 있어야 할 레코드를 해석할 수 없음
    #[error("malformed {format} input at {position}: {reason}")]
    MalformedInput {
        /// 파서 형식 (text, event-xml)
        format: String,
        /// 실패 위치 (바이트 위치)
        position: u64,
        /// 실패 사유
        reason: String,
    },

    /// 샘플 구간에서 줄바꿈 문자를 찾지 못함
    #[error("no line terminator found in the first {sampled} bytes")]
    NoLineTerminatorFound { sampled: usize },

    /// 라인 인식 패턴을 컴파일할 수 없음
    #[error("invalid line pattern: {0}")]
    InvalidPattern(String),
}

/// 집계 트리 및 시간 레벨 에러
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimelineError {
    /// 레벨의 유효 범위를 벗어난 시간 성분 (예: 13월)
    #[error("invalid timestamp component: {level} = {value}")]
    InvalidTimestampComponent { level: TimeLevel, value: i64 },

    /// 가장 세밀한 레벨 아래 / 가장 거친 레벨 위로 이동 시도
    #[error("no {direction} level after {level}")]
    NoAdjacentLevel {
        level: TimeLevel,
        direction: &'static str,
    },
}

/// 오프셋 기반 재읽기 에러
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// 스트림 범위를 벗어난 오프셋
    #[error("offset {offset} is out of range (stream length: {length})")]
    OffsetOutOfRange { offset: u64, length: u64 },

    /// 열린 로그 파일 없이 재읽기를 요청함
    #[error("no log file is open")]
    NoOpenLog,
}
