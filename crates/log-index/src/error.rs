//! 로그 인덱스 에러 타입
//!
//! [`LogIndexError`]는 파싱, 트리 구축, 재읽기 중 발생하는 모든 에러를 표현합니다.
//! `From<LogIndexError> for LogscopeError` 변환은 각 변형을 core의 대응 변형으로
//! 그대로 옮기므로, 상위 레이어에서 `?`로 전파해도 원인 정보가 보존됩니다.

use logscope_core::error::{ConfigError, LogscopeError, ParseError, ReadError, TimelineError};

/// 로그 인덱스 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum LogIndexError {
    /// 입력을 해석할 수 없음 (XML 구문 오류, 타임스탬프 누락 등)
    #[error("malformed {format} input at {position}: {reason}")]
    Malformed {
        /// 파서 형식 (text, event-xml)
        format: String,
        /// 실패 위치 (바이트 위치)
        position: u64,
        /// 실패 사유
        reason: String,
    },

    /// 샘플 구간에서 줄바꿈을 찾지 못함
    #[error("no line terminator found in the first {sampled} bytes")]
    NoLineTerminator { sampled: usize },

    /// 타임스탬프 성분이 범위를 벗어남
    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimelineError),

    /// 스트림 범위를 벗어난 재읽기 오프셋
    #[error("offset {offset} is out of range (stream length: {length})")]
    OffsetOutOfRange { offset: u64, length: u64 },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 정규식 컴파일 에러
    #[error("regex error: {0}")]
    Regex(#[from] regex::Error),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl LogIndexError {
    pub(crate) fn malformed(format: &str, position: u64, reason: impl Into<String>) -> Self {
        Self::Malformed {
            format: format.to_owned(),
            position,
            reason: reason.into(),
        }
    }
}

impl From<LogIndexError> for LogscopeError {
    fn from(err: LogIndexError) -> Self {
        match err {
            LogIndexError::Malformed {
                format,
                position,
                reason,
            } => ParseError::MalformedInput {
                format,
                position,
                reason,
            }
            .into(),
            LogIndexError::NoLineTerminator { sampled } => {
                ParseError::NoLineTerminatorFound { sampled }.into()
            }
            LogIndexError::Timestamp(e) => e.into(),
            LogIndexError::OffsetOutOfRange { offset, length } => {
                ReadError::OffsetOutOfRange { offset, length }.into()
            }
            LogIndexError::Config { field, reason } => {
                ConfigError::InvalidValue { field, reason }.into()
            }
            LogIndexError::Regex(e) => ParseError::InvalidPattern(e.to_string()).into(),
            LogIndexError::Io(e) => LogscopeError::Io(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logscope_core::TimeLevel;

    #[test]
    fn malformed_display() {
        let err = LogIndexError::malformed("event-xml", 42, "missing SystemTime");
        let msg = err.to_string();
        assert!(msg.contains("event-xml"));
        assert!(msg.contains("42"));
        assert!(msg.contains("missing SystemTime"));
    }

    #[test]
    fn converts_to_matching_core_variants() {
        let err: LogscopeError = LogIndexError::NoLineTerminator { sampled: 1024 }.into();
        assert!(matches!(
            err,
            LogscopeError::Parse(ParseError::NoLineTerminatorFound { sampled: 1024 })
        ));

        let err: LogscopeError = LogIndexError::OffsetOutOfRange {
            offset: 9,
            length: 3,
        }
        .into();
        assert!(matches!(
            err,
            LogscopeError::Read(ReadError::OffsetOutOfRange {
                offset: 9,
                length: 3
            })
        ));

        let err: LogscopeError = LogIndexError::Timestamp(TimelineError::InvalidTimestampComponent {
            level: TimeLevel::Month,
            value: 13,
        })
        .into();
        assert!(matches!(
            err,
            LogscopeError::Timeline(TimelineError::InvalidTimestampComponent { value: 13, .. })
        ));
    }

    #[test]
    fn regex_error_becomes_parse_error() {
        let regex_err = regex::Regex::new("(").unwrap_err();
        let err: LogscopeError = LogIndexError::from(regex_err).into();
        assert!(matches!(
            err,
            LogscopeError::Parse(ParseError::InvalidPattern(_))
        ));
    }

    #[test]
    fn io_error_is_preserved() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LogscopeError = LogIndexError::from(io).into();
        match err {
            LogscopeError::Io(e) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
            other => panic!("expected Io, got {other:?}"),
        }
    }
}
