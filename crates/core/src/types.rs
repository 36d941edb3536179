//! 도메인 타입 -- 시스템 전역에서 사용되는 공통 타입
//!
//! 집계 트리 질의 결과([`TimeBucket`])와 원본 로그 재읽기 결과([`LogEntry`])를 정의합니다.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 시간 버킷 요약 (집계 질의 결과 한 행)
///
/// `timestamp`는 질의 레벨보다 세밀한 성분이 최솟값(월=1, 일=1, 나머지=0)으로 채워진
/// 대표 타임스탬프입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBucket {
    /// 대표 타임스탬프
    pub timestamp: DateTime<Utc>,
    /// 버킷에 속한 이벤트 수 (항상 1 이상)
    pub count: u64,
    /// 버킷의 첫 이벤트가 시작하는 원본 오프셋
    pub offset: u64,
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} count={} offset={}",
            self.timestamp.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.count,
            self.offset,
        )
    }
}

/// 원본 로그 엔트리
///
/// 오프셋 기반 재읽기로 요청 시점에 생성되며 캐시되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 원본에서 매칭된 타임스탬프 토큰 (안정적인 키로 사용)
    pub id: String,
    /// 심각도
    pub severity: Severity,
    /// 엔트리에 속한 원본 라인들 (`\n`으로 연결)
    pub message: String,
}

impl LogEntry {
    pub fn new(id: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            severity,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.message)
    }
}

/// 로그 심각도
///
/// `Ord` 구현으로 심각도 비교가 가능합니다 (`None < Debug < Info < ... < Fatal`).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 심각도 토큰 없음
    #[default]
    None,
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Severity {
    /// 로그 라인의 심각도 토큰을 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_token(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "debug" => Self::Debug,
            "info" => Self::Info,
            "warn" | "warning" => Self::Warning,
            "error" => Self::Error,
            "fatal" => Self::Fatal,
            _ => Self::None,
        }
    }

    /// Windows 이벤트 로그 `<Level>` 값을 매핑합니다.
    ///
    /// - 1 Critical -> Fatal
    /// - 2 Error -> Error
    /// - 3 Warning -> Warning
    /// - 4 Information -> Info
    /// - 5 Verbose -> Debug
    pub fn from_event_level(level: u8) -> Self {
        match level {
            1 => Self::Fatal,
            2 => Self::Error,
            3 => Self::Warning,
            4 => Self::Info,
            5 => Self::Debug,
            _ => Self::None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Debug => write!(f, "Debug"),
            Self::Info => write!(f, "Info"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}
