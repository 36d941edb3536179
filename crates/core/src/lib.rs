#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod level;
pub mod metrics;
pub mod parser;
pub mod timeline;
pub mod types;
pub mod view;

// --- 주요 타입 re-export ---
// 각 모듈의 핵심 타입을 크레이트 루트에서 바로 사용할 수 있도록 합니다.

// 에러
pub use error::{ConfigError, LogscopeError, ParseError, ReadError, TimelineError};

// 설정
pub use config::LogscopeConfig;

// 시간 집계
pub use level::{TimeComponent, TimeLevel};
pub use timeline::{CountsAtLevel, TimelineTree};
pub use view::{DateRange, TimelineView};

// 파서 trait
pub use parser::{LogFileParser, ReadSeek};

// 도메인 타입
pub use types::{LogEntry, Severity, TimeBucket};
