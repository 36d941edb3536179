#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`parser`]: 텍스트/XML 파서 및 파일 이름 기반 선택기
//! - [`reader`]: 오프셋 기반 텍스트 엔트리 재읽기
//! - [`session`]: 현재 열린 로그와 트리 공유
//! - [`config`]: 인덱스 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 데이터 흐름
//!
//! ```text
//! file --(ParserSelector)--> LogFileParser --insert--> TimelineTree
//!                                 ^                        |
//!                                 |                  counts_at_level
//!                                 +---- read_entries <-- bucket.offset
//! ```

pub mod config;
pub mod error;
pub mod parser;
pub mod reader;
pub mod session;

// --- 주요 타입 re-export ---

// 설정
pub use config::IndexConfig;

// 에러
pub use error::LogIndexError;

// 파서
pub use parser::{EventLogXmlParser, LogFormat, ParserSelector, TextLogParser};

// 재읽기
pub use reader::EntryReader;

// 세션
pub use session::{LogSession, OpenedLog};
