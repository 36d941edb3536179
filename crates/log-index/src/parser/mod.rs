//! 로그 파서 모듈 -- 텍스트 로그, Windows 이벤트 로그 XML 파서
//!
//! [`ParserSelector`]는 파일 이름으로 형식을 판별하여 적절한 파서를 선택합니다.
//! 각 파서는 core의 [`LogFileParser`] trait을 구현합니다.
//!
//! # 지원 형식
//! - 타임스탬프로 시작하는 텍스트 로그 ([`TextLogParser`])
//! - Windows 이벤트 로그 XML 내보내기 ([`EventLogXmlParser`])
//!
//! # 사용 예시
//! ```
//! use logscope_log_index::parser::{LogFormat, ParserSelector};
//!
//! let selector = ParserSelector::new()?;
//! assert_eq!(selector.select("System.xml").format_name(), "event-xml");
//! assert_eq!(LogFormat::from_path("app.log"), LogFormat::Text);
//! # Ok::<(), logscope_log_index::LogIndexError>(())
//! ```

pub mod text;
pub mod xml;

pub use text::TextLogParser;
pub use xml::EventLogXmlParser;

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use logscope_core::parser::LogFileParser;

use crate::config::IndexConfig;
use crate::error::LogIndexError;

/// UTF-8 바이트 순서 표시
pub(crate) const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// 파일 첫 라인 앞의 UTF-8 BOM을 제거합니다. 오프셋 계산에는 원본 길이를 씁니다.
pub(crate) fn strip_bom(line: &[u8]) -> &[u8] {
    line.strip_prefix(UTF8_BOM).unwrap_or(line)
}

/// 로그 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogFormat {
    Text,
    EventXml,
}

impl LogFormat {
    /// 파일 이름이 `.xml`로 끝나면 XML, 그 외에는 텍스트입니다.
    ///
    /// 접미사 비교는 대소문자를 구분합니다.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let is_xml = path
            .as_ref()
            .file_name()
            .is_some_and(|name| name.to_string_lossy().ends_with(".xml"));
        if is_xml { Self::EventXml } else { Self::Text }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => text::TEXT_FORMAT,
            Self::EventXml => xml::XML_FORMAT,
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파서 선택기 -- 파일 이름으로 파서를 선택합니다.
///
/// 파서는 생성 시 한 번 만들어 공유합니다.
#[derive(Clone)]
pub struct ParserSelector {
    text: Arc<dyn LogFileParser>,
    xml: Arc<dyn LogFileParser>,
}

impl ParserSelector {
    /// 기본 설정으로 선택기를 생성합니다.
    pub fn new() -> Result<Self, LogIndexError> {
        Self::with_config(&IndexConfig::default())
    }

    pub fn with_config(config: &IndexConfig) -> Result<Self, LogIndexError> {
        Ok(Self {
            text: Arc::new(TextLogParser::with_config(config)?),
            xml: Arc::new(EventLogXmlParser::new()),
        })
    }

    /// 형식에 맞는 파서
    pub fn parser_for(&self, format: LogFormat) -> Arc<dyn LogFileParser> {
        match format {
            LogFormat::Text => Arc::clone(&self.text),
            LogFormat::EventXml => Arc::clone(&self.xml),
        }
    }

    /// 파일 이름으로 파서를 선택합니다.
    pub fn select(&self, path: impl AsRef<Path>) -> Arc<dyn LogFileParser> {
        self.parser_for(LogFormat::from_path(path))
    }

    /// 등록된 파서 형식 이름 목록을 반환합니다.
    pub fn registered_formats(&self) -> Vec<&str> {
        vec![self.text.format_name(), self.xml.format_name()]
    }
}

impl fmt::Debug for ParserSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParserSelector")
            .field("formats", &self.registered_formats())
            .finish()
    }
}
