//! 로그 인덱스 설정
//!
//! [`IndexConfig`]는 core의 [`IndexSection`](logscope_core::config::IndexSection)을
//! 기반으로 파서와 재읽기에 필요한 값을 제공합니다.
//!
//! # 사용 예시
//! ```
//! use logscope_core::config::LogscopeConfig;
//! use logscope_log_index::config::IndexConfig;
//!
//! let core_config = LogscopeConfig::default();
//! let config = IndexConfig::from_core(&core_config.index);
//! assert_eq!(config.line_break_sample_bytes, 1024);
//! ```

use logscope_core::TimeLevel;
use logscope_core::config::IndexSection;
use serde::{Deserialize, Serialize};

use crate::error::LogIndexError;

/// 로그 인덱스 설정
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// 줄바꿈 형식 판별 샘플 크기 (바이트)
    pub line_break_sample_bytes: usize,
    /// 재읽기 기본 최대 엔트리 수
    pub max_entries: usize,
    /// 열기 직후 자동 줌 여부
    pub auto_zoom: bool,
    /// 자동 줌 하한 레벨
    pub auto_zoom_floor: TimeLevel,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self::from_core(&IndexSection::default())
    }
}

impl IndexConfig {
    /// core의 `IndexSection`에서 설정을 생성합니다.
    pub fn from_core(core: &IndexSection) -> Self {
        Self {
            line_break_sample_bytes: core.line_break_sample_bytes,
            max_entries: core.max_entries,
            auto_zoom: core.auto_zoom,
            auto_zoom_floor: core.auto_zoom_floor,
        }
    }

    pub fn with_line_break_sample_bytes(mut self, bytes: usize) -> Self {
        self.line_break_sample_bytes = bytes;
        self
    }

    pub fn with_max_entries(mut self, max: usize) -> Self {
        self.max_entries = max;
        self
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogIndexError> {
        if self.line_break_sample_bytes == 0 {
            return Err(LogIndexError::Config {
                field: "line_break_sample_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        if self.max_entries == 0 {
            return Err(LogIndexError::Config {
                field: "max_entries".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_core_copies_every_field() {
        let core = IndexSection {
            line_break_sample_bytes: 64,
            max_entries: 7,
            auto_zoom: false,
            auto_zoom_floor: TimeLevel::Hour,
        };
        let config = IndexConfig::from_core(&core);
        assert_eq!(config.line_break_sample_bytes, 64);
        assert_eq!(config.max_entries, 7);
        assert!(!config.auto_zoom);
        assert_eq!(config.auto_zoom_floor, TimeLevel::Hour);
    }

    #[test]
    fn default_matches_core_default() {
        let config = IndexConfig::default();
        assert_eq!(config.line_break_sample_bytes, 1024);
        assert_eq!(config.max_entries, 100);
        config.validate().unwrap();
    }

    #[test]
    fn validate_rejects_zero_sample() {
        let config = IndexConfig::default().with_line_break_sample_bytes(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_max_entries() {
        let config = IndexConfig::default().with_max_entries(0);
        assert!(config.validate().is_err());
    }
}
