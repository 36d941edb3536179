//! 설정 관리 -- logscope.toml 파싱 및 런타임 설정
//!
//! [`LogscopeConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`LOGSCOPE_INDEX_MAX_ENTRIES=500` 형식)
//! 3. 설정 파일 (`logscope.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logscope_core::error::LogscopeError> {
//! use logscope_core::config::LogscopeConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogscopeConfig::load("logscope.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogscopeConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogscopeError};
use crate::level::TimeLevel;

/// logscope 통합 설정
///
/// `logscope.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogscopeConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 인덱싱/재읽기 설정
    #[serde(default)]
    pub index: IndexSection,
}

impl LogscopeConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    ///
    /// 설정 로딩 순서:
    /// 1. TOML 파일 파싱
    /// 2. 환경변수 오버라이드 적용
    /// 3. 검증
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogscopeError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일 없이 기본값 + 환경변수 오버라이드로 설정을 구성합니다.
    pub fn from_env() -> Result<Self, LogscopeError> {
        let mut config = Self::default();
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogscopeError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogscopeError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogscopeError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogscopeError> {
        toml::from_str(toml_str).map_err(|e| {
            LogscopeError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGSCOPE_{SECTION}_{FIELD}`
    /// 예: `LOGSCOPE_GENERAL_LOG_LEVEL=debug`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGSCOPE_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGSCOPE_GENERAL_LOG_FORMAT");

        // Index
        override_usize(
            &mut self.index.line_break_sample_bytes,
            "LOGSCOPE_INDEX_LINE_BREAK_SAMPLE_BYTES",
        );
        override_usize(&mut self.index.max_entries, "LOGSCOPE_INDEX_MAX_ENTRIES");
        override_bool(&mut self.index.auto_zoom, "LOGSCOPE_INDEX_AUTO_ZOOM");
        override_parsed(
            &mut self.index.auto_zoom_floor,
            "LOGSCOPE_INDEX_AUTO_ZOOM_FLOOR",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogscopeError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.index.line_break_sample_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.line_break_sample_bytes".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        if self.index.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "index.max_entries".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 인덱싱/재읽기 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    /// 줄바꿈 형식 판별을 위해 읽는 파일 앞부분 크기 (바이트)
    pub line_break_sample_bytes: usize,
    /// 재읽기 한 번에 반환할 최대 엔트리 수
    pub max_entries: usize,
    /// 파일을 연 직후 버킷이 하나뿐인 레벨을 건너뛸지 여부
    pub auto_zoom: bool,
    /// 자동 줌이 내려갈 수 있는 가장 세밀한 레벨
    pub auto_zoom_floor: TimeLevel,
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            line_break_sample_bytes: 1024,
            max_entries: 100,
            auto_zoom: true,
            auto_zoom_floor: TimeLevel::Second,
        }
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_parsed<T: FromStr>(target: &mut T, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse value from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = LogscopeConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.index.line_break_sample_bytes, 1024);
        assert_eq!(config.index.max_entries, 100);
        assert!(config.index.auto_zoom);
        assert_eq!(config.index.auto_zoom_floor, TimeLevel::Second);
    }

    #[test]
    fn default_config_passes_validation() {
        let config = LogscopeConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = LogscopeConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.index.max_entries, 100);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[general]
log_level = "debug"

[index]
max_entries = 250
auto_zoom_floor = "minute"
"#;
        let config = LogscopeConfig::parse(toml).unwrap();
        assert_eq!(config.general.log_level, "debug");
        // log_format은 기본값 유지
        assert_eq!(config.general.log_format, "pretty");
        assert_eq!(config.index.max_entries, 250);
        assert_eq!(config.index.auto_zoom_floor, TimeLevel::Minute);
        assert_eq!(config.index.line_break_sample_bytes, 1024);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = LogscopeConfig::parse("invalid = [[[toml");
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            LogscopeError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn from_str_unknown_level_returns_error() {
        let result = LogscopeConfig::parse("[index]\nauto_zoom_floor = \"week\"");
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = LogscopeConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = LogscopeConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_zero_sample_size() {
        let mut config = LogscopeConfig::default();
        config.index.line_break_sample_bytes = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("line_break_sample_bytes"));
    }

    #[test]
    fn validate_rejects_zero_max_entries() {
        let mut config = LogscopeConfig::default();
        config.index.max_entries = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_entries"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 경합하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGSCOPE_STR", "overridden") };
        override_string(&mut val, "TEST_LOGSCOPE_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_LOGSCOPE_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 경합하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGSCOPE_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_LOGSCOPE_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_LOGSCOPE_BOOL_BAD") };
    }

    #[test]
    fn env_override_usize_valid() {
        let mut val = 1usize;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 경합하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGSCOPE_USIZE", "4096") };
        override_usize(&mut val, "TEST_LOGSCOPE_USIZE");
        assert_eq!(val, 4096);
        unsafe { std::env::remove_var("TEST_LOGSCOPE_USIZE") };
    }

    #[test]
    fn env_override_level_parses_names() {
        let mut level = TimeLevel::Second;
        // SAFETY: 고유한 키를 사용하므로 다른 테스트와 경합하지 않습니다.
        unsafe { std::env::set_var("TEST_LOGSCOPE_LEVEL", "Hour") };
        override_parsed(&mut level, "TEST_LOGSCOPE_LEVEL");
        assert_eq!(level, TimeLevel::Hour);
        unsafe { std::env::remove_var("TEST_LOGSCOPE_LEVEL") };
    }

    #[test]
    fn env_override_missing_var_keeps_original() {
        let mut val = "original".to_owned();
        override_string(&mut val, "TEST_LOGSCOPE_NONEXISTENT_12345");
        assert_eq!(val, "original");
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = LogscopeConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = LogscopeConfig::parse(&toml_str).unwrap();
        assert_eq!(config.general.log_level, parsed.general.log_level);
        assert_eq!(config.index.auto_zoom_floor, parsed.index.auto_zoom_floor);
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = LogscopeConfig::from_file("/nonexistent/path/logscope.toml").await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            LogscopeError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
