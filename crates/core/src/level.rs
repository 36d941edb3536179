//! 시간 레벨 -- 연도부터 밀리초까지 7단계 해상도
//!
//! [`TimeLevel`]은 해상도 순서(거친 것 → 세밀한 것)로 전순서를 가지며,
//! 각 레벨은 타임스탬프에서 자기 성분을 추출하는 [`TimeLevel::part_of`]를 제공합니다.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TimelineError;

/// 시간 성분 값 (연도, 월, 일 ... 밀리초)
pub type TimeComponent = i32;

/// 집계 트리의 시간 해상도
///
/// `Ord` 구현은 해상도 순서를 따릅니다 (`Year < Month < ... < Millisecond`).
/// 즉 "작다"는 것은 "더 거칠다"는 뜻입니다.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TimeLevel {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
}

impl TimeLevel {
    /// 모든 레벨 (거친 것부터)
    pub const ALL: [TimeLevel; 7] = [
        TimeLevel::Year,
        TimeLevel::Month,
        TimeLevel::Day,
        TimeLevel::Hour,
        TimeLevel::Minute,
        TimeLevel::Second,
        TimeLevel::Millisecond,
    ];

    /// 트리에서의 깊이 (Year = 0)
    pub fn depth(self) -> usize {
        self as usize
    }

    /// 타임스탬프에서 이 레벨의 성분을 추출합니다.
    ///
    /// 밀리초는 윤초 표현(`nanosecond >= 1_000_000_000`)일 때 999를 넘을 수 있으므로
    /// 호출자는 [`TimeLevel::validate`]로 범위를 확인해야 합니다.
    pub fn part_of(self, timestamp: &DateTime<Utc>) -> TimeComponent {
        match self {
            Self::Year => timestamp.year(),
            Self::Month => timestamp.month() as TimeComponent,
            Self::Day => timestamp.day() as TimeComponent,
            Self::Hour => timestamp.hour() as TimeComponent,
            Self::Minute => timestamp.minute() as TimeComponent,
            Self::Second => timestamp.second() as TimeComponent,
            Self::Millisecond => timestamp.timestamp_subsec_millis() as TimeComponent,
        }
    }

    /// 타임스탬프를 모든 레벨의 성분으로 분해합니다 (인덱스 = 깊이).
    pub fn components_of(timestamp: &DateTime<Utc>) -> [TimeComponent; 7] {
        Self::ALL.map(|level| level.part_of(timestamp))
    }

    /// 이 레벨의 유효 성분 범위
    pub fn valid_range(self) -> RangeInclusive<TimeComponent> {
        match self {
            Self::Year => 1..=9999,
            Self::Month => 1..=12,
            Self::Day => 1..=31,
            Self::Hour => 0..=23,
            Self::Minute => 0..=59,
            Self::Second => 0..=59,
            Self::Millisecond => 0..=999,
        }
    }

    /// 성분 값이 유효 범위 안에 있는지 검증합니다.
    pub fn validate(self, value: i64) -> Result<TimeComponent, TimelineError> {
        let range = self.valid_range();
        match TimeComponent::try_from(value) {
            Ok(v) if range.contains(&v) => Ok(v),
            _ => Err(TimelineError::InvalidTimestampComponent { level: self, value }),
        }
    }

    /// 하위 성분을 기본값으로 채울 때 사용하는 이 레벨의 최솟값
    pub fn min_component(self) -> TimeComponent {
        *self.valid_range().start()
    }

    pub fn has_next(self) -> bool {
        self != Self::Millisecond
    }

    pub fn has_previous(self) -> bool {
        self != Self::Year
    }

    /// 한 단계 더 세밀한 레벨
    pub fn next(self) -> Result<Self, TimelineError> {
        Self::ALL
            .get(self.depth() + 1)
            .copied()
            .ok_or(TimelineError::NoAdjacentLevel {
                level: self,
                direction: "finer",
            })
    }

    /// 한 단계 더 거친 레벨
    pub fn previous(self) -> Result<Self, TimelineError> {
        self.depth()
            .checked_sub(1)
            .map(|depth| Self::ALL[depth])
            .ok_or(TimelineError::NoAdjacentLevel {
                level: self,
                direction: "coarser",
            })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
            Self::Minute => "minute",
            Self::Second => "second",
            Self::Millisecond => "millisecond",
        }
    }
}

impl fmt::Display for TimeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeLevel {
    type Err = String;

    /// 대소문자를 구분하지 않습니다. `ms`, `min`, `sec` 약어도 허용합니다.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            "minute" | "min" => Ok(Self::Minute),
            "second" | "sec" => Ok(Self::Second),
            "millisecond" | "ms" => Ok(Self::Millisecond),
            other => Err(format!(
                "unknown time level: {other} (expected: year, month, day, hour, minute, second, millisecond)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 20, 30).unwrap()
            + chrono::Duration::milliseconds(456)
    }

    #[test]
    fn part_of_extracts_each_component() {
        let ts = sample();
        assert_eq!(
            TimeLevel::components_of(&ts),
            [2024, 3, 1, 10, 20, 30, 456]
        );
    }

    #[test]
    fn levels_are_ordered_by_granularity() {
        assert!(TimeLevel::Year < TimeLevel::Month);
        assert!(TimeLevel::Second < TimeLevel::Millisecond);
        let mut sorted = TimeLevel::ALL;
        sorted.sort();
        assert_eq!(sorted, TimeLevel::ALL);
    }

    #[test]
    fn next_and_previous_are_adjacent() {
        assert_eq!(TimeLevel::Year.next().unwrap(), TimeLevel::Month);
        assert_eq!(TimeLevel::Second.next().unwrap(), TimeLevel::Millisecond);
        assert_eq!(TimeLevel::Month.previous().unwrap(), TimeLevel::Year);
        assert_eq!(TimeLevel::Millisecond.previous().unwrap(), TimeLevel::Second);
    }

    #[test]
    fn next_and_previous_fail_at_extremes() {
        assert!(matches!(
            TimeLevel::Millisecond.next(),
            Err(TimelineError::NoAdjacentLevel { .. })
        ));
        assert!(matches!(
            TimeLevel::Year.previous(),
            Err(TimelineError::NoAdjacentLevel { .. })
        ));
        assert!(!TimeLevel::Millisecond.has_next());
        assert!(!TimeLevel::Year.has_previous());
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        assert_eq!(TimeLevel::Month.validate(12).unwrap(), 12);
        assert_eq!(
            TimeLevel::Month.validate(13),
            Err(TimelineError::InvalidTimestampComponent {
                level: TimeLevel::Month,
                value: 13
            })
        );
        assert!(TimeLevel::Millisecond.validate(1000).is_err());
        assert!(TimeLevel::Hour.validate(-1).is_err());
        assert!(TimeLevel::Year.validate(i64::MAX).is_err());
    }

    #[test]
    fn from_str_is_case_insensitive() {
        assert_eq!("DAY".parse::<TimeLevel>().unwrap(), TimeLevel::Day);
        assert_eq!("ms".parse::<TimeLevel>().unwrap(), TimeLevel::Millisecond);
        assert!("fortnight".parse::<TimeLevel>().is_err());
    }

    #[test]
    fn display_matches_serde_name() {
        let json = serde_json::to_string(&TimeLevel::Minute).unwrap();
        assert_eq!(json, "\"minute\"");
        assert_eq!(TimeLevel::Minute.to_string(), "minute");
    }
}
