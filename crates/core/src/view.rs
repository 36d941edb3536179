//! 드릴다운 탐색 상태 -- 현재 레벨과 문맥 타임스탬프
//!
//! [`TimelineView`]는 공유된 [`TimelineTree`] 위에서 "지금 어떤 해상도로, 어떤 구간을 보고 있는가"만
//! 보관합니다. 트리는 변경하지 않으므로 같은 트리에 여러 뷰를 만들 수 있습니다.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Timelike, Utc};
use tracing::debug;

use crate::error::TimelineError;
use crate::level::TimeLevel;
use crate::timeline::TimelineTree;
use crate::types::TimeBucket;

/// 차트 축 범위 (시작, 끝)
pub type DateRange = (DateTime<Utc>, DateTime<Utc>);

/// 집계 트리 탐색 상태
#[derive(Debug, Clone)]
pub struct TimelineView {
    tree: Arc<TimelineTree>,
    level: TimeLevel,
    context: Option<DateTime<Utc>>,
}

impl TimelineView {
    /// 연도 레벨, 문맥 없음으로 시작합니다.
    pub fn new(tree: Arc<TimelineTree>) -> Self {
        Self {
            tree,
            level: TimeLevel::Year,
            context: None,
        }
    }

    /// 지정한 레벨과 문맥으로 바로 시작합니다.
    pub fn at_level(
        tree: Arc<TimelineTree>,
        level: TimeLevel,
        context: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            tree,
            level,
            context,
        }
    }

    /// 버킷이 정확히 하나뿐인 레벨을 `floor`까지 자동으로 건너뜁니다.
    pub fn auto_zoomed(tree: Arc<TimelineTree>, floor: TimeLevel) -> Self {
        let mut view = Self::new(tree);
        while view.level < floor {
            let mut buckets = view.tree.counts_at_level(view.level, view.context);
            let (Some(only), None) = (buckets.next(), buckets.next()) else {
                break;
            };
            view.context = Some(only.timestamp);
            view.level = match view.level.next() {
                Ok(level) => level,
                Err(_) => break,
            };
        }
        debug!(level = %view.level, context = ?view.context, "auto zoom settled");
        view
    }

    pub fn level(&self) -> TimeLevel {
        self.level
    }

    pub fn context(&self) -> Option<DateTime<Utc>> {
        self.context
    }

    pub fn tree(&self) -> &Arc<TimelineTree> {
        &self.tree
    }

    /// 현재 보이는 버킷 목록
    pub fn buckets(&self) -> Vec<TimeBucket> {
        self.tree.counts_at_level(self.level, self.context).collect()
    }

    /// 선택한 버킷 안으로 한 단계 들어갑니다.
    ///
    /// # Errors
    ///
    /// 이미 밀리초 레벨이면 `TimelineError::NoAdjacentLevel`을 반환하고 상태는 그대로입니다.
    pub fn zoom_in(&mut self, selected: DateTime<Utc>) -> Result<(), TimelineError> {
        let next = self.level.next()?;
        self.context = Some(selected);
        self.level = next;
        Ok(())
    }

    /// 한 단계 거친 레벨로 나옵니다. 문맥 타임스탬프는 유지됩니다.
    ///
    /// # Errors
    ///
    /// 이미 연도 레벨이면 `TimelineError::NoAdjacentLevel`을 반환합니다.
    pub fn zoom_out(&mut self) -> Result<(), TimelineError> {
        self.level = self.level.previous()?;
        Ok(())
    }

    /// 대표 타임스탬프가 `timestamp`와 같은 보이는 버킷
    pub fn bucket_at(&self, timestamp: DateTime<Utc>) -> Option<TimeBucket> {
        self.tree
            .counts_at_level(self.level, self.context)
            .find(|bucket| bucket.timestamp == timestamp)
    }

    /// 보이는 버킷을 담는 차트 축 범위. 버킷이 없으면 `None`입니다.
    pub fn date_range(&self) -> Option<DateRange> {
        let mut buckets = self.tree.counts_at_level(self.level, self.context);
        let first = buckets.next()?.timestamp;
        let last = buckets.last().map_or(first, |b| b.timestamp);
        date_range_for(self.level, first, last)
    }
}

fn midnight(y: i32, m: u32, d: u32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(y, m, d)?
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
}

fn date_range_for(
    level: TimeLevel,
    first: DateTime<Utc>,
    last: DateTime<Utc>,
) -> Option<DateRange> {
    let year = Months::new(12);
    let range = match level {
        TimeLevel::Year => (
            first.checked_sub_months(year)?,
            last.checked_add_months(year)?,
        ),
        TimeLevel::Month => (
            midnight(first.year(), 1, 1)?,
            midnight(last.year(), 12, 31)?,
        ),
        TimeLevel::Day => (
            midnight(first.year(), first.month(), 1)? - Duration::days(1),
            midnight(last.year(), last.month(), 1)?.checked_add_months(Months::new(1))?
                - Duration::days(1),
        ),
        TimeLevel::Hour => (
            midnight(first.year(), first.month(), first.day())?,
            midnight(last.year(), last.month(), last.day())? + Duration::days(1),
        ),
        TimeLevel::Minute => {
            let start = first.with_minute(0)?.with_second(0)?.with_nanosecond(0)?;
            (start, start + Duration::hours(1))
        }
        TimeLevel::Second => {
            let start = first.with_second(0)?.with_nanosecond(0)?;
            (start, start + Duration::minutes(1))
        }
        TimeLevel::Millisecond => {
            let start = first.with_nanosecond(0)?;
            (start, start + Duration::seconds(1))
        }
    };
    Some(range)
}
