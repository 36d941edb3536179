//! 시간 집계 트리 -- 레벨별 이벤트 카운트와 원본 오프셋
//!
//! [`TimelineTree`]는 로그 파일의 이벤트 타임스탬프를 연 → 월 → 일 → 시 → 분 → 초 → 밀리초
//! 계층으로 집계합니다. 각 노드는 자기 하위 이벤트 수와 첫 이벤트의 바이트 오프셋을 가지므로,
//! 파일을 다시 스캔하지 않고도 임의 해상도에서 롤업/드릴다운할 수 있습니다.
//!
//! # 구조
//! ```text
//! [2023] [2024]                       <- Year (루트 형제 목록)
//!          |
//!        [01] [03]                    <- Month
//!               |
//!             [01] [02]               <- Day
//!                    ...
//!                     [0] [456]       <- Millisecond (leaf, offset 보관)
//! ```
//!
//! 형제 목록은 항상 성분 오름차순으로 정렬되어 있습니다. 시간순 입력이 일반적이므로
//! 삽입은 마지막 형제를 먼저 확인하고, 역순 입력일 때만 뒤에서부터 선형 탐색합니다.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::warn;

use crate::error::TimelineError;
use crate::level::{TimeComponent, TimeLevel};
use crate::types::TimeBucket;

const LEVEL_COUNT: usize = TimeLevel::ALL.len();

/// 집계 트리 노드
///
/// 밀리초 레벨만 `Leaf`이고 그 위 레벨은 모두 `Internal`입니다.
#[derive(Debug, Clone)]
enum Node {
    Internal {
        component: TimeComponent,
        count: u64,
        children: Vec<Node>,
    },
    Leaf {
        component: TimeComponent,
        count: u64,
        offset: u64,
    },
}

impl Node {
    fn new(level: TimeLevel, component: TimeComponent, offset: u64) -> Self {
        if level == TimeLevel::Millisecond {
            Self::Leaf {
                component,
                count: 1,
                offset,
            }
        } else {
            Self::Internal {
                component,
                count: 1,
                children: Vec::with_capacity(8),
            }
        }
    }

    fn component(&self) -> TimeComponent {
        match self {
            Self::Internal { component, .. } | Self::Leaf { component, .. } => *component,
        }
    }

    fn count(&self) -> u64 {
        match self {
            Self::Internal { count, .. } | Self::Leaf { count, .. } => *count,
        }
    }

    fn increment(&mut self) {
        match self {
            Self::Internal { count, .. } | Self::Leaf { count, .. } => *count += 1,
        }
    }

    /// 첫 번째(가장 이른) 하위 leaf의 오프셋
    fn offset(&self) -> u64 {
        let mut node = self;
        loop {
            match node {
                Self::Leaf { offset, .. } => return *offset,
                Self::Internal { children, .. } => match children.first() {
                    Some(first) => node = first,
                    // Internal 노드는 생성 직후 같은 insert 호출에서 자식을 얻는다
                    None => return 0,
                },
            }
        }
    }

    fn children(&self) -> &[Node] {
        match self {
            Self::Internal { children, .. } => children,
            Self::Leaf { .. } => &[],
        }
    }
}

/// 형제 목록에서 `component` 노드를 찾아 카운트를 올리거나 새로 삽입하고 그 인덱스를 반환합니다.
fn locate_or_insert(
    siblings: &mut Vec<Node>,
    level: TimeLevel,
    component: TimeComponent,
    offset: u64,
) -> usize {
    let Some(last) = siblings.last_mut() else {
        siblings.push(Node::new(level, component, offset));
        return 0;
    };

    // 시간순 입력의 빠른 경로
    if last.component() == component {
        last.increment();
        return siblings.len() - 1;
    }

    if last.component() < component {
        siblings.push(Node::new(level, component, offset));
        return siblings.len() - 1;
    }

    // 역순 입력: 뒤에서부터 선형 탐색
    for i in (0..siblings.len() - 1).rev() {
        let current = siblings[i].component();
        if current > component {
            continue;
        }
        if current == component {
            siblings[i].increment();
            return i;
        }
        siblings.insert(i + 1, Node::new(level, component, offset));
        return i + 1;
    }

    siblings.insert(0, Node::new(level, component, offset));
    0
}

/// 계층형 시간 집계 트리
///
/// 파일을 열 때마다 한 번 구축되고, 이후에는 읽기 전용으로 취급됩니다.
/// 구축이 끝난 트리는 `Arc`로 공유하여 여러 호출자가 동시에 질의할 수 있습니다.
///
/// # 사용 예시
/// ```
/// use chrono::{TimeZone, Utc};
/// use logscope_core::{TimeLevel, TimelineTree};
///
/// let mut tree = TimelineTree::new();
/// tree.insert(Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(), 100)?;
/// tree.insert(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(), 0)?;
///
/// let days: Vec<_> = tree.counts_at_level(TimeLevel::Day, None).collect();
/// assert_eq!(days[0].offset, 0);
/// assert_eq!(tree.total_count(), 2);
/// # Ok::<(), logscope_core::TimelineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct TimelineTree {
    /// 연도 노드 목록 (루트 형제 목록)
    years: Vec<Node>,
    /// 삽입된 전체 이벤트 수
    total: u64,
}

impl TimelineTree {
    /// 빈 트리를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 이벤트 하나를 삽입합니다.
    ///
    /// 모든 레벨의 성분을 먼저 검증하므로, 실패한 삽입은 트리를 변경하지 않습니다.
    ///
    /// # Errors
    ///
    /// 성분이 레벨의 유효 범위를 벗어나면 `TimelineError::InvalidTimestampComponent`를 반환합니다.
    pub fn insert(&mut self, timestamp: DateTime<Utc>, offset: u64) -> Result<(), TimelineError> {
        let mut components = [0; LEVEL_COUNT];
        for level in TimeLevel::ALL {
            components[level.depth()] = level.validate(i64::from(level.part_of(&timestamp)))?;
        }

        let mut siblings = &mut self.years;
        for level in TimeLevel::ALL {
            let index = locate_or_insert(siblings, level, components[level.depth()], offset);
            match &mut siblings[index] {
                Node::Internal { children, .. } => siblings = children,
                Node::Leaf { .. } => break,
            }
        }

        self.total += 1;
        Ok(())
    }

    /// 삽입된 전체 이벤트 수
    pub fn total_count(&self) -> u64 {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// 특정 레벨의 버킷 카운트를 시간순으로 순회합니다.
    ///
    /// `scope`가 주어지면 `level`보다 거친 모든 레벨에서 해당 성분과 일치하는 노드만 방문합니다.
    /// `level` 자체와 그보다 세밀한 레벨은 필터링되지 않습니다.
    /// 반환된 이터레이터는 `Clone`이므로 같은 질의를 다시 순회할 수 있습니다.
    pub fn counts_at_level(
        &self,
        level: TimeLevel,
        scope: Option<DateTime<Utc>>,
    ) -> CountsAtLevel<'_> {
        CountsAtLevel {
            level,
            scope: scope.as_ref().map(TimeLevel::components_of),
            stack: vec![self.years.iter()],
            path: [0; LEVEL_COUNT],
        }
    }

    /// 가장 이른 이벤트의 밀리초 버킷
    pub fn first_bucket(&self) -> Option<TimeBucket> {
        self.counts_at_level(TimeLevel::Millisecond, None).next()
    }

    /// 디버깅용 트리 덤프 (노드당 한 줄, 레벨마다 4칸 들여쓰기)
    pub fn dump(&self) -> String {
        fn dump_node(out: &mut String, node: &Node, depth: usize) {
            let kind = match node {
                Node::Internal { .. } => "Internal",
                Node::Leaf { .. } => "Leaf",
            };
            out.push_str(&" ".repeat(depth * 4));
            out.push_str(&format!(
                "{kind}: {}={}, count={}, offset={}\n",
                TimeLevel::ALL[depth],
                node.component(),
                node.count(),
                node.offset()
            ));
            for child in node.children() {
                dump_node(out, child, depth + 1);
            }
        }

        let mut out = String::with_capacity(1024);
        for year in &self.years {
            dump_node(&mut out, year, 0);
        }
        out
    }
}

impl fmt::Display for TimelineTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dump())
    }
}

/// 경로 성분으로 대표 타임스탬프를 만듭니다. `level`보다 세밀한 성분은 최솟값으로 채웁니다.
fn representative_timestamp(
    path: &[TimeComponent; LEVEL_COUNT],
    level: TimeLevel,
) -> Option<DateTime<Utc>> {
    let part = |l: TimeLevel| {
        if l <= level {
            path[l.depth()]
        } else {
            l.min_component()
        }
    };
    let as_u32 = |l: TimeLevel| u32::try_from(part(l)).ok();

    NaiveDate::from_ymd_opt(part(TimeLevel::Year), as_u32(TimeLevel::Month)?, as_u32(TimeLevel::Day)?)?
        .and_hms_milli_opt(
            as_u32(TimeLevel::Hour)?,
            as_u32(TimeLevel::Minute)?,
            as_u32(TimeLevel::Second)?,
            as_u32(TimeLevel::Millisecond)?,
        )
        .map(|naive| naive.and_utc())
}

/// [`TimelineTree::counts_at_level`]가 반환하는 지연 이터레이터
///
/// 명시적 스택으로 트리를 깊이 우선 순회합니다. 요청 레벨보다 세밀한 노드로는 내려가지 않습니다.
#[derive(Debug, Clone)]
pub struct CountsAtLevel<'a> {
    level: TimeLevel,
    scope: Option<[TimeComponent; LEVEL_COUNT]>,
    /// `stack[d]`는 깊이 d의 형제 목록 이터레이터
    stack: Vec<std::slice::Iter<'a, Node>>,
    /// 현재 경로의 성분 값
    path: [TimeComponent; LEVEL_COUNT],
}

impl Iterator for CountsAtLevel<'_> {
    type Item = TimeBucket;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(depth) = self.stack.len().checked_sub(1) {
            let Some(node) = self.stack[depth].next() else {
                self.stack.pop();
                continue;
            };

            let node_level = TimeLevel::ALL[depth];
            if let Some(scope) = &self.scope {
                if node_level < self.level && node.component() != scope[depth] {
                    continue;
                }
            }

            self.path[depth] = node.component();

            if node_level == self.level {
                match representative_timestamp(&self.path, self.level) {
                    Some(timestamp) => {
                        return Some(TimeBucket {
                            timestamp,
                            count: node.count(),
                            offset: node.offset(),
                        });
                    }
                    None => {
                        warn!(path = ?self.path, level = %self.level, "skipping bucket with unrepresentable timestamp");
                        continue;
                    }
                }
            }

            self.stack.push(node.children().iter());
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32, ms: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap() + Duration::milliseconds(ms)
    }

    fn day(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
        ts(y, mo, d, 0, 0, 0, 0)
    }

    #[test]
    fn empty_tree_yields_nothing() {
        let tree = TimelineTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.total_count(), 0);
        for level in TimeLevel::ALL {
            assert_eq!(tree.counts_at_level(level, None).count(), 0);
        }
        assert!(tree.first_bucket().is_none());
    }

    #[test]
    fn single_insert_creates_one_bucket_per_level() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 3, 1, 10, 20, 30, 456), 42).unwrap();

        for level in TimeLevel::ALL {
            let buckets: Vec<_> = tree.counts_at_level(level, None).collect();
            assert_eq!(buckets.len(), 1, "level {level}");
            assert_eq!(buckets[0].count, 1);
            assert_eq!(buckets[0].offset, 42);
        }
    }

    #[test]
    fn representative_timestamp_defaults_finer_components() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 3, 15, 10, 20, 30, 456), 0).unwrap();

        let year = tree.counts_at_level(TimeLevel::Year, None).next().unwrap();
        assert_eq!(year.timestamp, day(2024, 1, 1));

        let month = tree.counts_at_level(TimeLevel::Month, None).next().unwrap();
        assert_eq!(month.timestamp, day(2024, 3, 1));

        let hour = tree.counts_at_level(TimeLevel::Hour, None).next().unwrap();
        assert_eq!(hour.timestamp, ts(2024, 3, 15, 10, 0, 0, 0));

        let ms = tree
            .counts_at_level(TimeLevel::Millisecond, None)
            .next()
            .unwrap();
        assert_eq!(ms.timestamp, ts(2024, 3, 15, 10, 20, 30, 456));
    }

    #[test]
    fn out_of_order_insertion_keeps_days_sorted() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2024, 1, 2), 10).unwrap();
        tree.insert(day(2024, 1, 1), 0).unwrap();
        tree.insert(day(2024, 1, 2), 20).unwrap();

        let days: Vec<_> = tree.counts_at_level(TimeLevel::Day, None).collect();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].timestamp, day(2024, 1, 1));
        assert_eq!(days[0].count, 1);
        assert_eq!(days[1].timestamp, day(2024, 1, 2));
        assert_eq!(days[1].count, 2);
        assert_eq!(tree.total_count(), 3);
    }

    #[test]
    fn insertion_before_every_sibling_goes_to_front() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2024, 1, 5), 50).unwrap();
        tree.insert(day(2024, 1, 7), 70).unwrap();
        tree.insert(day(2024, 1, 1), 10).unwrap();

        let days: Vec<_> = tree
            .counts_at_level(TimeLevel::Day, None)
            .map(|b| b.timestamp)
            .collect();
        assert_eq!(days, vec![day(2024, 1, 1), day(2024, 1, 5), day(2024, 1, 7)]);
    }

    #[test]
    fn out_of_order_insert_descends_into_matched_node() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 1, 2, 8, 0, 0, 0), 0).unwrap();
        tree.insert(ts(2024, 1, 3, 9, 0, 0, 0), 1).unwrap();
        // 이미 존재하는 1월 2일 노드 아래에 새로운 시간이 생겨야 한다
        tree.insert(ts(2024, 1, 2, 23, 0, 0, 0), 2).unwrap();

        let hours: Vec<_> = tree
            .counts_at_level(TimeLevel::Hour, Some(day(2024, 1, 2)))
            .map(|b| (b.timestamp, b.count))
            .collect();
        assert_eq!(
            hours,
            vec![
                (ts(2024, 1, 2, 8, 0, 0, 0), 1),
                (ts(2024, 1, 2, 23, 0, 0, 0), 1)
            ]
        );

        let jan3: Vec<_> = tree
            .counts_at_level(TimeLevel::Hour, Some(day(2024, 1, 3)))
            .collect();
        assert_eq!(jan3.len(), 1);
    }

    #[test]
    fn bucket_offset_is_chronologically_first_event() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 1, 1, 12, 0, 0, 0), 500).unwrap();
        tree.insert(ts(2024, 1, 1, 9, 0, 0, 0), 900).unwrap();

        let day_bucket = tree.counts_at_level(TimeLevel::Day, None).next().unwrap();
        assert_eq!(day_bucket.offset, 900);
        assert_eq!(day_bucket.count, 2);
    }

    #[test]
    fn leaf_offset_is_never_overwritten() {
        let mut tree = TimelineTree::new();
        let t = ts(2024, 1, 1, 0, 0, 0, 7);
        tree.insert(t, 100).unwrap();
        tree.insert(t, 200).unwrap();
        tree.insert(t, 300).unwrap();

        let leaf = tree.first_bucket().unwrap();
        assert_eq!(leaf.count, 3);
        assert_eq!(leaf.offset, 100);
    }

    #[test]
    fn scope_filters_every_coarser_level() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2023, 12, 31), 0).unwrap();
        tree.insert(day(2024, 1, 10), 1).unwrap();
        tree.insert(day(2024, 1, 11), 2).unwrap();
        tree.insert(day(2024, 2, 1), 3).unwrap();

        let months: Vec<_> = tree
            .counts_at_level(TimeLevel::Month, Some(day(2024, 6, 6)))
            .map(|b| (b.timestamp, b.count))
            .collect();
        assert_eq!(months, vec![(day(2024, 1, 1), 2), (day(2024, 2, 1), 1)]);

        let days: Vec<_> = tree
            .counts_at_level(TimeLevel::Day, Some(day(2024, 1, 20)))
            .map(|b| b.timestamp)
            .collect();
        assert_eq!(days, vec![day(2024, 1, 10), day(2024, 1, 11)]);
    }

    #[test]
    fn scope_does_not_filter_requested_level() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2023, 5, 1), 0).unwrap();
        tree.insert(day(2024, 5, 1), 1).unwrap();

        // Year 질의에는 거친 레벨이 없으므로 scope가 무시된다
        let years = tree
            .counts_at_level(TimeLevel::Year, Some(day(2024, 1, 1)))
            .count();
        assert_eq!(years, 2);
    }

    #[test]
    fn millisecond_query_filters_only_coarser_levels() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 1, 1, 0, 0, 1, 5), 0).unwrap();
        tree.insert(ts(2024, 1, 1, 0, 0, 1, 900), 1).unwrap();
        tree.insert(ts(2024, 1, 1, 0, 0, 2, 5), 2).unwrap();

        let ms: Vec<_> = tree
            .counts_at_level(TimeLevel::Millisecond, Some(ts(2024, 1, 1, 0, 0, 1, 0)))
            .collect();
        assert_eq!(ms.len(), 2);
    }

    #[test]
    fn scope_without_matches_yields_nothing() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2024, 1, 1), 0).unwrap();
        assert_eq!(
            tree.counts_at_level(TimeLevel::Day, Some(day(2020, 1, 1)))
                .count(),
            0
        );
    }

    #[test]
    fn query_iterator_can_be_cloned_and_replayed() {
        let mut tree = TimelineTree::new();
        tree.insert(day(2024, 1, 1), 0).unwrap();
        tree.insert(day(2024, 1, 2), 1).unwrap();

        let query = tree.counts_at_level(TimeLevel::Day, None);
        let first: Vec<_> = query.clone().collect();
        let second: Vec<_> = query.collect();
        assert_eq!(first, second);
    }

    #[test]
    fn leap_second_is_rejected_without_mutation() {
        let mut tree = TimelineTree::new();
        let leap = NaiveDate::from_ymd_opt(2016, 12, 31)
            .unwrap()
            .and_hms_milli_opt(23, 59, 59, 1_500)
            .unwrap()
            .and_utc();

        let err = tree.insert(leap, 0).unwrap_err();
        assert_eq!(
            err,
            TimelineError::InvalidTimestampComponent {
                level: TimeLevel::Millisecond,
                value: 1500
            }
        );
        assert!(tree.is_empty());
        assert_eq!(tree.total_count(), 0);
    }

    #[test]
    fn dump_lists_every_node() {
        let mut tree = TimelineTree::new();
        tree.insert(ts(2024, 1, 1, 0, 0, 0, 1), 3).unwrap();
        let dump = tree.dump();
        assert_eq!(dump.lines().count(), TimeLevel::ALL.len());
        assert!(dump.starts_with("Internal: year=2024, count=1, offset=3"));
        assert!(dump.contains("Leaf: millisecond=1"));
    }
}
