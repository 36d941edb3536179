#![no_main]

use arbitrary::Arbitrary;
use chrono::{DateTime, Utc};
use libfuzzer_sys::fuzz_target;
use logscope_core::{TimeLevel, TimelineTree};

#[derive(Arbitrary, Debug)]
struct FuzzEvent {
    /// 0001-01-01 00:00:00 UTC 이후 밀리초 (9999년 말에서 순환)
    millis: u64,
    offset: u64,
}

fuzz_target!(|events: Vec<FuzzEvent>| {
    let mut tree = TimelineTree::new();
    let mut inserted = 0u64;
    for event in events.iter().take(256) {
        let millis = (event.millis % 315_537_897_600_000) as i64 - 62_135_596_800_000;
        let Some(ts) = DateTime::<Utc>::from_timestamp_millis(millis) else {
            continue;
        };
        if tree.insert(ts, event.offset).is_ok() {
            inserted += 1;
        }
    }

    assert_eq!(tree.total_count(), inserted);
    for level in TimeLevel::ALL {
        let buckets: Vec<_> = tree.counts_at_level(level, None).collect();
        assert_eq!(buckets.iter().map(|b| b.count).sum::<u64>(), inserted);
        assert!(buckets.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
});
