#![no_main]

use std::io::Cursor;

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use logscope_log_index::EntryReader;
use logscope_log_index::parser::text::LineMatcher;

/// 퍼저용 구조적 입력
#[derive(Arbitrary, Debug)]
struct FuzzInput {
    content: Vec<u8>,
    offset: u64,
    /// 반환 개수 상한 (작은 값으로 제한)
    max_count: u8,
}

fuzz_target!(|input: FuzzInput| {
    let Ok(matcher) = LineMatcher::new() else {
        return;
    };
    let len = input.content.len() as u64;
    let offset = if len == 0 { input.offset % 2 } else { input.offset % (len + 2) };
    let result = EntryReader::new(&matcher).read_entries(
        &mut Cursor::new(input.content),
        offset,
        usize::from(input.max_count),
    );
    match result {
        Ok(entries) => assert!(entries.len() <= usize::from(input.max_count)),
        Err(_) => assert!(offset > len),
    }
});
