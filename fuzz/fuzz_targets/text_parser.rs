#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use logscope_core::parser::LogFileParser;
use logscope_log_index::TextLogParser;

fuzz_target!(|data: &[u8]| {
    let Ok(parser) = TextLogParser::new() else {
        return;
    };
    let mut stream = Cursor::new(data);
    if let Ok(tree) = parser.parse_and_build_tree(&mut stream) {
        // 줄바꿈이 섞인 입력에서는 오프셋이 어긋날 수 있으므로 패닉 여부만 확인한다
        if let Some(first) = tree.first_bucket() {
            let _ = parser.read_entries(&mut stream, first.offset, 4);
        }
    }
});
