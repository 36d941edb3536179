#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use logscope_core::parser::LogFileParser;
use logscope_log_index::EventLogXmlParser;

fuzz_target!(|data: &[u8]| {
    let parser = EventLogXmlParser::new();
    let mut stream = Cursor::new(data);
    if let Ok(tree) = parser.parse_and_build_tree(&mut stream) {
        if let Some(first) = tree.first_bucket() {
            let _ = parser.read_entries(&mut stream, first.offset, 4);
        }
    }
});
