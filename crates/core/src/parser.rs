//! 파서 trait -- 로그 형식 확장 포인트 정의

use std::io::{Read, Seek};

use crate::error::LogscopeError;
use crate::timeline::TimelineTree;
use crate::types::LogEntry;

/// 탐색 가능한 바이트 스트림
///
/// `Read + Seek`를 trait object로 넘기기 위한 보조 trait입니다.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// 로그 파일 파서 trait
///
/// 새로운 로그 형식을 지원하려면 이 trait을 구현합니다.
/// 두 메서드 모두 시작 전에 스트림 위치를 직접 지정하므로, 호출 전 스트림 위치는 무관합니다.
pub trait LogFileParser: Send + Sync {
    /// 지원하는 로그 형식 이름
    fn format_name(&self) -> &str;

    /// 스트림 전체를 읽어 새 집계 트리를 구축합니다.
    ///
    /// 실패 시 부분 트리는 반환되지 않습니다.
    fn parse_and_build_tree(&self, stream: &mut dyn ReadSeek) -> Result<TimelineTree, LogscopeError>;

    /// `offset`부터 최대 `max_count`개의 원본 엔트리를 다시 읽습니다.
    ///
    /// `offset`은 이 파서가 트리에 기록한 값이어야 합니다.
    fn read_entries(
        &self,
        stream: &mut dyn ReadSeek,
        offset: u64,
        max_count: usize,
    ) -> Result<Vec<LogEntry>, LogscopeError>;
}
