//! Восстановление таймлайна по сегментам и смещениям фрагментов

use std::collections::HashMap;

use crate::text::Segment;
use crate::timeline::types::{ChunkSpan, TimelineEntry};

/// Построить по одной записи на каждый сегмент в порядке индексов
///
/// Сегменты без звука (исключённые из озвучки, неудавшиеся или неизмеримые)
/// получают нулевой интервал, прижатый к концу предыдущей записи.
pub fn reconstruct(segments: &[Segment], spans: &[ChunkSpan]) -> Vec<TimelineEntry> {
    let by_index: HashMap<usize, &ChunkSpan> =
        spans.iter().map(|span| (span.segment_index, span)).collect();

    let mut ordered: Vec<&Segment> = segments.iter().collect();
    ordered.sort_by_key(|segment| segment.index);

    let mut cursor = 0.0;
    let mut entries = Vec::with_capacity(ordered.len());

    for segment in ordered {
        let entry = match by_index.get(&segment.index) {
            Some(span) => TimelineEntry {
                index: segment.index,
                text: segment.text.clone(),
                roman: span.transliteration.clone(),
                start: span.start,
                end: span.end,
            },
            None => TimelineEntry {
                index: segment.index,
                text: segment.text.clone(),
                roman: None,
                start: cursor,
                end: cursor,
            },
        };
        cursor = entry.end;
        entries.push(entry);
    }

    let silent = entries.iter().filter(|entry| entry.is_silent()).count();
    log::debug!(
        "Reconstructed {} timeline entries ({} silent)",
        entries.len(),
        silent
    );

    entries
}
