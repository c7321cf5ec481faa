//! Сборка итогового аудио из фрагментов
//!
//! Смещения считаются накопительной суммой измеренных длительностей в порядке
//! сегментов; склейка идёт в том же порядке без перекодирования, поэтому
//! смещения совпадают с реальными позициями в файле.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::media::audio::AudioTools;
use crate::timeline::types::{AudioChunk, ChunkSpan};
use crate::tts::client::ChunkFile;

/// Имя служебного списка файлов для ffmpeg
const CONCAT_LIST_NAME: &str = "tts_files.txt";

/// Результат сборки
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    /// Склеенный файл в рабочей директории; `None`, если склеивать нечего
    pub audio_path: Option<PathBuf>,
    /// Смещения фрагментов, вошедших в аудио
    pub spans: Vec<ChunkSpan>,
    /// Индексы сегментов, чьи файлы не удалось измерить
    pub unprobed: Vec<usize>,
}

impl Assembly {
    pub fn total_duration(&self) -> f64 {
        self.spans.last().map_or(0.0, |span| span.end)
    }
}

/// Измерить длительности; неизмеримые фрагменты исключаются из сборки
pub async fn probe_chunks(chunks: &[ChunkFile], tools: &dyn AudioTools) -> (Vec<AudioChunk>, Vec<usize>) {
    let mut probed = Vec::with_capacity(chunks.len());
    let mut unprobed = Vec::new();

    for chunk in chunks {
        match tools.probe_duration(&chunk.path).await {
            Ok(duration) => probed.push(AudioChunk {
                segment_index: chunk.segment_index,
                path: chunk.path.clone(),
                duration,
                transliteration: chunk.transliteration.clone(),
            }),
            Err(e) => {
                log::warn!(
                    "Excluding chunk {} from assembly: {}",
                    chunk.segment_index,
                    e
                );
                unprobed.push(chunk.segment_index);
            }
        }
    }

    (probed, unprobed)
}

/// Накопительные смещения: `start[0] = 0`, `start[i] = end[i-1]`
pub fn compute_spans(chunks: &[AudioChunk]) -> Vec<ChunkSpan> {
    let mut total = 0.0;
    chunks
        .iter()
        .map(|chunk| {
            let span = ChunkSpan {
                segment_index: chunk.segment_index,
                start: total,
                end: total + chunk.duration,
                transliteration: chunk.transliteration.clone(),
            };
            total = span.end;
            span
        })
        .collect()
}

/// Измерить, рассчитать смещения и склеить фрагменты в `work_dir/audio.{ext}`
pub async fn assemble(
    chunks: &[ChunkFile],
    tools: &dyn AudioTools,
    work_dir: &Path,
    extension: &str,
) -> Result<Assembly> {
    let mut ordered: Vec<ChunkFile> = chunks.to_vec();
    ordered.sort_by_key(|chunk| chunk.segment_index);

    let (probed, unprobed) = probe_chunks(&ordered, tools).await;
    if probed.is_empty() {
        log::warn!("No playable chunks, skipping audio assembly");
        return Ok(Assembly {
            audio_path: None,
            spans: Vec::new(),
            unprobed,
        });
    }

    let spans = compute_spans(&probed);
    let inputs: Vec<PathBuf> = probed.iter().map(|chunk| chunk.path.clone()).collect();
    let output = work_dir.join(format!("audio.{}", extension));

    log::info!("Concatenating {} chunk(s) into {}", inputs.len(), output.display());
    tools
        .concat(&inputs, &work_dir.join(CONCAT_LIST_NAME), &output)
        .await?;

    Ok(Assembly {
        audio_path: Some(output),
        spans,
        unprobed,
    })
}
