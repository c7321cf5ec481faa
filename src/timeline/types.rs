//! Типы таймлайна

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Фрагмент с измеренной длительностью
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub segment_index: usize,
    pub path: PathBuf,
    /// Длительность в секундах
    pub duration: f64,
    pub transliteration: Option<String>,
}

/// Положение фрагмента в итоговом аудио
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkSpan {
    pub segment_index: usize,
    pub start: f64,
    pub end: f64,
    pub transliteration: Option<String>,
}

/// Запись таймлайна
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    /// Индекс сегмента
    pub index: usize,
    /// Текст сегмента
    pub text: String,
    /// Романизация (только для голосов хокло)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roman: Option<String>,
    /// Начало в секундах от начала аудио
    pub start: f64,
    /// Конец в секундах от начала аудио
    pub end: f64,
}

impl TimelineEntry {
    /// Запись без звука (исключённый или неудавшийся сегмент)
    pub fn is_silent(&self) -> bool {
        self.start == self.end
    }
}

/// Результат одного запуска
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// Безопасный идентификатор проекта
    pub project_id: String,
    /// Итоговое аудио; `None`, если ни один сегмент не был синтезирован
    pub audio_path: Option<PathBuf>,
    /// Путь к index.json
    pub timeline_path: PathBuf,
    /// Записи таймлайна по порядку индексов
    pub entries: Vec<TimelineEntry>,
}

impl PipelineResult {
    pub fn has_audio(&self) -> bool {
        self.audio_path.is_some()
    }

    /// Конец последней записи, то есть длительность озвученной части
    pub fn duration(&self) -> f64 {
        self.entries.last().map_or(0.0, |entry| entry.end)
    }
}
