//! Модуль обработки ошибок библиотеки tts-timeline
//!
//! Ошибки делятся на два уровня: ошибки отдельного сегмента (синтез, пробинг),
//! которые превращаются в «тихие» записи таймлайна, и ошибки всего запуска,
//! которые возвращаются вызывающей стороне.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Ошибки библиотеки tts-timeline
#[derive(Debug, Error)]
pub enum TimelineError {
    /// Несбалансированная или вложенная разметка исключения
    #[error("Malformed markup at byte {position}: {reason}")]
    MalformedMarkup {
        /// Смещение проблемного маркера в байтах
        position: usize,
        /// Описание проблемы
        reason: String,
    },

    /// Синтез сегмента не удался после всех попыток
    #[error("Synthesis of chunk {ordinal} failed after {attempts} attempt(s): {cause}")]
    Synthesis {
        /// Порядковый номер сегмента
        ordinal: usize,
        /// Количество сделанных попыток
        attempts: u32,
        /// Причина последней неудачной попытки
        #[source]
        cause: Box<TimelineError>,
    },

    /// Бэкенд вернул слишком маленький ответ
    #[error("Invalid audio payload: {bytes} bytes (minimum {min})")]
    InvalidPayload {
        /// Размер полученного ответа
        bytes: usize,
        /// Минимально допустимый размер
        min: usize,
    },

    /// Ошибка протокола бэкенда синтеза
    #[error("Speech backend error: {0}")]
    Backend(String),

    /// Попытка не уложилась в таймаут
    #[error("Attempt timed out after {0:?}")]
    Timeout(Duration),

    /// Не удалось определить длительность аудиофрагмента
    #[error("Failed to probe {path}: {reason}")]
    Probe {
        /// Путь к фрагменту
        path: PathBuf,
        /// Причина
        reason: String,
    },

    /// Ошибка объединения аудиофрагментов
    #[error("Concatenation error: {0}")]
    Concatenation(String),

    /// Ошибка рабочей директории запуска
    #[error("Working directory error at {path}: {source}")]
    WorkingDirectory {
        /// Путь к директории
        path: PathBuf,
        /// Исходная ошибка
        #[source]
        source: std::io::Error,
    },

    /// Ошибка HTTP запроса
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Файл не найден
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Другая ошибка
    #[error("Other error: {0}")]
    Other(String),
}

impl TimelineError {
    /// Ошибка уровня сегмента, после которой запуск продолжается
    pub fn is_segment_level(&self) -> bool {
        matches!(self, Self::Synthesis { .. } | Self::Probe { .. })
    }
}

impl From<&str> for TimelineError {
    fn from(s: &str) -> Self {
        TimelineError::Other(s.to_string())
    }
}

impl From<String> for TimelineError {
    fn from(s: String) -> Self {
        TimelineError::Other(s)
    }
}

/// Тип Result для библиотеки tts-timeline
pub type Result<T> = std::result::Result<T, TimelineError>;
