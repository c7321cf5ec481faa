//! Абстракция внешнего бэкенда синтеза речи

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Response;

use crate::config::VoicePreset;
use crate::error::{Result, TimelineError};

/// Максимальная длина текста ошибки сервера, попадающего в сообщение
const ERROR_BODY_LIMIT: usize = 200;

/// Результат одного полного обращения к бэкенду
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechPayload {
    /// Двоичные аудиоданные
    pub audio: Bytes,
    /// Фонетическая транслитерация (романизация хокло), если бэкенд её строит
    pub transliteration: Option<String>,
}

impl SpeechPayload {
    pub fn new(audio: impl Into<Bytes>) -> Self {
        Self {
            audio: audio.into(),
            transliteration: None,
        }
    }

    pub fn with_transliteration(mut self, transliteration: impl Into<String>) -> Self {
        self.transliteration = Some(transliteration.into());
        self
    }
}

/// Бэкенд синтеза: `text + voice -> audio`
///
/// Реализация может делать несколько связанных сетевых запросов (получить
/// ссылку и скачать по ней, либо романизировать и синтезировать). Повторные
/// попытки делает вызывающая сторона, всегда для вызова целиком.
#[async_trait]
pub trait SpeechBackend: Send + Sync {
    /// Проверка конфигурации один раз за запуск, до первого синтеза
    async fn preflight(&self, _voice: VoicePreset) -> Result<()> {
        Ok(())
    }

    /// Синтезировать один фрагмент текста
    async fn synthesize(&self, text: &str, voice: VoicePreset) -> Result<SpeechPayload>;
}

/// Превратить не-2xx ответ в ошибку бэкенда с началом тела ответа
pub(crate) async fn ensure_success(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().clone();
    let error_text = match response.text().await {
        Ok(text) => text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
        Err(e) => format!("Failed to read error response: {}", e),
    };
    Err(TimelineError::Backend(format!(
        "{} returned status {}: {}",
        url, status, error_text
    )))
}

/// Ответ содержит JSON, а не аудио
pub(crate) fn is_json_response(response: &Response) -> bool {
    response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map_or(false, |value| value.contains("application/json"))
}
