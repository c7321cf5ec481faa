//! Клиент синтеза одного сегмента с повторными попытками
//!
//! Каждая попытка есть полный вызов бэкенда с таймаутом и проверкой размера
//! ответа. После исчерпания попыток возвращается `TimelineError::Synthesis`
//! с причиной последней неудачи; вызывающая сторона пропускает сегмент.

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{RetryPolicy, TimelineConfig, VoicePreset};
use crate::error::{Result, TimelineError};
use crate::tts::backend::{SpeechBackend, SpeechPayload};
use crate::tts::cache::SpeechCache;
use crate::utils::temp::ScopedWorkDir;

/// Успешно синтезированный фрагмент в рабочей директории
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkFile {
    /// Индекс сегмента, для которого создан файл
    pub segment_index: usize,
    /// Путь к аудиофайлу
    pub path: PathBuf,
    /// Романизация, если бэкенд её вернул
    pub transliteration: Option<String>,
}

/// Клиент синтеза
pub struct SynthesisClient {
    backend: Arc<dyn SpeechBackend>,
    retry: RetryPolicy,
    min_payload_bytes: usize,
    audio_extension: String,
    cache: Option<SpeechCache>,
}

impl SynthesisClient {
    pub fn new(backend: Arc<dyn SpeechBackend>, config: &TimelineConfig) -> Self {
        Self {
            backend,
            retry: config.retry.clone(),
            min_payload_bytes: config.min_payload_bytes,
            audio_extension: config.audio_extension.clone(),
            cache: None,
        }
    }

    /// Подключить дисковый кэш
    pub fn with_cache(mut self, cache: SpeechCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn backend(&self) -> &Arc<dyn SpeechBackend> {
        &self.backend
    }

    /// Синтезировать сегмент и записать его в `work_dir/chunk_{ordinal}.{ext}`
    pub async fn synthesize(
        &self,
        text: &str,
        ordinal: usize,
        work_dir: &ScopedWorkDir,
        voice: VoicePreset,
    ) -> Result<ChunkFile> {
        let cached = match &self.cache {
            Some(cache) => cache.lookup(text, voice).await,
            None => None,
        };
        let payload = match cached {
            Some(payload) if payload.audio.len() >= self.min_payload_bytes => payload,
            _ => {
                let payload = self.synthesize_with_retry(text, ordinal, voice).await?;
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.store(text, voice, &payload).await {
                        log::warn!("Failed to cache audio for chunk {}: {}", ordinal, e);
                    }
                }
                payload
            }
        };

        let path = work_dir.chunk_path(ordinal, &self.audio_extension);
        tokio::fs::write(&path, &payload.audio).await?;
        log::debug!(
            "Saved {} bytes of audio for chunk {} to {}",
            payload.audio.len(),
            ordinal,
            path.display()
        );

        Ok(ChunkFile {
            segment_index: ordinal,
            path,
            transliteration: payload.transliteration,
        })
    }

    /// Вызов бэкенда в конверте повторных попыток
    pub async fn synthesize_with_retry(
        &self,
        text: &str,
        ordinal: usize,
        voice: VoicePreset,
    ) -> Result<SpeechPayload> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            log::debug!(
                "Synthesizing chunk {} '{}' (attempt {}/{})",
                ordinal,
                text,
                attempt,
                max_attempts
            );

            let error = match self.attempt(text, voice).await {
                Ok(payload) => return Ok(payload),
                Err(e) => e,
            };

            log::warn!(
                "Attempt {}/{} for chunk {} failed: {}",
                attempt,
                max_attempts,
                ordinal,
                error
            );

            if attempt >= max_attempts {
                return Err(TimelineError::Synthesis {
                    ordinal,
                    attempts: attempt,
                    cause: Box::new(error),
                });
            }

            let wait_time = self.retry.delay_after(attempt);
            log::debug!("Retrying chunk {} in {:?}", ordinal, wait_time);
            tokio::time::sleep(wait_time).await;
        }
    }

    async fn attempt(&self, text: &str, voice: VoicePreset) -> Result<SpeechPayload> {
        let timeout = self.retry.attempt_timeout();
        let payload = tokio::time::timeout(timeout, self.backend.synthesize(text, voice))
            .await
            .map_err(|_| TimelineError::Timeout(timeout))??;

        if payload.audio.len() < self.min_payload_bytes {
            return Err(TimelineError::InvalidPayload {
                bytes: payload.audio.len(),
                min: self.min_payload_bytes,
            });
        }
        Ok(payload)
    }
}
