//! Модуль для кэширования результатов синтеза
//!
//! Аудио хранится на диске под ключом md5(настройки бэкенда, расширение,
//! голос, текст); романизация, если есть, лежит рядом в файле с
//! расширением `.roman`. Смена референсного аудио, эндпоинта или формата
//! даёт другой ключ.

use std::fs;
use std::path::PathBuf;
use std::time::SystemTime;

use walkdir::WalkDir;

use crate::config::{Dialect, TimelineConfig, VoicePreset};
use crate::error::{Result, TimelineError};
use crate::tts::backend::SpeechPayload;

const AUDIO_EXTENSION: &str = "audio";
const ROMAN_EXTENSION: &str = "roman";

/// Дисковый кэш синтеза
#[derive(Debug, Clone)]
pub struct SpeechCache {
    /// Директория для кэша
    cache_dir: PathBuf,
    /// Максимальный размер кэша в байтах
    max_size: Option<u64>,
    /// Отпечаток настроек GPT-SoVITS и формата
    mandarin_fingerprint: String,
    /// Отпечаток настроек сервисов хокло и формата
    taigi_fingerprint: String,
}

impl SpeechCache {
    /// Создать новый экземпляр SpeechCache
    pub fn new(config: &TimelineConfig) -> Result<Self> {
        let cache_dir = match &config.cache_dir {
            Some(dir) => PathBuf::from(dir),
            None => std::env::temp_dir().join("tts-timeline-cache"),
        };

        // Создаем директорию для кэша, если она не существует
        if !cache_dir.exists() {
            fs::create_dir_all(&cache_dir)?;
        }

        let extension = config.audio_extension.as_str();
        Ok(Self {
            cache_dir,
            max_size: config.max_cache_size,
            mandarin_fingerprint: fingerprint(&serde_json::to_vec(&config.sovits)?, extension),
            taigi_fingerprint: fingerprint(&serde_json::to_vec(&config.taigi)?, extension),
        })
    }

    /// Найти ранее синтезированный фрагмент
    pub async fn lookup(&self, text: &str, voice: VoicePreset) -> Option<SpeechPayload> {
        let key = self.cache_key(text, voice);
        let audio = tokio::fs::read(self.entry_path(&key, AUDIO_EXTENSION)).await.ok()?;
        let transliteration = tokio::fs::read_to_string(self.entry_path(&key, ROMAN_EXTENSION))
            .await
            .ok();

        log::debug!("Cache hit for '{}' ({})", text, voice);
        Some(SpeechPayload {
            audio: audio.into(),
            transliteration,
        })
    }

    /// Добавить фрагмент в кэш
    pub async fn store(&self, text: &str, voice: VoicePreset, payload: &SpeechPayload) -> Result<()> {
        let key = self.cache_key(text, voice);

        if let Some(roman) = &payload.transliteration {
            tokio::fs::write(self.entry_path(&key, ROMAN_EXTENSION), roman).await?;
        }
        tokio::fs::write(self.entry_path(&key, AUDIO_EXTENSION), &payload.audio).await?;

        if self.max_size.is_none() {
            return Ok(());
        }
        let cache = self.clone();
        tokio::task::spawn_blocking(move || cache.check_cache_size())
            .await
            .map_err(|e| TimelineError::Other(format!("cache eviction task failed: {}", e)))?
    }

    /// Очистить кэш
    pub fn clear(&self) -> Result<()> {
        for entry in fs::read_dir(&self.cache_dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    /// Генерировать ключ для кэша
    fn cache_key(&self, text: &str, voice: VoicePreset) -> String {
        let settings = match voice.dialect() {
            Dialect::Mandarin => &self.mandarin_fingerprint,
            Dialect::Taigi => &self.taigi_fingerprint,
        };

        let mut hasher = md5::Context::new();
        hasher.consume(settings.as_bytes());
        hasher.consume([0u8]);
        hasher.consume(voice.as_str().as_bytes());
        hasher.consume([0u8]);
        hasher.consume(text.as_bytes());

        format!("{:x}", hasher.compute())
    }

    fn entry_path(&self, key: &str, extension: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.{}", key, extension))
    }

    /// Удалить самые старые записи, если кэш превысил лимит
    fn check_cache_size(&self) -> Result<()> {
        let max_size = match self.max_size {
            Some(max_size) => max_size,
            None => return Ok(()),
        };

        let mut total_size = 0;
        let mut audio_files: Vec<(PathBuf, u64, SystemTime)> = Vec::new();

        for entry in WalkDir::new(&self.cache_dir).min_depth(1).max_depth(1) {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let metadata = entry.metadata().map_err(std::io::Error::from)?;
            total_size += metadata.len();

            let is_audio = entry.path().extension().map_or(false, |ext| ext == AUDIO_EXTENSION);
            if is_audio {
                audio_files.push((entry.path().to_path_buf(), metadata.len(), metadata.modified()?));
            }
        }

        if total_size <= max_size {
            return Ok(());
        }

        // Сортируем файлы по времени модификации (от старых к новым)
        audio_files.sort_by(|a, b| a.2.cmp(&b.2));

        for (path, size, _) in audio_files {
            if total_size <= max_size {
                break;
            }
            let roman = path.with_extension(ROMAN_EXTENSION);
            if let Ok(metadata) = fs::metadata(&roman) {
                total_size = total_size.saturating_sub(metadata.len());
                fs::remove_file(&roman)?;
            }
            fs::remove_file(&path)?;
            total_size = total_size.saturating_sub(size);
            log::debug!("Evicted cached audio {}", path.display());
        }

        Ok(())
    }
}

/// md5 от настроек бэкенда и расширения аудио
fn fingerprint(settings: &[u8], extension: &str) -> String {
    let mut hasher = md5::Context::new();
    hasher.consume(settings);
    hasher.consume([0u8]);
    hasher.consume(extension.as_bytes());
    format!("{:x}", hasher.compute())
}
