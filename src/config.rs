//! Модуль конфигурации библиотеки tts-timeline
//!
//! Этот модуль содержит структуры и перечисления для настройки библиотеки.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Диалект, определяющий бэкенд синтеза
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Dialect {
    /// Путунхуа (GPT-SoVITS)
    Mandarin,
    /// Тайваньский хокло (романизация + синтез)
    Taigi,
}

/// Пресет голоса/акцента
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum VoicePreset {
    /// Мандаринский голос с референсным аудио
    Mandarin,
    /// Женский голос, 強勢腔（高雄腔）
    TaigiFemaleStrong,
    /// Мужской голос, 強勢腔（高雄腔）
    TaigiMaleStrong,
    /// Женский голос, 次強勢腔（台北腔）
    TaigiFemaleSecondary,
    /// Мужской голос, 次強勢腔（台北腔）
    TaigiMaleSecondary,
}

impl Default for VoicePreset {
    fn default() -> Self {
        Self::Mandarin
    }
}

impl VoicePreset {
    /// Все доступные пресеты
    pub const ALL: [VoicePreset; 5] = [
        Self::Mandarin,
        Self::TaigiFemaleStrong,
        Self::TaigiMaleStrong,
        Self::TaigiFemaleSecondary,
        Self::TaigiMaleSecondary,
    ];

    /// Получить строковое представление пресета
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mandarin => "mandarin",
            Self::TaigiFemaleStrong => "taigi-female-strong",
            Self::TaigiMaleStrong => "taigi-male-strong",
            Self::TaigiFemaleSecondary => "taigi-female-secondary",
            Self::TaigiMaleSecondary => "taigi-male-secondary",
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Mandarin => Dialect::Mandarin,
            _ => Dialect::Taigi,
        }
    }

    /// Значение параметра `gender` сервиса синтеза хокло
    pub fn gender(&self) -> Option<&'static str> {
        match self {
            Self::Mandarin => None,
            Self::TaigiFemaleStrong | Self::TaigiFemaleSecondary => Some("女聲"),
            Self::TaigiMaleStrong | Self::TaigiMaleSecondary => Some("男聲"),
        }
    }

    /// Значение параметра `accent` сервиса синтеза хокло
    pub fn accent(&self) -> Option<&'static str> {
        match self {
            Self::Mandarin => None,
            Self::TaigiFemaleStrong | Self::TaigiMaleStrong => Some("強勢腔（高雄腔）"),
            Self::TaigiFemaleSecondary | Self::TaigiMaleSecondary => Some("次強勢腔（台北腔）"),
        }
    }
}

impl fmt::Display for VoicePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoicePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|preset| preset.as_str() == s.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = Self::ALL.iter().map(|p| p.as_str()).collect();
                format!("unknown voice preset '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// Способ увеличения паузы между попытками
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Backoff {
    /// Одинаковая пауза перед каждой повторной попыткой
    Fixed,
    /// Пауза растёт линейно: `backoff_ms * номер_попытки`
    Linear,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Linear
    }
}

/// Политика повторных попыток синтеза
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Максимальное количество попыток (включая первую)
    pub max_attempts: u32,
    /// Вид паузы между попытками
    pub backoff: Backoff,
    /// Базовая пауза в миллисекундах
    pub backoff_ms: u64,
    /// Таймаут одной попытки в миллисекундах
    pub attempt_timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::default(),
            backoff_ms: 1000,
            attempt_timeout_ms: 30_000,
        }
    }
}

impl RetryPolicy {
    /// Пауза после неудачной попытки с номером `attempt` (нумерация с 1)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let base = Duration::from_millis(self.backoff_ms);
        match self.backoff {
            Backoff::Fixed => base,
            Backoff::Linear => base * attempt.max(1),
        }
    }

    pub fn attempt_timeout(&self) -> Duration {
        Duration::from_millis(self.attempt_timeout_ms)
    }
}

/// Настройки сервиса GPT-SoVITS для мандаринского голоса
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SovitsConfig {
    /// Адрес эндпоинта синтеза
    pub endpoint: String,
    /// Язык синтезируемого текста
    pub text_lang: String,
    /// Путь к референсному аудио (передаётся сервису как есть)
    pub ref_audio_path: PathBuf,
    /// Язык текста референса
    pub prompt_lang: String,
    /// Текст, произнесённый в референсном аудио
    pub prompt_text: String,
    /// Метод нарезки текста на стороне сервиса
    pub text_split_method: String,
}

impl Default for SovitsConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:9880/tts".to_string(),
            text_lang: "zh".to_string(),
            ref_audio_path: PathBuf::from("ref_audio.wav"),
            prompt_lang: "zh".to_string(),
            prompt_text: "隨著深度學習的發展，自然語言處理 (Natural Language Processing，NLP) 技術越趨成熟"
                .to_string(),
            text_split_method: "cut0".to_string(),
        }
    }
}

/// Настройки сервисов романизации и синтеза хокло
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TaigiConfig {
    /// Эндпоинт перевода иероглифов в романизацию
    pub romanize_url: String,
    /// Эндпоинт синтеза по романизации
    pub synthesize_url: String,
}

impl Default for TaigiConfig {
    fn default() -> Self {
        Self {
            romanize_url: "http://tts001.iptcloud.net:8804/html_taigi_zh_tw_py".to_string(),
            synthesize_url: "http://tts001.iptcloud.net:8804/synthesize_TLPA".to_string(),
        }
    }
}

/// Способ определения длительности фрагментов
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeMethod {
    /// Внешняя утилита ffprobe
    Ffprobe,
    /// Разбор заголовков через symphonia
    Native,
}

impl Default for ProbeMethod {
    fn default() -> Self {
        Self::Ffprobe
    }
}

/// Конфигурация библиотеки
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// Голос по умолчанию
    pub voice: VoicePreset,
    /// Мандаринский бэкенд
    pub sovits: SovitsConfig,
    /// Бэкенд хокло
    pub taigi: TaigiConfig,
    /// Повторные попытки синтеза
    pub retry: RetryPolicy,
    /// Ответ короче этого размера считается ошибкой бэкенда
    pub min_payload_bytes: usize,
    /// Максимальное количество одновременных запросов к бэкенду
    pub max_concurrent_requests: usize,
    /// Расширение аудиофайлов
    pub audio_extension: String,
    /// Корень для рабочих директорий запусков
    pub temp_root: PathBuf,
    /// Корень для итоговых артефактов
    pub output_root: PathBuf,
    /// Способ определения длительности
    pub probe_method: ProbeMethod,
    /// Удалять markdown-разметку из озвучиваемого текста
    pub strip_markdown: bool,
    /// Использовать кэширование
    pub use_caching: bool,
    /// Директория для кэша
    pub cache_dir: Option<String>,
    /// Максимальный размер кэша в байтах
    pub max_cache_size: Option<u64>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            voice: VoicePreset::default(),
            sovits: SovitsConfig::default(),
            taigi: TaigiConfig::default(),
            retry: RetryPolicy::default(),
            min_payload_bytes: 1024,
            max_concurrent_requests: 1,
            audio_extension: "wav".to_string(),
            temp_root: PathBuf::from("temp"),
            output_root: PathBuf::from("wav"),
            probe_method: ProbeMethod::default(),
            strip_markdown: false,
            use_caching: false,
            cache_dir: None,
            max_cache_size: Some(512 * 1024 * 1024), // 512 MB
        }
    }
}

impl TimelineConfig {
    /// Загрузить конфигурацию из JSON файла; отсутствующие поля берутся по умолчанию
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            TimelineError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Проверить согласованность параметров
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(TimelineError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(TimelineError::Configuration(
                "max_concurrent_requests must be at least 1".to_string(),
            ));
        }
        if self.audio_extension.trim().is_empty() {
            return Err(TimelineError::Configuration(
                "audio_extension must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_preset_parsing() {
        assert_eq!("taigi-male-secondary".parse::<VoicePreset>().unwrap(), VoicePreset::TaigiMaleSecondary);
        assert_eq!(" mandarin ".parse::<VoicePreset>().unwrap(), VoicePreset::Mandarin);
        let err = "cantonese".parse::<VoicePreset>().unwrap_err();
        assert!(err.contains("taigi-female-strong"));
    }

    #[test]
    fn test_taigi_parameters() {
        let preset = VoicePreset::TaigiFemaleStrong;
        assert_eq!(preset.dialect(), Dialect::Taigi);
        assert_eq!(preset.gender(), Some("女聲"));
        assert_eq!(preset.accent(), Some("強勢腔（高雄腔）"));
        assert_eq!(VoicePreset::Mandarin.gender(), None);
    }

    #[test]
    fn test_backoff_delays() {
        let linear = RetryPolicy::default();
        assert_eq!(linear.delay_after(1), Duration::from_millis(1000));
        assert_eq!(linear.delay_after(3), Duration::from_millis(3000));

        let fixed = RetryPolicy { backoff: Backoff::Fixed, backoff_ms: 250, ..RetryPolicy::default() };
        assert_eq!(fixed.delay_after(1), Duration::from_millis(250));
        assert_eq!(fixed.delay_after(4), Duration::from_millis(250));
    }

    #[test]
    fn test_partial_json_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"voice": "taigi-male-strong", "retry": {"max_attempts": 5}}"#).unwrap();

        let config = TimelineConfig::from_json_file(&path).unwrap();
        assert_eq!(config.voice, VoicePreset::TaigiMaleStrong);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.backoff_ms, 1000);
        assert_eq!(config.audio_extension, "wav");
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = TimelineConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(config.validate(), Err(TimelineError::Configuration(_))));
    }
}
