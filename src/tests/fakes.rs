//! Детерминированные бэкенды и аудиоинструменты для тестов
//!
//! «Аудио» здесь текстовый заголовок `DUR:<секунды>` с добивкой до размера,
//! превышающего минимальный размер ответа. Фейковые инструменты читают
//! длительность из заголовка и склеивают файлы, суммируя длительности.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::config::{Backoff, RetryPolicy, TimelineConfig, VoicePreset};
use crate::error::{Result, TimelineError};
use crate::media::AudioTools;
use crate::tts::{SpeechBackend, SpeechPayload};

/// Размер фейкового аудио
pub const FAKE_AUDIO_BYTES: usize = 2048;

/// Длительность, если для текста не задана своя
pub const DEFAULT_DURATION: f64 = 0.5;

pub fn encode_audio(seconds: f64) -> Vec<u8> {
    let mut audio = format!("DUR:{}\n", seconds).into_bytes();
    audio.resize(FAKE_AUDIO_BYTES, b' ');
    audio
}

pub fn decode_audio(bytes: &[u8]) -> Option<f64> {
    let text = std::str::from_utf8(bytes).ok()?;
    text.strip_prefix("DUR:")?.lines().next()?.trim().parse().ok()
}

/// Конфигурация с быстрыми повторами внутри `root`
pub fn test_config(root: &Path) -> TimelineConfig {
    TimelineConfig {
        temp_root: root.join("temp"),
        output_root: root.join("wav"),
        retry: RetryPolicy {
            max_attempts: 3,
            backoff: Backoff::Fixed,
            backoff_ms: 1,
            attempt_timeout_ms: 1000,
        },
        ..TimelineConfig::default()
    }
}

/// Бэкенд со сценарием по тексту сегмента
#[derive(Default)]
pub struct ScriptedBackend {
    durations: HashMap<String, f64>,
    failing: HashSet<String>,
    garbage: HashSet<String>,
    delays: HashMap<String, Duration>,
    romanize: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<(String, VoicePreset)>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn speak(mut self, text: &str, seconds: f64) -> Self {
        self.durations.insert(text.to_string(), seconds);
        self
    }

    /// Все попытки для этого текста завершаются ошибкой
    pub fn fail(mut self, text: &str) -> Self {
        self.failing.insert(text.to_string());
        self
    }

    /// Ответ достаточного размера, но не распознаваемый как аудио
    pub fn garbage(mut self, text: &str) -> Self {
        self.garbage.insert(text.to_string());
        self
    }

    pub fn delay(mut self, text: &str, millis: u64) -> Self {
        self.delays.insert(text.to_string(), Duration::from_millis(millis));
        self
    }

    /// Возвращать романизацию вида `roman(<текст>)`
    pub fn with_romanization(mut self) -> Self {
        self.romanize = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_texts(&self) -> Vec<String> {
        self.requests.lock().iter().map(|(text, _)| text.clone()).collect()
    }

    pub fn requested_voices(&self) -> Vec<VoicePreset> {
        self.requests.lock().iter().map(|(_, voice)| *voice).collect()
    }
}

#[async_trait]
impl SpeechBackend for ScriptedBackend {
    async fn synthesize(&self, text: &str, voice: VoicePreset) -> Result<SpeechPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push((text.to_string(), voice));

        if let Some(delay) = self.delays.get(text) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(text) {
            return Err(TimelineError::Backend(format!("scripted failure for '{}'", text)));
        }
        if self.garbage.contains(text) {
            return Ok(SpeechPayload::new(vec![0u8; FAKE_AUDIO_BYTES]));
        }

        let seconds = self.durations.get(text).copied().unwrap_or(DEFAULT_DURATION);
        let payload = SpeechPayload::new(encode_audio(seconds));
        if self.romanize {
            Ok(payload.with_transliteration(format!("roman({})", text)))
        } else {
            Ok(payload)
        }
    }
}

/// Бэкенд из двух шагов: запрос ссылки и скачивание
///
/// Второй шаг падает первые `step_two_failures` раз.
pub struct TwoStepBackend {
    step_two_failures: usize,
    pub step_one_calls: AtomicUsize,
    pub step_two_calls: AtomicUsize,
}

impl TwoStepBackend {
    pub fn new(step_two_failures: usize) -> Self {
        Self {
            step_two_failures,
            step_one_calls: AtomicUsize::new(0),
            step_two_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SpeechBackend for TwoStepBackend {
    async fn synthesize(&self, _text: &str, _voice: VoicePreset) -> Result<SpeechPayload> {
        let reference = self.step_one_calls.fetch_add(1, Ordering::SeqCst);
        let fetch = self.step_two_calls.fetch_add(1, Ordering::SeqCst);
        if fetch < self.step_two_failures {
            return Err(TimelineError::Backend(format!("reference {} expired", reference)));
        }
        Ok(SpeechPayload::new(encode_audio(1.0)))
    }
}

/// Бэкенд, всегда отвечающий одним и тем же фиксированным ответом
pub struct FixedBackend {
    audio: Vec<u8>,
    delay: Duration,
    pub calls: AtomicUsize,
}

impl FixedBackend {
    pub fn new(audio: Vec<u8>) -> Self {
        Self {
            audio,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn slow(audio: Vec<u8>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(audio)
        }
    }
}

#[async_trait]
impl SpeechBackend for FixedBackend {
    async fn synthesize(&self, _text: &str, _voice: VoicePreset) -> Result<SpeechPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(SpeechPayload::new(self.audio.clone()))
    }
}

/// Бэкенд, проваливающий проверку конфигурации
pub struct MisconfiguredBackend {
    pub calls: AtomicUsize,
}

#[async_trait]
impl SpeechBackend for MisconfiguredBackend {
    async fn preflight(&self, _voice: VoicePreset) -> Result<()> {
        Err(TimelineError::Configuration("reference audio is missing".to_string()))
    }

    async fn synthesize(&self, _text: &str, _voice: VoicePreset) -> Result<SpeechPayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(SpeechPayload::new(encode_audio(1.0)))
    }
}

/// Аудиоинструменты поверх заголовка `DUR:`
#[derive(Default)]
pub struct FakeAudioTools {
    fail_concat: bool,
    pub concatenated: Mutex<Vec<PathBuf>>,
}

impl FakeAudioTools {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_concat() -> Self {
        Self {
            fail_concat: true,
            ..Self::default()
        }
    }
}

#[async_trait]
impl AudioTools for FakeAudioTools {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        let bytes = tokio::fs::read(path).await.map_err(|e| TimelineError::Probe {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        decode_audio(&bytes).ok_or_else(|| TimelineError::Probe {
            path: path.to_path_buf(),
            reason: "no duration header".to_string(),
        })
    }

    async fn concat(&self, inputs: &[PathBuf], _list_path: &Path, output: &Path) -> Result<()> {
        if self.fail_concat {
            return Err(TimelineError::Concatenation("scripted concat failure".to_string()));
        }

        let mut total = 0.0;
        for input in inputs {
            total += self.probe_duration(input).await?;
        }
        *self.concatenated.lock() = inputs.to_vec();
        tokio::fs::write(output, encode_audio(total)).await?;
        Ok(())
    }
}

/// Содержимое директории (пустой список, если её нет)
pub fn dir_entries(path: &Path) -> Vec<PathBuf> {
    match std::fs::read_dir(path) {
        Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(_) => Vec::new(),
    }
}
