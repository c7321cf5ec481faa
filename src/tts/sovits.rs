//! Мандаринский голос через сервис GPT-SoVITS
//!
//! Сервис отвечает либо самим аудио, либо JSON со ссылкой на него.
//! Во втором случае аудио скачивается вторым запросом.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use path_clean::PathClean;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::config::{Dialect, SovitsConfig, VoicePreset};
use crate::error::{Result, TimelineError};
use crate::tts::backend::{ensure_success, is_json_response, SpeechBackend, SpeechPayload};

/// Тело запроса к эндпоинту `/tts`
#[derive(Debug, Serialize)]
struct SovitsRequest<'a> {
    text: &'a str,
    text_lang: &'a str,
    ref_audio_path: String,
    prompt_lang: &'a str,
    prompt_text: &'a str,
    text_split_method: &'a str,
    streaming_mode: bool,
}

/// Ответ-ссылка на сгенерированное аудио
#[derive(Debug, Deserialize)]
struct AudioReference {
    #[serde(alias = "audio_url")]
    url: String,
}

/// Бэкенд GPT-SoVITS
pub struct SovitsBackend {
    client: Client,
    config: SovitsConfig,
    ref_audio_path: PathBuf,
}

impl SovitsBackend {
    pub fn new(config: SovitsConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        let ref_audio_path = if config.ref_audio_path.is_absolute() {
            config.ref_audio_path.clean()
        } else {
            std::env::current_dir()?.join(&config.ref_audio_path).clean()
        };

        Ok(Self {
            client,
            config,
            ref_audio_path,
        })
    }

    /// Второй шаг: скачать аудио по ссылке из ответа
    async fn fetch_reference(&self, reference: &str) -> Result<Bytes> {
        let base = Url::parse(&self.config.endpoint).map_err(|e| {
            TimelineError::Configuration(format!("invalid SoVITS endpoint '{}': {}", self.config.endpoint, e))
        })?;
        let url = base.join(reference).map_err(|e| {
            TimelineError::Backend(format!("invalid audio reference '{}': {}", reference, e))
        })?;

        log::debug!("Fetching SoVITS audio from {}", url);
        let response = ensure_success(self.client.get(url).send().await?).await?;
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl SpeechBackend for SovitsBackend {
    async fn preflight(&self, voice: VoicePreset) -> Result<()> {
        if voice.dialect() != Dialect::Mandarin {
            return Err(TimelineError::Configuration(format!(
                "voice {} is not served by the SoVITS backend",
                voice
            )));
        }
        if !self.ref_audio_path.is_file() {
            return Err(TimelineError::Configuration(format!(
                "reference audio not found: {}",
                self.ref_audio_path.display()
            )));
        }
        Ok(())
    }

    async fn synthesize(&self, text: &str, _voice: VoicePreset) -> Result<SpeechPayload> {
        let request = SovitsRequest {
            text,
            text_lang: &self.config.text_lang,
            ref_audio_path: self.ref_audio_path.to_string_lossy().to_string(),
            prompt_lang: &self.config.prompt_lang,
            prompt_text: &self.config.prompt_text,
            text_split_method: &self.config.text_split_method,
            streaming_mode: false,
        };

        log::debug!("Sending SoVITS request for text: '{}'", text);
        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let audio = if is_json_response(&response) {
            let reference: AudioReference = response.json().await?;
            self.fetch_reference(&reference.url).await?
        } else {
            response.bytes().await?
        };

        Ok(SpeechPayload::new(audio))
    }
}
