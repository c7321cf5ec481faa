//! Голос хокло: романизация текста и синтез по романизации
//!
//! Оба запроса составляют одну попытку; романизация попадает в поле `roman`
//! записи таймлайна.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;

use crate::config::{Dialect, TaigiConfig, VoicePreset};
use crate::error::{Result, TimelineError};
use crate::tts::backend::{ensure_success, SpeechBackend, SpeechPayload};

/// Бэкенд хокло
pub struct TaigiBackend {
    client: Client,
    config: TaigiConfig,
}

impl TaigiBackend {
    pub fn new(config: TaigiConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client, config })
    }

    /// Перевести иероглифы в романизацию
    pub async fn romanize(&self, text: &str) -> Result<String> {
        let response = self
            .client
            .get(&self.config.romanize_url)
            .query(&[("text0", text)])
            .send()
            .await?;
        let roman = ensure_success(response).await?.text().await?.trim().to_string();

        if roman.is_empty() {
            return Err(TimelineError::Backend(format!(
                "empty romanization for '{}'",
                text
            )));
        }
        Ok(roman)
    }

    async fn synthesize_roman(&self, roman: &str, voice: VoicePreset) -> Result<Bytes> {
        let (gender, accent) = match (voice.gender(), voice.accent()) {
            (Some(gender), Some(accent)) => (gender, accent),
            _ => {
                return Err(TimelineError::Configuration(format!(
                    "voice {} has no Taigi gender/accent",
                    voice
                )))
            }
        };

        let response = self
            .client
            .get(&self.config.synthesize_url)
            .query(&[("text1", roman), ("gender", gender), ("accent", accent)])
            .send()
            .await?;
        Ok(ensure_success(response).await?.bytes().await?)
    }
}

#[async_trait]
impl SpeechBackend for TaigiBackend {
    async fn preflight(&self, voice: VoicePreset) -> Result<()> {
        if voice.dialect() != Dialect::Taigi {
            return Err(TimelineError::Configuration(format!(
                "voice {} is not served by the Taigi backend",
                voice
            )));
        }
        Ok(())
    }

    async fn synthesize(&self, text: &str, voice: VoicePreset) -> Result<SpeechPayload> {
        let roman = self.romanize(text).await?;
        log::debug!("Romanized '{}' as '{}'", text, roman);

        let audio = self.synthesize_roman(&roman, voice).await?;
        Ok(SpeechPayload::new(audio).with_transliteration(roman))
    }
}
