//! Выбор бэкенда по диалекту пресета

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{Dialect, TimelineConfig, VoicePreset};
use crate::error::Result;
use crate::tts::backend::{SpeechBackend, SpeechPayload};
use crate::tts::sovits::SovitsBackend;
use crate::tts::taigi::TaigiBackend;

/// Маршрутизатор между мандаринским бэкендом и бэкендом хокло
pub struct DialectRouter {
    mandarin: Arc<dyn SpeechBackend>,
    taigi: Arc<dyn SpeechBackend>,
}

impl DialectRouter {
    pub fn new(mandarin: Arc<dyn SpeechBackend>, taigi: Arc<dyn SpeechBackend>) -> Self {
        Self { mandarin, taigi }
    }

    /// Собрать стандартные HTTP-бэкенды из конфигурации
    pub fn from_config(config: &TimelineConfig) -> Result<Self> {
        Ok(Self::new(
            Arc::new(SovitsBackend::new(config.sovits.clone())?),
            Arc::new(TaigiBackend::new(config.taigi.clone())?),
        ))
    }

    fn backend_for(&self, voice: VoicePreset) -> &dyn SpeechBackend {
        match voice.dialect() {
            Dialect::Mandarin => self.mandarin.as_ref(),
            Dialect::Taigi => self.taigi.as_ref(),
        }
    }
}

#[async_trait]
impl SpeechBackend for DialectRouter {
    async fn preflight(&self, voice: VoicePreset) -> Result<()> {
        self.backend_for(voice).preflight(voice).await
    }

    async fn synthesize(&self, text: &str, voice: VoicePreset) -> Result<SpeechPayload> {
        self.backend_for(voice).synthesize(text, voice).await
    }
}
