//! Основной файл библиотеки tts-timeline с поддержкой системы прогресса и уведомлений
//!
//! Библиотека превращает размеченный текст в одно аудио и таймлайн:
//! текст режется на сегменты, озвучиваемые сегменты синтезируются внешним
//! бэкендом, фрагменты склеиваются, а каждой записи таймлайна назначается
//! интервал в итоговом аудио. Фрагменты, исключённые разметкой
//! `<NoTTSHere>…</NoTTSHere>` или не озвученные из-за ошибки, получают
//! нулевой интервал.

pub mod config;
pub mod error;
pub mod media;
pub mod notification;
pub mod progress;
pub mod text;
pub mod timeline;
pub mod tts;
pub mod utils;

use std::path::PathBuf;
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

pub use crate::config::{TimelineConfig, VoicePreset};
pub use crate::error::{Result, TimelineError};
pub use crate::timeline::{PipelineResult, TimelineEntry};

use crate::media::{AudioTools, FfmpegTools};
use crate::progress::{ProcessStep, ProgressObserver, ProgressReporter, ProgressTracker};
use crate::text::{Segment, SegmentOptions};
use crate::timeline::output;
use crate::tts::cache::SpeechCache;
use crate::tts::router::DialectRouter;
use crate::tts::{ChunkFile, SpeechBackend, SynthesisClient};
use crate::utils::naming::safe_project_name;
use crate::utils::temp::ScopedWorkDir;

/// Основная структура для построения таймлайнов
pub struct TtsTimeline {
    /// Конфигурация библиотеки
    config: TimelineConfig,
    /// Клиент синтеза с повторными попытками
    client: SynthesisClient,
    /// Измерение длительности и склейка
    tools: Arc<dyn AudioTools>,
    /// Трекер прогресса
    progress_tracker: Option<ProgressTracker>,
    /// Очередь запусков: трекер прогресса один на экземпляр
    run_lock: Mutex<()>,
}

impl TtsTimeline {
    /// Создать экземпляр со стандартными HTTP-бэкендами и ffmpeg
    pub fn new(config: TimelineConfig) -> Result<Self> {
        let backend: Arc<dyn SpeechBackend> = Arc::new(DialectRouter::from_config(&config)?);
        let tools: Arc<dyn AudioTools> = Arc::new(FfmpegTools::new(config.probe_method));
        Self::with_collaborators(config, backend, tools)
    }

    /// Создать экземпляр с заданными бэкендом и аудиоинструментами
    pub fn with_collaborators(
        config: TimelineConfig,
        backend: Arc<dyn SpeechBackend>,
        tools: Arc<dyn AudioTools>,
    ) -> Result<Self> {
        config.validate()?;

        let mut client = SynthesisClient::new(backend, &config);
        if config.use_caching {
            client = client.with_cache(SpeechCache::new(&config)?);
        }

        Ok(Self {
            config,
            client,
            tools,
            progress_tracker: None,
            run_lock: Mutex::new(()),
        })
    }

    /// Создать экземпляр с репортером прогресса
    pub fn with_progress_reporter(config: TimelineConfig, reporter: Box<dyn ProgressReporter>) -> Result<Self> {
        let mut timeline = Self::new(config)?;
        timeline.set_progress_reporter(reporter);
        Ok(timeline)
    }

    /// Установить репортер прогресса
    pub fn set_progress_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        match &mut self.progress_tracker {
            Some(tracker) => tracker.set_reporter(reporter),
            None => self.progress_tracker = Some(ProgressTracker::with_reporter(reporter)),
        }
    }

    /// Добавить наблюдателя прогресса
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        self.progress_tracker
            .get_or_insert_with(ProgressTracker::new)
            .add_observer(observer)
    }

    pub fn config(&self) -> &TimelineConfig {
        &self.config
    }

    /// Построить аудио и таймлайн для размеченного текста
    ///
    /// Ошибки отдельных сегментов не прерывают запуск: такие сегменты
    /// попадают в таймлайн с нулевым интервалом. Рабочая директория
    /// удаляется при любом исходе. Параллельные вызовы на одном экземпляре
    /// выполняются по очереди; для одновременных запусков нужны отдельные
    /// экземпляры.
    pub async fn build(&self, text: &str, project_name: &str, voice: VoicePreset) -> Result<PipelineResult> {
        let _run = self.run_lock.lock().await;
        log::info!("Building timeline for project '{}' with voice {}", project_name, voice);
        let tracker = self.progress_tracker.as_ref();

        // 1. Разбор разметки до любого ввода-вывода
        if let Some(t) = tracker {
            t.reset();
            t.update_step_progress(0.0, Some("Parsing markup".to_string()));
        }

        let tokens = text::tokenize(text)?;
        let options = SegmentOptions {
            strip_markdown: self.config.strip_markdown,
        };
        let segments = text::segment_tokens(&tokens, &options);
        let speakable = segments.iter().filter(|segment| segment.speakable).count();
        log::info!(
            "Text split into {} segment(s), {} to synthesize",
            segments.len(),
            speakable
        );

        if let Some(t) = tracker {
            t.update_step_progress(100.0, Some(format!("{} segment(s)", segments.len())));
        }

        let project_id = safe_project_name(project_name);

        if speakable > 0 {
            self.client.backend().preflight(voice).await?;
        }

        let work_dir = ScopedWorkDir::create(&self.config.temp_root, &project_id)?;

        match self.run(&segments, &project_id, voice, &work_dir).await {
            Ok(result) => {
                if let Err(e) = work_dir.close() {
                    log::warn!("Failed to remove working directory: {}", e);
                }
                if let Some(t) = tracker {
                    t.complete();
                }
                log::info!(
                    "Timeline for '{}' ready: {} entries, {:.2}s of audio",
                    result.project_id,
                    result.entries.len(),
                    result.duration()
                );
                Ok(result)
            }
            Err(e) => {
                log::error!("Timeline build for '{}' failed: {}", project_id, e);
                // Drop удаляет рабочую директорию
                drop(work_dir);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        segments: &[Segment],
        project_id: &str,
        voice: VoicePreset,
        work_dir: &ScopedWorkDir,
    ) -> Result<PipelineResult> {
        let tracker = self.progress_tracker.as_ref();
        let extension = self.config.audio_extension.as_str();

        // 2. Синтез
        if let Some(t) = tracker {
            t.set_step(ProcessStep::SpeechSynthesis);
        }
        let chunks = self.synthesize_segments(segments, work_dir, voice).await?;

        // 3. Сборка
        if let Some(t) = tracker {
            t.set_step(ProcessStep::Assembly);
            t.update_step_progress(0.0, Some(format!("{} chunk(s)", chunks.len())));
        }
        let assembly = timeline::assemble(&chunks, self.tools.as_ref(), work_dir.path(), extension).await?;
        if !assembly.unprobed.is_empty() {
            log::warn!("Chunks excluded after probing: {:?}", assembly.unprobed);
        }

        // 4. Таймлайн и сохранение
        if let Some(t) = tracker {
            t.set_step(ProcessStep::Reconstruction);
        }
        let entries = timeline::reconstruct(segments, &assembly.spans);

        let output_dir = self.output_dir(project_id, voice);
        let audio_path = match &assembly.audio_path {
            Some(joined) => Some(output::persist_audio(joined, &output_dir, extension).await?),
            None => {
                log::warn!("No segment was synthesized, writing a text-only timeline");
                output::remove_stale_audio(&output_dir, extension).await?;
                None
            }
        };
        let timeline_path = output::write_index_file(&output_dir, &entries).await?;

        Ok(PipelineResult {
            project_id: project_id.to_string(),
            audio_path,
            timeline_path,
            entries,
        })
    }

    /// Синтезировать озвучиваемые сегменты с ограниченным параллелизмом
    ///
    /// Результаты возвращаются в порядке индексов сегментов, а не в порядке
    /// завершения запросов.
    async fn synthesize_segments(
        &self,
        segments: &[Segment],
        work_dir: &ScopedWorkDir,
        voice: VoicePreset,
    ) -> Result<Vec<ChunkFile>> {
        let speakable: Vec<&Segment> = segments.iter().filter(|segment| segment.speakable).collect();
        let total = speakable.len();
        let concurrency = self.config.max_concurrent_requests.max(1);

        let mut pending = stream::iter(speakable.into_iter().map(|segment| async move {
            let result = self
                .client
                .synthesize(&segment.text, segment.index, work_dir, voice)
                .await;
            (segment, result)
        }))
        .buffer_unordered(concurrency);

        let mut chunks = Vec::with_capacity(total);
        let mut finished = 0;

        while let Some((segment, result)) = pending.next().await {
            finished += 1;
            match result {
                Ok(chunk) => chunks.push(chunk),
                Err(e) if e.is_segment_level() => {
                    log::warn!("Skipping segment {} '{}': {}", segment.index, segment.text, e);
                }
                Err(e) => return Err(e),
            }

            if let Some(t) = self.progress_tracker.as_ref() {
                t.update_step_progress(
                    finished as f32 / total as f32 * 100.0,
                    Some(format!("{}/{}", finished, total)),
                );
            }
        }

        chunks.sort_by_key(|chunk| chunk.segment_index);
        log::info!("Synthesized {}/{} segment(s)", chunks.len(), total);
        Ok(chunks)
    }

    /// Директория результатов: `output_root/{project_id}/{voice}`
    fn output_dir(&self, project_id: &str, voice: VoicePreset) -> PathBuf {
        self.config.output_root.join(project_id).join(voice.as_str())
    }
}

/// Публичный API для удобного использования с настройками по умолчанию
pub async fn build_timeline(text: &str, project_name: &str, voice: VoicePreset) -> Result<PipelineResult> {
    let timeline = TtsTimeline::new(TimelineConfig::default())?;
    timeline.build(text, project_name, voice).await
}
