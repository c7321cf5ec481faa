//! Модуль для отслеживания прогресса выполнения операций
//!
//! Этот модуль предоставляет реализацию паттерна Observer для отслеживания
//! прогресса построения таймлайна.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Информация о прогрессе выполнения операции
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressInfo {
    /// Текущий этап операции
    pub step: String,
    /// Процент выполнения текущего этапа (0.0 - 100.0)
    pub step_progress: f32,
    /// Общий процент выполнения всей операции (0.0 - 100.0)
    pub total_progress: f32,
    /// Дополнительная информация о текущем этапе
    pub details: Option<String>,
}

impl ProgressInfo {
    /// Создает новый экземпляр ProgressInfo
    pub fn new(step: impl Into<String>, step_progress: f32, total_progress: f32, details: Option<String>) -> Self {
        Self {
            step: step.into(),
            step_progress: step_progress.clamp(0.0, 100.0),
            total_progress: total_progress.clamp(0.0, 100.0),
            details,
        }
    }
}

/// Трейт для наблюдателя, получающего уведомления о прогрессе
pub trait ProgressObserver: Send + Sync {
    /// Метод, вызываемый при обновлении прогресса
    fn on_progress_update(&self, progress: ProgressInfo);
}

/// Трейт для объекта, отправляющего уведомления о прогрессе
pub trait ProgressReporter: Send + Sync {
    /// Добавить наблюдателя
    ///
    /// Возвращает уникальный идентификатор наблюдателя, который можно использовать
    /// для его удаления в будущем.
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize;

    /// Удалить наблюдателя по идентификатору
    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>>;

    /// Уведомить всех наблюдателей о прогрессе
    fn notify_progress(&self, progress: ProgressInfo);
}

/// Реализация ProgressReporter по умолчанию
pub struct DefaultProgressReporter {
    observers: RwLock<HashMap<usize, Box<dyn ProgressObserver>>>,
    next_id: AtomicUsize,
}

impl DefaultProgressReporter {
    pub fn new() -> Self {
        Self {
            observers: RwLock::new(HashMap::new()),
            next_id: AtomicUsize::new(0),
        }
    }
}

impl Default for DefaultProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressReporter for DefaultProgressReporter {
    fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.observers.write().insert(id, observer);
        id
    }

    fn remove_observer(&mut self, id: usize) -> Option<Box<dyn ProgressObserver>> {
        self.observers.write().remove(&id)
    }

    fn notify_progress(&self, progress: ProgressInfo) {
        let observers = self.observers.read();
        for observer in observers.values() {
            observer.on_progress_update(progress.clone());
        }
    }
}

/// Этапы построения таймлайна
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessStep {
    /// Разбор разметки и нарезка на сегменты
    Tokenization,
    /// Синтез речи по сегментам
    SpeechSynthesis,
    /// Измерение и склейка фрагментов
    Assembly,
    /// Восстановление таймлайна и сохранение результатов
    Reconstruction,
}

impl ProcessStep {
    /// Получить название этапа в виде строки
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tokenization => "Разбор текста",
            Self::SpeechSynthesis => "Синтез речи",
            Self::Assembly => "Сборка аудио",
            Self::Reconstruction => "Построение таймлайна",
        }
    }

    /// Получить весовой коэффициент этапа (в процентах от общего процесса)
    pub fn weight(&self) -> f32 {
        match self {
            Self::Tokenization => 5.0,
            Self::SpeechSynthesis => 70.0,
            Self::Assembly => 20.0,
            Self::Reconstruction => 5.0,
        }
    }
}

/// Внутреннее состояние трекера
struct TrackerState {
    current_step: ProcessStep,
    step_progress: f32,
    total_progress: f32,
    completed_steps: HashMap<ProcessStep, f32>,
}

impl TrackerState {
    fn new() -> Self {
        Self {
            current_step: ProcessStep::Tokenization,
            step_progress: 0.0,
            total_progress: 0.0,
            completed_steps: HashMap::new(),
        }
    }

    /// Общий прогресс как взвешенная сумма пройденных этапов
    ///
    /// Веса этапов в сумме дают 100, поэтому сумма уже в процентах.
    fn recalculate(&mut self) {
        let mut total = 0.0;

        for (step, progress) in &self.completed_steps {
            if *step != self.current_step {
                total += step.weight() * progress / 100.0;
            }
        }
        total += self.current_step.weight() * self.step_progress / 100.0;

        self.total_progress = total.clamp(0.0, 100.0);
    }
}

/// Трекер прогресса для отслеживания выполнения процесса
pub struct ProgressTracker {
    reporter: Option<Box<dyn ProgressReporter>>,
    state: RwLock<TrackerState>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self {
            reporter: None,
            state: RwLock::new(TrackerState::new()),
        }
    }

    /// Создать трекер с репортером
    pub fn with_reporter(reporter: Box<dyn ProgressReporter>) -> Self {
        Self {
            reporter: Some(reporter),
            state: RwLock::new(TrackerState::new()),
        }
    }

    /// Установить репортер прогресса
    pub fn set_reporter(&mut self, reporter: Box<dyn ProgressReporter>) {
        self.reporter = Some(reporter);
    }

    /// Добавить наблюдателя; без репортера создаётся репортер по умолчанию
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) -> usize {
        self.reporter
            .get_or_insert_with(|| Box::new(DefaultProgressReporter::new()))
            .add_observer(observer)
    }

    /// Установить текущий этап
    pub fn set_step(&self, step: ProcessStep) {
        {
            let mut state = self.state.write();
            if state.current_step == step {
                return;
            }
            // Если этап меняется, считаем предыдущий этап завершенным на 100%
            let previous = state.current_step;
            state.completed_steps.insert(previous, 100.0);
            state.current_step = step;
            state.step_progress = 0.0;
            state.recalculate();
        }
        self.report_progress(None);
    }

    /// Обновить прогресс текущего этапа
    pub fn update_step_progress(&self, progress: f32, details: Option<String>) {
        {
            let mut state = self.state.write();
            state.step_progress = progress.clamp(0.0, 100.0);
            state.recalculate();
        }
        self.report_progress(details);
    }

    /// Сбросить состояние перед новым запуском
    pub fn reset(&self) {
        *self.state.write() = TrackerState::new();
    }

    /// Текущий общий прогресс
    pub fn total_progress(&self) -> f32 {
        self.state.read().total_progress
    }

    /// Отметить завершение всего процесса
    pub fn complete(&self) {
        {
            let mut state = self.state.write();
            let current = state.current_step;
            state.completed_steps.insert(current, 100.0);
            state.step_progress = 100.0;
            state.total_progress = 100.0;
        }
        self.report_progress(Some("Процесс завершен".to_string()));
    }

    fn report_progress(&self, details: Option<String>) {
        if let Some(reporter) = &self.reporter {
            let progress = {
                let state = self.state.read();
                ProgressInfo::new(
                    state.current_step.as_str(),
                    state.step_progress,
                    state.total_progress,
                    details,
                )
            };
            reporter.notify_progress(progress);
        }
    }
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}
