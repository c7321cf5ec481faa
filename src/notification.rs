//! Модуль для реализации системы уведомлений
//!
//! Этот модуль предоставляет конкретные реализации наблюдателей для
//! системы прогресса.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::progress::{ProgressInfo, ProgressObserver};

/// Форматирование одного обновления в строку
struct ProgressLine<'a>(&'a ProgressInfo);

impl fmt::Display for ProgressLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = self.0;
        write!(
            f,
            "Step: {}, step progress: {:.1}%, total: {:.1}%",
            progress.step, progress.step_progress, progress.total_progress
        )?;
        match progress.details.as_deref() {
            Some(details) if !details.is_empty() => write!(f, ", details: {}", details),
            _ => Ok(()),
        }
    }
}

/// Наблюдатель, выводящий информацию о прогрессе в консоль (stderr)
pub struct ConsoleProgressObserver {
    prefix: Option<String>,
}

impl ConsoleProgressObserver {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    /// Создать наблюдатель с префиксом строки
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self { prefix: Some(prefix.into()) }
    }
}

impl Default for ConsoleProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressObserver for ConsoleProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let prefix = self.prefix.as_deref().unwrap_or("");
        eprintln!("{}[progress] {}", prefix, ProgressLine(&progress));
    }
}

/// Наблюдатель, сохраняющий историю обновлений в памяти
///
/// Клоны разделяют одну историю, поэтому клон можно отдать трекеру,
/// а оригинал оставить себе для проверки.
#[derive(Clone, Default)]
pub struct MemoryProgressObserver {
    history: Arc<Mutex<Vec<ProgressInfo>>>,
}

impl MemoryProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Получить историю обновлений прогресса
    pub fn history(&self) -> Vec<ProgressInfo> {
        self.history.lock().clone()
    }

    /// Последнее полученное обновление
    pub fn last(&self) -> Option<ProgressInfo> {
        self.history.lock().last().cloned()
    }

    /// Очистить историю обновлений прогресса
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

impl ProgressObserver for MemoryProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        self.history.lock().push(progress);
    }
}

/// Наблюдатель, дописывающий обновления в файл журнала
pub struct FileProgressObserver {
    file_path: PathBuf,
}

impl FileProgressObserver {
    pub fn new(file_path: impl Into<PathBuf>) -> Self {
        Self {
            file_path: file_path.into(),
        }
    }
}

impl ProgressObserver for FileProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        let log_entry = format!(
            "[{}] {}\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
            ProgressLine(&progress)
        );

        let written = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.file_path)
            .and_then(|mut file| file.write_all(log_entry.as_bytes()));

        if let Err(e) = written {
            log::warn!("Failed to write progress to {}: {}", self.file_path.display(), e);
        }
    }
}

/// Наблюдатель, вызывающий функцию обратного вызова при обновлении прогресса
pub struct CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    callback: F,
}

impl<F> CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressObserver for CallbackProgressObserver<F>
where
    F: Fn(ProgressInfo) + Send + Sync + 'static,
{
    fn on_progress_update(&self, progress: ProgressInfo) {
        (self.callback)(progress);
    }
}

/// Комбинированный наблюдатель, объединяющий несколько наблюдателей
#[derive(Default)]
pub struct CompositeProgressObserver {
    observers: Vec<Box<dyn ProgressObserver>>,
}

impl CompositeProgressObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Добавить наблюдателя
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    /// Удалить всех наблюдателей
    pub fn clear(&mut self) {
        self.observers.clear();
    }
}

impl ProgressObserver for CompositeProgressObserver {
    fn on_progress_update(&self, progress: ProgressInfo) {
        for observer in &self.observers {
            observer.on_progress_update(progress.clone());
        }
    }
}
