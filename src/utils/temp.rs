//! Модуль для работы с рабочей директорией запуска
//!
//! Каждый запуск получает собственную директорию, которая удаляется при
//! любом исходе: явным `close`, либо в `Drop` при ошибке, панике или отмене.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{Result, TimelineError};

/// Рабочая директория одного запуска
#[derive(Debug)]
pub struct ScopedWorkDir {
    /// Временная директория
    temp_dir: TempDir,
}

impl ScopedWorkDir {
    /// Создать директорию `{project_id}_{timestamp}_{random}` внутри `root`
    pub fn create(root: &Path, project_id: &str) -> Result<Self> {
        fs::create_dir_all(root).map_err(|source| TimelineError::WorkingDirectory {
            path: root.to_path_buf(),
            source,
        })?;

        let prefix = format!(
            "{}_{}_",
            project_id,
            chrono::Local::now().format("%Y%m%d%H%M%S%3f")
        );
        let temp_dir = tempfile::Builder::new()
            .prefix(&prefix)
            .rand_bytes(6)
            .tempdir_in(root)
            .map_err(|source| TimelineError::WorkingDirectory {
                path: root.join(&prefix),
                source,
            })?;

        log::debug!("Created working directory {}", temp_dir.path().display());
        Ok(Self { temp_dir })
    }

    /// Получить путь к рабочей директории
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Путь к файлу фрагмента с порядковым номером `ordinal`
    pub fn chunk_path(&self, ordinal: usize, extension: &str) -> PathBuf {
        self.path().join(format!("chunk_{}.{}", ordinal, extension))
    }

    /// Удалить директорию, сообщив об ошибке удаления
    pub fn close(self) -> Result<()> {
        let path = self.path().to_path_buf();
        self.temp_dir
            .close()
            .map_err(|source| TimelineError::WorkingDirectory { path: path.clone(), source })?;
        log::debug!("Removed working directory {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_directories_for_same_project() {
        let root = tempfile::tempdir().unwrap();
        let first = ScopedWorkDir::create(root.path(), "news_abc123").unwrap();
        let second = ScopedWorkDir::create(root.path(), "news_abc123").unwrap();

        assert_ne!(first.path(), second.path());
        let name = first.path().file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("news_abc123_"));
        assert_eq!(first.chunk_path(4, "wav"), first.path().join("chunk_4.wav"));
    }

    #[test]
    fn test_removed_on_close_and_drop() {
        let root = tempfile::tempdir().unwrap();

        let closed = ScopedWorkDir::create(root.path(), "p").unwrap();
        let closed_path = closed.path().to_path_buf();
        fs::write(closed.chunk_path(0, "wav"), b"data").unwrap();
        closed.close().unwrap();
        assert!(!closed_path.exists());

        let dropped = ScopedWorkDir::create(root.path(), "p").unwrap();
        let dropped_path = dropped.path().to_path_buf();
        fs::write(dropped.chunk_path(1, "wav"), b"data").unwrap();
        drop(dropped);
        assert!(!dropped_path.exists());
    }
}
