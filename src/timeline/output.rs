//! Сохранение результатов: итоговое аудио и index.json

use std::path::{Path, PathBuf};

use tokio::fs;

use crate::error::{Result, TimelineError};
use crate::timeline::types::TimelineEntry;

/// Имя файла таймлайна
pub const INDEX_FILE_NAME: &str = "index.json";

/// Записать таймлайн в `dir/index.json`
pub async fn write_index_file(dir: &Path, entries: &[TimelineEntry]) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let path = dir.join(INDEX_FILE_NAME);
    let json = serde_json::to_string_pretty(entries)?;
    fs::write(&path, json).await?;

    log::info!("Timeline with {} entries saved to {}", entries.len(), path.display());
    Ok(path)
}

/// Прочитать ранее сохранённый таймлайн
pub async fn read_index_file(path: &Path) -> Result<Vec<TimelineEntry>> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(TimelineError::FileNotFound(path.display().to_string()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&content)?)
}

/// Перенести склеенное аудио из рабочей директории в `dir/audio.{ext}`
pub async fn persist_audio(source: &Path, dir: &Path, extension: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).await?;
    let target = dir.join(format!("audio.{}", extension));

    // rename не работает между файловыми системами
    if fs::rename(source, &target).await.is_err() {
        fs::copy(source, &target).await?;
    }

    log::info!("Audio saved to {}", target.display());
    Ok(target)
}

/// Удалить аудио, оставшееся от прошлого запуска
pub async fn remove_stale_audio(dir: &Path, extension: &str) -> Result<()> {
    let target = dir.join(format!("audio.{}", extension));
    match fs::remove_file(&target).await {
        Ok(()) => {
            log::info!("Removed stale audio {}", target.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
