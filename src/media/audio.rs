//! Модуль для работы с аудио
//!
//! Определение длительности фрагментов и их склейка без перекодирования.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use path_clean::PathClean;

use crate::config::ProbeMethod;
use crate::error::{Result, TimelineError};
use crate::media::probe::probe_duration_native;
use crate::utils::ffmpeg::{run_ffmpeg_command, run_ffprobe_command};

/// Внешняя утилита длительности и склейки аудио
#[async_trait]
pub trait AudioTools: Send + Sync {
    /// Длительность файла в секундах; для отсутствующего или нечитаемого файла ошибка
    async fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Склеить `inputs` по порядку в `output` без перекодирования.
    /// Служебный список файлов пишется в `list_path`.
    async fn concat(&self, inputs: &[PathBuf], list_path: &Path, output: &Path) -> Result<()>;
}

/// Реализация на ffmpeg/ffprobe
#[derive(Debug, Clone, Default)]
pub struct FfmpegTools {
    probe_method: ProbeMethod,
}

impl FfmpegTools {
    pub fn new(probe_method: ProbeMethod) -> Self {
        Self { probe_method }
    }
}

#[async_trait]
impl AudioTools for FfmpegTools {
    async fn probe_duration(&self, path: &Path) -> Result<f64> {
        ensure_exists(path).await?;
        let duration = match self.probe_method {
            ProbeMethod::Ffprobe => get_audio_duration(path).await?,
            ProbeMethod::Native => {
                let owned = path.to_path_buf();
                tokio::task::spawn_blocking(move || probe_duration_native(&owned))
                    .await
                    .map_err(|e| TimelineError::Probe {
                        path: path.to_path_buf(),
                        reason: format!("probe task failed: {}", e),
                    })??
            }
        };
        validate_duration(path, duration)
    }

    async fn concat(&self, inputs: &[PathBuf], list_path: &Path, output: &Path) -> Result<()> {
        concat_audio_files(inputs, list_path, output).await
    }
}

/// Проверить, что файл фрагмента существует
pub async fn ensure_exists(path: &Path) -> Result<()> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|metadata| metadata.is_file())
        .unwrap_or(false);
    if !is_file {
        return Err(TimelineError::Probe {
            path: path.to_path_buf(),
            reason: "audio file does not exist".to_string(),
        });
    }
    Ok(())
}

/// Отклонить NaN, бесконечность и отрицательные значения
pub fn validate_duration(path: &Path, duration: f64) -> Result<f64> {
    if !duration.is_finite() || duration < 0.0 {
        return Err(TimelineError::Probe {
            path: path.to_path_buf(),
            reason: format!("invalid duration {}", duration),
        });
    }
    Ok(duration)
}

/// Получение длительности аудиофайла через ffprobe
pub async fn get_audio_duration(path: &Path) -> Result<f64> {
    let probe_error = |reason: String| TimelineError::Probe {
        path: path.to_path_buf(),
        reason,
    };

    let stdout = run_ffprobe_command([
        OsStr::new("-v"),
        OsStr::new("error"),
        OsStr::new("-show_entries"),
        OsStr::new("format=duration"),
        OsStr::new("-of"),
        OsStr::new("default=noprint_wrappers=1:nokey=1"),
        path.as_os_str(),
    ])
    .await
    .map_err(|e| probe_error(e.to_string()))?;

    let duration_str = stdout.trim();
    duration_str
        .parse::<f64>()
        .map_err(|_| probe_error(format!("failed to parse audio duration: '{}'", duration_str)))
}

/// Объединение аудиофайлов через concat-демультиплексор ffmpeg
pub async fn concat_audio_files(inputs: &[PathBuf], list_path: &Path, output: &Path) -> Result<()> {
    if inputs.is_empty() {
        return Err(TimelineError::Concatenation("no input files to concatenate".to_string()));
    }

    write_concat_list(inputs, list_path)
        .await
        .map_err(|e| TimelineError::Concatenation(format!("failed to write concat list: {}", e)))?;

    run_ffmpeg_command([
        OsStr::new("-f"),
        OsStr::new("concat"),
        OsStr::new("-safe"),
        OsStr::new("0"),
        OsStr::new("-i"),
        list_path.as_os_str(),
        OsStr::new("-c"),
        OsStr::new("copy"),
        OsStr::new("-y"),
        output.as_os_str(),
    ])
    .await
    .map_err(|e| TimelineError::Concatenation(e.to_string()))?;

    if tokio::fs::metadata(output).await.is_err() {
        return Err(TimelineError::Concatenation(format!(
            "ffmpeg reported success but {} was not created",
            output.display()
        )));
    }
    Ok(())
}

/// Записать список файлов для concat-демультиплексора
pub async fn write_concat_list(inputs: &[PathBuf], list_path: &Path) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let mut list = String::new();

    for input in inputs {
        let absolute = if input.is_absolute() {
            input.clean()
        } else {
            cwd.join(input).clean()
        };
        list.push_str(&format!("file '{}'\n", escape_concat_path(&absolute.to_string_lossy())));
    }

    tokio::fs::write(list_path, list).await?;
    Ok(())
}

/// Экранирование одинарных кавычек по правилам concat-списка ffmpeg
fn escape_concat_path(path: &str) -> String {
    path.replace('\'', r"'\''")
}
