//! Модуль для работы с FFmpeg
//!
//! Этот модуль содержит функции запуска ffmpeg и ffprobe. Процессы
//! запускаются через `tokio::process`, ожидание их завершения не занимает
//! поток рантайма.

use std::ffi::OsStr;
use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use crate::error::{Result, TimelineError};

/// Проверка наличия FFmpeg и FFprobe
pub async fn check_ffmpeg_installed() -> bool {
    for tool in ["ffmpeg", "ffprobe"] {
        let installed = TokioCommand::new(tool)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);
        if !installed {
            return false;
        }
    }
    true
}

/// Получение версии FFmpeg
pub async fn get_ffmpeg_version() -> Result<String> {
    let output = TokioCommand::new("ffmpeg").arg("-version").output().await?;

    if !output.status.success() {
        return Err(TimelineError::Other("Failed to get FFmpeg version".to_string()));
    }

    let version_str = String::from_utf8_lossy(&output.stdout);
    let first_line = version_str.lines().next().unwrap_or("");

    Ok(first_line.to_string())
}

/// Запуск команды FFmpeg
pub async fn run_ffmpeg_command<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = TokioCommand::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error"])
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(TimelineError::Other(format!(
            "FFmpeg command failed with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

/// Запуск команды FFprobe
pub async fn run_ffprobe_command<I, S>(args: I) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = TokioCommand::new("ffprobe")
        .args(args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await?;

    if !output.status.success() {
        return Err(TimelineError::Other(format!(
            "FFprobe command failed with status {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
