//! Модуль для работы с аудиофайлами

pub mod audio;
pub mod probe;

pub use audio::{AudioTools, FfmpegTools};
