//! Модуль для работы с TTS
//!
//! Этот модуль содержит абстракцию бэкенда синтеза, его HTTP-реализации
//! и клиент с повторными попытками.

pub mod backend;
pub mod cache;
pub mod client;
pub mod router;
pub mod sovits;
pub mod taigi;

pub use backend::{SpeechBackend, SpeechPayload};
pub use client::{ChunkFile, SynthesisClient};
