//! Модуль построения таймлайна
//!
//! Сборка аудио из фрагментов, восстановление записей по индексам сегментов
//! и сохранение результатов на диск.

pub mod assembler;
pub mod output;
pub mod reconstructor;
pub mod types;

pub use assembler::{assemble, Assembly};
pub use reconstructor::reconstruct;
pub use types::{AudioChunk, ChunkSpan, PipelineResult, TimelineEntry};
