//! Модуль подготовки текста
//!
//! Разбор разметки исключения, очистка markdown и нарезка на предложения.

pub mod markdown;
pub mod markup;
pub mod segmenter;

pub use markup::{tokenize, Token, CLOSE_MARKER, OPEN_MARKER};
pub use segmenter::{segment_tokens, split_sentences, Segment, SegmentOptions};
