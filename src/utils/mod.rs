//! Вспомогательные модули: ffmpeg, рабочие директории, имена проектов, логирование

pub mod ffmpeg;
pub mod logger;
pub mod naming;
pub mod temp;
