//! Определение длительности по заголовкам контейнера без внешних утилит

use std::fs::File;
use std::path::Path;

use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::error::{Result, TimelineError};

/// Длительность файла в секундах по числу кадров дорожки по умолчанию
pub fn probe_duration_native(path: &Path) -> Result<f64> {
    let probe_error = |reason: String| TimelineError::Probe {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path).map_err(|e| probe_error(format!("failed to open: {}", e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|ext| ext.to_str()) {
        hint.with_extension(extension);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| probe_error(format!("unsupported or corrupt audio: {}", e)))?;

    let track = probed
        .format
        .default_track()
        .ok_or_else(|| probe_error("no audio track".to_string()))?;
    let params = &track.codec_params;

    match (params.n_frames, params.time_base, params.sample_rate) {
        (Some(frames), Some(time_base), _) => {
            let time = time_base.calc_time(frames);
            Ok(time.seconds as f64 + time.frac)
        }
        (Some(frames), None, Some(rate)) if rate > 0 => Ok(frames as f64 / rate as f64),
        _ => Err(probe_error("container does not report a frame count".to_string())),
    }
}
