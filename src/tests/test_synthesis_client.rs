//! Тесты конверта повторных попыток клиента синтеза

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use super::fakes::{encode_audio, test_config, FixedBackend, ScriptedBackend, TwoStepBackend};
use crate::config::{RetryPolicy, TimelineConfig, VoicePreset};
use crate::error::TimelineError;
use crate::tts::cache::SpeechCache;
use crate::tts::SynthesisClient;
use crate::utils::temp::ScopedWorkDir;

fn config_with_attempts(root: &std::path::Path, max_attempts: u32) -> TimelineConfig {
    let mut config = test_config(root);
    config.retry.max_attempts = max_attempts;
    config
}

#[tokio::test]
async fn test_always_failing_backend_called_max_attempts_times() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "retry").unwrap();

    for max_attempts in [1, 3, 5] {
        let backend = Arc::new(ScriptedBackend::new().fail("晴天。"));
        let client = SynthesisClient::new(backend.clone(), &config_with_attempts(root.path(), max_attempts));

        let error = assert_err!(client.synthesize("晴天。", 7, &work_dir, VoicePreset::Mandarin).await);

        assert_eq!(backend.calls(), max_attempts as usize);
        match error {
            TimelineError::Synthesis { ordinal, attempts, cause } => {
                assert_eq!(ordinal, 7);
                assert_eq!(attempts, max_attempts);
                assert!(matches!(*cause, TimelineError::Backend(ref message) if message.contains("scripted failure")));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(!work_dir.chunk_path(7, "wav").exists());
    }
}

#[tokio::test]
async fn test_step_two_failure_restarts_from_step_one() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "two_step").unwrap();
    let backend = Arc::new(TwoStepBackend::new(2));
    let client = SynthesisClient::new(backend.clone(), &test_config(root.path()));

    let chunk = assert_ok!(client.synthesize("出發。", 0, &work_dir, VoicePreset::Mandarin).await);

    assert_eq!(backend.step_one_calls.load(Ordering::SeqCst), 3);
    assert_eq!(backend.step_two_calls.load(Ordering::SeqCst), 3);
    assert_eq!(chunk.path, work_dir.chunk_path(0, "wav"));
    assert_eq!(std::fs::read(&chunk.path).unwrap(), encode_audio(1.0));
}

#[tokio::test]
async fn test_short_payload_is_retried_as_invalid() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "short").unwrap();
    let backend = Arc::new(FixedBackend::new(vec![1u8; 16]));
    let client = SynthesisClient::new(backend.clone(), &test_config(root.path()));

    let error = assert_err!(client.synthesize("晴天。", 2, &work_dir, VoicePreset::Mandarin).await);

    assert_eq!(backend.calls.load(Ordering::SeqCst), 3);
    assert!(error.to_string().contains("Invalid audio payload: 16 bytes"));
}

#[tokio::test]
async fn test_slow_attempt_times_out() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "slow").unwrap();
    let mut config = config_with_attempts(root.path(), 2);
    config.retry.attempt_timeout_ms = 20;

    let backend = Arc::new(FixedBackend::slow(encode_audio(1.0), Duration::from_millis(500)));
    let client = SynthesisClient::new(backend.clone(), &config);

    let error = assert_err!(client.synthesize("晴天。", 0, &work_dir, VoicePreset::Mandarin).await);

    assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    assert!(error.to_string().contains("timed out"));
    match error {
        TimelineError::Synthesis { cause, .. } => assert!(matches!(*cause, TimelineError::Timeout(_))),
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn test_transliteration_is_kept_with_chunk() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "roman").unwrap();
    let backend = Arc::new(ScriptedBackend::new().with_romanization());
    let client = SynthesisClient::new(backend, &test_config(root.path()));

    let chunk = assert_ok!(
        client
            .synthesize("你好。", 3, &work_dir, VoicePreset::TaigiMaleSecondary)
            .await
    );

    assert_eq!(chunk.segment_index, 3);
    assert_eq!(chunk.transliteration.as_deref(), Some("roman(你好。)"));
}

#[tokio::test]
async fn test_cache_hit_skips_backend() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "cache").unwrap();
    let config = TimelineConfig {
        use_caching: true,
        cache_dir: Some(root.path().join("cache").to_string_lossy().to_string()),
        ..test_config(root.path())
    };
    let backend = Arc::new(ScriptedBackend::new().speak("晴天。", 1.0));
    let client = SynthesisClient::new(backend.clone(), &config).with_cache(SpeechCache::new(&config).unwrap());

    assert_ok!(client.synthesize("晴天。", 0, &work_dir, VoicePreset::Mandarin).await);
    let chunk = assert_ok!(client.synthesize("晴天。", 1, &work_dir, VoicePreset::Mandarin).await);

    assert_eq!(backend.calls(), 1);
    assert_eq!(std::fs::read(&chunk.path).unwrap(), encode_audio(1.0));

    // у другого голоса свой ключ
    assert_ok!(client.synthesize("晴天。", 2, &work_dir, VoicePreset::TaigiFemaleStrong).await);
    assert_eq!(backend.calls(), 2);
}

#[test]
fn test_linear_backoff_grows_with_attempt() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.delay_after(1), Duration::from_millis(1000));
    assert_eq!(policy.delay_after(3), Duration::from_millis(3000));
}

#[tokio::test]
async fn test_cache_misses_after_speaker_or_format_change() {
    let root = tempfile::tempdir().unwrap();
    let work_dir = ScopedWorkDir::create(root.path(), "cache_settings").unwrap();
    let wav_config = TimelineConfig {
        use_caching: true,
        cache_dir: Some(root.path().join("cache").to_string_lossy().to_string()),
        ..test_config(root.path())
    };

    let first = Arc::new(ScriptedBackend::new().speak("晴天。", 1.0));
    let client = SynthesisClient::new(first.clone(), &wav_config).with_cache(SpeechCache::new(&wav_config).unwrap());
    assert_ok!(client.synthesize("晴天。", 0, &work_dir, VoicePreset::Mandarin).await);
    assert_eq!(first.calls(), 1);

    let mut mp3_config = wav_config.clone();
    mp3_config.audio_extension = "mp3".to_string();
    mp3_config.sovits.ref_audio_path = std::path::PathBuf::from("other_speaker.wav");

    let second = Arc::new(ScriptedBackend::new().speak("晴天。", 2.0));
    let client = SynthesisClient::new(second.clone(), &mp3_config).with_cache(SpeechCache::new(&mp3_config).unwrap());
    let chunk = assert_ok!(client.synthesize("晴天。", 1, &work_dir, VoicePreset::Mandarin).await);

    assert_eq!(second.calls(), 1);
    assert_eq!(chunk.path, work_dir.chunk_path(1, "mp3"));
    assert_eq!(std::fs::read(&chunk.path).unwrap(), encode_audio(2.0));
}
