//! Пример использования системы прогресса и уведомлений
//!
//! Строит таймлайн для короткого текста и выводит прогресс в консоль и в файл.
//! Нужны запущенный сервис GPT-SoVITS и референсное аудио `ref_audio.wav`.

use tts_timeline::{
    notification::{CallbackProgressObserver, CompositeProgressObserver, ConsoleProgressObserver, FileProgressObserver},
    progress::{DefaultProgressReporter, ProgressReporter},
    TimelineConfig, TtsTimeline, VoicePreset,
};

const TEXT: &str = "今天天氣很好。<NoTTSHere>（畫面：市場）</NoTTSHere>我們一起去市場買菜吧！";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tts_timeline::utils::logger::init_logger();

    println!("Пример 1: функция-обертка с настройками по умолчанию");

    let result = tts_timeline::build_timeline(TEXT, "demo", VoicePreset::Mandarin).await?;
    println!("Таймлайн сохранен в {}", result.timeline_path.display());

    println!("\nПример 2: объект TtsTimeline с наблюдателями");

    let mut reporter = DefaultProgressReporter::new();

    let mut composite_observer = CompositeProgressObserver::new();
    composite_observer.add_observer(Box::new(ConsoleProgressObserver::with_prefix("[demo] ")));
    composite_observer.add_observer(Box::new(FileProgressObserver::new("progress.log")));
    reporter.add_observer(Box::new(composite_observer));

    let config = TimelineConfig {
        max_concurrent_requests: 2,
        strip_markdown: true,
        ..TimelineConfig::default()
    };
    let mut timeline = TtsTimeline::with_progress_reporter(config, Box::new(reporter))?;

    timeline.add_observer(Box::new(CallbackProgressObserver::new(|progress| {
        if progress.total_progress >= 100.0 {
            println!("Готово: {}", progress.step);
        }
    })));

    let result = timeline.build(TEXT, "demo", VoicePreset::Mandarin).await?;
    for entry in &result.entries {
        println!("[{:>6.2} - {:>6.2}] {}", entry.start, entry.end, entry.text);
    }

    Ok(())
}
