use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

const DEFAULT_FILTER: &str = "warn,tts_timeline=info";

/// Инициализация логирования для бинарника; `RUST_LOG` переопределяет фильтр
pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_FILTER);

    let mut builder = Builder::from_env(env);

    builder
        .filter_module("hyper", LevelFilter::Error)
        .filter_module("mio", LevelFilter::Error)
        .filter_module("symphonia_core", LevelFilter::Warn)
        .filter_module("symphonia_format_wav", LevelFilter::Warn)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    // Повторная инициализация (например, из тестов) не считается ошибкой
    let _ = builder.try_init();
}
