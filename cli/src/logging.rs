use colored::*;
use log::LevelFilter;
use std::env;

/// Initializes env_logger. `RUST_LOG` wins over the configured level.
pub fn init(level: Option<&str>) {
    let level = level
        .map(|level| match level.to_lowercase().as_str() {
            "trace" => LevelFilter::Trace,
            "debug" => LevelFilter::Debug,
            "info" => LevelFilter::Info,
            "warn" => LevelFilter::Warn,
            "error" => LevelFilter::Error,
            _ => LevelFilter::Info,
        })
        .unwrap_or(LevelFilter::Info);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();
}

pub fn log_info(message: &str) {
    if env::var("PANTRY_DEBUG").is_ok() {
        eprintln!("{} {}", "[INFO]".cyan(), message);
    }
}

pub fn log_error(message: &str) {
    eprintln!("{} {}", "[ERROR]".red().bold(), message);
}
