//! Integration tests for the logging system

use bridge_traits::LogLevel;
use core_runtime::logging::{init_logging, preview, LogFormat, LoggingConfig};

#[test]
fn test_logging_initializes_once() {
    // A process can install only one global subscriber.
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_spans(false);

    assert!(init_logging(config.clone()).is_ok());
    assert!(init_logging(config).is_err());

    tracing::info!(chunk = %preview("First sentence. Second sentence.", 8), "logged preview");
}

#[test]
fn test_invalid_custom_filter_is_rejected() {
    let config = LoggingConfig::default().with_filter("core_playback=[not a level");
    assert!(init_logging(config).is_err());
}

#[test]
fn test_config_chaining() {
    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true);

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
    assert!(config.logger_sink.is_none());
}

#[test]
fn test_preview_keeps_short_text() {
    assert_eq!(preview("।", 40), "।");
    assert_eq!(preview("Hello world", 5), "Hello…(11 chars)");
}
