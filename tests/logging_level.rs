use tracing::Level;

use looplaunch::cli::LogLevel;
use looplaunch::logging::{effective_level, parse_level_str};

#[test]
fn flag_wins_over_environment() {
    assert_eq!(effective_level(Some(LogLevel::Debug), Some("error")), Level::DEBUG);
    assert_eq!(effective_level(Some(LogLevel::Warn), None), Level::WARN);
}

#[test]
fn environment_is_used_without_a_flag() {
    assert_eq!(effective_level(None, Some(" TRACE ")), Level::TRACE);
    assert_eq!(effective_level(None, Some("warning")), Level::WARN);
}

#[test]
fn unset_or_unknown_level_means_info() {
    assert_eq!(effective_level(None, None), Level::INFO);
    assert_eq!(effective_level(None, Some("loud")), Level::INFO);
    assert_eq!(parse_level_str(""), None);
}
