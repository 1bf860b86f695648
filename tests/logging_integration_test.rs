//! Integration tests for logging configuration

use aegis::config::{parse_config, LoggingConfig};

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_path, "./logs");
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_logging_section_parses() {
    let config = parse_config(
        r#"
[logging]
local_enabled = true
local_path = "/tmp/aegis-logs"
local_rotation = "never"
"#,
    )
    .unwrap();

    assert!(config.logging.local_enabled);
    assert_eq!(config.logging.local_path, "/tmp/aegis-logs");
    assert_eq!(config.logging.local_rotation, "never");
}

#[test]
fn test_enabled_file_logging_requires_path() {
    let result = parse_config("[logging]\nlocal_enabled = true\nlocal_path = \"\"\n");
    assert!(result.is_err());
}
