use std::path::PathBuf;

use caretracker_server::config::{ServerConfig, parse_config};

#[test]
fn empty_object_gets_defaults() {
    let config = parse_config("{}").unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.bind, "0.0.0.0:8000");
    assert_eq!(config.csrf_cookie, "csrftoken");
    assert_eq!(config.staffing.weekly_hours, 38.5);
    assert_eq!(config.scheme.minutes.base, 33);
    assert_eq!(config.sheet.sheet_name, "Analyse");
}

#[test]
fn unversioned_config_is_stamped_and_keeps_its_values() {
    let config = parse_config(r#"{"bind": "127.0.0.1:9000", "staffing": {"shift_hours": 12}}"#).unwrap();
    assert_eq!(config.config_version, 1);
    assert_eq!(config.bind, "127.0.0.1:9000");
    assert_eq!(config.staffing.shift_hours, 12.0);
    assert_eq!(config.staffing.weekly_hours, 38.5);
}

#[test]
fn non_object_config_is_rejected() {
    let err = parse_config("[1, 2]").unwrap_err();
    assert!(err.to_string().contains("not a JSON object"));
}

#[test]
fn partial_scheme_keeps_remaining_defaults() {
    let config = parse_config(
        r#"{"config_version": 1, "scheme": {"general": {"gate": {"barthel_max": 30, "expanded_barthel_max": 15, "mini_mental_max": 16}}}}"#,
    )
    .unwrap();
    assert_eq!(config.scheme.general.gate.barthel_max, 30);
    assert_eq!(config.scheme.minutes.isolation_base, 123);
}

#[test]
fn newer_config_is_rejected() {
    let err = parse_config(r#"{"config_version": 7}"#).unwrap_err();
    assert!(err.to_string().contains("newer than this build supports"));
}

#[test]
fn environment_overrides_win() {
    let config = ServerConfig::default().with_overrides(
        Some("127.0.0.1:1".to_string()),
        Some("/tmp/caretracker.json".to_string()),
    );
    assert_eq!(config.bind, "127.0.0.1:1");
    assert_eq!(config.snapshot_path, Some(PathBuf::from("/tmp/caretracker.json")));

    let untouched = ServerConfig::default().with_overrides(Some("  ".to_string()), None);
    assert_eq!(untouched.bind, "0.0.0.0:8000");
}
