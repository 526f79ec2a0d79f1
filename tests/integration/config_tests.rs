use appsync::config::{Config, ConfigOverrides, ENV_PREFIX};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Use figment directly without Env to avoid interference from other tests
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.inter_item_delay_ms, 500);
    assert!(config.store_path.is_none());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("APPSYNC_GENERATOR_TIMEOUT_SECS", "30");
    std::env::set_var("APPSYNC_ICON_PRELOAD_CONCURRENCY", "2");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()
        .unwrap();

    assert_eq!(config.generator_timeout(), Some(Duration::from_secs(30)));
    assert_eq!(config.icon_cache_limits().max_concurrent_loads, 2);

    std::env::remove_var("APPSYNC_GENERATOR_TIMEOUT_SECS");
    std::env::remove_var("APPSYNC_ICON_PRELOAD_CONCURRENCY");
}

#[test]
fn test_config_load_from_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        r#"
store_path = "/tmp/appsync/records.json"
language = "fi"
inter_item_delay_ms = 1500
generator_paths = ["/opt/tools/bin"]
icon_cache_max_items = 64
"#,
    )
    .unwrap();

    let config = Config::load(Some(&config_path), &ConfigOverrides::default());
    assert_eq!(
        config.store_path().unwrap(),
        PathBuf::from("/tmp/appsync/records.json")
    );
    assert_eq!(config.language_plan().targets(), ["fi", "en"]);
    assert_eq!(config.inter_item_delay(), Duration::from_millis(1500));
    assert_eq!(config.generator_paths, vec![PathBuf::from("/opt/tools/bin")]);
    assert_eq!(config.icon_cache_limits().max_items, 64);
}

#[test]
fn test_cli_overrides_win() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "language = \"fi\"\ninter_item_delay_ms = 1500\n").unwrap();

    let overrides = ConfigOverrides {
        store_path: Some(PathBuf::from("/elsewhere/records.json")),
        language: Some("sv".into()),
        inter_item_delay_ms: Some(0),
    };
    let config = Config::load(Some(&config_path), &overrides);

    assert_eq!(config.language.as_deref(), Some("sv"));
    assert_eq!(config.inter_item_delay(), Duration::ZERO);
    assert_eq!(
        config.store_path.as_deref(),
        Some(PathBuf::from("/elsewhere/records.json").as_path())
    );
}

#[test]
fn test_unset_overrides_leave_file_values() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "inter_item_delay_ms = 900\n").unwrap();

    let overrides = ConfigOverrides {
        language: Some("de".into()),
        ..ConfigOverrides::default()
    };
    let config = Config::load(Some(&config_path), &overrides);
    assert_eq!(config.inter_item_delay_ms, 900);
    assert_eq!(config.language.as_deref(), Some("de"));
}

#[test]
fn test_invalid_toml_falls_back() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(&config_path, "inter_item_delay_ms = \"soon\"\n[[[").unwrap();

    let overrides = ConfigOverrides {
        language: Some("fi".into()),
        ..ConfigOverrides::default()
    };
    let config = Config::load(Some(&config_path), &overrides);
    assert_eq!(config.inter_item_delay_ms, 500);
    assert_eq!(config.language.as_deref(), Some("fi"));
}

#[test]
fn test_missing_file_is_ignored() {
    let temp_dir = tempdir().unwrap();
    let config = Config::load(
        Some(&temp_dir.path().join("absent.toml")),
        &ConfigOverrides::default(),
    );
    assert_eq!(config.inter_item_delay_ms, 500);
}

#[test]
fn test_save_round_trips_through_figment() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("nested/config.toml");
    let config = Config {
        language: Some("ja".into()),
        inter_item_delay_ms: 250,
        generator_paths: vec![PathBuf::from("/usr/local/bin")],
        ..Config::default()
    };
    config.save(&config_path).unwrap();

    let loaded: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();
    assert_eq!(loaded, config);
}
