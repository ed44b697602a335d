// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Integration tests for configuration loading.
//!
//! ## Test Categories
//!
//! - File formats
//! - Environment overrides
//! - Validation failures
//! - Wiring loaded settings into the engine and manager

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use uaview_core::{
    config::ConfigFormat, error::ConfigError, types::well_known, BrowseEngine, ConfigLoader,
    DispatchBridge, ExplorerConfig, SubscriptionManager, TreeCache,
};
use uaview_tests::common::*;

fn loader() -> ConfigLoader {
    ConfigLoader::new().with_env_vars(false)
}

// =============================================================================
// File Formats
// =============================================================================

#[test]
fn test_load_yaml_file() {
    let dir = temp_test_dir();
    let path = dir.path().join("uaview.yaml");
    fs::write(
        &path,
        r#"
browse:
  rebrowse_on_expand: true
  page_size: 50
subscription:
  publishing_interval: 1s
  sampling_interval: 500ms
"#,
    )
    .unwrap();

    let config = loader().load(&path).unwrap();

    assert!(config.browse.rebrowse_on_expand);
    assert_eq!(config.browse.page_size, 50);
    assert_eq!(config.subscription.publishing_interval, Duration::from_secs(1));
    assert_eq!(config.subscription.sampling_interval, Duration::from_millis(500));
}

#[test]
fn test_load_toml_and_json_files() {
    let dir = temp_test_dir();

    let toml_path = dir.path().join("uaview.toml");
    fs::write(&toml_path, "[browse]\npage_size = 10\n").unwrap();
    let config = loader().load(&toml_path).unwrap();
    assert_eq!(config.browse.page_size, 10);
    assert_eq!(
        config.subscription.publishing_interval,
        Duration::from_millis(250)
    );

    let json_path = dir.path().join("uaview.json");
    fs::write(&json_path, r#"{"subscription": {"publishing_interval": "2s"}}"#).unwrap();
    let config = loader().load(&json_path).unwrap();
    assert_eq!(config.subscription.publishing_interval, Duration::from_secs(2));
    assert_eq!(config.browse.page_size, 100);
}

#[test]
fn test_empty_content_yields_defaults() {
    let config = loader().load_from_str("   \n", ConfigFormat::Yaml).unwrap();
    assert_eq!(config, ExplorerConfig::default());
    assert!(!config.browse.rebrowse_on_expand);
}

#[test]
fn test_missing_and_unsupported_files() {
    let dir = temp_test_dir();

    let missing = loader().load(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(missing, ConfigError::FileNotFound { .. }));

    let ini = dir.path().join("uaview.ini");
    fs::write(&ini, "page_size=1").unwrap();
    let unsupported = loader().load(&ini).unwrap_err();
    assert!(matches!(unsupported, ConfigError::UnsupportedFormat { .. }));
}

#[test]
fn test_malformed_file_is_a_parse_error() {
    let dir = temp_test_dir();
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let err = loader().load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_zero_values_are_rejected() {
    let err = loader()
        .load_from_str("[browse]\npage_size = 0\n", ConfigFormat::Toml)
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));

    let err = loader()
        .load_from_str(
            r#"{"subscription": {"sampling_interval": "0s"}}"#,
            ConfigFormat::Json,
        )
        .unwrap_err();
    assert!(matches!(err, ConfigError::Validation { .. }));
}

// =============================================================================
// Environment Overrides
// =============================================================================

#[test]
fn test_environment_overrides_file_values() {
    let prefix = unique_env_prefix("override");
    std::env::set_var(format!("{prefix}_PAGE_SIZE"), "7");
    std::env::set_var(format!("{prefix}_REBROWSE_ON_EXPAND"), "yes");
    std::env::set_var(format!("{prefix}_PUBLISHING_INTERVAL"), "750ms");

    let config = ConfigLoader::new()
        .with_env_prefix(&prefix)
        .load_from_str("[browse]\npage_size = 40\n", ConfigFormat::Toml)
        .unwrap();

    assert_eq!(config.browse.page_size, 7);
    assert!(config.browse.rebrowse_on_expand);
    assert_eq!(
        config.subscription.publishing_interval,
        Duration::from_millis(750)
    );
}

#[test]
fn test_invalid_environment_value_is_reported() {
    let prefix = unique_env_prefix("invalid");
    std::env::set_var(format!("{prefix}_SAMPLING_INTERVAL"), "soon");

    let err = ConfigLoader::new()
        .with_env_prefix(&prefix)
        .load_from_str("", ConfigFormat::Yaml)
        .unwrap_err();

    match err {
        ConfigError::InvalidEnvVar { name, .. } => {
            assert_eq!(name, format!("{prefix}_SAMPLING_INTERVAL"));
        }
        other => panic!("Expected InvalidEnvVar, got {other:?}"),
    }
}

#[test]
fn test_unrecognised_boolean_is_reported() {
    let prefix = unique_env_prefix("bool");
    std::env::set_var(format!("{prefix}_REBROWSE_ON_EXPAND"), "maybe");

    let err = ConfigLoader::new()
        .with_env_prefix(&prefix)
        .load_from_str("", ConfigFormat::Yaml)
        .unwrap_err();

    match err {
        ConfigError::InvalidEnvVar { name, .. } => {
            assert_eq!(name, format!("{prefix}_REBROWSE_ON_EXPAND"));
        }
        other => panic!("Expected InvalidEnvVar, got {other:?}"),
    }

    std::env::set_var(format!("{prefix}_REBROWSE_ON_EXPAND"), "No");
    let config = ConfigLoader::new()
        .with_env_prefix(&prefix)
        .load_from_str("[browse]\nrebrowse_on_expand = true\n", ConfigFormat::Toml)
        .unwrap();
    assert!(!config.browse.rebrowse_on_expand);
}

// =============================================================================
// Wiring
// =============================================================================

#[tokio::test]
async fn test_loaded_settings_reach_engine_and_manager() {
    let config = loader()
        .load_from_str(
            "[browse]\npage_size = 3\n[subscription]\npublishing_interval = \"100ms\"\n",
            ConfigFormat::Toml,
        )
        .unwrap();

    let session = MockSession::shared();
    session.script_children(well_known::ROOT_FOLDER, Scenario::tags(2));

    let engine = BrowseEngine::new(Arc::clone(&session)).with_settings(config.browse.clone());
    let mut cache = TreeCache::new();
    engine.browse(&mut cache, None).await;
    assert_eq!(session.browse_requests()[0].max_references, 3);

    let (bridge, _dispatch) = DispatchBridge::new();
    let manager = SubscriptionManager::new(Arc::clone(&session), bridge)
        .with_settings(config.subscription.clone());
    assert_eq!(
        manager.settings().publishing_interval,
        Duration::from_millis(100)
    );
    manager.create_default_subscription().await.unwrap();
}
