// tests/config_test.rs
use gitversion::config::{load_config, Config, VersioningMode};
use gitversion::domain::IncrementStrategy;
use gitversion::engine::CompiledConfig;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

#[test]
fn test_load_default_config() {
    let config = Config::default();
    assert_eq!(config.mode, VersioningMode::ContinuousDelivery);
    assert_eq!(config.tag_prefix, "[vV]?");
    assert_eq!(config.next_version, "0.1.0");
    assert_eq!(config.branches["develop"].label.as_deref(), Some("alpha"));
    assert_eq!(config.branches["main"].is_mainline, Some(true));
}

#[test]
fn test_load_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();
    let toml_content = r#"
next_version = "2.0.0"

[branches.develop]
label = "dev"
"#;
    temp_file.write_all(toml_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = load_config(Some(temp_file.path()), None).unwrap();
    assert_eq!(config.next_version, "2.0.0");
    let develop = &config.branches["develop"];
    assert_eq!(develop.label.as_deref(), Some("dev"));
    assert_eq!(develop.increment, Some(IncrementStrategy::Minor));
    assert_eq!(develop.tracks_release_branches, Some(true));
}

#[test]
fn test_fixture_config() {
    let config = load_config(Some(Path::new("tests/fixtures/gitversion.toml")), None)
        .expect("Failed to load test config");
    assert_eq!(config.mode, VersioningMode::ContinuousDeployment);
    assert_eq!(config.tag_prefix, "release-");
    assert_eq!(config.formats.len(), 1);
    assert!(config.merge_message_formats.contains_key("Gitea"));

    let compiled = CompiledConfig::new(config).expect("fixture compiles");
    let feature = compiled.classifier.classify("feature/search");
    assert_eq!(feature.increment, IncrementStrategy::Minor);
    assert_eq!(feature.label.as_deref(), Some("feat-search"));

    let experiment = compiled.classifier.classify("exp/rewrite");
    assert_eq!(experiment.key, "experiment");
    assert_eq!(experiment.increment, IncrementStrategy::Major);
    assert_eq!(experiment.label.as_deref(), Some("exp"));

    let merge = compiled
        .merge_messages
        .parse("Merged 'release/3.0.0'")
        .expect("custom merge format");
    assert_eq!(merge.source_branch, "release/3.0.0");
}

#[test]
fn test_missing_explicit_file_is_an_error() {
    let result = load_config(Some(Path::new("tests/fixtures/does-not-exist.toml")), None);
    assert!(result.is_err());
}

#[test]
fn test_new_rule_without_regex_is_rejected() {
    let config = Config::from_toml_str(
        r#"
[branches.orphan]
priority = 5
"#,
    )
    .unwrap();
    assert!(CompiledConfig::new(config).is_err());
}

#[test]
fn test_duplicate_priority_is_rejected() {
    let config = Config::from_toml_str(
        r#"
[branches.feature]
priority = 90
"#,
    )
    .unwrap();
    let err = CompiledConfig::new(config).unwrap_err();
    assert!(err.to_string().contains("share priority 90"));
}

#[test]
fn test_fingerprint_tracks_effective_rules() {
    let a = Config::from_toml_str("").unwrap();
    let b = Config::from_toml_str("[branches.feature]\nlabel = \"f\"\n").unwrap();
    assert_eq!(a.fingerprint().unwrap(), Config::default().fingerprint().unwrap());
    assert_ne!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
}
