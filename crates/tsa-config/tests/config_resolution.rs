//! Configuration resolution and loading against real files.
//!
//! Covers:
//! - Resolution order (CLI > env path > env dir > defaults)
//! - TOML and JSON loading with validation
//! - Snapshot hashing of file content

use std::env;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tempfile::TempDir;
use tsa_config::resolve::{resolve_config, ConfigSource};
use tsa_config::{load_config, ScorerKind, ValidationError};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

const ENV_KEYS: &[&str] = &["TSA_CONFIG", "TSA_CONFIG_DIR", "XDG_CONFIG_HOME", "HOME"];

struct EnvGuard {
    saved: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    fn new(keys: &[&str]) -> Self {
        Self {
            saved: keys
                .iter()
                .map(|k| (k.to_string(), env::var(k).ok()))
                .collect(),
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(val) => env::set_var(key, val),
                None => env::remove_var(key),
            }
        }
    }
}

fn with_env_lock<T>(f: impl FnOnce() -> T) -> T {
    let _guard = ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    f()
}

/// Point XDG and HOME at an empty directory so the host's config is ignored.
fn isolate(temp: &TempDir) {
    let home = temp.path().join("home");
    fs::create_dir_all(&home).unwrap();
    env::set_var("HOME", &home);
    env::set_var("XDG_CONFIG_HOME", home.join(".config"));
    env::remove_var("TSA_CONFIG");
    env::remove_var("TSA_CONFIG_DIR");
}

fn write_pipeline(path: &Path, windowsize: i64) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(
        path,
        format!(
            r#"
schema_version = "1.0.0"

[[scorers]]
kind = "spectral"
input_item = "temp"
windowsize = {windowsize}
output_item = "temp_spectral"
"#
        ),
    )
    .unwrap();
}

#[test]
fn cli_path_wins_over_env() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().unwrap();
        isolate(&temp);

        let cli = temp.path().join("cli").join("pipeline.toml");
        let from_env = temp.path().join("env").join("pipeline.toml");
        write_pipeline(&cli, 12);
        write_pipeline(&from_env, 24);
        env::set_var("TSA_CONFIG", &from_env);

        let paths = resolve_config(Some(&cli));
        assert_eq!(paths.source, ConfigSource::CliArgument);
        assert_eq!(paths.pipeline.unwrap(), cli);
    });
}

#[test]
fn env_path_wins_over_env_dir() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().unwrap();
        isolate(&temp);

        let from_env = temp.path().join("env").join("custom.toml");
        let dir = temp.path().join("dir");
        write_pipeline(&from_env, 24);
        write_pipeline(&dir.join("pipeline.toml"), 36);
        env::set_var("TSA_CONFIG", &from_env);
        env::set_var("TSA_CONFIG_DIR", &dir);

        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.config.scorers[0].windowsize, 24);
        assert_eq!(loaded.snapshot.source, ConfigSource::Environment);

        env::remove_var("TSA_CONFIG");
        let loaded = load_config(None).unwrap();
        assert_eq!(loaded.config.scorers[0].windowsize, 36);
    });
}

#[test]
fn falls_back_to_builtin_default() {
    with_env_lock(|| {
        let _guard = EnvGuard::new(ENV_KEYS);
        let temp = TempDir::new().unwrap();
        isolate(&temp);

        let paths = resolve_config(None);
        if paths.source == ConfigSource::SystemConfig {
            // host has /etc/tsa/pipeline.toml; nothing to assert here
            return;
        }
        assert_eq!(paths.source, ConfigSource::BuiltinDefault);
        let loaded = load_config(None).unwrap();
        let kinds: Vec<ScorerKind> = loaded.config.scorers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, ScorerKind::ALL.to_vec());
        assert!(loaded.snapshot.content_hash.is_none());
    });
}

#[test]
fn missing_cli_path_is_an_error() {
    let err = load_config(Some(Path::new("/nonexistent/tsa/pipeline.toml"))).unwrap_err();
    assert!(matches!(err, ValidationError::IoError(_)));
}

#[test]
fn json_files_load_and_validate() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.json");
    fs::write(
        &path,
        r#"{
            "scorers": [
                {"kind": "nodata", "input_item": "flow", "windowsize": 12, "output_item": "flow_gaps"}
            ],
            "policy": {"non_finite": "neutral"}
        }"#,
    )
    .unwrap();

    let loaded = load_config(Some(&path)).unwrap();
    assert_eq!(loaded.config.scorers[0].kind, ScorerKind::NoData);
    assert_eq!(loaded.snapshot.source, ConfigSource::CliArgument);
    assert_eq!(
        loaded.snapshot.content_hash.as_deref().map(str::len),
        Some(64)
    );
}

#[test]
fn invalid_file_is_rejected() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pipeline.toml");
    write_pipeline(&path, 0);
    let err = load_config(Some(&path)).unwrap_err();
    assert!(matches!(err, ValidationError::InvalidValue { .. }));
}
