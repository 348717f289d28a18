//! Tests for configuration loading and validation

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::loader::{ENV_LOCALE, ENV_PYTHON};
    use crate::errors::BootstrapError;
    use crate::locale::Locale;
    use serial_test::serial;
    use std::collections::HashMap;
    use std::io::Write;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, NamedTempFile};

    #[test]
    #[serial]
    fn test_empty_config_uses_defaults() {
        let config = ConfigLoader::from_str("").unwrap();
        assert_eq!(config.interpreter, "python");
        assert_eq!(config.locale, Locale::English);
        assert!(config.pause_on_exit);
        assert_eq!(config.paths.env_dir, PathBuf::from("env"));
        assert_eq!(config.paths.requirements, PathBuf::from("requirements.txt"));
        assert_eq!(config.paths.download_script, PathBuf::from("download_models.py"));
        assert_eq!(config.paths.models_dir, PathBuf::from("models"));
        assert_eq!(config.runtime.accelerated.packages.len(), 3);
        assert!(config.runtime.accelerated.packages[0].starts_with("torch=="));
        assert_eq!(config.runtime.accelerated.index_url, "https://download.pytorch.org/whl/cu118");
        assert_eq!(config.runtime.fallback.packages, vec!["torch", "torchvision", "torchaudio"]);
        assert_eq!(config.models.source, ModelSource::Script);
        assert_eq!(config.models.max_retries, 3);
        assert_eq!(config.models.fallback_files.len(), 10);
    }

    #[test]
    #[serial]
    fn test_partial_yaml_keeps_other_defaults() {
        let yaml = r#"
interpreter: py
locale: zh
paths:
  env_dir: .venv
models:
  source: builtin
  max_retries: 5
"#;
        let config = ConfigLoader::from_str(yaml).unwrap();
        assert_eq!(config.interpreter, "py");
        assert_eq!(config.locale, Locale::Chinese);
        assert_eq!(config.paths.env_dir, PathBuf::from(".venv"));
        assert_eq!(config.paths.requirements, PathBuf::from("requirements.txt"));
        assert_eq!(config.models.source, ModelSource::Builtin);
        assert_eq!(config.models.max_retries, 5);
        assert_eq!(config.models.revision, "master");
    }

    #[test]
    #[serial]
    fn test_invalid_yaml_is_config_error() {
        let result = ConfigLoader::from_str("interpreter: [unclosed");
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_validation_rejects_bad_values() {
        let result = ConfigLoader::from_str("interpreter: \"  \"");
        assert!(matches!(result, Err(BootstrapError::Config(msg)) if msg.contains("interpreter")));

        let result = ConfigLoader::from_str("models:\n  max_retries: 0\n");
        assert!(matches!(result, Err(BootstrapError::Config(msg)) if msg.contains("max_retries")));

        let result = ConfigLoader::from_str("runtime:\n  accelerated:\n    index_url: ftp://example.com\n");
        assert!(matches!(result, Err(BootstrapError::Config(msg)) if msg.contains("index_url")));

        let result = ConfigLoader::from_str("runtime:\n  fallback:\n    packages: []\n");
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[test]
    fn test_overrides_from_lookup() {
        let mut vars = HashMap::new();
        vars.insert("OCRPREP_PYTHON", "python3.11");
        vars.insert("OCRPREP_LOCALE", "zh-CN");
        vars.insert("OCRPREP_ENV_DIR", "venv");
        vars.insert("OCRPREP_MODELS_DIR", "weights");
        vars.insert("OCRPREP_PIP_INDEX_URL", "https://download.pytorch.org/whl/cu121");

        let mut config = OcrPrepConfig::default();
        ConfigLoader::apply_overrides_from(&mut config, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.interpreter, "python3.11");
        assert_eq!(config.locale, Locale::Chinese);
        assert_eq!(config.paths.env_dir, PathBuf::from("venv"));
        assert_eq!(config.paths.models_dir, PathBuf::from("weights"));
        assert_eq!(config.runtime.accelerated.index_url, "https://download.pytorch.org/whl/cu121");
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = OcrPrepConfig::default();
        ConfigLoader::apply_overrides_from(&mut config, |_| Some("   ".to_string())).unwrap();
        assert_eq!(config.interpreter, "python");
    }

    #[test]
    fn test_unknown_locale_override_fails() {
        let mut config = OcrPrepConfig::default();
        let result = ConfigLoader::apply_overrides_from(&mut config, |k| {
            (k == "OCRPREP_LOCALE").then(|| "klingon".to_string())
        });
        assert!(matches!(result, Err(BootstrapError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_process_environment_overrides() {
        std::env::set_var(ENV_PYTHON, "/opt/python/bin/python3");
        std::env::set_var(ENV_LOCALE, "zh");
        let config = ConfigLoader::from_str("interpreter: python");
        std::env::remove_var(ENV_PYTHON);
        std::env::remove_var(ENV_LOCALE);

        let config = config.unwrap();
        assert_eq!(config.interpreter, "/opt/python/bin/python3");
        assert_eq!(config.locale, Locale::Chinese);
    }

    #[tokio::test]
    #[serial]
    async fn test_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "interpreter: python3").unwrap();
        writeln!(file, "pause_on_exit: false").unwrap();

        let config = ConfigLoader::from_file(file.path()).await.unwrap();
        assert_eq!(config.interpreter, "python3");
        assert!(!config.pause_on_exit);
    }

    #[tokio::test]
    #[serial]
    async fn test_load_or_default_without_file() {
        let dir = tempdir().unwrap();
        let (config, source) = ConfigLoader::load_or_default(None, dir.path()).await.unwrap();
        assert!(source.is_none());
        assert_eq!(config.interpreter, "python");
    }

    #[tokio::test]
    #[serial]
    async fn test_load_or_default_picks_up_workdir_file() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "locale: zh\n").unwrap();

        let (config, source) = ConfigLoader::load_or_default(None, dir.path()).await.unwrap();
        assert_eq!(source, Some(dir.path().join(DEFAULT_CONFIG_FILE)));
        assert_eq!(config.locale, Locale::Chinese);
    }

    #[tokio::test]
    #[serial]
    async fn test_missing_explicit_file_is_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        let result = ConfigLoader::load_or_default(Some(&missing), dir.path()).await;
        assert!(matches!(result, Err(BootstrapError::Config(msg)) if msg.contains("nope.yaml")));
    }

    #[test]
    fn test_resolve_joins_relative_paths() {
        let mut config = OcrPrepConfig::default();
        let absolute_models = std::env::temp_dir().join("shared-models");
        config.paths.models_dir = absolute_models.clone();

        let workdir = Path::new("/work/ocr");
        let resolved = config.resolve(workdir);
        assert_eq!(resolved.env_dir, workdir.join("env"));
        assert_eq!(resolved.requirements, workdir.join("requirements.txt"));
        assert_eq!(resolved.download_script, workdir.join("download_models.py"));
        assert_eq!(resolved.models_dir, absolute_models);
    }

    #[test]
    #[serial]
    fn test_resolve_anchors_relative_workdir_at_cwd() {
        let cwd = std::env::current_dir().unwrap();
        let resolved = OcrPrepConfig::default().resolve(Path::new("sub"));

        assert_eq!(resolved.workdir, cwd.join("sub"));
        assert_eq!(resolved.env_dir, cwd.join("sub").join("env"));
        assert!(resolved.requirements.is_absolute());
        assert!(resolved.download_script.is_absolute());
        assert!(resolved.models_dir.is_absolute());
    }
}
