//! Tests for the installation system

#[cfg(test)]
mod tests {
    use crate::config::RuntimeConfig;
    use crate::errors::BootstrapError;
    use crate::installation::*;
    use crate::test_utils::ScriptedRunner;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_upgrade_pip_ignores_failure() {
        let runner = ScriptedRunner::new().exit("--upgrade pip", 1);
        let installer = PackageInstaller::new(&runner, "env/bin/python");
        installer.upgrade_pip().await;
        assert_eq!(runner.calls(), vec!["env/bin/python -m pip install --upgrade pip"]);
    }

    #[tokio::test]
    async fn test_upgrade_pip_ignores_spawn_error() {
        let runner = ScriptedRunner::new().missing("--upgrade pip");
        let installer = PackageInstaller::new(&runner, "env/bin/python");
        installer.upgrade_pip().await;
        assert_eq!(runner.count_matching("--upgrade pip"), 1);
    }

    #[tokio::test]
    async fn test_accelerated_success_skips_fallback() {
        let runner = ScriptedRunner::new();
        let installer = PackageInstaller::new(&runner, "python");
        let mut failures = Vec::new();

        let result = installer
            .install_runtime(runtime_strategies(&RuntimeConfig::default()), |name| failures.push(name))
            .await;

        assert_eq!(result, RuntimeInstall::Primary("accelerated"));
        assert!(!result.used_fallback());
        assert!(failures.is_empty());
        assert_eq!(runner.calls().len(), 1);
        assert!(runner.calls()[0].contains("--index-url https://download.pytorch.org/whl/cu118"));
    }

    #[tokio::test]
    async fn test_accelerated_failure_falls_back_exactly_once() {
        let runner = ScriptedRunner::new().exit("--index-url", 1);
        let installer = PackageInstaller::new(&runner, "python");
        let mut failures = Vec::new();

        let result = installer
            .install_runtime(runtime_strategies(&RuntimeConfig::default()), |name| failures.push(name))
            .await;

        assert_eq!(result, RuntimeInstall::Fallback("generic"));
        assert_eq!(failures, vec!["accelerated"]);
        assert_eq!(runner.count_matching("--index-url"), 1);
        assert_eq!(
            runner.count_matching("-m pip install torch torchvision torchaudio"),
            1
        );
    }

    #[tokio::test]
    async fn test_both_strategies_failing_is_not_fatal() {
        let runner = ScriptedRunner::new().exit("install torch", 1);
        let installer = PackageInstaller::new(&runner, "python");
        let mut failures = Vec::new();

        let result = installer
            .install_runtime(runtime_strategies(&RuntimeConfig::default()), |name| failures.push(name))
            .await;

        assert_eq!(result, RuntimeInstall::Failed);
        assert_eq!(failures, vec!["accelerated", "generic"]);
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_strategies_sorted_by_priority() {
        let runner = ScriptedRunner::new();
        let installer = PackageInstaller::new(&runner, "python");
        let config = RuntimeConfig::default();
        let reversed: Vec<Box<dyn RuntimeStrategy>> = vec![
            Box::new(GenericStrategy::from(&config.fallback)),
            Box::new(AcceleratedStrategy::from(&config.accelerated)),
        ];

        let result = installer.install_runtime(reversed, |_| {}).await;
        assert_eq!(result, RuntimeInstall::Primary("accelerated"));
    }

    #[tokio::test]
    async fn test_manifest_install_success() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("requirements.txt");
        std::fs::write(&manifest, "transformers\n").unwrap();

        let runner = ScriptedRunner::new();
        let installer = PackageInstaller::new(&runner, "python").with_current_dir(dir.path());
        installer.install_manifest(&manifest).await.unwrap();

        let specs = runner.specs();
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].args[..4], ["-m", "pip", "install", "-r"]);
        assert_eq!(specs[0].cwd.as_deref(), Some(dir.path()));
    }

    #[tokio::test]
    async fn test_manifest_install_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let manifest = dir.path().join("requirements.txt");
        std::fs::write(&manifest, "transformers\n").unwrap();

        let runner = ScriptedRunner::new().exit("-r", 1);
        let installer = PackageInstaller::new(&runner, "python");
        let err = installer.install_manifest(&manifest).await.unwrap_err();

        assert!(matches!(err, BootstrapError::DependencyInstall { code: Some(1), .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_missing_manifest() {
        let dir = tempdir().unwrap();
        let runner = ScriptedRunner::new();
        let installer = PackageInstaller::new(&runner, "python");
        let err = installer
            .install_manifest(&dir.path().join("requirements.txt"))
            .await
            .unwrap_err();

        assert!(matches!(err, BootstrapError::ManifestMissing { .. }));
        assert!(runner.calls().is_empty());
    }
}
