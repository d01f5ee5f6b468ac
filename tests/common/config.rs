//! Test environment: temp directories and an orchestrator wired to them

use bit_installer::{AcquisitionOrchestrator, Config, PrivilegedExecutor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Package used by the end-to-end scenarios
pub const TEST_PACKAGE: &str = "com.example.app";

/// Destination relative to the package root
pub const TEST_RELATIVE_PATH: &str = "files/patch.bin";

/// Isolated temp and privileged-root directories for one test
pub struct TestEnv {
    _temp: TempDir,
    /// Where temporary download artifacts are written
    pub temp_dir: PathBuf,
    /// Stand-in for the protected per-package data root
    pub privileged_root: PathBuf,
}

impl TestEnv {
    /// Create the directories, including `<root>/com.example.app/files`
    pub fn new() -> Result<Self, std::io::Error> {
        let temp = tempfile::tempdir()?;
        let temp_dir = temp.path().join("downloads");
        let privileged_root = temp.path().join("data");
        std::fs::create_dir_all(&temp_dir)?;
        std::fs::create_dir_all(privileged_root.join(TEST_PACKAGE).join("files"))?;
        Ok(Self {
            _temp: temp,
            temp_dir,
            privileged_root,
        })
    }

    /// Configuration pointing at this environment, plain HTTP allowed
    pub fn config(&self) -> Config {
        let mut config = Config::default();
        config.download.temp_dir = self.temp_dir.clone();
        config.download.min_free_space = 1024;
        config.download.allow_http = true;
        config.download.read_timeout = Duration::from_secs(5);
        config.install.privileged_root = self.privileged_root.clone();
        config
    }

    /// Installed location of the test destination
    pub fn installed_path(&self) -> PathBuf {
        self.privileged_root.join(TEST_PACKAGE).join(TEST_RELATIVE_PATH)
    }

    /// Number of files left in the temp directory
    pub fn temp_file_count(&self) -> usize {
        count_entries(&self.temp_dir)
    }
}

fn count_entries(dir: &Path) -> usize {
    std::fs::read_dir(dir)
        .map(|entries| entries.filter_map(Result::ok).count())
        .unwrap_or(0)
}

/// Build an orchestrator for `env` around `executor`
pub fn create_test_orchestrator(
    env: &TestEnv,
    executor: Arc<dyn PrivilegedExecutor>,
) -> AcquisitionOrchestrator {
    match AcquisitionOrchestrator::new(env.config(), executor) {
        Ok(orchestrator) => orchestrator,
        Err(e) => panic!("failed to build orchestrator: {e}"),
    }
}
