use std::path::PathBuf;

use pkgtest_core::FixtureMode;
use pkgtest_runner_compose::ComposeConfig;
use pkgtest_runner_terraform::TerraformConfig;

pub const DEFAULT_LOGS_DIR: &str = ".tmp/service-logs";

/// Everything a system test run reads from its environment, gathered once.
#[derive(Clone, Debug)]
pub struct RunnerConfig {
    pub compose: ComposeConfig,
    pub terraform: TerraformConfig,
    pub fixture_mode: FixtureMode,
    /// Parent of the per-service log folders.
    pub logs_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            compose: ComposeConfig::default(),
            terraform: TerraformConfig::default(),
            fixture_mode: FixtureMode::default(),
            logs_dir: PathBuf::from(DEFAULT_LOGS_DIR),
        }
    }
}

impl RunnerConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            compose: ComposeConfig::from_env(),
            terraform: TerraformConfig::from_env(),
            fixture_mode: FixtureMode::from_env(),
            logs_dir: pkgtest_env::logs_dir().unwrap_or_else(|| PathBuf::from(DEFAULT_LOGS_DIR)),
        }
    }

    /// Log folder owned by one service deployment.
    #[must_use]
    pub fn service_logs_dir(&self, service: &str) -> PathBuf {
        self.logs_dir.join(service)
    }
}
