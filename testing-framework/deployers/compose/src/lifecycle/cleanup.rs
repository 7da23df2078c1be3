use std::{path::PathBuf, time::Duration};

use pkgtest_core::process::CommandError;
use tracing::{debug, info};

use crate::docker::commands::compose_down;

/// Removes a compose project unless preservation was requested.
pub struct ComposeCleanup {
    pub compose_file: PathBuf,
    pub project_name: String,
    preserve: bool,
    timeout: Duration,
}

impl ComposeCleanup {
    pub fn new(compose_file: PathBuf, project_name: String, preserve: bool, timeout: Duration) -> Self {
        debug_assert!(
            !compose_file.as_os_str().is_empty() && !project_name.is_empty(),
            "compose cleanup should receive valid identifiers"
        );
        Self {
            compose_file,
            project_name,
            preserve,
            timeout,
        }
    }

    pub async fn run(&self) -> Result<(), CommandError> {
        debug!(
            compose_file = %self.compose_file.display(),
            project = %self.project_name,
            preserve = self.preserve,
            "compose cleanup started"
        );
        if self.preserve {
            info!(
                project = %self.project_name,
                "preserve flag set; skipping docker compose down"
            );
            return Ok(());
        }

        compose_down(&self.compose_file, &self.project_name, self.timeout).await
    }
}
