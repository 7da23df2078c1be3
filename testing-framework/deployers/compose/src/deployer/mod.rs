use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use pkgtest_core::{DeploymentError, ServiceContext, ServiceDeployer, adjust_timeout};
use tracing::info;
use uuid::Uuid;

use crate::{
    descriptor::service_endpoint,
    docker::{
        commands::{compose_config_json, compose_up},
        ensure_docker_available,
    },
    lifecycle::cleanup::ComposeCleanup,
};

/// Directory name under `_dev/deploy` selecting this deployer.
pub const DEPLOYER_NAME: &str = "docker";
/// Compose file expected inside the `docker` directory.
pub const COMPOSE_FILE: &str = "docker-compose.yml";

const DEFAULT_UP_TIMEOUT: Duration = Duration::from_secs(600);
const DEFAULT_DOWN_TIMEOUT: Duration = Duration::from_secs(120);
const CONFIG_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct ComposeConfig {
    pub up_timeout: Duration,
    pub down_timeout: Duration,
    /// Leave the project running on teardown.
    pub preserve: bool,
}

impl Default for ComposeConfig {
    fn default() -> Self {
        Self {
            up_timeout: DEFAULT_UP_TIMEOUT,
            down_timeout: DEFAULT_DOWN_TIMEOUT,
            preserve: false,
        }
    }
}

impl ComposeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            up_timeout: pkgtest_env::compose_up_timeout_secs()
                .map(Duration::from_secs)
                .unwrap_or(defaults.up_timeout),
            down_timeout: defaults.down_timeout,
            preserve: pkgtest_env::preserve_services(),
        }
    }
}

/// Runs the service described by a `docker-compose.yml` as its own compose
/// project.
pub struct DockerComposeServiceDeployer {
    compose_file: PathBuf,
    project_name: String,
    config: ComposeConfig,
    started: bool,
}

impl DockerComposeServiceDeployer {
    /// Bind a deployer to `compose_file`; the path is never re-resolved.
    pub fn new(compose_file: PathBuf, config: ComposeConfig) -> Result<Self, DeploymentError> {
        if !compose_file.is_file() {
            return Err(DeploymentError::MissingDefinition { path: compose_file });
        }

        let suffix = Uuid::new_v4().simple().to_string();
        Ok(Self {
            compose_file,
            project_name: format!("pkgtest-service-{}", &suffix[..8]),
            config,
            started: false,
        })
    }

    #[must_use]
    pub fn compose_file(&self) -> &Path {
        &self.compose_file
    }

    #[must_use]
    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    fn command_error(source: pkgtest_core::process::CommandError) -> DeploymentError {
        DeploymentError::Command {
            deployer: DEPLOYER_NAME,
            source,
        }
    }
}

#[async_trait]
impl ServiceDeployer for DockerComposeServiceDeployer {
    fn kind(&self) -> &'static str {
        DEPLOYER_NAME
    }

    async fn deploy(&mut self, ctx: ServiceContext) -> Result<ServiceContext, DeploymentError> {
        ensure_docker_available().await?;

        let logs_dir = ctx.logs_folder_local().to_path_buf();
        fs::create_dir_all(&logs_dir).map_err(|source| DeploymentError::Io {
            path: logs_dir.clone(),
            source,
        })?;

        info!(
            service = ctx.name(),
            project = %self.project_name,
            compose_file = %self.compose_file.display(),
            "compose deployment starting"
        );

        // A failed `up` can still leave containers behind.
        self.started = true;
        compose_up(
            &self.compose_file,
            &self.project_name,
            &logs_dir,
            adjust_timeout(self.config.up_timeout),
        )
        .await
        .map_err(Self::command_error)?;

        let config = compose_config_json(
            &self.compose_file,
            &self.project_name,
            &logs_dir,
            adjust_timeout(CONFIG_TIMEOUT),
        )
        .await
        .map_err(Self::command_error)?;

        let endpoint = service_endpoint(&config, ctx.name()).map_err(|err| {
            DeploymentError::InvalidDefinition {
                path: self.compose_file.clone(),
                reason: err.to_string(),
            }
        })?;

        info!(
            service = ctx.name(),
            hostname = %endpoint.hostname,
            ports = ?endpoint.ports,
            "compose service ready"
        );
        Ok(ctx.mark_started(endpoint.hostname, endpoint.ports))
    }

    async fn tear_down(&mut self) -> Result<(), DeploymentError> {
        if !self.started {
            info!(project = %self.project_name, "compose service never started; nothing to tear down");
            return Ok(());
        }

        ComposeCleanup::new(
            self.compose_file.clone(),
            self.project_name.clone(),
            self.config.preserve,
            adjust_timeout(self.config.down_timeout),
        )
        .run()
        .await
        .map_err(Self::command_error)?;

        self.started = false;
        Ok(())
    }
}
