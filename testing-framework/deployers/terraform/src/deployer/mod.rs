mod workspace;

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use async_trait::async_trait;
use pkgtest_core::{DeploymentError, ServiceContext, ServiceDeployer, adjust_timeout, process::CommandError};
use tempfile::TempDir;
use tracing::{info, warn};

use crate::infrastructure::{
    environment::{AwsCredentials, build_executor_environment},
    executor::TerraformExecutor,
    outputs::ServiceOutputs,
};

/// Directory name under `_dev/deploy` selecting this deployer.
pub const DEPLOYER_NAME: &str = "tf";

const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Settings for the terraform deployer, read once at the process boundary.
#[derive(Clone, Debug)]
pub struct TerraformConfig {
    pub credentials: AwsCredentials,
    /// Variables such as `PATH` kept for the otherwise cleared executor env.
    pub passthrough: Vec<(String, String)>,
    pub command_timeout: Duration,
    /// Leave provisioned resources (and the scratch workspace) in place.
    pub preserve: bool,
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            credentials: AwsCredentials::default(),
            passthrough: Vec::new(),
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            preserve: false,
        }
    }
}

impl TerraformConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            credentials: AwsCredentials::from_env(),
            passthrough: pkgtest_env::executor_passthrough(),
            command_timeout: pkgtest_env::terraform_timeout_secs()
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_COMMAND_TIMEOUT),
            preserve: pkgtest_env::preserve_services(),
        }
    }
}

struct Provisioned {
    workspace: TempDir,
    executor: TerraformExecutor,
}

/// Provisions the service described by a terraform definitions directory.
pub struct TerraformServiceDeployer {
    definitions_dir: PathBuf,
    config: TerraformConfig,
    provisioned: Option<Provisioned>,
}

impl TerraformServiceDeployer {
    /// Bind a deployer to `definitions_dir` for its whole lifetime.
    pub fn new(definitions_dir: PathBuf, config: TerraformConfig) -> Result<Self, DeploymentError> {
        if !definitions_dir.is_dir() {
            return Err(DeploymentError::MissingDefinition {
                path: definitions_dir,
            });
        }
        Ok(Self {
            definitions_dir,
            config,
            provisioned: None,
        })
    }

    #[must_use]
    pub fn definitions_dir(&self) -> &Path {
        &self.definitions_dir
    }

    fn command_error(source: CommandError) -> DeploymentError {
        DeploymentError::Command {
            deployer: DEPLOYER_NAME,
            source,
        }
    }
}

#[async_trait]
impl ServiceDeployer for TerraformServiceDeployer {
    fn kind(&self) -> &'static str {
        DEPLOYER_NAME
    }

    async fn deploy(&mut self, ctx: ServiceContext) -> Result<ServiceContext, DeploymentError> {
        // Dropping the current workspace would lose the state `destroy` needs.
        if self.provisioned.is_some() {
            return Err(DeploymentError::AlreadyDeployed {
                deployer: DEPLOYER_NAME,
            });
        }

        let logs_dir = ctx.logs_folder_local().to_path_buf();
        fs::create_dir_all(&logs_dir).map_err(|source| DeploymentError::Io {
            path: logs_dir.clone(),
            source,
        })?;

        let workspace = workspace::create(&self.definitions_dir)?;

        let mut env = build_executor_environment(
            &self.config.credentials,
            &logs_dir,
            &self.definitions_dir,
        );
        for (key, value) in &self.config.passthrough {
            env.entry(key.clone()).or_insert_with(|| value.clone());
        }

        info!(
            service = ctx.name(),
            definitions = %self.definitions_dir.display(),
            workspace = %workspace.path().display(),
            forwarded = ?env.keys().collect::<Vec<_>>(),
            "terraform deployment starting"
        );

        let executor = TerraformExecutor::new(
            workspace.path().to_path_buf(),
            env,
            adjust_timeout(self.config.command_timeout),
        );
        let provisioned = self.provisioned.insert(Provisioned {
            workspace,
            executor,
        });

        provisioned
            .executor
            .init()
            .await
            .map_err(Self::command_error)?;
        provisioned
            .executor
            .apply()
            .await
            .map_err(Self::command_error)?;

        let raw = provisioned
            .executor
            .output_json()
            .await
            .map_err(Self::command_error)?;
        let outputs = ServiceOutputs::parse(&raw).map_err(|err| DeploymentError::InvalidDefinition {
            path: self.definitions_dir.clone(),
            reason: err.to_string(),
        })?;

        let hostname = outputs.hostname.unwrap_or_else(|| ctx.name().to_owned());
        info!(
            service = ctx.name(),
            hostname = %hostname,
            ports = ?outputs.ports,
            "terraform service ready"
        );
        Ok(ctx.mark_started(hostname, outputs.ports))
    }

    async fn tear_down(&mut self) -> Result<(), DeploymentError> {
        let Some(provisioned) = self.provisioned.take() else {
            info!(definitions = %self.definitions_dir.display(), "terraform service never provisioned; nothing to tear down");
            return Ok(());
        };

        if self.config.preserve {
            let kept = provisioned.workspace.keep();
            info!(workspace = %kept.display(), "preserve flag set; skipping terraform destroy");
            return Ok(());
        }

        if let Err(err) = provisioned.executor.destroy().await {
            warn!(
                workspace = %provisioned.executor.workdir().display(),
                error = %err,
                "terraform destroy failed; keeping workspace for inspection"
            );
            let _ = provisioned.workspace.keep();
            return Err(Self::command_error(err));
        }
        Ok(())
    }
}
