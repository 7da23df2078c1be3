use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    time::Duration,
};

use pkgtest_core::process::{CommandError, run_command};
use tokio::process::Command;
use tracing::{debug, info};

/// Runs `terraform` inside a scratch copy of the definitions with a fully
/// assembled environment.
pub struct TerraformExecutor {
    workdir: PathBuf,
    env: BTreeMap<String, String>,
    timeout: Duration,
}

impl TerraformExecutor {
    pub fn new(workdir: PathBuf, env: BTreeMap<String, String>, timeout: Duration) -> Self {
        Self {
            workdir,
            env,
            timeout,
        }
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new("terraform");
        cmd.arg(format!("-chdir={}", self.workdir.display()))
            .args(args)
            .env_clear()
            .envs(&self.env)
            .env("TF_IN_AUTOMATION", "1");
        cmd
    }

    async fn run(&self, args: &[&str]) -> Result<Vec<u8>, CommandError> {
        let description = format!("terraform {}", args.join(" "));
        debug!(command = %description, workdir = %self.workdir.display(), "prepared terraform command");
        let output = run_command(self.command(args), self.timeout, &description).await?;
        Ok(output.stdout)
    }

    pub async fn init(&self) -> Result<(), CommandError> {
        info!(workdir = %self.workdir.display(), "terraform init");
        self.run(&["init", "-input=false", "-no-color"]).await.map(|_| ())
    }

    pub async fn apply(&self) -> Result<(), CommandError> {
        info!(workdir = %self.workdir.display(), "terraform apply");
        self.run(&["apply", "-auto-approve", "-input=false", "-no-color"])
            .await
            .map(|_| ())
    }

    pub async fn output_json(&self) -> Result<Vec<u8>, CommandError> {
        self.run(&["output", "-json", "-no-color"]).await
    }

    pub async fn destroy(&self) -> Result<(), CommandError> {
        info!(workdir = %self.workdir.display(), "terraform destroy");
        self.run(&["destroy", "-auto-approve", "-input=false", "-no-color"])
            .await
            .map(|_| ())
    }
}
