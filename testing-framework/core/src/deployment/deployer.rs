use std::{io, path::PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use super::ServiceContext;
use crate::process::CommandError;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error("{deployer} deployer: {source}")]
    Command {
        deployer: &'static str,
        #[source]
        source: CommandError,
    },
    #[error("{deployer} deployer is unavailable: {reason}")]
    Unavailable {
        deployer: &'static str,
        reason: String,
    },
    #[error("{deployer} deployer already has a deployment; tear it down first")]
    AlreadyDeployed { deployer: &'static str },
    #[error("service definition not found at {path}")]
    MissingDefinition { path: PathBuf },
    #[error("invalid service definition at {path}: {reason}")]
    InvalidDefinition { path: PathBuf, reason: String },
    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Backend able to stand up and tear down the service a data stream is tested
/// against.
///
/// An instance is bound to one definition path for its whole lifetime and is
/// not meant to be shared across concurrently running test cases.
#[async_trait]
pub trait ServiceDeployer: Send + Sync {
    /// Variant name, matching the directory under `_dev/deploy`.
    fn kind(&self) -> &'static str;

    /// Start the service and return the context populated with its endpoint.
    async fn deploy(&mut self, ctx: ServiceContext) -> Result<ServiceContext, DeploymentError>;

    /// Stop and remove the service. Safe to call after a partial `deploy`.
    async fn tear_down(&mut self) -> Result<(), DeploymentError>;
}

/// Tear down a deployment, logging instead of propagating failures so that
/// the remaining cleanup can continue.
pub async fn tear_down_quietly(deployer: &mut dyn ServiceDeployer) {
    let kind = deployer.kind();
    match deployer.tear_down().await {
        Ok(()) => info!(deployer = kind, "service torn down"),
        Err(err) => warn!(deployer = kind, error = %err, "service teardown failed"),
    }
}
