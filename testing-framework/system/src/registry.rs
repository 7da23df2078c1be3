use pkgtest_core::{
    DeployerRegistry, ServiceDeployer,
    factory::{DefinitionLayout, RegistryError},
};
use pkgtest_runner_compose::{COMPOSE_FILE, DockerComposeServiceDeployer};
use pkgtest_runner_terraform::TerraformServiceDeployer;

use crate::config::RunnerConfig;

/// Registry with the built-in `docker` and `tf` deployers.
pub fn default_registry(config: &RunnerConfig) -> Result<DeployerRegistry, RegistryError> {
    let compose = config.compose.clone();
    let terraform = config.terraform.clone();

    DeployerRegistry::new()
        .register(
            pkgtest_runner_compose::DEPLOYER_NAME,
            DefinitionLayout::File(COMPOSE_FILE),
            move |compose_file| {
                DockerComposeServiceDeployer::new(compose_file, compose.clone())
                    .map(|deployer| Box::new(deployer) as Box<dyn ServiceDeployer>)
            },
        )?
        .register(
            pkgtest_runner_terraform::DEPLOYER_NAME,
            DefinitionLayout::Directory,
            move |definitions_dir| {
                TerraformServiceDeployer::new(definitions_dir, terraform.clone())
                    .map(|deployer| Box::new(deployer) as Box<dyn ServiceDeployer>)
            },
        )
}
