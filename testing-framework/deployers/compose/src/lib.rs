mod deployer;
mod descriptor;
mod docker;
mod lifecycle;

pub use deployer::{COMPOSE_FILE, ComposeConfig, DEPLOYER_NAME, DockerComposeServiceDeployer};
pub use descriptor::{DescriptorError, ServiceEndpoint};
pub use docker::ensure_docker_available;
