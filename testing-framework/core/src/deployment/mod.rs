mod context;
mod deployer;

pub use context::{ContextError, ServiceContext};
pub use deployer::{DeploymentError, ServiceDeployer, tear_down_quietly};
