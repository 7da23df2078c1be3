mod deployer;
mod infrastructure;

pub use deployer::{DEPLOYER_NAME, TerraformConfig, TerraformServiceDeployer};
pub use infrastructure::{
    environment::{
        AWS_ACCESS_KEY_ID, AWS_PROFILE, AWS_REGION, AWS_SECRET_ACCESS_KEY, AwsCredentials,
        SERVICE_LOGS_DIR_ENV, TF_DIR_ENV, build_executor_environment,
    },
    outputs::{OutputsError, ServiceOutputs},
};
