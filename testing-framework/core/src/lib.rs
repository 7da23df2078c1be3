pub mod deployment;
pub mod factory;
pub mod fixture;
pub mod package;
pub mod process;
pub mod wait;

use std::{ops::Mul as _, sync::LazyLock, time::Duration};

pub use deployment::{ContextError, DeploymentError, ServiceContext, ServiceDeployer};
pub use factory::{DeployerRegistry, FactoryError, FactoryOptions};
pub use fixture::{FixtureError, FixtureMode, ResultComparator, TestResult};
pub use wait::{WaitError, WaitPolicy, wait_until, wait_until_cancelled};

static IS_SLOW_TEST_ENV: LazyLock<bool> = LazyLock::new(pkgtest_env::slow_test_env);

/// In slow test environments like shared CI runners, use 2x timeout.
#[must_use]
pub fn adjust_timeout(d: Duration) -> Duration {
    if *IS_SLOW_TEST_ENV { d.mul(2) } else { d }
}
