mod config;
mod events;
mod registry;

pub use config::{DEFAULT_LOGS_DIR, RunnerConfig};
pub use events::DataStreamEvents;
pub use registry::default_registry;
pub use system_test::{
    DynError, EventSource, PolicyAssignment, SystemTest, SystemTestError, SystemTestOutcome,
};
use tracing_subscriber::{EnvFilter, fmt};

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = pkgtest_env::rust_log()
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
