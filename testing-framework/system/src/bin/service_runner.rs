use std::{env, path::Path, process};

use anyhow::{Context as _, Result};
use pkgtest_core::{
    FactoryOptions, ServiceContext,
    deployment::tear_down_quietly,
    package::{MANIFEST_FILE, find_data_stream_root, find_package_root, read_package_manifest},
};
use pkgtest_system::{RunnerConfig, default_registry, init_tracing};
use tracing::{info, warn};

#[tokio::main]
async fn main() {
    init_tracing();

    if let Err(err) = run().await {
        warn!("service runner failed: {err:#}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = RunnerConfig::from_env();
    let options = factory_options()?;
    let service = service_name(&options.package_root)?;

    info!(
        service = %service,
        package = %options.package_root.display(),
        data_stream = ?options.data_stream_root,
        "starting service runner"
    );

    let registry = default_registry(&config).context("building deployer registry")?;
    let mut deployer = registry
        .select(&options)
        .context("selecting service deployer")?;

    let ctx = ServiceContext::new(service.clone(), config.service_logs_dir(&service));
    let ctx = match deployer.deploy(ctx).await {
        Ok(ctx) => ctx,
        Err(err) => {
            tear_down_quietly(deployer.as_mut()).await;
            return Err(err).with_context(|| format!("deploying service `{service}`"));
        }
    };

    for (key, value) in ctx.template_vars()? {
        info!(variable = key, value = %value, "service context");
    }
    info!("service is running; press Ctrl-C to tear it down");

    let waited = tokio::signal::ctrl_c().await;
    info!("tearing down service");
    deployer
        .tear_down()
        .await
        .with_context(|| format!("tearing down service `{service}`"))?;
    waited.context("listening for Ctrl-C")
}

fn factory_options() -> Result<FactoryOptions> {
    let cwd = env::current_dir().context("reading working directory")?;

    let data_stream_root = match pkgtest_env::data_stream_root() {
        Some(root) => Some(root),
        None => find_data_stream_root(&cwd)?,
    };
    let package_root = match pkgtest_env::package_root() {
        Some(root) => root,
        None => {
            let start = data_stream_root.as_deref().unwrap_or(&cwd);
            find_package_root(start)?
                .with_context(|| format!("no package found above {}", start.display()))?
        }
    };

    let options = FactoryOptions::new(package_root);
    Ok(match data_stream_root {
        Some(root) => options.with_data_stream_root(root),
        None => options,
    })
}

fn service_name(package_root: &Path) -> Result<String> {
    let manifest = read_package_manifest(&package_root.join(MANIFEST_FILE))?;
    if !manifest.name.is_empty() {
        return Ok(manifest.name);
    }
    package_root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("cannot name the package at {}", package_root.display()))
}
