use std::{path::Path, time::Duration};

use pkgtest_core::process::{CommandError, run_command};
use tokio::process::Command;
use tracing::info;

/// Variable through which compose files mount the service logs folder.
pub const SERVICE_LOGS_DIR_ENV: &str = "SERVICE_LOGS_DIR";

fn compose_command(compose_file: &Path, project_name: &str) -> Command {
    let mut command = Command::new("docker");
    command
        .arg("compose")
        .arg("-f")
        .arg(compose_file)
        .arg("-p")
        .arg(project_name);
    command
}

/// `docker compose up -d --build --wait` for the whole project.
pub async fn compose_up(
    compose_file: &Path,
    project_name: &str,
    logs_dir: &Path,
    timeout: Duration,
) -> Result<(), CommandError> {
    let mut command = compose_command(compose_file, project_name);
    command
        .arg("up")
        .arg("-d")
        .arg("--build")
        .arg("--wait")
        .env(SERVICE_LOGS_DIR_ENV, logs_dir);

    info!(
        project = project_name,
        compose_file = %compose_file.display(),
        logs_dir = %logs_dir.display(),
        "starting compose service"
    );
    run_command(command, timeout, "docker compose up").await?;
    Ok(())
}

/// `docker compose down -v` removing containers and anonymous volumes.
pub async fn compose_down(
    compose_file: &Path,
    project_name: &str,
    timeout: Duration,
) -> Result<(), CommandError> {
    let mut command = compose_command(compose_file, project_name);
    command.arg("down").arg("-v").arg("--remove-orphans");

    info!(project = project_name, compose_file = %compose_file.display(), "stopping compose service");
    run_command(command, timeout, "docker compose down").await?;
    Ok(())
}

/// Normalised project definition as emitted by `docker compose config`.
pub async fn compose_config_json(
    compose_file: &Path,
    project_name: &str,
    logs_dir: &Path,
    timeout: Duration,
) -> Result<Vec<u8>, CommandError> {
    let mut command = compose_command(compose_file, project_name);
    command
        .arg("config")
        .arg("--format")
        .arg("json")
        .env(SERVICE_LOGS_DIR_ENV, logs_dir);

    let output = run_command(command, timeout, "docker compose config").await?;
    Ok(output.stdout)
}
