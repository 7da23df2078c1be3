use std::{fs, io, path::Path};

use pkgtest_core::DeploymentError;
use tempfile::TempDir;
use tracing::info;

/// Copy the definitions into a fresh scratch directory so terraform state and
/// provider caches never land inside the package.
pub(super) fn create(definitions_dir: &Path) -> Result<TempDir, DeploymentError> {
    let temp = tempfile::Builder::new()
        .prefix("pkgtest-tf-")
        .tempdir()
        .map_err(|source| DeploymentError::Io {
            path: std::env::temp_dir(),
            source,
        })?;

    copy_dir_recursive(definitions_dir, temp.path()).map_err(|source| DeploymentError::Io {
        path: definitions_dir.to_path_buf(),
        source,
    })?;

    info!(root = %temp.path().display(), "terraform workspace created");
    Ok(temp)
}

fn copy_dir_recursive(source: &Path, target: &Path) -> io::Result<()> {
    fs::create_dir_all(target)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let name = entry.file_name();
        // Local state from a manual run would shadow the fresh deployment.
        if name == ".terraform" || name.to_string_lossy().starts_with("terraform.tfstate") {
            continue;
        }
        let dest = target.join(&name);
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &dest)?;
        } else {
            fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
