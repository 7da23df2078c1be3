pub mod elasticsearch;

use std::{
    fs,
    path::{Path, PathBuf},
};

use pkgtest_core::{factory::DEV_DEPLOY_DIR, package::MANIFEST_FILE};
use tempfile::TempDir;

pub use elasticsearch::FakeElasticsearch;
pub use fleet::FakeFleet;

/// Scratch integration package with one `access` logs data stream.
pub struct PackageTree {
    root: TempDir,
}

impl PackageTree {
    pub fn new(name: &str) -> anyhow::Result<Self> {
        let root = tempfile::tempdir()?;
        let tree = Self { root };
        tree.write(
            MANIFEST_FILE,
            &format!("name: {name}\ntitle: {name}\ntype: integration\nversion: 0.1.0\n"),
        )?;
        tree.write(
            &format!("data_stream/access/{MANIFEST_FILE}"),
            "title: Access logs\ntype: logs\n",
        )?;
        Ok(tree)
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.path()
    }

    #[must_use]
    pub fn data_stream(&self) -> PathBuf {
        self.root().join("data_stream/access")
    }

    #[must_use]
    pub fn package_deploy_dir(&self) -> PathBuf {
        self.root().join(DEV_DEPLOY_DIR)
    }

    #[must_use]
    pub fn data_stream_deploy_dir(&self) -> PathBuf {
        self.data_stream().join(DEV_DEPLOY_DIR)
    }

    /// Write `contents` at `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn mkdir(&self, relative: &str) -> anyhow::Result<PathBuf> {
        let path = self.root().join(relative);
        fs::create_dir_all(&path)?;
        Ok(path)
    }
}
