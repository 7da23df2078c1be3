use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;
use thiserror::Error;

/// Name of both the package and the data stream manifest files.
pub const MANIFEST_FILE: &str = "manifest.yml";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("reading manifest {path} failed: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("parsing manifest {path} failed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub version: String,
}

impl PackageManifest {
    fn is_package(&self) -> bool {
        self.kind == "integration" && !self.version.is_empty()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DataStreamManifest {
    /// Taken from the data stream directory name, not the file.
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, rename = "type")]
    pub kind: String,
}

impl DataStreamManifest {
    fn is_data_stream(&self) -> bool {
        !self.title.is_empty() && matches!(self.kind.as_str(), "logs" | "metrics")
    }
}

fn read_yaml<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ManifestError> {
    let raw = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_yaml::from_str(&raw).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub fn read_package_manifest(path: &Path) -> Result<PackageManifest, ManifestError> {
    read_yaml(path)
}

pub fn read_data_stream_manifest(path: &Path) -> Result<DataStreamManifest, ManifestError> {
    let mut manifest: DataStreamManifest = read_yaml(path)?;
    manifest.name = path
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(manifest)
}

fn find_root_with<F>(start: &Path, accept: F) -> Result<Option<PathBuf>, ManifestError>
where
    F: Fn(&Path) -> Result<bool, ManifestError>,
{
    for dir in start.ancestors() {
        let manifest = dir.join(MANIFEST_FILE);
        if manifest.is_file() && accept(&manifest)? {
            return Ok(Some(dir.to_path_buf()));
        }
    }
    Ok(None)
}

/// Walk up from `start` to the directory holding an integration package manifest.
pub fn find_package_root(start: &Path) -> Result<Option<PathBuf>, ManifestError> {
    find_root_with(start, |path| Ok(read_package_manifest(path)?.is_package()))
}

/// Walk up from `start` to the directory holding a logs/metrics data stream manifest.
pub fn find_data_stream_root(start: &Path) -> Result<Option<PathBuf>, ManifestError> {
    find_root_with(start, |path| {
        Ok(read_data_stream_manifest(path)?.is_data_stream())
    })
}
