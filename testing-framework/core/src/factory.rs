use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, info};

use crate::deployment::{DeploymentError, ServiceDeployer};

/// Location of service deploy definitions, relative to a data stream or
/// package root.
pub const DEV_DEPLOY_DIR: &str = "_dev/deploy";

type Constructor =
    Box<dyn Fn(PathBuf) -> Result<Box<dyn ServiceDeployer>, DeploymentError> + Send + Sync>;

/// Where a variant expects its definition inside its `_dev/deploy/<name>` dir.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DefinitionLayout {
    /// A single file, e.g. `docker-compose.yml`.
    File(&'static str),
    /// The variant directory itself.
    Directory,
}

impl DefinitionLayout {
    fn resolve(self, variant_dir: &Path) -> PathBuf {
        match self {
            Self::File(file) => variant_dir.join(file),
            Self::Directory => variant_dir.to_path_buf(),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FactoryErrorKind {
    NotFound,
    Configuration,
    Unsupported,
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("\"_dev/deploy\" directory doesn't exist (searched: {searched:?})")]
    DeployDirNotFound { searched: Vec<PathBuf> },
    #[error("failed to inspect {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no service deployer defined in {dir}")]
    NoDeployer { dir: PathBuf },
    #[error("expected to find only one service deployer in {dir}, found {entries:?}")]
    MultipleDeployers { dir: PathBuf, entries: Vec<String> },
    #[error("\"{entry}\" is expected to be a folder in {dir}")]
    NotADirectory { dir: PathBuf, entry: String },
    #[error("unsupported service deployer (name: {name}, known: {known:?})")]
    UnsupportedDeployer {
        name: String,
        known: Vec<&'static str>,
    },
    #[error("service deployer `{name}` is missing its definition at {path}")]
    MissingDefinition { name: String, path: PathBuf },
    #[error("failed to construct service deployer `{name}`: {source}")]
    Construct {
        name: String,
        #[source]
        source: DeploymentError,
    },
}

impl FactoryError {
    #[must_use]
    pub const fn kind(&self) -> FactoryErrorKind {
        match self {
            Self::DeployDirNotFound { .. } => FactoryErrorKind::NotFound,
            Self::Io { .. }
            | Self::NoDeployer { .. }
            | Self::MultipleDeployers { .. }
            | Self::NotADirectory { .. }
            | Self::Construct { .. } => FactoryErrorKind::Configuration,
            Self::UnsupportedDeployer { .. } | Self::MissingDefinition { .. } => {
                FactoryErrorKind::Unsupported
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("service deployer `{name}` is registered twice")]
    Duplicate { name: &'static str },
}

/// Roots searched for a `_dev/deploy` directory.
#[derive(Clone, Debug)]
pub struct FactoryOptions {
    pub package_root: PathBuf,
    pub data_stream_root: Option<PathBuf>,
}

impl FactoryOptions {
    #[must_use]
    pub fn new(package_root: impl Into<PathBuf>) -> Self {
        Self {
            package_root: package_root.into(),
            data_stream_root: None,
        }
    }

    #[must_use]
    pub fn with_data_stream_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.data_stream_root = Some(root.into());
        self
    }
}

struct Registration {
    layout: DefinitionLayout,
    constructor: Constructor,
}

/// Maps `_dev/deploy/<name>` directory names to deployer constructors.
#[derive(Default)]
pub struct DeployerRegistry {
    entries: BTreeMap<&'static str, Registration>,
}

impl fmt::Debug for DeployerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeployerRegistry")
            .field("deployers", &self.names())
            .finish()
    }
}

impl DeployerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a variant; names must be unique.
    pub fn register<F>(
        mut self,
        name: &'static str,
        layout: DefinitionLayout,
        constructor: F,
    ) -> Result<Self, RegistryError>
    where
        F: Fn(PathBuf) -> Result<Box<dyn ServiceDeployer>, DeploymentError>
            + Send
            + Sync
            + 'static,
    {
        if self.entries.contains_key(name) {
            return Err(RegistryError::Duplicate { name });
        }
        self.entries.insert(
            name,
            Registration {
                layout,
                constructor: Box::new(constructor),
            },
        );
        Ok(self)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.entries.keys().copied().collect()
    }

    /// Choose the deployer declared for a data stream (or its package).
    pub fn select(
        &self,
        options: &FactoryOptions,
    ) -> Result<Box<dyn ServiceDeployer>, FactoryError> {
        let deploy_dir = find_dev_deploy_dir(options)?;
        let name = find_service_deployer(&deploy_dir)?;

        let registration =
            self.entries
                .get(name.as_str())
                .ok_or_else(|| FactoryError::UnsupportedDeployer {
                    name: name.clone(),
                    known: self.names(),
                })?;

        let definition = registration.layout.resolve(&deploy_dir.join(&name));
        if !definition.exists() {
            return Err(FactoryError::MissingDefinition {
                name,
                path: definition,
            });
        }

        info!(
            deployer = %name,
            definition = %definition.display(),
            "service deployer selected"
        );

        (registration.constructor)(definition)
            .map_err(|source| FactoryError::Construct { name, source })
    }
}

fn find_dev_deploy_dir(options: &FactoryOptions) -> Result<PathBuf, FactoryError> {
    let candidates = options
        .data_stream_root
        .iter()
        .chain(std::iter::once(&options.package_root))
        .map(|root| root.join(DEV_DEPLOY_DIR))
        .collect::<Vec<_>>();

    for candidate in &candidates {
        match fs::metadata(candidate) {
            Ok(_) => {
                debug!(path = %candidate.display(), "found deploy definitions directory");
                return Ok(candidate.clone());
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(source) => {
                return Err(FactoryError::Io {
                    path: candidate.clone(),
                    source,
                });
            }
        }
    }

    Err(FactoryError::DeployDirNotFound {
        searched: candidates,
    })
}

fn find_service_deployer(deploy_dir: &Path) -> Result<String, FactoryError> {
    let io_err = |source| FactoryError::Io {
        path: deploy_dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(deploy_dir)
        .map_err(io_err)?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    let entry = match entries.as_slice() {
        [] => {
            return Err(FactoryError::NoDeployer {
                dir: deploy_dir.to_path_buf(),
            });
        }
        [entry] => entry,
        many => {
            return Err(FactoryError::MultipleDeployers {
                dir: deploy_dir.to_path_buf(),
                entries: many
                    .iter()
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect(),
            });
        }
    };

    let name = entry.file_name().to_string_lossy().into_owned();
    if !entry.file_type().map_err(io_err)?.is_dir() {
        return Err(FactoryError::NotADirectory {
            dir: deploy_dir.to_path_buf(),
            entry: name,
        });
    }
    Ok(name)
}
