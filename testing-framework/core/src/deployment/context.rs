use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("service `{name}` has not been started; hostname and ports are not known yet")]
    NotStarted { name: String },
}

/// Describes a service instance as seen by the agent that consumes it.
///
/// The context starts out with only a name and a local logs folder. A
/// deployer fills in the network identity once the service is up; until then
/// the context must not be used to render consuming configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceContext {
    name: String,
    hostname: Option<String>,
    ports: Vec<u16>,
    logs_folder_local: PathBuf,
}

impl ServiceContext {
    #[must_use]
    pub fn new(name: impl Into<String>, logs_folder_local: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            hostname: None,
            ports: Vec::new(),
            logs_folder_local: logs_folder_local.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address of the service as reachable from the agent, not from this host.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    #[must_use]
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    #[must_use]
    pub fn logs_folder_local(&self) -> &Path {
        &self.logs_folder_local
    }

    #[must_use]
    pub const fn is_started(&self) -> bool {
        self.hostname.is_some()
    }

    /// Record the network identity reported by a deployer once the service runs.
    #[must_use]
    pub fn mark_started(mut self, hostname: impl Into<String>, ports: Vec<u16>) -> Self {
        self.hostname = Some(hostname.into());
        self.ports = ports;
        self
    }

    /// Values exposed to templated test configuration, e.g. `{{Hostname}}`.
    pub fn template_vars(&self) -> Result<BTreeMap<&'static str, String>, ContextError> {
        let hostname = self.hostname.as_ref().ok_or_else(|| ContextError::NotStarted {
            name: self.name.clone(),
        })?;

        let mut vars = BTreeMap::new();
        vars.insert("Name", self.name.clone());
        vars.insert("Hostname", hostname.clone());
        vars.insert(
            "Port",
            self.ports.first().map(u16::to_string).unwrap_or_default(),
        );
        vars.insert(
            "Ports",
            self.ports
                .iter()
                .map(u16::to_string)
                .collect::<Vec<_>>()
                .join(","),
        );
        vars.insert(
            "Logs.Folder.Local",
            self.logs_folder_local.display().to_string(),
        );
        Ok(vars)
    }
}
