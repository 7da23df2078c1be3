use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputsError {
    #[error("invalid `terraform output -json` document: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("terraform output `{name}` has an unexpected shape: {value}")]
    Shape { name: &'static str, value: Value },
}

/// Endpoint values a terraform definition may publish as outputs.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ServiceOutputs {
    pub hostname: Option<String>,
    pub ports: Vec<u16>,
}

#[derive(Deserialize)]
struct OutputValue {
    value: Value,
}

impl ServiceOutputs {
    /// Read the optional `hostname` (string) and `ports` (number list) outputs.
    pub fn parse(raw: &[u8]) -> Result<Self, OutputsError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }

        let outputs: BTreeMap<String, OutputValue> =
            serde_json::from_slice(raw).map_err(|source| OutputsError::Parse { source })?;

        let hostname = match outputs.get("hostname").map(|o| &o.value) {
            None | Some(Value::Null) => None,
            Some(Value::String(host)) => Some(host.clone()),
            Some(other) => {
                return Err(OutputsError::Shape {
                    name: "hostname",
                    value: other.clone(),
                });
            }
        };

        let ports = match outputs.get("ports").map(|o| &o.value) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .iter()
                .map(|item| item.as_u64().and_then(|port| u16::try_from(port).ok()))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(|| OutputsError::Shape {
                    name: "ports",
                    value: Value::Array(items.clone()),
                })?,
            Some(other) => {
                return Err(OutputsError::Shape {
                    name: "ports",
                    value: other.clone(),
                });
            }
        };

        Ok(Self { hostname, ports })
    }
}
