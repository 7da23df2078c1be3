use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid `docker compose config` output: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
    #[error("service `{service}` is not defined (services: {known:?})")]
    UnknownService { service: String, known: Vec<String> },
    #[error("service `{service}` declares an unreadable port `{raw}`")]
    InvalidPort { service: String, raw: String },
}

/// Endpoint of a compose service as seen from other containers on the
/// project network.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ServiceEndpoint {
    pub hostname: String,
    pub ports: Vec<u16>,
}

#[derive(Deserialize)]
struct ComposeProject {
    #[serde(default)]
    services: BTreeMap<String, ComposeService>,
}

#[derive(Deserialize)]
struct ComposeService {
    #[serde(default)]
    expose: Vec<Value>,
    #[serde(default)]
    ports: Vec<PublishedPort>,
}

#[derive(Deserialize)]
struct PublishedPort {
    target: u16,
}

/// Resolve `service` from the normalised project JSON.
///
/// The hostname is the compose service name; ports are the `expose` entries
/// followed by the published ports' container targets, without duplicates.
pub fn service_endpoint(config: &[u8], service: &str) -> Result<ServiceEndpoint, DescriptorError> {
    let project: ComposeProject =
        serde_json::from_slice(config).map_err(|source| DescriptorError::Parse { source })?;

    let definition =
        project
            .services
            .get(service)
            .ok_or_else(|| DescriptorError::UnknownService {
                service: service.to_owned(),
                known: project.services.keys().cloned().collect(),
            })?;

    let mut ports = Vec::new();
    for raw in &definition.expose {
        for port in parse_expose(raw).ok_or_else(|| DescriptorError::InvalidPort {
            service: service.to_owned(),
            raw: raw.to_string(),
        })? {
            push_unique(&mut ports, port);
        }
    }
    for published in &definition.ports {
        push_unique(&mut ports, published.target);
    }

    Ok(ServiceEndpoint {
        hostname: service.to_owned(),
        ports,
    })
}

fn push_unique(ports: &mut Vec<u16>, port: u16) {
    if !ports.contains(&port) {
        ports.push(port);
    }
}

// "80", 80, "80/tcp" or "8000-8002/udp"
fn parse_expose(raw: &Value) -> Option<Vec<u16>> {
    let text = match raw {
        Value::Number(number) => return number.as_u64()?.try_into().ok().map(|p| vec![p]),
        Value::String(text) => text,
        _ => return None,
    };

    let range = text.split('/').next()?;
    match range.split_once('-') {
        Some((start, end)) => {
            let start = start.trim().parse::<u16>().ok()?;
            let end = end.trim().parse::<u16>().ok()?;
            (start <= end).then(|| (start..=end).collect())
        }
        None => range.trim().parse::<u16>().ok().map(|p| vec![p]),
    }
}
