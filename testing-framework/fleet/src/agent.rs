use serde::{Deserialize, Deserializer, Serialize};

/// An agent enrolled with Fleet, as reported by the agents API.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Agent {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_id: String,
    /// Fleet reports `null` while a reassignment is still rolling out.
    #[serde(default, deserialize_with = "null_as_default")]
    pub policy_revision: u64,
    #[serde(default)]
    pub local_metadata: LocalMetadata,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct LocalMetadata {
    #[serde(default)]
    pub host: HostMetadata,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct HostMetadata {
    #[serde(default)]
    pub name: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// A versioned agent policy.
///
/// The identity survives edits; every edit bumps `revision`.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Policy {
    pub id: String,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

impl Agent {
    #[must_use]
    pub fn hostname(&self) -> &str {
        &self.local_metadata.host.name
    }

    /// True once the agent runs exactly this revision of `policy`.
    #[must_use]
    pub fn has_policy(&self, policy: &Policy) -> bool {
        self.policy_id == policy.id && self.policy_revision == policy.revision
    }
}
