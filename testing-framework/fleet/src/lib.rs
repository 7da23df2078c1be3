mod agent;
mod assignment;
mod client;

pub use agent::{Agent, HostMetadata, LocalMetadata, Policy};
pub use assignment::{AgentSource, AssignmentError, wait_until_policy_assigned};
pub use client::{DEFAULT_KIBANA_HOST, FleetClient, FleetConfig, FleetError};
