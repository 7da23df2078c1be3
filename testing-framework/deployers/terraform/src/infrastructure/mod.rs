pub mod environment;
pub mod executor;
pub mod outputs;
