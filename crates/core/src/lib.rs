//! Purging of old builds and step logs from a Drone CI server.

pub mod client;
pub mod config;
pub mod purge;
pub mod types;

pub use client::{ApiError, DroneApi, DroneClient};
pub use config::{ConfigError, PurgeConfig};
pub use purge::{PurgeError, PurgeReport};
