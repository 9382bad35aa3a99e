//! WebSub Hub event publisher.
//!
//! Publishes identity security events to an external WebSub Hub and manages
//! the hub topics they are published on. Topics are named
//! `<tenant domain>/<event URI>`.
//!
//! # Operations
//!
//! - **Publish**: fire-and-forget `hub.mode=publish` call carrying the
//!   Security Event Token payload as JSON
//! - **Register**: `hub.mode=register` management call for a topic
//! - **Deregister**: `hub.mode=deregister` management call for a topic
//!
//! The adapter talks to the hub through the [`HubClient`] trait;
//! [`HttpHubClient`] is the `reqwest`-backed implementation.

pub mod adapter;
pub mod client;
pub mod config;
pub mod constants;
pub mod error;

// Re-export primary types for convenience.
pub use adapter::WebSubHubAdapter;
pub use client::{HttpHubClient, HubClient};
pub use config::{AdapterConfiguration, ConfigError, ConfigurationProvider};
pub use constants::{ErrorMessage, HubMode, TopicOperation};
pub use error::{AdapterError, HubError};
