//! Shared types for identity event publishers.
//!
//! Publisher adapters (WebSub Hub, and anything else that delivers
//! security events to an external broker) implement [`EventPublisher`]
//! and receive a [`SecurityEventTokenPayload`] together with the
//! [`EventContext`] it was raised in.

pub mod publisher;
pub mod types;

// Re-export primary types for convenience.
pub use publisher::EventPublisher;
pub use types::{EventContext, SecurityEventTokenPayload};
