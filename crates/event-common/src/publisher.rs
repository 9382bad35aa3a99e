//! Event publisher capability.

use crate::types::{EventContext, SecurityEventTokenPayload};

/// Delivers security events to an external broker.
///
/// Upstream event dispatch holds publishers behind this trait and does not
/// know which transport an adapter uses.
pub trait EventPublisher: Send + Sync {
    /// Error type reported by the adapter.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Publishes `payload` raised in `context`.
    ///
    /// Adapters may deliver asynchronously; an `Ok` return only means the
    /// event was handed off.
    fn publish(
        &self,
        payload: &SecurityEventTokenPayload,
        context: &EventContext,
    ) -> Result<(), Self::Error>;
}
