use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Where an event was raised: which event type, in which tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventContext {
    pub tenant_domain: String,
    pub event_uri: String,
}

impl EventContext {
    pub fn new(tenant_domain: impl Into<String>, event_uri: impl Into<String>) -> Self {
        Self {
            tenant_domain: tenant_domain.into(),
            event_uri: event_uri.into(),
        }
    }
}

/// Security Event Token payload delivered to subscribers.
///
/// `events` maps each event URI to its event-specific claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityEventTokenPayload {
    pub iss: String,
    pub jti: String,
    pub iat: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rci: Option<String>,
    #[serde(default)]
    pub events: BTreeMap<String, serde_json::Value>,
}

impl SecurityEventTokenPayload {
    /// Creates a payload with no events attached.
    pub fn new(iss: impl Into<String>, jti: impl Into<String>, iat: i64) -> Self {
        Self {
            iss: iss.into(),
            jti: jti.into(),
            iat,
            aud: None,
            txn: None,
            rci: None,
            events: BTreeMap::new(),
        }
    }

    pub fn with_audience(mut self, aud: impl Into<String>) -> Self {
        self.aud = Some(aud.into());
        self
    }

    pub fn with_transaction(mut self, txn: impl Into<String>) -> Self {
        self.txn = Some(txn.into());
        self
    }

    pub fn with_event(mut self, event_uri: impl Into<String>, claims: serde_json::Value) -> Self {
        self.events.insert(event_uri.into(), claims);
        self
    }
}
