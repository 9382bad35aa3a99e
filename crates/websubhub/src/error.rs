//! Error types for the WebSub Hub adapter.

use crate::constants::ErrorMessage;

/// Failure talking to the hub.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("hub returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("unexpected hub response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no async runtime available to dispatch the call")]
    NoRuntime,
}

/// Errors reported by [`WebSubHubAdapter`](crate::WebSubHubAdapter).
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// Configuration problem the operator has to fix.
    #[error("{}: {}", .error.code(), .error.message())]
    Client { error: ErrorMessage },

    /// Hub call failed for the given event type and tenant.
    #[error(
        "{}: {} (event: {event_uri}, tenant: {tenant_domain})",
        .error.code(),
        .error.message()
    )]
    Server {
        error: ErrorMessage,
        event_uri: String,
        tenant_domain: String,
        #[source]
        source: HubError,
    },
}

impl AdapterError {
    pub fn client(error: ErrorMessage) -> Self {
        Self::Client { error }
    }

    pub fn server(
        error: ErrorMessage,
        source: HubError,
        event_uri: &str,
        tenant_domain: &str,
    ) -> Self {
        Self::Server {
            error,
            event_uri: event_uri.to_string(),
            tenant_domain: tenant_domain.to_string(),
            source,
        }
    }

    /// Catalogue entry behind this error.
    pub fn error_message(&self) -> ErrorMessage {
        match self {
            Self::Client { error } | Self::Server { error, .. } => *error,
        }
    }

    pub fn code(&self) -> &'static str {
        self.error_message().code()
    }

    pub fn description(&self) -> &'static str {
        self.error_message().description()
    }

    pub fn is_client(&self) -> bool {
        matches!(self, Self::Client { .. })
    }
}
