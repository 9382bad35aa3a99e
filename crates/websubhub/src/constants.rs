//! Hub wire constants and the adapter error catalogue.

use std::fmt;

/// Query parameter carrying the hub mode.
pub const HUB_MODE: &str = "hub.mode";

/// Query parameter carrying the topic name.
pub const HUB_TOPIC: &str = "hub.topic";

/// Separator between tenant domain and event URI in a topic name.
pub const TOPIC_SEPARATOR: &str = "/";

/// Body the hub returns when a management call was accepted.
pub const RESPONSE_FOR_SUCCESSFUL_OPERATION: &str = "hub.mode=accepted";

/// Header carrying the per-request correlation id.
pub const CORRELATION_ID_REQUEST_HEADER: &str = "activityid";

pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Value of the `hub.mode` query parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HubMode {
    Publish,
    Register,
    Deregister,
}

impl HubMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Publish => "publish",
            Self::Register => "register",
            Self::Deregister => "deregister",
        }
    }
}

impl fmt::Display for HubMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic lifecycle call sent to the hub management endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicOperation {
    Register,
    Deregister,
}

impl From<TopicOperation> for HubMode {
    fn from(op: TopicOperation) -> Self {
        match op {
            TopicOperation::Register => HubMode::Register,
            TopicOperation::Deregister => HubMode::Deregister,
        }
    }
}

impl fmt::Display for TopicOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        HubMode::from(*self).fmt(f)
    }
}

/// Error catalogue: stable code, short message, operator-facing description.
///
/// `60xxx` codes are client (configuration) errors, `65xxx` are server errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorMessage {
    WebSubBaseUrlNotConfigured,
    ErrorPublishingEvent,
    ErrorRegisteringHubTopic,
    ErrorDeregisteringHubTopic,
}

impl ErrorMessage {
    pub fn code(self) -> &'static str {
        match self {
            Self::WebSubBaseUrlNotConfigured => "WEBSUB-60001",
            Self::ErrorPublishingEvent => "WEBSUB-65001",
            Self::ErrorRegisteringHubTopic => "WEBSUB-65002",
            Self::ErrorDeregisteringHubTopic => "WEBSUB-65003",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Self::WebSubBaseUrlNotConfigured => "WebSub Hub base URL is not configured",
            Self::ErrorPublishingEvent => "Error publishing event to the WebSub Hub",
            Self::ErrorRegisteringHubTopic => "Error registering WebSub Hub topic",
            Self::ErrorDeregisteringHubTopic => "Error deregistering WebSub Hub topic",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::WebSubBaseUrlNotConfigured => {
                "Set web_sub_hub_base_url in the adapter configuration."
            }
            Self::ErrorPublishingEvent => "Server error encountered while publishing the event.",
            Self::ErrorRegisteringHubTopic => {
                "Server error encountered while registering the hub topic."
            }
            Self::ErrorDeregisteringHubTopic => {
                "Server error encountered while deregistering the hub topic."
            }
        }
    }

    /// Returns `true` for errors the operator fixes through configuration.
    pub fn is_client_error(self) -> bool {
        self.code().starts_with("WEBSUB-60")
    }
}
