//! WebSub Hub publisher adapter.
//!
//! Maps events and topic lifecycle calls onto hub calls. The hub base URL
//! is looked up from the configuration provider on first use and cached for
//! the lifetime of the adapter.

use std::sync::{Arc, OnceLock};

use idevent_common::{EventContext, EventPublisher, SecurityEventTokenPayload};
use tracing::{debug, warn};

use crate::client::{HttpHubClient, HubClient};
use crate::config::{AdapterConfiguration, ConfigurationProvider};
use crate::constants::{ErrorMessage, TOPIC_SEPARATOR, TopicOperation};
use crate::error::{AdapterError, HubError};

/// Publishes security events to a WebSub Hub and manages their topics.
pub struct WebSubHubAdapter {
    config: Arc<dyn ConfigurationProvider>,
    client: Arc<dyn HubClient>,
    base_url: OnceLock<String>,
}

impl WebSubHubAdapter {
    pub fn new(config: Arc<dyn ConfigurationProvider>, client: Arc<dyn HubClient>) -> Self {
        Self {
            config,
            client,
            base_url: OnceLock::new(),
        }
    }

    /// Creates an adapter talking HTTP to the hub named in `config`.
    pub fn from_configuration(config: AdapterConfiguration) -> Result<Self, HubError> {
        let client = HttpHubClient::new(&config)?;
        Ok(Self::new(Arc::new(config), Arc::new(client)))
    }

    /// Registers the topic for `event_uri` in `tenant_domain`.
    pub async fn register_topic(
        &self,
        event_uri: &str,
        tenant_domain: &str,
    ) -> Result<(), AdapterError> {
        self.manage_topic(event_uri, tenant_domain, TopicOperation::Register)
            .await?;
        debug!(
            event_uri,
            tenant = tenant_domain,
            "WebSub Hub topic registered"
        );
        Ok(())
    }

    /// Deregisters the topic for `event_uri` in `tenant_domain`.
    pub async fn deregister_topic(
        &self,
        event_uri: &str,
        tenant_domain: &str,
    ) -> Result<(), AdapterError> {
        self.manage_topic(event_uri, tenant_domain, TopicOperation::Deregister)
            .await?;
        debug!(
            event_uri,
            tenant = tenant_domain,
            "WebSub Hub topic deregistered"
        );
        Ok(())
    }

    /// Waits for publish calls still in flight.
    pub async fn drain(&self) {
        self.client.drain().await;
    }

    async fn manage_topic(
        &self,
        event_uri: &str,
        tenant_domain: &str,
        operation: TopicOperation,
    ) -> Result<(), AdapterError> {
        let topic = construct_hub_topic(event_uri, tenant_domain);
        let base_url = self.web_sub_base_url()?;

        self.client
            .manage_topic(base_url, &topic, operation)
            .await
            .map_err(|e| {
                let error = match operation {
                    TopicOperation::Register => ErrorMessage::ErrorRegisteringHubTopic,
                    TopicOperation::Deregister => ErrorMessage::ErrorDeregisteringHubTopic,
                };
                AdapterError::server(error, e, event_uri, tenant_domain)
            })
    }

    /// Returns the hub base URL, looking it up on first use.
    ///
    /// Surrounding whitespace is stripped. A failed lookup is not cached.
    fn web_sub_base_url(&self) -> Result<&str, AdapterError> {
        if let Some(url) = self.base_url.get() {
            return Ok(url);
        }

        let Some(url) = self
            .config
            .web_sub_hub_base_url()
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
        else {
            warn!("WebSub Hub base URL is empty; WebSub Hub event publisher will not engage");
            return Err(AdapterError::client(
                ErrorMessage::WebSubBaseUrlNotConfigured,
            ));
        };

        Ok(self.base_url.get_or_init(|| url))
    }
}

impl EventPublisher for WebSubHubAdapter {
    type Error = AdapterError;

    fn publish(
        &self,
        payload: &SecurityEventTokenPayload,
        context: &EventContext,
    ) -> Result<(), AdapterError> {
        let topic = construct_hub_topic(&context.event_uri, &context.tenant_domain);
        let base_url = self.web_sub_base_url()?;

        self.client
            .publish(base_url, &topic, payload, context)
            .map_err(|e| {
                AdapterError::server(
                    ErrorMessage::ErrorPublishingEvent,
                    e,
                    &context.event_uri,
                    &context.tenant_domain,
                )
            })?;

        debug!(%topic, "event handed off to the WebSub Hub");
        Ok(())
    }
}

/// `<tenant_domain>/<topic_suffix>`, unescaped.
fn construct_hub_topic(topic_suffix: &str, tenant_domain: &str) -> String {
    format!("{tenant_domain}{TOPIC_SEPARATOR}{topic_suffix}")
}
