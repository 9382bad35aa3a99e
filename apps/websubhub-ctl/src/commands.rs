//! Command execution.

use std::path::Path;

use anyhow::{Context, bail};
use idevent_common::{EventContext, EventPublisher, SecurityEventTokenPayload};
use idevent_websubhub::{AdapterConfiguration, AdapterError, WebSubHubAdapter};

use crate::cli::{Cli, Command};

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config_path();
    let config = AdapterConfiguration::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    if !config.enabled {
        bail!(
            "WebSub Hub adapter is disabled in {}; set enabled = true",
            path.display()
        );
    }

    let adapter = WebSubHubAdapter::from_configuration(config)?;

    match cli.command {
        Command::Register(args) => {
            adapter
                .register_topic(&args.event_uri, &args.tenant)
                .await
                .map_err(with_hint)?;
            tracing::info!(event_uri = %args.event_uri, tenant = %args.tenant, "topic registered");
        }
        Command::Deregister(args) => {
            adapter
                .deregister_topic(&args.event_uri, &args.tenant)
                .await
                .map_err(with_hint)?;
            tracing::info!(event_uri = %args.event_uri, tenant = %args.tenant, "topic deregistered");
        }
        Command::Publish { topic, payload } => {
            let payload = read_payload(&payload)?;
            let context = EventContext::new(topic.tenant, topic.event_uri);
            adapter.publish(&payload, &context).map_err(with_hint)?;
            adapter.drain().await;
            tracing::info!(
                event_uri = %context.event_uri,
                tenant = %context.tenant_domain,
                jti = %payload.jti,
                "event published"
            );
        }
    }

    Ok(())
}

/// Wraps an adapter error with its operator-facing description.
fn with_hint(err: AdapterError) -> anyhow::Error {
    let hint = err.description();
    anyhow::Error::new(err).context(hint)
}

/// Reads a Security Event Token payload from a JSON file.
fn read_payload(path: &Path) -> anyhow::Result<SecurityEventTokenPayload> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read payload {}", path.display()))?;
    let payload = serde_json::from_str(&content)
        .with_context(|| format!("invalid payload JSON in {}", path.display()))?;
    Ok(payload)
}
