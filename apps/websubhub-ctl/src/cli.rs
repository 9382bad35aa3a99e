//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "idevent-websubhub-ctl", version, about = "Manage WebSub Hub topics and publish security events")]
pub struct Cli {
    /// Adapter configuration file (TOML).
    #[arg(long, short, env = "IDEVENT_WEBSUBHUB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Register the hub topic for an event type.
    Register(TopicArgs),
    /// Deregister the hub topic for an event type.
    Deregister(TopicArgs),
    /// Publish a Security Event Token payload read from a JSON file.
    Publish {
        #[command(flatten)]
        topic: TopicArgs,
        /// Path to the JSON payload.
        #[arg(long)]
        payload: PathBuf,
    },
}

#[derive(Debug, Clone, Args)]
pub struct TopicArgs {
    /// Event URI (topic suffix).
    #[arg(long)]
    pub event_uri: String,
    /// Tenant domain (topic prefix).
    #[arg(long)]
    pub tenant: String,
}

impl Cli {
    /// Returns the configuration path, falling back to the per-user default.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(default_config_path)
    }
}

/// Returns the platform-specific default configuration file path.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("idevent").join("websubhub.toml")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("idevent")
            .join("websubhub.toml")
    }
}
