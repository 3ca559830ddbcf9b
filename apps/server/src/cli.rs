use std::path::PathBuf;

use clap::Parser;

use crate::config::{Config, ConfigError};

/// Dead-man's-switch watchdog: clients ping, silence raises an alert.
#[derive(Debug, Parser)]
#[command(name = "feedwatch", version, about)]
pub struct Cli {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "FEEDWATCH_PORT")]
    pub port: Option<u16>,

    /// Address to bind (overrides the config file)
    #[arg(long, env = "FEEDWATCH_BIND")]
    pub bind: Option<String>,

    /// Debug logging
    #[arg(short, long, env = "FEEDWATCH_DEBUG")]
    pub debug: bool,

    /// TOML configuration file, created with defaults if missing
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Load the config file (if any) and apply command-line overrides.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = Config::from_config(self.config.as_ref())?;

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(bind) = &self.bind {
            config.server.bind.clone_from(bind);
        }

        Ok(config)
    }
}
