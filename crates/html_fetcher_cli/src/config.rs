use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context};
use fetch_logging::{fetch_info, level_from_name};
use html_fetcher::{FetchSettings, TransportKind};
use log::LevelFilter;
use serde::{Deserialize, Serialize};

use crate::args::Args;

/// On-disk shape of the fetch settings. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub max_bytes: u64,
    pub user_agent: String,
    pub transport: String,
    pub redirects: u32,
    pub log_level: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_secs: settings.connect_timeout.as_secs(),
            request_timeout_secs: settings.request_timeout.as_secs(),
            max_bytes: settings.max_bytes,
            user_agent: settings.user_agent,
            transport: settings.transport.to_string(),
            redirects: 0,
            log_level: "info".to_string(),
        }
    }
}

impl FetchConfig {
    /// Command line flags win over file values.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(redirects) = args.redirects {
            self.redirects = redirects;
        }
        if let Some(transport) = args.transport {
            self.transport = transport.to_string();
        }
        if args.verbose {
            self.log_level = "debug".to_string();
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        level_from_name(&self.log_level)
    }

    pub fn to_settings(&self) -> anyhow::Result<FetchSettings> {
        let transport: TransportKind = self.transport.parse().map_err(|err| anyhow!("{err}"))?;
        Ok(FetchSettings {
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            max_bytes: self.max_bytes,
            user_agent: self.user_agent.clone(),
            transport,
        })
    }

    pub fn to_ron(&self) -> anyhow::Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::new())
            .context("serializing configuration")
    }
}

/// Effective configuration plus the file it came from, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub config: FetchConfig,
    pub source: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Reports where the configuration came from. Call once logging is up.
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => fetch_info!("loaded fetch configuration from {:?}", path),
            None => fetch_info!("using default fetch configuration"),
        }
    }
}

/// Loads the file named by `--config` (if any) and applies flag overrides.
///
/// Runs before the logger exists, so it reports nothing itself.
pub fn resolve(args: &Args) -> anyhow::Result<ResolvedConfig> {
    let mut config = match &args.config {
        Some(path) => load(path)?,
        None => FetchConfig::default(),
    };
    config.apply_args(args);
    Ok(ResolvedConfig {
        config,
        source: args.config.clone(),
    })
}

pub fn load(path: &Path) -> anyhow::Result<FetchConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    ron::from_str(&content).with_context(|| format!("parsing config file {}", path.display()))
}
