//! TOML configuration file parsing

use super::*;
use crate::config::cli::{Cli, ExecutionMode};
use crate::config::cli_convert::convert_draw_mode;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse TOML configuration file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse TOML configuration from string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config = ::toml::from_str(contents)
        .context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Load the configuration file named on the command line, if any, and apply CLI overrides
pub fn load_config(cli: &Cli) -> Result<Config> {
    let config = match &cli.config {
        Some(path) => parse_toml_file(path)?,
        None => Config::default(),
    };
    merge_cli_with_config(cli, config)
}

/// Merge CLI arguments with TOML configuration (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Result<Config> {
    // Override universe and draw settings
    if let Some(size) = cli.universe_size {
        config.universe.size = size;
    }
    if let Some(ref spec) = cli.whitelist {
        config.draw.whitelist = Some(spec.clone());
    }
    if let Some(mode) = cli.draw_mode {
        config.draw.mode = convert_draw_mode(mode);
    }
    if let Some(count) = cli.count {
        config.draw.count = count;
    }
    if let Some(interval) = cli.interval_ms {
        config.draw.interval_ms = interval;
    }

    // Override sampling
    if let Some(seed) = cli.seed {
        config.sampling.seed = Some(seed);
    }
    if let Some(depth) = cli.prefetch_depth {
        config.sampling.prefetch_depth = depth;
    }

    // The auth token belongs to whichever side of the exchange we run
    match cli.mode {
        ExecutionMode::Draw => {
            if let Some(ref address) = cli.entropy_addr {
                let auth_token = cli
                    .auth_token
                    .clone()
                    .or_else(|| config.entropy.as_ref().map(|e| e.auth_token.clone()))
                    .context("--entropy-addr requires an auth token")?;
                config.entropy = Some(EntropyConfig {
                    address: address.clone(),
                    auth_token,
                });
            } else if let (Some(token), Some(entropy)) = (&cli.auth_token, config.entropy.as_mut()) {
                entropy.auth_token = token.clone();
            }
        }
        ExecutionMode::Serve => {
            if let Some(ref token) = cli.auth_token {
                config.service.auth_token = token.clone();
            }
            if let Some(port) = cli.listen_port {
                config.service.listen_port = port;
            }
        }
    }

    // Override output and runtime flags
    if cli.json {
        config.output.json = true;
    }
    if cli.dry_run {
        config.runtime.dry_run = true;
    }
    if cli.debug {
        config.runtime.debug = true;
    }

    Ok(config)
}
