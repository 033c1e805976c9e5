//! Configuration validation

use super::*;
use crate::entropy::protocol::MAX_SYMBOL_VALUE;
use anyhow::{Context, Result};
use std::collections::HashSet;

/// Validate complete configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_universe(&config.universe)?;
    validate_weights(&config.weights, config.universe.size)?;
    validate_sampling(&config.sampling)?;
    validate_draw(&config.draw, config.universe.size)?;
    if let Some(ref entropy) = config.entropy {
        validate_entropy(entropy)?;
    }
    validate_service(&config.service)?;

    Ok(())
}

pub fn validate_universe(universe: &UniverseConfig) -> Result<()> {
    if universe.size < 2 {
        anyhow::bail!("universe size must be at least 2, got {}", universe.size);
    }
    Ok(())
}

/// Validate the local weight table
pub fn validate_weights(weights: &WeightsConfig, universe: usize) -> Result<()> {
    if weights.default == 0 {
        anyhow::bail!("default weight must be greater than 0");
    }

    let mut seen = HashSet::new();
    for (i, o) in weights.overrides.iter().enumerate() {
        if o.item == 0 || o.item as usize > universe {
            anyhow::bail!(
                "Weight override {} names item {} outside 1..={}",
                i,
                o.item,
                universe
            );
        }
        if o.weight == 0 {
            anyhow::bail!("Weight override {} for item {} must be greater than 0", i, o.item);
        }
        if !seen.insert(o.item) {
            anyhow::bail!("Item {} has more than one weight override", o.item);
        }
    }
    Ok(())
}

pub fn validate_sampling(sampling: &SamplingConfig) -> Result<()> {
    if sampling.prefetch_depth == 0 {
        anyhow::bail!("prefetch_depth must be at least 1");
    }
    if sampling.exclusion_floor == 0 {
        anyhow::bail!("exclusion_floor must be at least 1");
    }
    if sampling.weighting_limit == Some(0) {
        anyhow::bail!("weighting_limit must be at least 1; set it to the universe size to disable the limit");
    }
    Ok(())
}

pub fn validate_draw(draw: &DrawConfig, universe: usize) -> Result<()> {
    if draw.count == 0 {
        anyhow::bail!("draw count must be at least 1");
    }
    if let Some(ref spec) = draw.whitelist {
        cli_convert::parse_whitelist(spec, universe)
            .context("draw whitelist does not fit the universe")?;
    }
    Ok(())
}

pub fn validate_entropy(entropy: &EntropyConfig) -> Result<()> {
    if entropy.address.trim().is_empty() {
        anyhow::bail!("entropy address must not be empty");
    }
    if entropy.auth_token.is_empty() {
        anyhow::bail!("entropy auth_token must not be empty");
    }
    if entropy.auth_token.contains(char::is_whitespace) {
        anyhow::bail!("entropy auth_token must not contain whitespace");
    }
    Ok(())
}

pub fn validate_service(service: &ServiceConfig) -> Result<()> {
    if service.base_weight == 0 || service.base_weight > MAX_SYMBOL_VALUE {
        anyhow::bail!(
            "service base_weight must be between 1 and {}, got {}",
            MAX_SYMBOL_VALUE,
            service.base_weight
        );
    }
    if service.buffer_depth == 0 {
        anyhow::bail!("service buffer_depth must be at least 1");
    }
    Ok(())
}

/// Checks that only matter when the service is actually started
pub fn validate_serve(config: &Config) -> Result<()> {
    if config.service.auth_token.is_empty() {
        anyhow::bail!("service auth_token must be set (config file, --auth-token or DUTYDRAW_AUTH_TOKEN)");
    }
    if config.service.auth_token.contains(char::is_whitespace) {
        anyhow::bail!("service auth_token must not contain whitespace");
    }
    Ok(())
}
