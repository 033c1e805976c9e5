//! Configuration module
//!
//! Handles CLI argument parsing, TOML configuration files, and validation.

pub mod cli;
pub mod cli_convert;
pub mod toml;
pub mod validator;

use crate::distribution::prefetch::DEFAULT_PREFETCH_DEPTH;
use crate::distribution::weights::WeightTable;
use crate::error::WeightError;
use crate::sequencer::DrawMode;
use crate::whitelist::{Item, Whitelist};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub draw: DrawConfig,
    /// Remote entropy service used by draw sessions
    #[serde(default)]
    pub entropy: Option<EntropyConfig>,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

impl Config {
    /// Local weight table: the default weight everywhere, then the overrides
    pub fn weight_table(&self) -> Result<WeightTable, WeightError> {
        let mut table = WeightTable::new(self.universe.size, self.weights.default)?;
        for o in &self.weights.overrides {
            table.set(o.item, o.weight)?;
        }
        Ok(table)
    }

    /// Whitelist for draw mode; every item when none is configured
    pub fn whitelist(&self) -> Result<Whitelist> {
        match &self.draw.whitelist {
            Some(spec) => cli_convert::parse_whitelist(spec, self.universe.size),
            None => Ok(Whitelist::full(self.universe.size)),
        }
    }
}

/// Set of drawable numbers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseConfig {
    /// Number of items, numbered from 1
    #[serde(default = "default_universe_size")]
    pub size: usize,
}

fn default_universe_size() -> usize {
    40
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            size: default_universe_size(),
        }
    }
}

/// Local weight table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Weight of every item without an override
    #[serde(default = "default_weight")]
    pub default: u32,
    #[serde(default)]
    pub overrides: Vec<WeightOverride>,
}

fn default_weight() -> u32 {
    100
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            default: default_weight(),
            overrides: Vec::new(),
        }
    }
}

/// Weight for a single item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightOverride {
    pub item: Item,
    pub weight: u32,
}

/// Sampler tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Lookahead of the weighted pool
    #[serde(default = "default_prefetch_depth")]
    pub prefetch_depth: usize,
    /// Below this many eligible items draws are unweighted
    #[serde(default = "default_backup_below")]
    pub backup_below: usize,
    /// The previous regular draw is excluded only while more items than this remain
    #[serde(default = "default_exclusion_floor")]
    pub exclusion_floor: usize,
    /// Draws are unweighted when an eligible item lies above this number
    #[serde(default = "default_weighting_limit")]
    pub weighting_limit: Option<Item>,
    /// Fixed seed for reproducible draws
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_prefetch_depth() -> usize {
    DEFAULT_PREFETCH_DEPTH
}

fn default_backup_below() -> usize {
    5
}

fn default_exclusion_floor() -> usize {
    1
}

fn default_weighting_limit() -> Option<Item> {
    Some(29)
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            prefetch_depth: default_prefetch_depth(),
            backup_below: default_backup_below(),
            exclusion_floor: default_exclusion_floor(),
            weighting_limit: default_weighting_limit(),
            seed: None,
        }
    }
}

/// Draw mode settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawConfig {
    #[serde(default)]
    pub mode: DrawMode,
    /// Whitelist spec such as `"1-29,31"`; all items when absent
    #[serde(default)]
    pub whitelist: Option<String>,
    /// Number of draws to perform
    #[serde(default = "default_count")]
    pub count: usize,
    /// Pause between draws, giving entropy refreshes time to arrive
    #[serde(default)]
    pub interval_ms: u64,
}

fn default_count() -> usize {
    1
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            mode: DrawMode::default(),
            whitelist: None,
            count: default_count(),
            interval_ms: 0,
        }
    }
}

/// Entropy service a draw session fetches refreshes from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntropyConfig {
    /// `host:port` of the service
    pub address: String,
    pub auth_token: String,
}

/// Entropy service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default)]
    pub auth_token: String,
    /// Starting weight of every item before transactions
    #[serde(default = "default_base_weight")]
    pub base_weight: u32,
    /// Lookahead of the service buffer
    #[serde(default = "default_buffer_depth")]
    pub buffer_depth: usize,
    /// Ledger lines, see [`crate::entropy::ledger`]
    #[serde(default)]
    pub transactions: Vec<String>,
}

fn default_listen_port() -> u16 {
    9999
}

fn default_base_weight() -> u32 {
    10
}

fn default_buffer_depth() -> usize {
    500
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            auth_token: String::new(),
            base_weight: default_base_weight(),
            buffer_depth: default_buffer_depth(),
            transactions: Vec::new(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Print the draw report as JSON
    #[serde(default)]
    pub json: bool,
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Print the configuration and exit
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

// Display trait implementations

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration:")?;
        writeln!(f, "  Universe: {} items", self.universe.size)?;
        writeln!(f, "  Weights: {}", self.weights)?;
        writeln!(f, "  Sampling: {}", self.sampling)?;
        writeln!(f, "  Draw: {}", self.draw)?;
        match &self.entropy {
            Some(entropy) => writeln!(f, "  Entropy: {}", entropy.address)?,
            None => writeln!(f, "  Entropy: local only")?,
        }
        writeln!(f, "  Service: {}", self.service)?;
        Ok(())
    }
}

impl fmt::Display for WeightsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "default={}", self.default)?;
        if !self.overrides.is_empty() {
            write!(
                f,
                ", overrides=[{}]",
                self.overrides
                    .iter()
                    .map(|o| format!("{}:{}", o.item, o.weight))
                    .collect::<Vec<_>>()
                    .join(", ")
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for SamplingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prefetch_depth={}, backup_below={}, exclusion_floor={}",
            self.prefetch_depth, self.backup_below, self.exclusion_floor
        )?;
        match self.weighting_limit {
            Some(limit) => write!(f, ", weighting_limit={}", limit)?,
            None => write!(f, ", weighting_limit=none")?,
        }
        if let Some(seed) = self.seed {
            write!(f, ", seed={}", seed)?;
        }
        Ok(())
    }
}

impl fmt::Display for DrawConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{}, whitelist={}",
            self.mode,
            self.count,
            self.whitelist.as_deref().unwrap_or("all")
        )?;
        if self.interval_ms > 0 {
            write!(f, ", interval={}ms", self.interval_ms)?;
        }
        Ok(())
    }
}

impl fmt::Display for ServiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "port={}, base_weight={}, buffer_depth={}, {} transaction(s)",
            self.listen_port,
            self.base_weight,
            self.buffer_depth,
            self.transactions.len()
        )
    }
}
