//! CLI argument parsing using clap

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Execution mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExecutionMode {
    /// Draw numbers and print them (default)
    Draw,
    /// Run the entropy service
    Serve,
}

/// Draw mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DrawModeArg {
    /// Weighted pick, repeats allowed
    Unconstrained,
    /// No immediate repeat
    Regular,
    /// Every eligible number once before any repeats
    WithoutRepetition,
}

/// dutydraw - weighted duty-number picker
#[derive(Parser, Debug)]
#[command(name = "dutydraw")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Execution mode: draw or serve
    #[arg(long, value_enum, default_value = "draw")]
    pub mode: ExecutionMode,

    /// TOML configuration file
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Draw Options ===
    /// Number of drawable items, numbered from 1
    #[arg(short = 'u', long)]
    pub universe_size: Option<usize>,

    /// Eligible items, e.g. "1-29,31"
    #[arg(short = 'w', long)]
    pub whitelist: Option<String>,

    /// Draw mode
    #[arg(long, value_enum)]
    pub draw_mode: Option<DrawModeArg>,

    /// Number of draws
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Pause between draws in milliseconds
    #[arg(long)]
    pub interval_ms: Option<u64>,

    // === Sampling Options ===
    /// Fixed RNG seed for reproducible draws
    #[arg(long)]
    pub seed: Option<u64>,

    /// Lookahead of the weighted pool
    #[arg(long)]
    pub prefetch_depth: Option<usize>,

    // === Entropy Options ===
    /// Entropy service address (host:port) for draw mode
    #[arg(long)]
    pub entropy_addr: Option<String>,

    /// Auth token: sent to the entropy service in draw mode, required from clients in serve mode
    #[arg(long, env = "DUTYDRAW_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Port for the entropy service to listen on (serve mode only)
    #[arg(long)]
    pub listen_port: Option<u16>,

    // === Output Options ===
    /// Print the draw report as JSON
    #[arg(long)]
    pub json: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.mode == ExecutionMode::Serve {
            if self.entropy_addr.is_some() {
                anyhow::bail!("--entropy-addr is only used in draw mode");
            }
            return Ok(());
        }

        if self.count == Some(0) {
            anyhow::bail!("count must be at least 1");
        }
        if self.listen_port.is_some() {
            anyhow::bail!("--listen-port is only used in serve mode");
        }

        Ok(())
    }
}
