//! dutydraw - weighted duty-number picker
//!
//! dutydraw hands out numbers from a small universe (`1..=N`) to a group of people,
//! for example to decide who takes the next duty. Draws are weighted, respect a
//! whitelist of currently eligible numbers, and can avoid immediate repeats or
//! cycle through everyone before anyone is picked twice.
//!
//! # Architecture
//!
//! - **Whitelist**: which numbers may be drawn right now
//! - **Distribution**: weighted pool with a prefetch buffer, plus an unweighted backup
//! - **Sequencer**: the draw modes and their history
//! - **Entropy**: optional remote service that refreshes weights and primes the next value
//! - **Config / output**: TOML and CLI configuration, text and JSON reports

pub mod config;
pub mod distribution;
pub mod entropy;
pub mod error;
pub mod output;
pub mod sequencer;
pub mod whitelist;

// Re-export commonly used types
pub use config::Config;
pub use error::{DrawError, WeightError};
pub use sequencer::{DrawMode, DrawSequencer, DrawSession};
pub use whitelist::{Item, Whitelist};

/// Result type used throughout dutydraw
pub type Result<T> = anyhow::Result<T>;
