//! CLI to Config conversion utilities

use crate::config::cli;
use crate::sequencer::DrawMode;
use crate::whitelist::{Item, Whitelist};
use anyhow::{Context, Result};

/// Parse a whitelist spec (e.g., "1-29,31,33-35") for a universe of `universe` items
///
/// An empty spec yields an empty whitelist.
pub fn parse_whitelist(spec: &str, universe: usize) -> Result<Whitelist> {
    let mut whitelist = Whitelist::empty(universe);

    for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_item(start, spec)?, parse_item(end, spec)?),
            None => {
                let item = parse_item(part, spec)?;
                (item, item)
            }
        };
        if start > end {
            anyhow::bail!("Invalid range '{}' in whitelist '{}'", part, spec);
        }
        for item in start..=end {
            whitelist
                .set(item, true)
                .with_context(|| format!("Invalid whitelist '{}'", spec))?;
        }
    }

    Ok(whitelist)
}

fn parse_item(s: &str, spec: &str) -> Result<Item> {
    s.trim()
        .parse()
        .with_context(|| format!("Invalid item '{}' in whitelist '{}'", s.trim(), spec))
}

/// Convert CLI DrawModeArg to sequencer DrawMode
pub fn convert_draw_mode(cli_mode: cli::DrawModeArg) -> DrawMode {
    match cli_mode {
        cli::DrawModeArg::Unconstrained => DrawMode::Unconstrained,
        cli::DrawModeArg::Regular => DrawMode::Regular,
        cli::DrawModeArg::WithoutRepetition => DrawMode::WithoutRepetition,
    }
}
