//! Service-side weight ledger
//!
//! The entropy service starts every item at a base weight and then applies a list
//! of transactions. Each transaction carries an expiry date; expired ones are
//! skipped with a warning so stale entries are noticed and removed.
//!
//! # Transaction Format
//!
//! ```text
//! delete <n> from <a>, <YYYY-MM-DD>
//! move <n> from <a> to <b>, <YYYY-MM-DD>
//! ```
//!
//! Items are numbered from 1. Every weight must stay within `1..=63` so it fits a
//! single protocol symbol.

use super::protocol::MAX_SYMBOL_VALUE;
use crate::distribution::weights::WeightTable;
use crate::whitelist::Item;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::warn;

/// One weight adjustment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Take `amount` away from `from`
    Delete { amount: u32, from: Item },
    /// Move `amount` from `from` to `to`
    Move { amount: u32, from: Item, to: Item },
}

/// Weight adjustment with its expiry date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub action: Action,
    pub expires: NaiveDate,
}

impl Transaction {
    /// Parse a transaction line
    pub fn parse(line: &str) -> Result<Self> {
        let (action, expires) = line
            .rsplit_once(',')
            .with_context(|| format!("Transaction '{}' has no expiry date", line))?;
        let expires = NaiveDate::parse_from_str(expires.trim(), "%Y-%m-%d")
            .with_context(|| format!("Invalid expiry date in transaction '{}'", line))?;

        let words: Vec<&str> = action.split_whitespace().collect();
        let action = match words.as_slice() {
            ["delete", amount, "from", from] => Action::Delete {
                amount: parse_number(amount, line)?,
                from: parse_number(from, line)?,
            },
            ["move", amount, "from", from, "to", to] => Action::Move {
                amount: parse_number(amount, line)?,
                from: parse_number(from, line)?,
                to: parse_number(to, line)?,
            },
            _ => anyhow::bail!("Unknown transaction '{}'", line),
        };

        Ok(Self { action, expires })
    }

    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expires < today
    }
}

fn parse_number(word: &str, line: &str) -> Result<u32> {
    word.parse()
        .with_context(|| format!("Invalid number '{}' in transaction '{}'", word, line))
}

/// Build the service weight table from a base weight and transaction lines
///
/// Transactions expired before `today` are skipped.
pub fn build_weights(
    universe: usize,
    base_weight: u32,
    transactions: &[String],
    today: NaiveDate,
) -> Result<WeightTable> {
    if base_weight == 0 || base_weight > MAX_SYMBOL_VALUE {
        anyhow::bail!("Base weight {} outside 1..={}", base_weight, MAX_SYMBOL_VALUE);
    }
    let mut weights: Vec<i64> = vec![base_weight as i64; universe];

    for line in transactions {
        let transaction = Transaction::parse(line)?;
        if transaction.is_expired(today) {
            warn!("Expired transaction in ledger, please remove: {}", line);
            continue;
        }

        match transaction.action {
            Action::Delete { amount, from } => {
                let from = slot(from, universe, line)?;
                weights[from] -= amount as i64;
                check_weight(weights[from], line)?;
            }
            Action::Move { amount, from, to } => {
                let from = slot(from, universe, line)?;
                let to = slot(to, universe, line)?;
                weights[from] -= amount as i64;
                weights[to] += amount as i64;
                check_weight(weights[from], line)?;
                check_weight(weights[to], line)?;
            }
        }
    }

    let weights = weights.into_iter().map(|w| w as u32).collect();
    WeightTable::from_weights(weights).context("Ledger produced an invalid weight table")
}

fn slot(item: Item, universe: usize, line: &str) -> Result<usize> {
    match (item as usize).checked_sub(1) {
        Some(index) if index < universe => Ok(index),
        _ => anyhow::bail!(
            "Transaction '{}' refers to item {} outside 1..={}",
            line,
            item,
            universe
        ),
    }
}

fn check_weight(weight: i64, line: &str) -> Result<()> {
    if weight < 1 || weight > MAX_SYMBOL_VALUE as i64 {
        anyhow::bail!(
            "Transaction '{}' leaves a weight of {} (allowed 1..={})",
            line,
            weight,
            MAX_SYMBOL_VALUE
        );
    }
    Ok(())
}
