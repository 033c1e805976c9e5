//! Entropy refresh protocol
//!
//! This module defines the messages exchanged between a draw session and the
//! entropy service. Bodies are short ASCII strings built from a fixed 64-symbol
//! alphabet in which each symbol's index is the value it stands for.
//!
//! # Message Flow
//!
//! ```text
//! Client                                    Service
//!    |                                         |
//!    |---- "<auth_token> <whitelist>" -------->|
//!    |                                         |
//!    |<--- "<primed> <weights>" ---------------|   accepted
//!    |<--- "invalid-authentication" -----------|   rejected
//! ```
//!
//! - `whitelist`: one symbol per universe slot, `A` (0) ineligible, `B` (1) eligible
//! - `primed`: zero-based decimal index of the next item to hand out
//! - `weights`: one symbol per universe slot, so remote weights are `1..=63`
//!
//! # Message Framing
//!
//! Each body is prefixed with a 4-byte length field (little-endian u32):
//!
//! ```text
//! [4 bytes: body length][N bytes: UTF-8 body]
//! ```

use crate::distribution::weights::WeightTable;
use crate::entropy::Refresh;
use crate::error::WeightError;
use crate::whitelist::{Item, Whitelist};
use anyhow::{Context, Result};
use std::fmt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Symbol alphabet; a symbol's index is its value
pub const ALPHABET: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Largest value a single symbol can carry
pub const MAX_SYMBOL_VALUE: u32 = 63;

/// Upper bound on a frame body
pub const MAX_FRAME_LEN: usize = 64 * 1024;

/// Errors decoding or encoding protocol bodies
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("value {0} does not fit a single symbol (max 63)")]
    ValueTooLarge(u32),

    #[error("'{0}' is not a protocol symbol")]
    UnknownSymbol(char),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("encoding covers {actual} slots, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("primed index {index} outside a universe of {universe} items")]
    PrimedOutOfRange { index: u32, universe: usize },

    #[error("weight vector rejected: {0}")]
    Weight(#[from] WeightError),
}

/// Symbol carrying `value`
pub fn symbol(value: u32) -> Result<char, ProtocolError> {
    ALPHABET
        .get(value as usize)
        .map(|&byte| byte as char)
        .ok_or(ProtocolError::ValueTooLarge(value))
}

/// Value carried by `symbol`
pub fn symbol_value(symbol: char) -> Result<u32, ProtocolError> {
    ALPHABET
        .iter()
        .position(|&byte| byte as char == symbol)
        .map(|index| index as u32)
        .ok_or(ProtocolError::UnknownSymbol(symbol))
}

pub fn encode_symbols(values: &[u32]) -> Result<String, ProtocolError> {
    values.iter().map(|&value| symbol(value)).collect()
}

pub fn decode_symbols(text: &str) -> Result<Vec<u32>, ProtocolError> {
    text.chars().map(symbol_value).collect()
}

/// Encode a whitelist as one `A`/`B` symbol per slot
pub fn encode_whitelist(whitelist: &Whitelist) -> String {
    whitelist
        .as_slots()
        .iter()
        .map(|&eligible| ALPHABET[eligible as usize] as char)
        .collect()
}

pub fn decode_whitelist(text: &str, universe: usize) -> Result<Whitelist, ProtocolError> {
    let values = decode_symbols(text)?;
    if values.len() != universe {
        return Err(ProtocolError::LengthMismatch {
            expected: universe,
            actual: values.len(),
        });
    }
    let slots = values
        .into_iter()
        .map(|value| match value {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(ProtocolError::Malformed(format!(
                "whitelist symbol '{}' is neither A nor B",
                ALPHABET[other as usize] as char
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Whitelist::from_slots(slots))
}

/// Request for a refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRequest {
    pub auth_token: String,
    pub whitelist: Whitelist,
}

impl RefreshRequest {
    pub fn encode(&self) -> String {
        format!("{} {}", self.auth_token, encode_whitelist(&self.whitelist))
    }

    pub fn decode(body: &str, universe: usize) -> Result<Self, ProtocolError> {
        let (auth_token, whitelist) = body
            .trim()
            .split_once(' ')
            .ok_or_else(|| ProtocolError::Malformed("expected '<auth> <whitelist>'".to_string()))?;
        Ok(Self {
            auth_token: auth_token.to_string(),
            whitelist: decode_whitelist(whitelist, universe)?,
        })
    }
}

/// Reasons a service declines a request
///
/// [`EntropyService`](super::EntropyService) only ever answers with
/// `InvalidAuthentication` or `Error`. `InvalidClient` and `ClientNotActive` belong to
/// the wire format for per-client services; the client decodes them so such a
/// service's replies are reported instead of rejected as malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    InvalidAuthentication,
    /// Not sent by this crate's service
    InvalidClient,
    /// Not sent by this crate's service
    ClientNotActive,
    Error,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidAuthentication => "invalid-authentication",
            Self::InvalidClient => "invalid-client",
            Self::ClientNotActive => "client-not-active",
            Self::Error => "error",
        }
    }

    fn parse(word: &str) -> Option<Self> {
        match word {
            "invalid-authentication" => Some(Self::InvalidAuthentication),
            "invalid-client" => Some(Self::InvalidClient),
            "client-not-active" => Some(Self::ClientNotActive),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service answer to a [`RefreshRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshResponse {
    /// Zero-based primed index plus the full weight vector
    Accepted { primed: u32, weights: Vec<u32> },
    Rejected(Rejection),
}

impl RefreshResponse {
    pub fn encode(&self) -> Result<String, ProtocolError> {
        match self {
            Self::Accepted { primed, weights } => {
                Ok(format!("{} {}", primed, encode_symbols(weights)?))
            }
            Self::Rejected(rejection) => Ok(rejection.as_str().to_string()),
        }
    }

    pub fn decode(body: &str) -> Result<Self, ProtocolError> {
        let body = body.trim();
        if let Some(rejection) = Rejection::parse(body) {
            return Ok(Self::Rejected(rejection));
        }

        let (primed, weights) = body
            .split_once(' ')
            .ok_or_else(|| ProtocolError::Malformed(format!("unexpected response '{}'", body)))?;
        let primed: u32 = primed
            .parse()
            .map_err(|_| ProtocolError::Malformed(format!("primed index '{}' is not a number", primed)))?;
        Ok(Self::Accepted {
            primed,
            weights: decode_symbols(weights)?,
        })
    }

    /// Turn an accepted response into a refresh for a universe of `universe` items
    ///
    /// Rejections yield `Ok(None)`.
    pub fn into_refresh(self, universe: usize) -> Result<Option<Refresh>, ProtocolError> {
        let (primed, weights) = match self {
            Self::Accepted { primed, weights } => (primed, weights),
            Self::Rejected(_) => return Ok(None),
        };

        if weights.len() != universe {
            return Err(ProtocolError::LengthMismatch {
                expected: universe,
                actual: weights.len(),
            });
        }
        if primed as usize >= universe {
            return Err(ProtocolError::PrimedOutOfRange {
                index: primed,
                universe,
            });
        }

        Ok(Some(Refresh {
            weights: WeightTable::from_weights(weights)?,
            primed: Some(primed as Item + 1),
        }))
    }
}

/// Read one length-prefixed body
pub async fn read_frame<R: AsyncRead + Unpin>(reader: &mut R) -> Result<String> {
    let mut len_buf = [0u8; 4];
    reader
        .read_exact(&mut len_buf)
        .await
        .context("Failed to read frame length")?;

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_FRAME_LEN {
        anyhow::bail!("Frame too large: {} bytes (max {})", len, MAX_FRAME_LEN);
    }

    let mut body = vec![0u8; len];
    reader
        .read_exact(&mut body)
        .await
        .context("Failed to read frame body")?;

    String::from_utf8(body).context("Frame body is not UTF-8")
}

/// Write one length-prefixed body and flush
pub async fn write_frame<W: AsyncWrite + Unpin>(writer: &mut W, body: &str) -> Result<()> {
    if body.len() > MAX_FRAME_LEN {
        anyhow::bail!("Frame too large: {} bytes (max {})", body.len(), MAX_FRAME_LEN);
    }

    let mut framed = Vec::with_capacity(4 + body.len());
    framed.extend_from_slice(&(body.len() as u32).to_le_bytes());
    framed.extend_from_slice(body.as_bytes());

    writer
        .write_all(&framed)
        .await
        .context("Failed to write frame")?;
    writer.flush().await.context("Failed to flush stream")?;
    Ok(())
}
