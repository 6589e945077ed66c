//! Recovery of JSON objects from generative-model output.
//!
//! Models asked for strict JSON still emit trailing commas, single quotes,
//! comments and chatty wrapping text. Recovery runs a fixed chain of
//! increasingly permissive strategies and stops at the first success:
//!
//! 1. strict JSON on the input
//! 2. JSON5 on the input
//! 3. strict JSON on the repaired input
//! 4. JSON5 on the repaired input
//!
//! When every strategy fails, the error of the last one is returned.

pub mod extract;

pub use extract::{extract_json_candidate, repair_json_text};

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

/// One parsing attempt in the recovery chain.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Strategy {
    /// Strict JSON on the input as given.
    Strict,
    /// JSON5 (trailing commas, single quotes, comments, unquoted keys).
    Relaxed,
    /// Strict JSON after [`repair_json_text`].
    RepairedStrict,
    /// JSON5 after [`repair_json_text`].
    RepairedRelaxed,
}

/// Strategies in the order they are attempted.
pub const STRATEGY_CHAIN: [Strategy; 4] = [
    Strategy::Strict,
    Strategy::Relaxed,
    Strategy::RepairedStrict,
    Strategy::RepairedRelaxed,
];

impl Strategy {
    /// Stable name used in logs and errors.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Relaxed => "relaxed",
            Self::RepairedStrict => "repaired-strict",
            Self::RepairedRelaxed => "repaired-relaxed",
        }
    }

    /// Whether the strategy parses the repaired text instead of the input.
    #[must_use]
    pub const fn uses_repaired_text(self) -> bool {
        matches!(self, Self::RepairedStrict | Self::RepairedRelaxed)
    }

    fn parse(self, text: &str) -> Result<Value, ParseFailure> {
        match self {
            Self::Strict | Self::RepairedStrict => Ok(serde_json::from_str(text)?),
            Self::Relaxed | Self::RepairedRelaxed => Ok(json5::from_str(text)?),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Parser-level failure of a single strategy.
#[derive(Debug, Error)]
pub enum ParseFailure {
    /// Strict JSON parser error.
    #[error(transparent)]
    Strict(#[from] serde_json::Error),
    /// JSON5 parser error.
    #[error(transparent)]
    Relaxed(#[from] json5::Error),
}

/// Every strategy failed; carries the failure of the last one attempted.
#[derive(Debug, Error)]
#[error("{strategy} parse failed: {source}")]
pub struct RecoveryError {
    /// Strategy that produced `source`.
    pub strategy: Strategy,
    /// Parser error.
    pub source: ParseFailure,
}

/// A successfully recovered value.
#[derive(Clone, Debug, PartialEq)]
pub struct Recovered {
    /// Parsed JSON value.
    pub value: Value,
    /// Strategy that produced it.
    pub strategy: Strategy,
}

fn attempt(strategy: Strategy, text: &str, repaired: &str) -> Result<Value, RecoveryError> {
    let input = if strategy.uses_repaired_text() {
        repaired
    } else {
        text
    };
    strategy
        .parse(input)
        .map_err(|source| RecoveryError { strategy, source })
}

/// Parse `text` with the strategy chain.
///
/// # Errors
/// Returns the error of the final strategy when none succeeds.
pub fn recover_json(text: &str) -> Result<Recovered, RecoveryError> {
    let repaired = repair_json_text(text);
    let [earlier @ .., last] = STRATEGY_CHAIN;

    for strategy in earlier {
        match attempt(strategy, text, &repaired) {
            Ok(value) => {
                debug!(%strategy, "JSON recovered");
                return Ok(Recovered { value, strategy });
            }
            Err(err) => debug!(%strategy, "JSON parse attempt failed: {}", err.source),
        }
    }

    match attempt(last, text, &repaired) {
        Ok(value) => {
            debug!(strategy = %last, "JSON recovered");
            Ok(Recovered {
                value,
                strategy: last,
            })
        }
        Err(err) => {
            warn!("All JSON recovery strategies failed: {err}");
            Err(err)
        }
    }
}

/// Extract the JSON candidate from raw model output and recover it.
///
/// # Errors
/// Returns the error of the final strategy when none succeeds.
pub fn recover_from_model_output(raw: &str) -> Result<Recovered, RecoveryError> {
    let candidate = extract_json_candidate(raw);
    debug!(len = candidate.len(), "Extracted JSON candidate");
    recover_json(candidate)
}
