//! Core result types and errors for PokeAPI queries.

use serde::{Deserialize, Serialize};

/// A named candidate together with the value it was ranked by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranked {
    pub name: String,
    pub value: i64,
}

impl Ranked {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl std::fmt::Display for Ranked {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.value)
    }
}

/// Which end of a numeric range an extremum query tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Max,
    Min,
}

impl Direction {
    /// True when `candidate` strictly beats `current`. Ties never replace.
    pub fn beats(self, candidate: i64, current: i64) -> bool {
        match self {
            Direction::Max => candidate > current,
            Direction::Min => candidate < current,
        }
    }
}

/// Per-species predicate applied before a global extremum is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SpeciesFilter {
    /// Every species qualifies.
    Any,
    /// Species introduced in the named generation (e.g. `generation-ii`).
    Generation(String),
    /// Species not flagged `is_legendary`.
    NonLegendary,
}

/// Most frequent nominal value among a set of members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mode {
    pub value: String,
    pub count: usize,
}

/// Label returned by grouped-mode queries when no member carries the attribute.
pub const UNKNOWN_LABEL: &str = "unknown";

impl Mode {
    pub fn unknown() -> Self {
        Self {
            value: UNKNOWN_LABEL.to_string(),
            count: 0,
        }
    }
}

/// Why a single GET attempt failed.
#[derive(thiserror::Error, Debug)]
pub enum FetchFailure {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// A GET that kept failing until the retry budget ran out.
#[derive(thiserror::Error, Debug)]
#[error("GET {url} failed after {attempts} attempt(s): {source}")]
pub struct TransportError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: FetchFailure,
}

/// Errors that can occur while running queries.
#[derive(thiserror::Error, Debug)]
pub enum InsightsError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Convenience result type.
pub type InsightsResult<T> = Result<T, InsightsError>;
