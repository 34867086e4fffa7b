//! Chunking configuration
//!
//! The thresholds and the chunking mode are read once (from the environment
//! or from CLI flags) and passed into the chunker by reference. The chunker
//! itself never consults ambient global state, so its behavior is fully
//! determined by its inputs.

use std::env;
use std::str::FromStr;

use crate::error::ChunkError;

/// Environment variable holding the character threshold.
pub const MAX_SQL_LENGTH_VAR: &str = "MAX_SQL_LENGTH";
/// Environment variable holding the line-count threshold.
pub const MAX_SQL_LINES_VAR: &str = "MAX_SQL_LINES";
/// Environment variable holding the chunking mode (auto/always/disabled).
pub const CHUNKING_MODE_VAR: &str = "SQL_CHUNKING_MODE";

const DEFAULT_MAX_CHARS: usize = 8000;
const DEFAULT_MAX_LINES: usize = 200;

/// Size thresholds that decide whether a script is chunked at all.
///
/// Either threshold triggers chunking on its own; both use strict `>`
/// comparison, so a script of exactly the threshold size is not chunked.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum character count before chunking kicks in.
    pub max_chars: usize,
    /// Maximum newline count before chunking kicks in.
    pub max_lines: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_MAX_CHARS,
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}

impl ChunkerConfig {
    /// Build a config from `MAX_SQL_LENGTH` / `MAX_SQL_LINES`, falling back
    /// to the defaults when a variable is unset or unparseable.
    pub fn from_env() -> Self {
        Self {
            max_chars: read_threshold(MAX_SQL_LENGTH_VAR, DEFAULT_MAX_CHARS),
            max_lines: read_threshold(MAX_SQL_LINES_VAR, DEFAULT_MAX_LINES),
        }
    }
}

fn read_threshold(name: &str, default: usize) -> usize {
    match env::var(name) {
        Ok(raw) => match raw.trim().parse::<usize>() {
            Ok(value) => value,
            Err(_) => {
                log::warn!("ignoring unparseable {name}={raw:?}, using default {default}");
                default
            }
        },
        Err(_) => default,
    }
}

/// Caller-facing toggle that can force chunking on or off regardless of the
/// size thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkingMode {
    /// Chunk only when a threshold is exceeded.
    #[default]
    Auto,
    /// Always chunk, even for small scripts.
    Always,
    /// Never chunk; the whole script goes to translation in one shot.
    Disabled,
}

impl FromStr for ChunkingMode {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(ChunkingMode::Auto),
            "always" => Ok(ChunkingMode::Always),
            "disabled" => Ok(ChunkingMode::Disabled),
            _ => Err(ChunkError::UnknownChunkingMode {
                value: s.to_string(),
            }),
        }
    }
}

impl ChunkingMode {
    /// Read `SQL_CHUNKING_MODE`, defaulting to `Auto` when unset or invalid.
    pub fn from_env() -> Self {
        match env::var(CHUNKING_MODE_VAR) {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                log::warn!("ignoring unknown {CHUNKING_MODE_VAR}={raw:?}, using auto");
                ChunkingMode::Auto
            }),
            Err(_) => ChunkingMode::Auto,
        }
    }
}
