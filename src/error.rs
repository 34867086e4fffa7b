//! Error types for sparkbq-chunker

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while chunking and converting a SQL script
#[derive(Error, Debug)]
pub enum ChunkError {
    #[error("failed to read SQL script: {path}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("translation failed for fragment {index} ({kind}): {reason}")]
    Translation {
        index: usize,
        kind: String,
        reason: anyhow::Error,
    },

    #[error("unknown chunking mode: {value} (expected auto, always, or disabled)")]
    UnknownChunkingMode { value: String },
}
