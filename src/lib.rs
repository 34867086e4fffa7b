//! sparkbq-chunker: structural chunking for Spark/Hive → BigQuery SQL conversion
//!
//! Large SQL scripts cannot safely be handed to a translator in one shot.
//! This library decides when a script is too large, splits it into
//! independently translatable fragments along syntactic boundaries
//! (statements, CTEs, UNION branches, INSERT/ALTER headers), runs a
//! caller-supplied per-fragment translator over them, and reassembles the
//! results into one coherent script.
//!
//! The pipeline is pure text-to-text: no network, no SQL validation, no
//! AST. Translation itself is injected as a closure so the expensive part
//! (in production, a language-model call) stays outside this crate.

pub mod chunker;
pub mod config;
pub mod convert;
pub mod error;
pub mod preprocess;
pub mod scanner;
pub mod util;

pub use chunker::{Fragment, FragmentKind, SqlChunker, StatementKind};
pub use config::{ChunkerConfig, ChunkingMode};
pub use error::ChunkError;

/// Options for a chunked conversion pass
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    /// Size thresholds deciding when chunking kicks in.
    pub config: ChunkerConfig,
    /// Force chunking on/off, or leave it threshold-driven.
    pub mode: ChunkingMode,
    /// Resolve hivevar definitions and `${..}` macros before chunking.
    pub preprocess: bool,
}

/// Result of a conversion pass
#[derive(Debug, Clone)]
pub struct Conversion {
    /// The reassembled output script.
    pub sql: String,
    /// Whether the script was split into more than one fragment.
    pub was_chunked: bool,
    /// How many fragments were translated (1 when unchunked).
    pub fragment_count: usize,
}

/// Convert a SQL script, chunking it first when it is too large.
///
/// `translate` is invoked once per fragment needing semantic conversion
/// (header fragments are rewritten locally and `USE` statements dropped),
/// sequentially and in output order. Its errors propagate; nothing is
/// retried here.
pub fn convert_script<F>(
    sql: &str,
    options: &ConvertOptions,
    mut translate: F,
) -> anyhow::Result<Conversion>
where
    F: FnMut(&str) -> anyhow::Result<String>,
{
    let source = if options.preprocess {
        preprocess::preprocess_script(sql)
    } else {
        sql.to_string()
    };

    let chunk_config = &options.config;
    let sql_chunker = SqlChunker::new(&source, chunk_config);

    let use_chunking = match options.mode {
        ChunkingMode::Auto => sql_chunker.should_chunk(),
        ChunkingMode::Always => true,
        ChunkingMode::Disabled => false,
    };

    if use_chunking {
        let fragments = sql_chunker.analyze_and_chunk();
        if fragments.len() > 1 {
            log::info!("[convert] processing {} fragments", fragments.len());
            let fragment_count = fragments.len();
            let merged = convert::convert_fragments(fragments, &mut translate)?;
            return Ok(Conversion {
                sql: merged,
                was_chunked: true,
                fragment_count,
            });
        }
        log::info!("[convert] analyzed but no split applied, converting whole");
    }

    let converted = translate(source.trim())?;
    Ok(Conversion {
        sql: converted,
        was_chunked: false,
        fragment_count: 1,
    })
}
