use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sparkbq_chunker::{
    convert_script, ChunkError, ChunkerConfig, ChunkingMode, ConvertOptions, SqlChunker,
};

#[derive(Parser)]
#[command(name = "sparkbq")]
#[command(
    author,
    version,
    about = "Structural chunker for Spark/Hive SQL to BigQuery conversion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a SQL script and print its fragments
    Chunk {
        /// Path to the SQL script
        script: PathBuf,

        /// Character threshold above which chunking applies
        #[arg(long)]
        max_chars: Option<usize>,

        /// Line threshold above which chunking applies
        #[arg(long)]
        max_lines: Option<usize>,
    },

    /// Rewrite a script structurally (headers rewritten, USE dropped)
    /// without translating fragment bodies
    Rewrite {
        /// Path to the SQL script
        script: PathBuf,

        /// Chunking mode: auto, always, or disabled
        #[arg(long, default_value = "auto")]
        mode: String,

        /// Resolve hivevar definitions and ${..} macros first
        #[arg(long)]
        preprocess: bool,
    },
}

fn read_script(path: &PathBuf) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| {
        ChunkError::ScriptRead {
            path: path.clone(),
            source,
        }
        .into()
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chunk {
            script,
            max_chars,
            max_lines,
        } => {
            let sql = read_script(&script)?;

            let mut config = ChunkerConfig::from_env();
            if let Some(chars) = max_chars {
                config.max_chars = chars;
            }
            if let Some(lines) = max_lines {
                config.max_lines = lines;
            }

            let chunker = SqlChunker::new(&sql, &config);
            println!(
                "should_chunk: {} (thresholds: {} chars, {} lines)",
                chunker.should_chunk(),
                config.max_chars,
                config.max_lines
            );

            for fragment in chunker.analyze_and_chunk() {
                let name = fragment
                    .name
                    .as_deref()
                    .map(|n| format!(" name={n}"))
                    .unwrap_or_default();
                println!(
                    "[{}] kind={}{} ({} chars)",
                    fragment.order_index,
                    fragment.kind,
                    name,
                    fragment.content.chars().count()
                );
            }
        }

        Commands::Rewrite {
            script,
            mode,
            preprocess,
        } => {
            let sql = read_script(&script)?;

            let options = ConvertOptions {
                config: ChunkerConfig::from_env(),
                mode: mode.parse::<ChunkingMode>()?,
                preprocess,
            };

            // Identity translator: only the structural rewrites apply.
            let conversion = convert_script(&sql, &options, |fragment| Ok(fragment.to_string()))?;
            println!("{}", conversion.sql);
        }
    }

    Ok(())
}
