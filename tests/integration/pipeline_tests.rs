//! End-to-end pipeline tests: preprocess → chunk → translate → reassemble.

use pretty_assertions::assert_eq;
use sparkbq_chunker::{
    convert_script, ChunkerConfig, ChunkingMode, ConvertOptions, SqlChunker,
};

fn tiny_thresholds() -> ConvertOptions {
    ConvertOptions {
        config: ChunkerConfig {
            max_chars: 10,
            max_lines: 1,
        },
        mode: ChunkingMode::Auto,
        preprocess: false,
    }
}

fn identity(sql: &str) -> anyhow::Result<String> {
    Ok(sql.to_string())
}

#[test]
fn small_script_converts_unchunked() {
    let options = ConvertOptions::default();

    let mut calls = 0;
    let conversion = convert_script("SELECT 1", &options, |sql| {
        calls += 1;
        Ok(sql.to_string())
    })
    .unwrap();

    assert_eq!(calls, 1);
    assert!(!conversion.was_chunked);
    assert_eq!(conversion.fragment_count, 1);
    assert_eq!(conversion.sql, "SELECT 1");
}

#[test]
fn cte_round_trip_is_structurally_equivalent() {
    let sql = "WITH a AS (SELECT 1), b AS (SELECT 2) SELECT * FROM a, b";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert!(conversion.was_chunked);
    assert_eq!(conversion.fragment_count, 3);
    assert_eq!(
        conversion.sql,
        "WITH a AS (SELECT 1)\n, b AS (SELECT 2)\nSELECT * FROM a, b"
    );

    // Re-chunking the output finds the same structure.
    let config = ChunkerConfig::default();
    let again = SqlChunker::new(&conversion.sql, &config).analyze_and_chunk();
    assert_eq!(again.len(), 3);
    assert_eq!(again[0].name.as_deref(), Some("a"));
    assert_eq!(again[1].name.as_deref(), Some("b"));
    assert_eq!(again[2].content, "SELECT * FROM a, b");
}

#[test]
fn insert_overwrite_becomes_create_or_replace() {
    let sql = "INSERT OVERWRITE TABLE db.tbl SELECT * FROM src";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert!(conversion.was_chunked);
    assert_eq!(
        conversion.sql,
        "CREATE OR REPLACE TABLE `db.tbl` AS\nSELECT * FROM src"
    );
}

#[test]
fn alter_view_becomes_create_or_replace_view() {
    let sql = "ALTER VIEW db.v AS SELECT id FROM users";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert_eq!(
        conversion.sql,
        "CREATE OR REPLACE VIEW `db.v` AS\nSELECT id FROM users"
    );
}

#[test]
fn union_branches_rejoin_with_union_all() {
    let sql = "SELECT 1 UNION ALL SELECT 2 UNION SELECT 3";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert!(conversion.was_chunked);
    assert_eq!(
        conversion.sql,
        "SELECT 1\nUNION ALL\nSELECT 2\nUNION ALL\nSELECT 3"
    );
}

#[test]
fn multi_statement_script_keeps_statement_separation() {
    let sql = "SELECT 1; SELECT 2;";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert!(conversion.was_chunked);
    assert_eq!(conversion.fragment_count, 2);
    assert_eq!(conversion.sql, "SELECT 1;\nSELECT 2;");
}

#[test]
fn use_statements_are_dropped_from_output() {
    let sql = "USE analytics; INSERT OVERWRITE TABLE db.t SELECT * FROM s;";
    let conversion = convert_script(sql, &tiny_thresholds(), identity).unwrap();

    assert!(!conversion.sql.to_uppercase().contains("USE "));
    assert!(conversion.sql.contains("INSERT OVERWRITE TABLE db.t"));
}

#[test]
fn disabled_mode_never_chunks() {
    let mut options = tiny_thresholds();
    options.mode = ChunkingMode::Disabled;

    let sql = "SELECT 1; SELECT 2;";
    let mut calls = 0;
    let conversion = convert_script(sql, &options, |sql| {
        calls += 1;
        Ok(sql.to_string())
    })
    .unwrap();

    assert_eq!(calls, 1);
    assert!(!conversion.was_chunked);
    assert_eq!(conversion.sql, sql.trim());
}

#[test]
fn always_mode_chunks_small_scripts() {
    let options = ConvertOptions {
        config: ChunkerConfig::default(),
        mode: ChunkingMode::Always,
        preprocess: false,
    };

    let conversion = convert_script("SELECT 1; SELECT 2", &options, identity).unwrap();
    assert!(conversion.was_chunked);
    assert_eq!(conversion.sql, "SELECT 1;\nSELECT 2;");
}

#[test]
fn auto_mode_respects_threshold_boundary() {
    let config = ChunkerConfig {
        max_chars: 60,
        max_lines: 200,
    };
    let options = ConvertOptions {
        config,
        mode: ChunkingMode::Auto,
        preprocess: false,
    };

    // Exactly at the threshold: converted in one shot even though the
    // script has a splittable shape.
    let sql = format!(
        "SELECT 1; SELECT '{}'",
        "x".repeat(60 - "SELECT 1; SELECT ''".len())
    );
    assert_eq!(sql.chars().count(), 60);
    let conversion = convert_script(&sql, &options, identity).unwrap();
    assert!(!conversion.was_chunked);

    // One character over: chunked.
    let over = format!("{sql}x");
    let conversion = convert_script(&over, &options, identity).unwrap();
    assert!(conversion.was_chunked);
    assert_eq!(conversion.fragment_count, 2);
}

#[test]
fn preprocessing_resolves_hivevars_before_chunking() {
    let sql = "set hivevar:target=db.out;\nINSERT OVERWRITE TABLE ${target} SELECT * FROM src";
    let mut options = tiny_thresholds();
    options.preprocess = true;

    let conversion = convert_script(sql, &options, identity).unwrap();

    assert!(conversion.sql.contains("CREATE OR REPLACE TABLE `db.out` AS"));
    assert!(!conversion.sql.contains("${target}"));
    assert!(!conversion.sql.to_lowercase().contains("set hivevar"));
}

#[test]
fn translated_fragments_keep_relative_order() {
    let sql = "SELECT 'a' UNION ALL SELECT 'b' UNION ALL SELECT 'c'";
    let mut counter = 0;
    let conversion = convert_script(sql, &tiny_thresholds(), |fragment| {
        counter += 1;
        Ok(format!("{fragment} /* step {counter} */"))
    })
    .unwrap();

    let first = conversion.sql.find("step 1").unwrap();
    let second = conversion.sql.find("step 2").unwrap();
    let third = conversion.sql.find("step 3").unwrap();
    assert!(first < second && second < third);
}

#[test]
fn translator_error_aborts_conversion() {
    let sql = "SELECT 1; SELECT 2";
    let result = convert_script(sql, &tiny_thresholds(), |_| {
        anyhow::bail!("quota exhausted")
    });

    let err = result.unwrap_err();
    assert!(err.to_string().contains("translation failed"));
}
