//! Translator driver and reassembly unit tests.

use pretty_assertions::assert_eq;
use sparkbq_chunker::chunker::{Fragment, FragmentKind, StatementKind};
use sparkbq_chunker::convert::{
    convert_fragments, merge_fragments, rewrite_alter_view_header, rewrite_insert_header,
};

fn fragment(kind: FragmentKind, content: &str, order_index: usize) -> Fragment {
    Fragment {
        kind,
        content: content.to_string(),
        name: None,
        order_index,
    }
}

fn cte(name: &str, content: &str, order_index: usize) -> Fragment {
    Fragment {
        kind: FragmentKind::Cte,
        content: content.to_string(),
        name: Some(name.to_string()),
        order_index,
    }
}

fn identity(sql: &str) -> anyhow::Result<String> {
    Ok(sql.to_string())
}

#[test]
fn insert_header_rewrite() {
    assert_eq!(
        rewrite_insert_header("INSERT OVERWRITE TABLE db.tbl"),
        "CREATE OR REPLACE TABLE `db.tbl` AS"
    );
    assert_eq!(
        rewrite_insert_header("INSERT INTO TABLE db.tbl"),
        "CREATE OR REPLACE TABLE `db.tbl` AS"
    );
    assert_eq!(
        rewrite_insert_header("insert overwrite table `db.tbl`"),
        "CREATE OR REPLACE TABLE `db.tbl` AS"
    );
}

#[test]
fn malformed_insert_header_passes_through() {
    let header = "INSERT INTO t VALUES";
    assert_eq!(rewrite_insert_header(header), header);
}

#[test]
fn alter_view_header_rewrite() {
    assert_eq!(
        rewrite_alter_view_header("ALTER VIEW db.v AS"),
        "CREATE OR REPLACE VIEW `db.v` AS"
    );
    assert_eq!(
        rewrite_alter_view_header("alter view `db.v` as"),
        "CREATE OR REPLACE VIEW `db.v` AS"
    );
}

#[test]
fn malformed_alter_view_header_passes_through() {
    let header = "ALTER VIEW broken";
    assert_eq!(rewrite_alter_view_header(header), header);
}

#[test]
fn single_fragment_merges_unchanged() {
    let fragments = vec![fragment(FragmentKind::Main, "  SELECT 1  ", 0)];
    assert_eq!(merge_fragments(&fragments), "  SELECT 1  ");
}

#[test]
fn empty_fragment_list_merges_to_empty_string() {
    assert_eq!(merge_fragments(&[]), "");
}

#[test]
fn cte_chain_is_reconstructed() {
    let fragments = vec![
        cte("a", "(SELECT 1)", 0),
        cte("b", "(SELECT 2)", 1),
        fragment(FragmentKind::Main, "SELECT * FROM a, b", 2),
    ];
    assert_eq!(
        merge_fragments(&fragments),
        "WITH a AS (SELECT 1)\n, b AS (SELECT 2)\nSELECT * FROM a, b"
    );
}

#[test]
fn union_branches_join_with_union_all() {
    let fragments = vec![
        fragment(FragmentKind::UnionFirst, "SELECT 1", 0),
        fragment(FragmentKind::UnionPart, "SELECT 2", 1),
        fragment(FragmentKind::UnionPart, "SELECT 3", 2),
    ];
    assert_eq!(
        merge_fragments(&fragments),
        "SELECT 1\nUNION ALL\nSELECT 2\nUNION ALL\nSELECT 3"
    );
}

#[test]
fn statements_keep_terminators() {
    let fragments = vec![
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 1", 0),
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 2", 1),
    ];
    assert_eq!(merge_fragments(&fragments), "SELECT 1;\nSELECT 2;");
}

#[test]
fn header_placed_first_by_kind_not_index() {
    let fragments = vec![
        fragment(FragmentKind::Select, "SELECT * FROM src", 0),
        fragment(FragmentKind::InsertHeader, "CREATE OR REPLACE TABLE `t` AS", 5),
    ];
    assert_eq!(
        merge_fragments(&fragments),
        "CREATE OR REPLACE TABLE `t` AS\nSELECT * FROM src"
    );
}

#[test]
fn merge_respects_order_index_not_array_position() {
    let fragments = vec![
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 2", 1),
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 1", 0),
    ];
    assert_eq!(merge_fragments(&fragments), "SELECT 1;\nSELECT 2;");
}

#[test]
fn driver_rewrites_headers_without_calling_translator() {
    let fragments = vec![
        fragment(FragmentKind::InsertHeader, "INSERT OVERWRITE TABLE db.tbl", 0),
        fragment(FragmentKind::Select, "SELECT * FROM src", 1),
    ];

    let mut calls = Vec::new();
    let merged = convert_fragments(fragments, &mut |sql: &str| {
        calls.push(sql.to_string());
        Ok(sql.to_string())
    })
    .unwrap();

    assert_eq!(calls, vec!["SELECT * FROM src"]);
    assert_eq!(
        merged,
        "CREATE OR REPLACE TABLE `db.tbl` AS\nSELECT * FROM src"
    );
}

#[test]
fn driver_drops_use_statements() {
    let fragments = vec![
        fragment(FragmentKind::Statement(StatementKind::Use), "USE analytics", 0),
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 1", 1),
        fragment(FragmentKind::Statement(StatementKind::Select), "SELECT 2", 2),
    ];

    let merged = convert_fragments(fragments, &mut identity).unwrap();
    assert_eq!(merged, "SELECT 1;\nSELECT 2;");
}

#[test]
fn driver_translates_in_order() {
    let fragments = vec![
        fragment(FragmentKind::UnionPart, "SELECT 2", 1),
        fragment(FragmentKind::UnionFirst, "SELECT 1", 0),
    ];

    let mut seen = Vec::new();
    convert_fragments(fragments, &mut |sql: &str| {
        seen.push(sql.to_string());
        Ok(sql.to_string())
    })
    .unwrap();

    assert_eq!(seen, vec!["SELECT 1", "SELECT 2"]);
}

#[test]
fn translator_failure_propagates_with_fragment_context() {
    let fragments = vec![
        fragment(FragmentKind::UnionFirst, "SELECT 1", 0),
        fragment(FragmentKind::UnionPart, "SELECT 2", 1),
    ];

    let result = convert_fragments(fragments, &mut |sql: &str| {
        if sql.contains('2') {
            anyhow::bail!("model unavailable");
        }
        Ok(sql.to_string())
    });

    let err = result.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("fragment 1"));
    assert!(message.contains("union_part"));
}

#[test]
fn translated_content_replaces_fragment_content() {
    let fragments = vec![
        cte("a", "(SELECT 1)", 0),
        fragment(FragmentKind::Main, "SELECT * FROM a", 1),
    ];

    let merged = convert_fragments(fragments, &mut |sql: &str| {
        Ok(sql.replace("SELECT", "SELECT /* bq */"))
    })
    .unwrap();

    assert_eq!(
        merged,
        "WITH a AS (SELECT /* bq */ 1)\nSELECT /* bq */ * FROM a"
    );
}
