//! Structural classification of SQL statements
//!
//! Decides, in priority order, which chunking strategy applies to a
//! statement. The order matters because shapes overlap: an INSERT..SELECT
//! whose body opens with a CTE must be handled as INSERT..SELECT first and
//! only then sub-chunked as a CTE.

use std::sync::LazyLock;

use regex::Regex;

use crate::scanner;
use crate::util::{contains_ci, starts_with_ci};

use super::StatementKind;

static ALTER_VIEW_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*ALTER\s+VIEW\b").unwrap());

static CTE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^\s*WITH\s").unwrap());

static UNION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bUNION(\s+ALL)?\b").unwrap());

/// Top-level shape of a statement, in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementShape {
    MultiStatement,
    InsertSelect,
    AlterView,
    Cte,
    Union,
    Plain,
}

/// Classify a statement; first matching shape wins.
pub fn shape_of(sql: &str) -> StatementShape {
    if has_multiple_statements(sql) {
        StatementShape::MultiStatement
    } else if is_insert_select(sql) {
        StatementShape::InsertSelect
    } else if is_alter_view(sql) {
        StatementShape::AlterView
    } else if has_cte(sql) {
        StatementShape::Cte
    } else if has_union(sql) {
        StatementShape::Union
    } else {
        StatementShape::Plain
    }
}

/// More than one non-empty top-level-semicolon-delimited segment.
pub fn has_multiple_statements(sql: &str) -> bool {
    scanner::split_on_semicolons(sql).len() > 1
}

/// `INSERT [OVERWRITE] [INTO] TABLE .. SELECT` or `.. WITH` prefix shape.
pub fn is_insert_select(sql: &str) -> bool {
    let sql = sql.trim_start();
    starts_with_ci(sql, "INSERT") && (contains_ci(sql, "SELECT") || contains_ci(sql, "WITH"))
}

/// `ALTER VIEW ..` prefix (whitespace between the keywords may be anything).
pub fn is_alter_view(sql: &str) -> bool {
    ALTER_VIEW_RE.is_match(sql)
}

/// Leading `WITH` clause.
pub fn has_cte(sql: &str) -> bool {
    CTE_RE.is_match(sql)
}

/// A `UNION` / `UNION ALL` at the top level. Tested on a masked copy so a
/// UNION inside a subquery or a string literal never counts.
pub fn has_union(sql: &str) -> bool {
    let masked = scanner::mask_parenthesized(&scanner::mask_string_literals(sql));
    UNION_RE.is_match(&masked)
}

/// Coarse kind of an individual statement, from its leading keyword. Used
/// to route fragments of a multi-statement script through the translator
/// driver (`Use` is dropped there; everything else is translated).
pub fn statement_kind(stmt: &str) -> StatementKind {
    let stmt = stmt.trim_start();
    if starts_with_ci(stmt, "WITH") {
        StatementKind::CteQuery
    } else if is_alter_view(stmt) {
        StatementKind::AlterView
    } else if starts_with_ci(stmt, "INSERT") {
        StatementKind::Insert
    } else if starts_with_ci(stmt, "CREATE") {
        StatementKind::Create
    } else if starts_with_ci(stmt, "SELECT") {
        StatementKind::Select
    } else if starts_with_ci(stmt, "USE") {
        StatementKind::Use
    } else {
        StatementKind::Other
    }
}
