//! SQL chunking
//!
//! Splits a SQL script that is too large to translate in one shot into an
//! ordered sequence of typed fragments along syntactic boundaries: one
//! fragment per top-level statement, per CTE definition, per UNION branch,
//! plus synthetic header fragments for INSERT..SELECT and ALTER VIEW.
//! Chunking is best effort: any structure the chunker cannot take apart
//! safely stays whole as a single fragment, never losing content.

mod classify;

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ChunkerConfig;
use crate::scanner;

pub use classify::{shape_of, StatementShape};

static INSERT_SELECT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(INSERT\s+(?:OVERWRITE\s+)?(?:INTO\s+)?TABLE\s+\S+)\s+((?:WITH|SELECT).*)")
        .unwrap()
});

static ALTER_VIEW_SPLIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^(ALTER\s+VIEW\s+\S+\s+AS)\s+(SELECT.*)").unwrap());

static CTE_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^\s*WITH\s+(.*)").unwrap());

static CTE_HEAD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*(\w+)\s+AS\s*\(").unwrap());

/// Coarse kind of a standalone statement inside a multi-statement script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    CteQuery,
    Insert,
    AlterView,
    Create,
    Select,
    Use,
    Other,
}

impl StatementKind {
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::CteQuery => "cte_query",
            StatementKind::Insert => "insert",
            StatementKind::AlterView => "alter_view",
            StatementKind::Create => "create",
            StatementKind::Select => "select",
            StatementKind::Use => "use",
            StatementKind::Other => "other",
        }
    }
}

/// What role a fragment plays in the reassembled script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentKind {
    /// One CTE definition; `Fragment::name` holds the alias and the content
    /// is the parenthesized body including the parentheses.
    Cte,
    /// The main query following a CTE chain, or an entire statement when no
    /// finer split applied.
    Main,
    /// A SELECT body split off an INSERT or ALTER VIEW header.
    Select,
    /// The `INSERT .. TABLE <name>` prefix; rewritten locally, not translated.
    InsertHeader,
    /// The `ALTER VIEW <name> AS` prefix; rewritten locally, not translated.
    AlterViewHeader,
    /// First branch of a top-level UNION chain.
    UnionFirst,
    /// Every subsequent UNION branch.
    UnionPart,
    /// An independent top-level statement from a multi-statement script,
    /// carrying its coarse kind for translator routing.
    Statement(StatementKind),
}

impl FragmentKind {
    pub fn label(&self) -> &'static str {
        match self {
            FragmentKind::Cte => "cte",
            FragmentKind::Main => "main",
            FragmentKind::Select => "select",
            FragmentKind::InsertHeader => "insert_header",
            FragmentKind::AlterViewHeader => "alter_view_header",
            FragmentKind::UnionFirst => "union_first",
            FragmentKind::UnionPart => "union_part",
            FragmentKind::Statement(kind) => kind.label(),
        }
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// The atomic unit of chunking: a slice of the input script plus enough
/// structure to put the translated pieces back together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub kind: FragmentKind,
    pub content: String,
    /// CTE alias for `FragmentKind::Cte`, unset otherwise.
    pub name: Option<String>,
    /// Position in the reassembled output. Assigned once at creation;
    /// sub-chunking re-indexes its fragments into the parent's index space.
    pub order_index: usize,
}

impl Fragment {
    fn new(kind: FragmentKind, content: impl Into<String>, order_index: usize) -> Self {
        Self {
            kind,
            content: content.into(),
            name: None,
            order_index,
        }
    }

    fn cte(name: impl Into<String>, content: impl Into<String>, order_index: usize) -> Self {
        Self {
            kind: FragmentKind::Cte,
            content: content.into(),
            name: Some(name.into()),
            order_index,
        }
    }
}

/// Splits one SQL script into translatable fragments.
///
/// Holds no state beyond the (trimmed) input and the thresholds, so
/// independent chunkers can run concurrently without coordination.
pub struct SqlChunker<'a> {
    sql: &'a str,
    config: &'a ChunkerConfig,
}

impl<'a> SqlChunker<'a> {
    pub fn new(sql: &'a str, config: &'a ChunkerConfig) -> Self {
        Self {
            sql: sql.trim(),
            config,
        }
    }

    /// True when either size threshold is exceeded (strict `>`).
    pub fn should_chunk(&self) -> bool {
        self.sql.chars().count() > self.config.max_chars
            || self.sql.matches('\n').count() > self.config.max_lines
    }

    /// Split the script into ordered fragments along its top-level structure.
    pub fn analyze_and_chunk(&self) -> Vec<Fragment> {
        let sql = self.sql;
        log::info!(
            "[chunker] analyzing SQL: {} chars, {} lines",
            sql.chars().count(),
            sql.matches('\n').count() + 1
        );

        match classify::shape_of(sql) {
            StatementShape::MultiStatement => {
                log::info!("[chunker] detected multiple statements");
                chunk_by_statements(sql)
            }
            StatementShape::InsertSelect => {
                log::info!("[chunker] detected INSERT..SELECT");
                chunk_insert_select(sql)
            }
            StatementShape::AlterView => {
                log::info!("[chunker] detected ALTER VIEW");
                chunk_alter_view(sql)
            }
            StatementShape::Cte => {
                log::info!("[chunker] detected WITH clause");
                chunk_by_cte(sql)
            }
            StatementShape::Union => {
                log::info!("[chunker] detected top-level UNION");
                chunk_by_union(sql)
            }
            StatementShape::Plain => {
                log::info!("[chunker] no chunking pattern detected, keeping statement whole");
                vec![Fragment::new(FragmentKind::Main, sql, 0)]
            }
        }
    }
}

/// Split on top-level semicolons; each statement keeps its coarse kind for
/// translator routing.
fn chunk_by_statements(sql: &str) -> Vec<Fragment> {
    let fragments: Vec<Fragment> = scanner::split_on_semicolons(sql)
        .into_iter()
        .enumerate()
        .map(|(i, stmt)| {
            Fragment::new(
                FragmentKind::Statement(classify::statement_kind(stmt)),
                stmt,
                i,
            )
        })
        .collect();
    log::info!("[chunker] split into {} statements", fragments.len());
    fragments
}

/// Split `INSERT .. TABLE <name> SELECT ..` into a header fragment and a
/// body, sub-chunking the body when it is itself a CTE chain or a UNION.
fn chunk_insert_select(sql: &str) -> Vec<Fragment> {
    let Some(caps) = INSERT_SELECT_RE.captures(sql) else {
        // Header did not match the expected shape; keep the statement whole.
        return vec![Fragment::new(
            FragmentKind::Statement(StatementKind::Insert),
            sql,
            0,
        )];
    };

    let header = caps.get(1).expect("header group").as_str();
    let body = caps.get(2).expect("body group").as_str();

    let mut fragments = vec![Fragment::new(FragmentKind::InsertHeader, header, 0)];
    if classify::has_cte(body) {
        splice_reindexed(&mut fragments, chunk_by_cte(body));
    } else if classify::has_union(body) {
        splice_reindexed(&mut fragments, chunk_by_union(body));
    } else {
        fragments.push(Fragment::new(FragmentKind::Select, body, 1));
    }

    log::info!(
        "[chunker] split INSERT..SELECT into {} fragments",
        fragments.len()
    );
    fragments
}

/// Split `ALTER VIEW <name> AS SELECT ..` into a header fragment and the
/// SELECT body. The body is not sub-chunked further.
fn chunk_alter_view(sql: &str) -> Vec<Fragment> {
    let Some(caps) = ALTER_VIEW_SPLIT_RE.captures(sql) else {
        return vec![Fragment::new(
            FragmentKind::Statement(StatementKind::AlterView),
            sql,
            0,
        )];
    };

    let header = caps.get(1).expect("header group").as_str();
    let body = caps.get(2).expect("body group").as_str();
    vec![
        Fragment::new(FragmentKind::AlterViewHeader, header, 0),
        Fragment::new(FragmentKind::Select, body, 1),
    ]
}

/// Split a `WITH a AS (..), b AS (..) SELECT ..` chain into one fragment
/// per CTE plus the main query. A parse failure keeps the whole original
/// statement as a single fragment so no content is ever dropped.
fn chunk_by_cte(sql: &str) -> Vec<Fragment> {
    let Some(caps) = CTE_STRIP_RE.captures(sql) else {
        return vec![Fragment::new(FragmentKind::Main, sql, 0)];
    };
    let after_with = caps.get(1).expect("WITH body group").as_str();

    let (blocks, main_query) = parse_cte_blocks(after_with);
    if blocks.is_empty() {
        log::warn!("[chunker] WITH clause present but no CTE blocks parsed, keeping statement whole");
        return vec![Fragment::new(FragmentKind::Main, sql, 0)];
    }

    let block_count = blocks.len();
    let mut fragments: Vec<Fragment> = blocks
        .into_iter()
        .enumerate()
        .map(|(i, (name, definition))| Fragment::cte(name, definition, i))
        .collect();
    if !main_query.is_empty() {
        fragments.push(Fragment::new(FragmentKind::Main, main_query, block_count));
    }

    log::info!(
        "[chunker] split CTE query into {} fragments ({} CTEs)",
        fragments.len(),
        block_count
    );
    fragments
}

/// Iteratively parse `name AS ( .. )` blocks off the front of the text
/// following `WITH`, chaining on commas. Whatever remains after the last
/// parsed block is the main query, so a mid-chain parse failure leaves the
/// unparsed tail (and all its content) in the main query.
fn parse_cte_blocks(text: &str) -> (Vec<(String, String)>, String) {
    let mut blocks = Vec::new();
    let mut remaining = text;

    loop {
        let Some(caps) = CTE_HEAD_RE.captures(remaining) else {
            break;
        };
        let head = caps.get(0).expect("whole match");
        let name = caps.get(1).expect("name group").as_str();
        let open = head.end() - 1;

        let Some(close) = scanner::find_matching_paren(remaining, open) else {
            break;
        };

        blocks.push((name.to_string(), remaining[open..=close].to_string()));
        remaining = remaining[close + 1..].trim_start();

        match remaining.strip_prefix(',') {
            Some(rest) => remaining = rest.trim_start(),
            None => break,
        }
    }

    (blocks, remaining.trim().to_string())
}

/// Split at top-level `UNION` / `UNION ALL` boundaries. The classifier can
/// flag a UNION the splitter then fails to locate (masking and scanning
/// disagree on pathological input); that mismatch degrades to one fragment.
fn chunk_by_union(sql: &str) -> Vec<Fragment> {
    let spans = scanner::find_top_level_keywords(sql, &["UNION ALL", "UNION"]);
    if spans.is_empty() {
        log::warn!("[chunker] classifier saw a UNION but none found at top level");
        return vec![Fragment::new(FragmentKind::Main, sql, 0)];
    }

    let mut fragments = Vec::new();
    let mut prev_end = 0;
    for span in &spans {
        let part = sql[prev_end..span.start].trim();
        if !part.is_empty() {
            let kind = if fragments.is_empty() {
                FragmentKind::UnionFirst
            } else {
                FragmentKind::UnionPart
            };
            let index = fragments.len();
            fragments.push(Fragment::new(kind, part, index));
        }
        prev_end = span.end;
    }
    let last = sql[prev_end..].trim();
    if !last.is_empty() {
        let index = fragments.len();
        fragments.push(Fragment::new(FragmentKind::UnionPart, last, index));
    }

    log::info!("[chunker] split UNION query into {} branches", fragments.len());
    fragments
}

/// Append sub-fragments to a parent list, re-indexing them to follow the
/// fragments already present.
fn splice_reindexed(parent: &mut Vec<Fragment>, sub: Vec<Fragment>) {
    let base = parent.len();
    for (i, mut fragment) in sub.into_iter().enumerate() {
        fragment.order_index = base + i;
        parent.push(fragment);
    }
}
