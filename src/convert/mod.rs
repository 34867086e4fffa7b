//! Fragment translation and reassembly
//!
//! Drives the externally supplied per-fragment translator over a chunked
//! script and merges the results back into one statement. Header fragments
//! are rewritten locally (a single identifier substitution needs no dialect
//! knowledge) and `USE` statements are dropped; everything else goes
//! through the translator verbatim, sequentially, in output order.

use std::sync::LazyLock;

use regex::Regex;

use crate::chunker::{Fragment, FragmentKind, StatementKind};
use crate::error::ChunkError;

static INSERT_TABLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*INSERT\s+(?:OVERWRITE\s+)?(?:INTO\s+)?TABLE\s+(\S+)").unwrap()
});

static ALTER_VIEW_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*ALTER\s+VIEW\s+(\S+)\s+AS").unwrap());

/// Translate every fragment that needs semantic conversion, rewrite header
/// fragments locally, drop `USE` statements, and merge the results.
///
/// The translator is called once per eligible fragment in ascending
/// `order_index` order. A translator failure is propagated immediately with
/// the failing fragment's position attached; nothing is retried here.
pub fn convert_fragments<F>(
    fragments: Vec<Fragment>,
    translate: &mut F,
) -> Result<String, ChunkError>
where
    F: FnMut(&str) -> anyhow::Result<String>,
{
    let mut fragments = fragments;
    fragments.sort_by_key(|f| f.order_index);

    let mut converted = Vec::with_capacity(fragments.len());
    for mut fragment in fragments {
        log::info!(
            "[converter] fragment {} ({}{})",
            fragment.order_index,
            fragment.kind,
            fragment
                .name
                .as_deref()
                .map(|n| format!(": {n}"))
                .unwrap_or_default()
        );

        match fragment.kind {
            FragmentKind::InsertHeader => {
                fragment.content = rewrite_insert_header(&fragment.content);
            }
            FragmentKind::AlterViewHeader => {
                fragment.content = rewrite_alter_view_header(&fragment.content);
            }
            FragmentKind::Statement(StatementKind::Use) => {
                // No session-scoped database selection in the target dialect.
                log::info!("[converter] dropping USE statement");
                continue;
            }
            FragmentKind::Cte
            | FragmentKind::Main
            | FragmentKind::Select
            | FragmentKind::UnionFirst
            | FragmentKind::UnionPart
            | FragmentKind::Statement(_) => {
                fragment.content =
                    translate(&fragment.content).map_err(|reason| ChunkError::Translation {
                        index: fragment.order_index,
                        kind: fragment.kind.label().to_string(),
                        reason,
                    })?;
            }
        }
        converted.push(fragment);
    }

    Ok(merge_fragments(&converted))
}

/// `INSERT [OVERWRITE] [INTO] TABLE <name> ..` becomes
/// `` CREATE OR REPLACE TABLE `<name>` AS ``. A header that does not match
/// the expected shape passes through unchanged; the downstream validation
/// stage will surface it as a syntax error.
pub fn rewrite_insert_header(header: &str) -> String {
    match INSERT_TABLE_RE.captures(header) {
        Some(caps) => {
            let table = caps
                .get(1)
                .expect("table name group")
                .as_str()
                .trim_matches('`');
            format!("CREATE OR REPLACE TABLE `{table}` AS")
        }
        None => {
            log::warn!("[converter] INSERT header did not match expected shape, passing through");
            header.to_string()
        }
    }
}

/// `ALTER VIEW <name> AS` becomes `` CREATE OR REPLACE VIEW `<name>` AS ``.
pub fn rewrite_alter_view_header(header: &str) -> String {
    match ALTER_VIEW_NAME_RE.captures(header) {
        Some(caps) => {
            let view = caps
                .get(1)
                .expect("view name group")
                .as_str()
                .trim_matches('`');
            format!("CREATE OR REPLACE VIEW `{view}` AS")
        }
        None => {
            log::warn!(
                "[converter] ALTER VIEW header did not match expected shape, passing through"
            );
            header.to_string()
        }
    }
}

/// Merge translated fragments into one script.
///
/// Headers come first (by kind, not by numeric index), then the rebuilt
/// `WITH` chain, then the body. Union branches are joined with `UNION ALL`;
/// independent statements keep a trailing `;`. A single fragment is
/// returned untouched.
pub fn merge_fragments(fragments: &[Fragment]) -> String {
    if fragments.is_empty() {
        return String::new();
    }
    if fragments.len() == 1 {
        return fragments[0].content.clone();
    }

    let mut ordered: Vec<&Fragment> = fragments.iter().collect();
    ordered.sort_by_key(|f| f.order_index);

    let mut headers: Vec<&str> = Vec::new();
    let mut cte_parts: Vec<(&str, &str)> = Vec::new();
    let mut body_parts: Vec<String> = Vec::new();
    let mut has_union = false;

    for fragment in ordered {
        let content = fragment.content.trim();
        match fragment.kind {
            FragmentKind::InsertHeader | FragmentKind::AlterViewHeader => {
                headers.push(content);
            }
            FragmentKind::Cte => {
                cte_parts.push((fragment.name.as_deref().unwrap_or_default(), content));
            }
            FragmentKind::UnionFirst | FragmentKind::UnionPart => {
                has_union = true;
                body_parts.push(content.to_string());
            }
            FragmentKind::Statement(kind) => {
                if kind == StatementKind::Use {
                    // Should have been dropped by the driver.
                    log::warn!("[converter] USE statement reached reassembly, merging as body");
                }
                body_parts.push(format!("{content};"));
            }
            FragmentKind::Main | FragmentKind::Select => {
                body_parts.push(content.to_string());
            }
        }
    }

    let mut blocks: Vec<String> = Vec::new();
    blocks.extend(headers.iter().map(|h| h.to_string()));

    if !cte_parts.is_empty() {
        let chain: Vec<String> = cte_parts
            .iter()
            .enumerate()
            .map(|(i, (name, definition))| {
                if i == 0 {
                    format!("WITH {name} AS {definition}")
                } else {
                    format!(", {name} AS {definition}")
                }
            })
            .collect();
        blocks.push(chain.join("\n"));
    }

    if !body_parts.is_empty() {
        if has_union {
            blocks.push(body_parts.join("\nUNION ALL\n"));
        } else {
            blocks.push(body_parts.join("\n"));
        }
    }

    blocks.join("\n")
}
