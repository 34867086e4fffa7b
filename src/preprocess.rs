//! Spark/Hive script preprocessing
//!
//! Hive scripts commonly open with `set hivevar:name=value;` definitions
//! and reference them later as `${name}` or `${hivevar:name}`. The target
//! dialect has neither, so before chunking the definitions are stripped and
//! the references resolved:
//!
//! - a plain literal value is substituted directly
//! - a dynamic value (one containing `${` or a call like `zdt.addDay(-1)`)
//!   is replaced by a stable `placeholder_<name>` token
//! - any remaining `${..}` macro with no matching definition becomes
//!   `dummy_var`
//!
//! Definition lines inside `--` comments are left alone.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static HIVEVAR_DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*set\s+hivevar:(\w+)\s*=\s*([^;\r\n]*);?[ \t]*$").unwrap()
});

static MACRO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$\{([^}]*)\}").unwrap());

/// Strip hivevar definitions and resolve all `${..}` references.
pub fn preprocess_script(sql: &str) -> String {
    let variables = collect_variables(sql);
    if !variables.is_empty() {
        log::info!("[preprocess] resolved {} hivevar definitions", variables.len());
    }

    let stripped = HIVEVAR_DEF_RE.replace_all(sql, "");

    MACRO_RE
        .replace_all(&stripped, |caps: &Captures| {
            let reference = caps.get(1).expect("macro body group").as_str();
            let name = reference.strip_prefix("hivevar:").unwrap_or(reference);
            match variables.get(name) {
                Some(value) => value.clone(),
                None => "dummy_var".to_string(),
            }
        })
        .into_owned()
}

/// Gather `set hivevar:` definitions, mapping dynamic values to placeholder
/// tokens so later substitution stays deterministic.
fn collect_variables(sql: &str) -> HashMap<String, String> {
    let mut variables = HashMap::new();
    for caps in HIVEVAR_DEF_RE.captures_iter(sql) {
        let name = caps.get(1).expect("name group").as_str();
        let value = caps.get(2).expect("value group").as_str().trim();

        let resolved = if value.contains("${") || value.contains('(') {
            format!("placeholder_{name}")
        } else {
            value.to_string()
        };
        variables.insert(name.to_string(), resolved);
    }
    variables
}
