//! Helpers for reading table definitions back from SQLite's catalog.
//!
//! SQLite keeps table constraints only in the original `CREATE TABLE`
//! statement, so named constraints are recovered by scanning that text.

use regex::Regex;

use crate::error::{MigrateError, Result};
use crate::schema::ConstraintSchema;

const CONSTRAINT_PATTERN: &str = r#"(?i)\bCONSTRAINT\s+("(?:[^"]|"")+"|`[^`]+`|\[[^\]]+\]|\w+)\s+(UNIQUE|CHECK)\s*\("#;

/// Extracts named UNIQUE and CHECK constraints from `CREATE TABLE`
/// statements.
///
/// The pattern is compiled once; a backend keeps one parser for its
/// lifetime.
#[derive(Debug, Clone)]
pub struct ConstraintParser {
    pattern: Regex,
}

impl ConstraintParser {
    /// Compiles the constraint pattern.
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(CONSTRAINT_PATTERN)
            .map_err(|e| MigrateError::InvalidState(format!("constraint pattern: {e}")))?;
        Ok(Self { pattern })
    }

    /// Returns the constraints of `create_sql`, in the order they appear.
    #[must_use]
    pub fn parse(&self, create_sql: &str) -> Vec<ConstraintSchema> {
        let mut constraints = Vec::new();
        for captures in self.pattern.captures_iter(create_sql) {
            let (Some(whole), Some(name), Some(kind)) =
                (captures.get(0), captures.get(1), captures.get(2))
            else {
                continue;
            };
            let Some(body) = balanced_body(&create_sql[whole.end()..]) else {
                continue;
            };
            let name = unquote(name.as_str());
            if kind.as_str().eq_ignore_ascii_case("UNIQUE") {
                constraints.push(ConstraintSchema::Unique {
                    name,
                    columns: body.split(',').map(|c| unquote(c.trim())).collect(),
                });
            } else {
                constraints.push(ConstraintSchema::Check {
                    name,
                    expression: body.trim().to_string(),
                });
            }
        }
        constraints
    }
}

/// Returns the text up to the parenthesis closing an already opened one.
fn balanced_body(rest: &str) -> Option<&str> {
    let mut depth = 1usize;
    let mut in_string = false;
    for (i, ch) in rest.char_indices() {
        match ch {
            '\'' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&rest[..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strips SQLite identifier quoting (`"x"`, `` `x` ``, `[x]`).
pub fn unquote(identifier: &str) -> String {
    let trimmed = identifier.trim();
    let quoted = [('"', '"'), ('`', '`'), ('[', ']')]
        .iter()
        .find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|s| s.strip_suffix(*close))
        });
    match quoted {
        Some(inner) if trimmed.starts_with('"') => inner.replace("\"\"", "\""),
        Some(inner) => inner.to_string(),
        None => trimmed.to_string(),
    }
}
