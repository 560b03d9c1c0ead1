//! JSON field extraction expressions.
//!
//! Turns a logical "field X (optionally nested) of JSON column C" request into
//! the engine's native syntax: chained `->` / `->>` operators on PostgreSQL,
//! a single `json_extract(C, '$.path')` call on SQLite. The result is always
//! a scalar (text on PostgreSQL) suitable for a SELECT list, a WHERE clause,
//! or the right-hand side of a backfill UPDATE.

use crate::dialect::DatabaseType;
use crate::error::{SqlError, SqlResult};

/// Expression extracting top-level `field` of JSON `column`.
pub fn get_field(column: &str, field: &str, db_type: DatabaseType) -> SqlResult<String> {
    validate_segment(field, field)?;
    Ok(match db_type {
        DatabaseType::Postgresql => format!("{column}->>{}", literal(db_type, field)),
        DatabaseType::Sqlite => format!(
            "json_extract({column}, {})",
            literal(db_type, &format!("$.{field}"))
        ),
    })
}

/// Expression extracting the dot-separated `dot_path` of JSON `column`.
///
/// `"dshield.ip.asname"` becomes `col->'dshield'->'ip'->>'asname'` on
/// PostgreSQL and `json_extract(col, '$.dshield.ip.asname')` on SQLite.
pub fn get_nested_field(column: &str, dot_path: &str, db_type: DatabaseType) -> SqlResult<String> {
    let segments = split_path(dot_path)?;
    Ok(match db_type {
        DatabaseType::Postgresql => {
            let (last, parents) = segments
                .split_last()
                .ok_or_else(|| invalid(dot_path, "path is empty"))?;
            let mut expr = column.to_string();
            for segment in parents {
                expr.push_str(&format!("->{}", literal(db_type, segment)));
            }
            expr.push_str(&format!("->>{}", literal(db_type, last)));
            expr
        }
        DatabaseType::Sqlite => format!(
            "json_extract({column}, {})",
            literal(db_type, &format!("$.{}", segments.join(".")))
        ),
    })
}

fn literal(db_type: DatabaseType, value: &str) -> String {
    db_type.dialect().quote_literal(value)
}

fn split_path(dot_path: &str) -> SqlResult<Vec<&str>> {
    if dot_path.is_empty() {
        return Err(invalid(dot_path, "path is empty"));
    }
    let segments: Vec<&str> = dot_path.split('.').collect();
    for segment in &segments {
        validate_segment(segment, dot_path)?;
    }
    Ok(segments)
}

/// Segments are embedded inside single-quoted SQL literals and SQLite path
/// strings, so only identifier-like characters are accepted.
fn validate_segment(segment: &str, path: &str) -> SqlResult<()> {
    if segment.is_empty() {
        return Err(invalid(path, "empty path segment"));
    }
    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '-'))
    {
        return Err(invalid(path, &format!("unsupported character '{c}'")));
    }
    Ok(())
}

fn invalid(path: &str, reason: &str) -> SqlError {
    SqlError::InvalidJsonPath {
        path: path.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod tests;
