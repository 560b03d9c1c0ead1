//! Engine-neutral parameter and result values.

use crate::error::{DbError, DbResult};

/// A single bind parameter or result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL
    Null,
    /// Integer (booleans are reported as 0/1)
    Integer(i64),
    /// Floating point
    Real(f64),
    /// Text (JSON documents are reported as their serialized text)
    Text(String),
}

impl SqlValue {
    /// True for SQL NULL
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    /// Integer view of this value; numeric text is parsed.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(v) => Some(*v),
            SqlValue::Real(v) => Some(*v as i64),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    /// Float view of this value; numeric text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Integer(v) => Some(*v as f64),
            SqlValue::Real(v) => Some(*v),
            SqlValue::Text(s) => s.trim().parse().ok(),
            SqlValue::Null => None,
        }
    }

    /// Text view of this value; numbers are formatted.
    pub fn as_text(&self) -> Option<String> {
        match self {
            SqlValue::Text(s) => Some(s.clone()),
            SqlValue::Integer(v) => Some(v.to_string()),
            SqlValue::Real(v) => Some(v.to_string()),
            SqlValue::Null => None,
        }
    }
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<i32> for SqlValue {
    fn from(v: i32) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<bool> for SqlValue {
    fn from(v: bool) -> Self {
        SqlValue::Integer(i64::from(v))
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(SqlValue::Null, Into::into)
    }
}

/// One result row, cells in SELECT-list order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<SqlValue>,
}

impl Row {
    /// Build a row from its cells
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self { values }
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no cells
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Cell at `idx`
    pub fn get(&self, idx: usize) -> DbResult<&SqlValue> {
        self.values.get(idx).ok_or_else(|| {
            DbError::ConversionError(format!(
                "column index {idx} out of range for row of {} columns",
                self.values.len()
            ))
        })
    }

    /// Non-null integer at `idx`
    pub fn get_i64(&self, idx: usize) -> DbResult<i64> {
        let value = self.get(idx)?;
        value
            .as_i64()
            .ok_or_else(|| DbError::ConversionError(format!("column {idx}: {value:?} is not an integer")))
    }

    /// Nullable integer at `idx`
    pub fn get_opt_i64(&self, idx: usize) -> DbResult<Option<i64>> {
        match self.get(idx)? {
            SqlValue::Null => Ok(None),
            _ => self.get_i64(idx).map(Some),
        }
    }

    /// Non-null float at `idx`
    pub fn get_f64(&self, idx: usize) -> DbResult<f64> {
        let value = self.get(idx)?;
        value
            .as_f64()
            .ok_or_else(|| DbError::ConversionError(format!("column {idx}: {value:?} is not a number")))
    }

    /// Non-null text at `idx`
    pub fn get_string(&self, idx: usize) -> DbResult<String> {
        let value = self.get(idx)?;
        value
            .as_text()
            .ok_or_else(|| DbError::ConversionError(format!("column {idx} is NULL")))
    }

    /// Nullable text at `idx`
    pub fn get_opt_string(&self, idx: usize) -> DbResult<Option<String>> {
        Ok(self.get(idx)?.as_text())
    }

    /// Boolean at `idx` (non-zero integers and `t`/`true` text are true)
    pub fn get_bool(&self, idx: usize) -> DbResult<bool> {
        match self.get(idx)? {
            SqlValue::Integer(v) => Ok(*v != 0),
            SqlValue::Text(s) => Ok(matches!(s.as_str(), "t" | "true" | "1")),
            other => Err(DbError::ConversionError(format!(
                "column {idx}: {other:?} is not a boolean"
            ))),
        }
    }

    /// Consume the row into its cells
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        assert_eq!(SqlValue::from(3_i32), SqlValue::Integer(3));
        assert_eq!(SqlValue::from(true), SqlValue::Integer(1));
        assert_eq!(SqlValue::from("x"), SqlValue::Text("x".to_string()));
        assert_eq!(SqlValue::from(None::<i64>), SqlValue::Null);
        assert_eq!(SqlValue::Text(" 16 ".to_string()).as_i64(), Some(16));
        assert_eq!(SqlValue::Text("abc".to_string()).as_i64(), None);
    }

    #[test]
    fn test_row_accessors() {
        let row = Row::new(vec![
            SqlValue::Integer(7),
            SqlValue::Text("16".to_string()),
            SqlValue::Null,
            SqlValue::Text("t".to_string()),
        ]);
        assert_eq!(row.len(), 4);
        assert_eq!(row.get_i64(0).unwrap(), 7);
        assert_eq!(row.get_i64(1).unwrap(), 16);
        assert_eq!(row.get_string(0).unwrap(), "7");
        assert_eq!(row.get_opt_string(2).unwrap(), None);
        assert_eq!(row.get_opt_i64(2).unwrap(), None);
        assert!(row.get_bool(3).unwrap());
        assert!(row.get_string(2).is_err());
        assert!(row.get(9).is_err());
    }
}
