use super::value::SqlValue;
use crate::error::StoreError;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One result row: column names and values kept as parallel lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Record {
    /// Pairs up the engine's column-name list with its value list.
    /// Extra entries on either side are dropped.
    pub fn from_parts(mut columns: Vec<String>, mut values: Vec<SqlValue>) -> Self {
        let len = columns.len().min(values.len());
        columns.truncate(len);
        values.truncate(len);
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    /// Looks a column up by name; exact match first, then ASCII case-insensitive.
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        let idx = self
            .columns
            .iter()
            .position(|c| c == column)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.eq_ignore_ascii_case(column))
            })?;
        self.values.get(idx)
    }

    fn required(&self, column: &str) -> Result<&SqlValue, StoreError> {
        self.get(column)
            .ok_or_else(|| StoreError::MissingColumn(column.to_string()))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64, StoreError> {
        self.get_opt_i64(column)?
            .ok_or_else(|| StoreError::decode(column, "unexpected NULL"))
    }

    pub fn get_opt_i64(&self, column: &str) -> Result<Option<i64>, StoreError> {
        match self.required(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(v) => Ok(Some(*v)),
            other => Err(StoreError::decode(
                column,
                format!("expected INTEGER, found {}", other.type_name()),
            )),
        }
    }

    pub fn get_text(&self, column: &str) -> Result<String, StoreError> {
        self.get_opt_text(column)?
            .ok_or_else(|| StoreError::decode(column, "unexpected NULL"))
    }

    pub fn get_opt_text(&self, column: &str) -> Result<Option<String>, StoreError> {
        match self.required(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(StoreError::decode(
                column,
                format!("expected TEXT, found {}", other.type_name()),
            )),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

/// Typed row decoder keyed by a declared column list.
pub trait FromRecord: Sized {
    /// Columns read by `from_record`, in SELECT order.
    const COLUMNS: &'static [&'static str];

    fn from_record(record: &Record) -> Result<Self, StoreError>;

    fn select_list() -> String {
        Self::COLUMNS.join(", ")
    }
}
