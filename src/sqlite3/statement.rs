use super::value::SqlValue;
use crate::error::StoreError;

/// Parameters bound to a statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Params {
    #[default]
    None,
    /// Matched in order to `?` placeholders.
    Positional(Vec<SqlValue>),
    /// Matched by name to `:name`, `@name` or `$name` placeholders.
    Named(Vec<(String, SqlValue)>),
}

/// SQL text plus its bound parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    sql: String,
    params: Params,
    mixed: bool,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Params::None,
            mixed: false,
        }
    }

    /// Bare names in `Params::Named` are treated as `:name`, as in [`bind_named`].
    ///
    /// [`bind_named`]: Statement::bind_named
    pub fn with_params(sql: impl Into<String>, params: Params) -> Self {
        let params = match params {
            Params::Named(named) => Params::Named(
                named
                    .into_iter()
                    .map(|(name, value)| (prefixed(name), value))
                    .collect(),
            ),
            other => other,
        };
        Self {
            sql: sql.into(),
            params,
            mixed: false,
        }
    }

    /// Appends a positional parameter.
    pub fn bind(mut self, value: impl Into<SqlValue>) -> Self {
        match self.params {
            Params::None => self.params = Params::Positional(vec![value.into()]),
            Params::Positional(ref mut values) => values.push(value.into()),
            Params::Named(_) => self.mixed = true,
        }
        self
    }

    /// Binds a named parameter. A bare `name` is treated as `:name`.
    pub fn bind_named(mut self, name: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        let name = prefixed(name.into());
        match self.params {
            Params::None => self.params = Params::Named(vec![(name, value.into())]),
            Params::Named(ref mut values) => match values.iter_mut().find(|(k, _)| *k == name) {
                Some(slot) => slot.1 = value.into(),
                None => values.push((name, value.into())),
            },
            Params::Positional(_) => self.mixed = true,
        }
        self
    }

    /// Resolves the statement into SQL with only numbered placeholders and
    /// the argument list in slot order.
    pub(crate) fn into_positional(self) -> Result<(String, Vec<SqlValue>), StoreError> {
        if self.mixed {
            return Err(StoreError::MixedParameters);
        }
        match self.params {
            Params::None => Ok((self.sql, Vec::new())),
            Params::Positional(values) => Ok((self.sql, values)),
            Params::Named(named) => {
                let (sql, names) = number_named_placeholders(&self.sql);
                let values = names
                    .iter()
                    .map(|name| {
                        named
                            .iter()
                            .find(|(k, _)| k == name)
                            .map(|(_, v)| v.clone())
                            .ok_or_else(|| StoreError::MissingParameter(name.clone()))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok((sql, values))
            }
        }
    }
}

impl From<&str> for Statement {
    fn from(sql: &str) -> Self {
        Statement::new(sql)
    }
}

impl From<String> for Statement {
    fn from(sql: String) -> Self {
        Statement::new(sql)
    }
}

fn prefixed(mut name: String) -> String {
    if !name.starts_with([':', '@', '$']) {
        name.insert(0, ':');
    }
    name
}

/// Rewrites each named placeholder to `?N`, where N is the 1-based position
/// of the name's first occurrence. Quoted strings, identifiers and comments
/// are copied untouched.
fn number_named_placeholders(sql: &str) -> (String, Vec<String>) {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut names: Vec<String> = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            q @ (b'\'' | b'"' | b'`') => i = skip_past(bytes, i + 1, q),
            b'[' => i = skip_past(bytes, i + 1, b']'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => i = skip_past(bytes, i + 2, b'\n'),
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = sql[i + 2..]
                    .find("*/")
                    .map_or(bytes.len(), |end| i + 2 + end + 2);
            }
            b':' | b'@' | b'$' if bytes.get(i + 1).is_some_and(|b| is_ident_byte(*b)) => {
                let end = (i + 1..bytes.len())
                    .find(|&j| !is_ident_byte(bytes[j]))
                    .unwrap_or(bytes.len());
                let name = &sql[i..end];
                let slot = match names.iter().position(|n| n == name) {
                    Some(pos) => pos,
                    None => {
                        names.push(name.to_string());
                        names.len() - 1
                    }
                };
                out.push_str(&sql[start..i]);
                out.push('?');
                out.push_str(&(slot + 1).to_string());
                start = end;
                i = end;
            }
            _ => i += 1,
        }
    }
    out.push_str(&sql[start..]);
    (out, names)
}

fn skip_past(bytes: &[u8], from: usize, delim: u8) -> usize {
    bytes
        .get(from..)
        .and_then(|rest| rest.iter().position(|b| *b == delim))
        .map_or(bytes.len(), |pos| from + pos + 1)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}
