use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority. Stored as its integer value; lower sorts first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High = 1,
    #[default]
    Middle = 2,
    Low = 3,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::High, Priority::Middle, Priority::Low];

    pub fn value(self) -> i64 {
        self as i64
    }

    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "High",
            Priority::Middle => "Middle",
            Priority::Low => "Low",
        }
    }
}

impl TryFrom<i64> for Priority {
    type Error = StoreError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Priority::ALL
            .into_iter()
            .find(|p| p.value() == value)
            .ok_or_else(|| StoreError::decode("PRIORITY", format!("unknown priority {value}")))
    }
}

impl FromStr for Priority {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(n) = s.parse::<i64>() {
            return Priority::try_from(n);
        }
        Priority::ALL
            .into_iter()
            .find(|p| p.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| StoreError::decode("PRIORITY", format!("unknown priority {s:?}")))
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
