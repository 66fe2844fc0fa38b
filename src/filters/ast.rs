//! Structured filter types handed to topology queries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A predicate over a single key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Predicate {
    /// Exact match: `key=value`
    Equal(String),
    /// Membership match: `key in (a, b)`
    In(Vec<String>),
    /// Negation of the inner predicate: `key!=value`, `key !in (a, b)`
    Not(Box<Predicate>),
}

/// A predicate bound to the key it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub key: String,
    pub predicate: Predicate,
}

impl Filter {
    pub fn equal(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            predicate: Predicate::Equal(value.into()),
        }
    }

    pub fn is_in<I, S>(key: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key: key.into(),
            predicate: Predicate::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Wrap this filter's predicate in a negation, keeping the key.
    pub fn negate(self) -> Self {
        Self {
            key: self.key,
            predicate: Predicate::Not(Box::new(self.predicate)),
        }
    }
}

/// Label and kind filters for one query. Each list is an implicit AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filters {
    pub label_filters: Vec<Filter>,
    pub kind_filters: Vec<Filter>,
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Equal(value) => write!(f, "= {value}"),
            Predicate::In(values) => write!(f, "in ({})", values.join(", ")),
            Predicate::Not(inner) => match inner.as_ref() {
                Predicate::Equal(value) => write!(f, "!= {value}"),
                Predicate::In(values) => write!(f, "!in ({})", values.join(", ")),
                other => write!(f, "not ({other})"),
            },
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.key, self.predicate)
    }
}
