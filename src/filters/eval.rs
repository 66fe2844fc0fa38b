//! Evaluate compiled filters against a topology object's labels and kind.

use super::ast::{Filter, Filters, Predicate};
use std::collections::HashMap;

/// True when every label filter holds against `labels` and every kind filter
/// holds against `kind`.
pub fn evaluate_filters(filters: &Filters, labels: &HashMap<String, String>, kind: &str) -> bool {
    filters
        .label_filters
        .iter()
        .all(|filter| evaluate_filter(filter, labels))
        && filters
            .kind_filters
            .iter()
            .all(|filter| evaluate_predicate(&filter.predicate, Some(kind)))
}

/// Evaluate a single filter against a label map.
pub fn evaluate_filter(filter: &Filter, labels: &HashMap<String, String>) -> bool {
    evaluate_predicate(
        &filter.predicate,
        labels.get(&filter.key).map(String::as_str),
    )
}

fn evaluate_predicate(predicate: &Predicate, actual: Option<&str>) -> bool {
    match predicate {
        Predicate::Equal(expected) => actual == Some(expected.as_str()),
        Predicate::In(values) => actual.is_some_and(|a| values.iter().any(|v| v == a)),
        Predicate::Not(inner) => !evaluate_predicate(inner, actual),
    }
}
