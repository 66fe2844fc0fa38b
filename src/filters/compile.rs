//! Compile label and kind query strings into [`Filters`].

use super::ast::{Filter, Filters};
use super::clause::{Operand, ParsedClause, parse_clause, split_clauses};
use super::error::{FilterError, Result};
use crate::topo::ObjectType;

/// Why a clause produced no filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The clause matches none of the recognized operators.
    Unrecognized,
    /// Kind filters are not compiled yet.
    KindFiltersUnsupported,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedClause {
    pub clause: String,
    pub reason: SkipReason,
}

/// Filters compiled from one query, plus the non-empty clauses that were
/// left out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compilation {
    pub filters: Vec<Filter>,
    pub skipped: Vec<SkippedClause>,
}

impl Compilation {
    /// Log every skipped clause and return the filters.
    pub fn into_filters(self) -> Vec<Filter> {
        for skipped in &self.skipped {
            match skipped.reason {
                SkipReason::Unrecognized => {
                    tracing::warn!("Filters: Ignoring unrecognized clause '{}'", skipped.clause)
                }
                SkipReason::KindFiltersUnsupported => tracing::warn!(
                    "Filters: Kind filtering is not supported yet; ignoring '{}'",
                    skipped.clause
                ),
            }
        }
        self.filters
    }

    /// Fail on the first unrecognized clause. Unsupported kind clauses are
    /// still only warned about.
    pub fn into_strict_filters(self) -> Result<Vec<Filter>> {
        if let Some(skipped) = self
            .skipped
            .iter()
            .find(|s| s.reason == SkipReason::Unrecognized)
        {
            return Err(FilterError::UnrecognizedClause {
                clause: skipped.clause.clone(),
            });
        }
        Ok(self.into_filters())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    pub strict: bool,
}

/// Map a parsed clause onto its filter node.
pub fn build_filter(clause: ParsedClause<'_>) -> Filter {
    let filter = match clause.operand {
        Operand::Single(value) => Filter::equal(clause.key, value),
        Operand::List(values) => Filter::is_in(clause.key, values),
    };
    if clause.operator.is_negated() {
        filter.negate()
    } else {
        filter
    }
}

fn compile_clauses<F>(query: &str, mut compile_one: F) -> Result<Compilation>
where
    F: FnMut(&str) -> Result<std::result::Result<Filter, SkipReason>>,
{
    let mut compilation = Compilation::default();
    for clause in split_clauses(query) {
        match compile_one(clause)? {
            Ok(filter) => compilation.filters.push(filter),
            Err(_) if clause.is_empty() => {}
            Err(reason) => compilation.skipped.push(SkippedClause {
                clause: clause.to_string(),
                reason,
            }),
        }
    }
    Ok(compilation)
}

/// Compile a label query, reporting the clauses that were dropped.
pub fn compile_label_clauses(query: &str) -> Result<Compilation> {
    compile_clauses(query, |clause| {
        Ok(parse_clause(clause)?
            .map(build_filter)
            .ok_or(SkipReason::Unrecognized))
    })
}

/// Compile a kind query, reporting the clauses that were dropped.
///
/// Kind filtering is not implemented: every clause is skipped.
pub fn compile_kind_clauses(query: &str) -> Result<Compilation> {
    compile_clauses(query, |_| Ok(Err(SkipReason::KindFiltersUnsupported)))
}

/// Compile a label query. Unrecognized clauses are dropped.
pub fn compile_label_filters(query: &str) -> Result<Vec<Filter>> {
    Ok(compile_label_clauses(query)?.into_filters())
}

/// Compile a kind query. Always empty.
pub fn compile_kind_filters(query: &str) -> Result<Vec<Filter>> {
    Ok(compile_kind_clauses(query)?.into_filters())
}

/// Compile the filters for a query over `object_type`. Kind filters are only
/// compiled for kind and relation queries.
pub fn compile_filters(
    object_type: ObjectType,
    label_query: &str,
    kind_query: &str,
    options: CompileOptions,
) -> Result<Filters> {
    let label_filters = if options.strict {
        compile_label_clauses(label_query)?.into_strict_filters()?
    } else {
        compile_label_filters(label_query)?
    };
    let kind_filters = if !object_type.targets_kinds() {
        Vec::new()
    } else if options.strict {
        compile_kind_clauses(kind_query)?.into_strict_filters()?
    } else {
        compile_kind_filters(kind_query)?
    };

    tracing::debug!(
        "Filters: {} label, {} kind for {:?}",
        label_filters.len(),
        kind_filters.len(),
        object_type
    );

    Ok(Filters {
        label_filters,
        kind_filters,
    })
}
