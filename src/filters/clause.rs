//! Clause splitting, operator classification and key/value extraction.
//!
//! A query is a comma separated list of clauses:
//!
//! clause   = key operator rhs
//! operator = "=" | "!=" | " in (" | " !in ("
//! rhs      = literal                      (for = and !=)
//!          | literal ("," literal)* ")"   (for in and !in)
//!
//! There is no escaping. Commas between an ` in (` / ` !in (` marker and the
//! first `)` after it belong to that value list and never split the query;
//! any other `(` or `)` is an ordinary literal character.

use std::ops::Range;
use winnow::combinator::terminated;
use winnow::prelude::*;
use winnow::token::take_till;

use super::error::{FilterError, Result};

// Manually define PResult for resilience against winnow version changes
type PResult<T> = std::result::Result<T, winnow::error::ErrMode<winnow::error::ContextError>>;

/// Operator forms recognized in a clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    NotIn,    //  !in (
    In,       //  in (
    NotEqual, // !=
    Equal,    // =
}

/// Operator patterns in the order they are tested. `!=` contains `=`, and a
/// value list may contain either, so the longer forms go first.
pub const OPERATORS: [(&str, Operator); 4] = [
    (" !in (", Operator::NotIn),
    (" in (", Operator::In),
    ("!=", Operator::NotEqual),
    ("=", Operator::Equal),
];

impl Operator {
    pub fn is_negated(self) -> bool {
        matches!(self, Operator::NotIn | Operator::NotEqual)
    }

    pub fn is_membership(self) -> bool {
        matches!(self, Operator::NotIn | Operator::In)
    }
}

/// Right-hand side of a clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand<'a> {
    Single(&'a str),
    List(Vec<&'a str>),
}

/// A clause broken into key, operator and operand. All parts are trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClause<'a> {
    pub key: &'a str,
    pub operator: Operator,
    pub operand: Operand<'a>,
}

/// Split a query on commas, trimming each clause. Commas inside a
/// membership value list do not split.
///
/// An empty query yields a single empty clause.
pub fn split_clauses(query: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut start = 0;
    let mut pos = 0;

    while let Some(c) = query[pos..].chars().next() {
        if let Some(marker) = membership_marker(&query[pos..]) {
            // skip to just past the first ')' of the list, or to the end
            let list_start = pos + marker.len();
            pos = query[list_start..]
                .find(')')
                .map_or(query.len(), |end| list_start + end + 1);
            continue;
        }
        if c == ',' {
            clauses.push(query[start..pos].trim());
            start = pos + 1;
        }
        pos += c.len_utf8();
    }
    clauses.push(query[start..].trim());
    clauses
}

/// The membership operator pattern `input` starts with, if any.
fn membership_marker(input: &str) -> Option<&'static str> {
    OPERATORS
        .iter()
        .find(|(pattern, op)| op.is_membership() && input.starts_with(pattern))
        .map(|(pattern, _)| *pattern)
}

/// Find the highest priority operator present in the clause, with the byte
/// range of its first occurrence.
pub fn classify(clause: &str) -> Option<(Operator, Range<usize>)> {
    OPERATORS.iter().find_map(|(pattern, op)| {
        clause
            .find(pattern)
            .map(|pos| (*op, pos..pos + pattern.len()))
    })
}

/// Classify a clause and extract its key and values.
///
/// Returns `Ok(None)` for clauses that match no operator.
pub fn parse_clause(clause: &str) -> Result<Option<ParsedClause<'_>>> {
    let Some((operator, token)) = classify(clause) else {
        return Ok(None);
    };

    let key = clause[..token.start].trim();
    let rhs = &clause[token.end..];

    let operand = if operator.is_membership() {
        Operand::List(extract_values(clause, rhs)?)
    } else {
        Operand::Single(rhs.trim())
    };

    Ok(Some(ParsedClause {
        key,
        operator,
        operand,
    }))
}

/// Everything up to the first `)`, consuming the parenthesis.
fn value_list<'a>(input: &mut &'a str) -> PResult<&'a str> {
    terminated(take_till(0.., ')'), ')').parse_next(input)
}

/// Parse the remainder of a membership clause (just past the opening
/// parenthesis) into trimmed values. Empty elements are kept.
fn extract_values<'a>(clause: &str, rhs: &'a str) -> Result<Vec<&'a str>> {
    let mut remaining = rhs;
    let inner = value_list(&mut remaining).map_err(|_| FilterError::UnclosedValueList {
        clause: clause.to_string(),
    })?;

    if inner.trim().is_empty() {
        return Err(FilterError::EmptyValueList {
            clause: clause.to_string(),
        });
    }

    Ok(inner.split(',').map(str::trim).collect())
}
