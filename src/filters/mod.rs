//! Filter-expression compiler for topology queries.
//!
//! Syntax (clauses joined by `,`, all clauses must hold):
//!   key=value               - exact match
//!   key!=value              - not equal (also matches when the label is absent)
//!   key in (v1, v2, v3)     - match any value
//!   key !in (v1, v2)        - match none of the values
//!
//! Clauses that match no operator are dropped unless compiling strictly.

mod ast;
mod clause;
mod compile;
mod error;
mod eval;

pub use ast::*;
pub use compile::{CompileOptions, compile_filters, compile_kind_filters, compile_label_filters};
pub use eval::evaluate_filters;
