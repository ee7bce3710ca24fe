//! Filtering capabilities for the joined school table
//!
//! Predicates evaluated against Arrow record batches, and the
//! checkbox-driven two-stage filter built on them.

pub mod core;
pub mod expr;
pub mod selection;

pub use self::core::filter_record_batch;
pub use self::expr::{Expr, evaluate_expr, filter_with_expr};
pub use self::selection::{Selection, filter_schools, level_predicate, sector_predicate};
