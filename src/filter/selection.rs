//! Two-stage checkbox filtering of the joined school table
//!
//! The sector stage runs first and the level stage runs on its output. A
//! stage whose two checkboxes are both off selects nothing at all, and that
//! outcome is carried as [`Selection::NoRows`] so the next stage can pass it
//! through without touching any table.

use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::filter::expr::{Expr, filter_with_expr};
use crate::join::{LEVEL_COLUMN, SECTOR_COLUMN, SchoolTable};
use crate::session::{FilterFlags, PUBLIC_SECTOR, SchoolLevel};

/// Outcome of a filter stage
#[derive(Debug, Clone)]
pub enum Selection {
    /// The rows that passed every stage so far (possibly zero of them)
    Rows(RecordBatch),
    /// A stage had both of its checkboxes off
    NoRows,
}

impl Selection {
    #[must_use]
    pub fn num_rows(&self) -> usize {
        match self {
            Self::Rows(batch) => batch.num_rows(),
            Self::NoRows => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// The selected rows, if any stage produced a table
    #[must_use]
    pub fn batch(&self) -> Option<&RecordBatch> {
        match self {
            Self::Rows(batch) => Some(batch),
            Self::NoRows => None,
        }
    }

    /// Run one more stage; `None` is a stage that selects nothing
    pub fn then(self, predicate: Option<&Expr>) -> Result<Self> {
        match (self, predicate) {
            (Self::NoRows, _) | (_, None) => Ok(Self::NoRows),
            (Self::Rows(batch), Some(expr)) => Ok(Self::Rows(filter_with_expr(&batch, expr)?)),
        }
    }
}

/// Predicate of the sector stage
///
/// "Private" covers every sector value other than public.
#[must_use]
pub fn sector_predicate(flags: &FilterFlags) -> Option<Expr> {
    match (flags.show_public, flags.show_private) {
        (true, false) => Some(Expr::eq(SECTOR_COLUMN, PUBLIC_SECTOR)),
        (false, true) => Some(Expr::not_eq(SECTOR_COLUMN, PUBLIC_SECTOR)),
        (true, true) => Some(Expr::AlwaysTrue),
        (false, false) => None,
    }
}

/// Predicate of the level stage
#[must_use]
pub fn level_predicate(flags: &FilterFlags) -> Option<Expr> {
    match (flags.show_middle, flags.show_high) {
        (true, false) => Some(Expr::eq(LEVEL_COLUMN, SchoolLevel::Middle.label())),
        (false, true) => Some(Expr::eq(LEVEL_COLUMN, SchoolLevel::High.label())),
        (true, true) => Some(Expr::AlwaysTrue),
        (false, false) => None,
    }
}

/// Apply the checkbox flags to the joined table: sector first, then level
pub fn filter_schools(table: &SchoolTable, flags: &FilterFlags) -> Result<Selection> {
    let selection = Selection::Rows(table.batch().clone())
        .then(sector_predicate(flags).as_ref())?
        .then(level_predicate(flags).as_ref())?;

    log::debug!(
        "Filter {:?} kept {} of {} schools",
        flags,
        selection.num_rows(),
        table.num_rows()
    );
    Ok(selection)
}
