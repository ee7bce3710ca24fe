//! Expression-based filtering
//!
//! The predicates the school filter is built from, evaluated against Arrow
//! record batches. The result of evaluating an [`Expr`] is a boolean mask
//! with one entry per row.

use arrow::array::{Array, ArrayRef, BooleanArray, Scalar, StringArray};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{is_not_null, not, prep_null_mask_filter};
use arrow::record_batch::RecordBatch;

use crate::error::{IpsMapError, Result};
use crate::filter::core::filter_record_batch;

/// Represents a filter expression over a record batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Text column equals a value
    Eq(String, String),

    /// Text column differs from a value; null cells count as different
    NotEq(String, String),

    /// Column is not null
    IsNotNull(String),

    /// Always evaluates to true
    AlwaysTrue,
}

impl Expr {
    /// Column equals `value`
    pub fn eq(column: &str, value: &str) -> Self {
        Self::Eq(column.to_string(), value.to_string())
    }

    /// Column differs from `value`
    pub fn not_eq(column: &str, value: &str) -> Self {
        Self::NotEq(column.to_string(), value.to_string())
    }
}

/// Evaluate an expression against a record batch
///
/// The returned mask never contains nulls: a comparison against a null
/// cell is false.
pub fn evaluate_expr(batch: &RecordBatch, expr: &Expr) -> Result<BooleanArray> {
    match expr {
        Expr::AlwaysTrue => Ok(BooleanArray::from(vec![true; batch.num_rows()])),

        Expr::Eq(col_name, value) => {
            let column = column_by_name(batch, col_name)?;
            evaluate_eq(column, col_name, value)
        }

        Expr::NotEq(col_name, value) => {
            let column = column_by_name(batch, col_name)?;
            Ok(not(&evaluate_eq(column, col_name, value)?)?)
        }

        Expr::IsNotNull(col_name) => {
            Ok(is_not_null(column_by_name(batch, col_name)?.as_ref())?)
        }
    }
}

/// Filter a record batch with an expression
pub fn filter_with_expr(batch: &RecordBatch, expr: &Expr) -> Result<RecordBatch> {
    match expr {
        Expr::AlwaysTrue => Ok(batch.clone()),
        _ => filter_record_batch(batch, &evaluate_expr(batch, expr)?),
    }
}

fn column_by_name<'a>(batch: &'a RecordBatch, col_name: &str) -> Result<&'a ArrayRef> {
    batch
        .schema_ref()
        .index_of(col_name)
        .map(|idx| batch.column(idx))
        .map_err(|_| IpsMapError::Filter(format!("Column '{col_name}' not found")))
}

/// Equality mask with nulls folded to false
fn evaluate_eq(column: &ArrayRef, col_name: &str, value: &str) -> Result<BooleanArray> {
    let values = column
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| IpsMapError::ColumnType {
            column: col_name.to_string(),
            expected: "Utf8".to_string(),
            found: column.data_type().to_string(),
        })?;
    let mask = eq(values, &Scalar::new(StringArray::from(vec![value])))?;
    Ok(prep_null_mask_filter(&mask))
}
