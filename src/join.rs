//! Joining IPS scores to school locations
//!
//! The two score tables are tagged with their school level, stacked, cleared
//! of rows without a score and inner-joined to the geocoding table on the
//! establishment identifier. The result is one Arrow table with a fixed
//! schema ([`SchoolTable`]); typed rows come out of it as [`JoinedRecord`]s.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::compute::{cast, concat_batches, take};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use itertools::{Itertools, MinMaxResult};
use rustc_hash::FxHashMap;

use crate::error::{IpsMapError, Result};
use crate::filter::expr::{Expr, filter_with_expr};
use crate::loader::{
    GEO_COMMUNE_COLUMN, GEO_ID_COLUMN, GEO_LATITUDE_COLUMN, GEO_LONGITUDE_COLUMN,
    GEO_NAME_COLUMN, GEO_POSTAL_CODE_COLUMN, SCORE_ID_COLUMN, ScoreTable,
};
use crate::session::{GeoPoint, SchoolLevel};

/// Establishment identifier in the joined table
pub const ID_COLUMN: &str = SCORE_ID_COLUMN;
/// IPS score, `Float64`, never null in the joined table
pub const SCORE_COLUMN: &str = "ips";
/// School level label (`collège` / `lycée`)
pub const LEVEL_COLUMN: &str = "type";
/// Sector as found in the score tables
pub const SECTOR_COLUMN: &str = crate::loader::SECTOR_COLUMN;

/// Schema of the stacked score tables
fn scores_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(ID_COLUMN, DataType::Utf8, true),
        Field::new(SCORE_COLUMN, DataType::Float64, true),
        Field::new(LEVEL_COLUMN, DataType::Utf8, false),
        Field::new(SECTOR_COLUMN, DataType::Utf8, true),
    ]))
}

/// One joined school, ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct JoinedRecord {
    pub uai: String,
    pub score: f64,
    pub level: SchoolLevel,
    pub sector: String,
    pub name: Option<String>,
    pub commune: Option<String>,
    pub postal_code: Option<String>,
    pub point: GeoPoint,
}

/// The joined table: every score column followed by every geocoding column
#[derive(Debug, Clone)]
pub struct SchoolTable {
    batch: RecordBatch,
}

impl SchoolTable {
    /// Wrap a batch after checking it carries the columns the pipeline reads
    pub fn try_new(batch: RecordBatch) -> Result<Self> {
        let required = [
            (ID_COLUMN, DataType::Utf8),
            (SCORE_COLUMN, DataType::Float64),
            (LEVEL_COLUMN, DataType::Utf8),
            (SECTOR_COLUMN, DataType::Utf8),
            (GEO_LATITUDE_COLUMN, DataType::Float64),
            (GEO_LONGITUDE_COLUMN, DataType::Float64),
        ];
        let schema = batch.schema();
        for (column, expected) in required {
            let field = schema
                .field_with_name(column)
                .map_err(|_| IpsMapError::missing_column("joined table", column))?;
            if field.data_type() != &expected {
                return Err(IpsMapError::ColumnType {
                    column: column.to_string(),
                    expected: expected.to_string(),
                    found: field.data_type().to_string(),
                });
            }
        }
        Ok(Self { batch })
    }

    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    /// Smallest and largest score, `None` for an empty table
    pub fn score_range(&self) -> Result<Option<(f64, f64)>> {
        let scores = float_column(&self.batch, SCORE_COLUMN)?;
        let range = match scores.iter().flatten().minmax_by(f64::total_cmp) {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(v) => Some((v, v)),
            MinMaxResult::MinMax(min, max) => Some((min, max)),
        };
        Ok(range)
    }

    /// All rows as typed records
    pub fn records(&self) -> Result<Vec<JoinedRecord>> {
        records_from_batch(&self.batch)
    }
}

/// Read typed records out of a joined (and possibly filtered) batch
pub fn records_from_batch(batch: &RecordBatch) -> Result<Vec<JoinedRecord>> {
    let ids = string_column(batch, ID_COLUMN)?;
    let scores = float_column(batch, SCORE_COLUMN)?;
    let levels = string_column(batch, LEVEL_COLUMN)?;
    let sectors = string_column(batch, SECTOR_COLUMN)?;
    let names = string_column(batch, GEO_NAME_COLUMN)?;
    let communes = string_column(batch, GEO_COMMUNE_COLUMN)?;
    let postal_codes = string_column(batch, GEO_POSTAL_CODE_COLUMN)?;
    let latitudes = float_column(batch, GEO_LATITUDE_COLUMN)?;
    let longitudes = float_column(batch, GEO_LONGITUDE_COLUMN)?;

    let optional = |array: &StringArray, row: usize| {
        (!array.is_null(row)).then(|| array.value(row).to_string())
    };

    (0..batch.num_rows())
        .map(|row| {
            let level = match levels.value(row) {
                label if label == SchoolLevel::Middle.label() => SchoolLevel::Middle,
                label if label == SchoolLevel::High.label() => SchoolLevel::High,
                other => {
                    return Err(IpsMapError::Filter(format!(
                        "Unknown school level '{other}' in row {row}"
                    )));
                }
            };
            Ok(JoinedRecord {
                uai: ids.value(row).to_string(),
                score: scores.value(row),
                level,
                sector: optional(sectors, row).unwrap_or_default(),
                name: optional(names, row),
                commune: optional(communes, row),
                postal_code: optional(postal_codes, row),
                point: GeoPoint::new(latitudes.value(row), longitudes.value(row)),
            })
        })
        .collect()
}

/// Stack the score tables, each row tagged with its table's level
///
/// Identifier and sector columns are cast to text and the score column to
/// `Float64`; score cells that are not numbers become null.
pub fn stack_scores(tables: &[ScoreTable]) -> Result<RecordBatch> {
    let schema = scores_schema();
    let tagged = tables
        .iter()
        .map(|table| -> Result<RecordBatch> {
            let batch = &table.batch;
            let column = |name: &str| -> Result<ArrayRef> {
                let idx = batch
                    .schema_ref()
                    .index_of(name)
                    .map_err(|_| IpsMapError::missing_column("score table", name))?;
                Ok(batch.column(idx).clone())
            };
            let ids = cast(&column(SCORE_ID_COLUMN)?, &DataType::Utf8)?;
            let scores = cast(&column(&table.score_column)?, &DataType::Float64)?;
            let levels: ArrayRef = Arc::new(StringArray::from(vec![
                table.level.label();
                batch.num_rows()
            ]));
            let sectors = cast(&column(SECTOR_COLUMN)?, &DataType::Utf8)?;
            Ok(RecordBatch::try_new(
                schema.clone(),
                vec![ids, scores, levels, sectors],
            )?)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(concat_batches(&schema, &tagged)?)
}

/// Inner-join the score tables to the geocoding table
///
/// Rows without a score are dropped first. Score rows whose identifier has
/// no geocoding row with coordinates are dropped as well; an identifier
/// listed several times in the geocoding table yields one row per listing.
/// Output order follows the score tables, then the geocoding table.
pub fn join_scores(tables: &[ScoreTable], geocoding: &RecordBatch) -> Result<SchoolTable> {
    let stacked = stack_scores(tables)?;
    let scored = filter_with_expr(&stacked, &Expr::IsNotNull(SCORE_COLUMN.to_string()))?;
    log::debug!(
        "Dropped {} score rows without an IPS value",
        stacked.num_rows() - scored.num_rows()
    );

    let geo_ids = string_column(geocoding, GEO_ID_COLUMN)?;
    let latitudes = float_column(geocoding, GEO_LATITUDE_COLUMN)?;
    let longitudes = float_column(geocoding, GEO_LONGITUDE_COLUMN)?;

    let mut index: FxHashMap<&str, Vec<u32>> = FxHashMap::default();
    for row in 0..geocoding.num_rows() {
        if geo_ids.is_null(row) || latitudes.is_null(row) || longitudes.is_null(row) {
            continue;
        }
        index
            .entry(geo_ids.value(row))
            .or_default()
            .push(row_index(row)?);
    }

    let score_ids = string_column(&scored, ID_COLUMN)?;
    let mut left = Vec::with_capacity(scored.num_rows());
    let mut right = Vec::with_capacity(scored.num_rows());
    for row in 0..scored.num_rows() {
        if score_ids.is_null(row) {
            continue;
        }
        if let Some(matches) = index.get(score_ids.value(row)) {
            for &geo_row in matches {
                left.push(row_index(row)?);
                right.push(geo_row);
            }
        }
    }
    let left = UInt32Array::from(left);
    let right = UInt32Array::from(right);
    log::debug!(
        "Joined {} of {} scored schools to a location",
        left.len(),
        scored.num_rows()
    );

    let mut fields = Vec::with_capacity(scored.num_columns() + geocoding.num_columns());
    let mut columns = Vec::with_capacity(fields.capacity());
    for (field, column) in scored.schema().fields().iter().zip(scored.columns()) {
        fields.push(field.as_ref().clone());
        columns.push(take(column.as_ref(), &left, None)?);
    }
    for (field, column) in geocoding.schema().fields().iter().zip(geocoding.columns()) {
        fields.push(field.as_ref().clone());
        columns.push(take(column.as_ref(), &right, None)?);
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    SchoolTable::try_new(batch)
}

fn row_index(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| IpsMapError::Filter(format!("Row {row} exceeds u32 index range")))
}

fn string_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    typed_column(batch, name, "Utf8")
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    typed_column(batch, name, "Float64")
}

fn typed_column<'a, T: Array + 'static>(
    batch: &'a RecordBatch,
    name: &str,
    expected: &str,
) -> Result<&'a T> {
    let idx = batch
        .schema_ref()
        .index_of(name)
        .map_err(|_| IpsMapError::missing_column("table", name))?;
    let column = batch.column(idx);
    column
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| IpsMapError::ColumnType {
            column: name.to_string(),
            expected: expected.to_string(),
            found: column.data_type().to_string(),
        })
}
