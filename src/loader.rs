//! Reference data loading
//!
//! Reads the three static datasets into memory: the two IPS score tables
//! (Parquet), the national school directory (CSV) and the country borders
//! (GeoJSON). Any missing or malformed file is fatal.

use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::ReaderBuilder;
use arrow::csv::reader::Format;
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use geojson::{GeoJson, Geometry};
use parquet::arrow::ProjectionMask;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use rayon::prelude::*;

use crate::config::{ScoreSource, ViewerConfig};
use crate::error::util::{read_without_bom, safe_open_file};
use crate::error::{IpsMapError, Result};
use crate::session::SchoolLevel;
use crate::utils::logging::{FileRead, log_warning};

/// Join key in the score tables
pub const SCORE_ID_COLUMN: &str = "uai";
/// Sector column in the score tables
pub const SECTOR_COLUMN: &str = "secteur";

/// Join key in the geocoding table
pub const GEO_ID_COLUMN: &str = "Identifiant_de_l_etablissement";
pub const GEO_NAME_COLUMN: &str = "Nom_etablissement";
pub const GEO_MULTI_UAI_COLUMN: &str = "multi_uai";
pub const GEO_LATITUDE_COLUMN: &str = "latitude";
pub const GEO_LONGITUDE_COLUMN: &str = "longitude";
pub const GEO_COMMUNE_COLUMN: &str = "Nom_commune";
pub const GEO_POSTAL_CODE_COLUMN: &str = "Code_postal";
pub const GEO_COMMUNE_CODE_COLUMN: &str = "Code_commune";
pub const GEO_NATURE_COLUMN: &str = "libelle_nature";

/// Geocoding columns kept after loading, in output order
pub const GEOCODING_COLUMNS: [&str; 9] = [
    GEO_NAME_COLUMN,
    GEO_ID_COLUMN,
    GEO_MULTI_UAI_COLUMN,
    GEO_LATITUDE_COLUMN,
    GEO_LONGITUDE_COLUMN,
    GEO_COMMUNE_COLUMN,
    GEO_POSTAL_CODE_COLUMN,
    GEO_COMMUNE_CODE_COLUMN,
    GEO_NATURE_COLUMN,
];

/// A named polygon used as a map outline
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryShape {
    pub name: String,
    pub geometry: Geometry,
}

/// One score table together with the level its rows belong to
#[derive(Debug, Clone)]
pub struct ScoreTable {
    pub level: SchoolLevel,
    pub score_column: String,
    pub batch: RecordBatch,
}

/// Everything read from disk, before any join
#[derive(Debug, Clone)]
pub struct ReferenceData {
    pub boundaries: Vec<BoundaryShape>,
    pub scores: Vec<ScoreTable>,
    pub geocoding: RecordBatch,
}

impl ReferenceData {
    /// The boundary whose name matches `name`
    pub fn boundary(&self, key: &str, name: &str) -> Result<&BoundaryShape> {
        self.boundaries
            .iter()
            .find(|shape| shape.name == name)
            .ok_or_else(|| IpsMapError::BoundaryNotFound {
                key: key.to_string(),
                name: name.to_string(),
            })
    }
}

/// Load every reference dataset named by the configuration
pub fn load_reference_data(config: &ViewerConfig) -> Result<ReferenceData> {
    let paths = &config.paths;

    let boundaries = read_boundaries(&paths.boundary_path(), &config.boundary_name_key)?;

    // The two score files are independent; read them side by side.
    let scores = paths
        .score_sources()
        .par_iter()
        .map(|source| read_score_table(&paths.resolve(&source.file), source))
        .collect::<Result<Vec<_>>>()?;

    let geocoding = read_geocoding_csv(&paths.geocoding_path())?;

    Ok(ReferenceData {
        boundaries,
        scores,
        geocoding,
    })
}

/// Read one score table, keeping only the columns the joiner needs
pub fn read_score_table(path: &Path, source: &ScoreSource) -> Result<ScoreTable> {
    let columns = [SCORE_ID_COLUMN, SECTOR_COLUMN, source.score_column.as_str()];
    let batch = read_parquet(path, Some(&columns[..]))?;

    for column in columns {
        if batch.schema().index_of(column).is_err() {
            return Err(IpsMapError::missing_column(
                &path.display().to_string(),
                column,
            ));
        }
    }

    Ok(ScoreTable {
        level: source.level,
        score_column: source.score_column.clone(),
        batch,
    })
}

/// Read a parquet file into a single record batch
///
/// With `columns`, only those columns are decoded; names absent from the
/// file are skipped with a warning.
pub fn read_parquet(path: &Path, columns: Option<&[&str]>) -> Result<RecordBatch> {
    let read = FileRead::start("parquet file", path);

    let file = safe_open_file(path, "reading parquet file")?;
    let reader_builder = ParquetRecordBatchReaderBuilder::try_new(file)?;

    let reader = if let Some(columns) = columns {
        let file_schema = reader_builder.schema();
        let mut projection = Vec::new();
        for name in columns {
            match file_schema.index_of(name) {
                Ok(idx) => projection.push(idx),
                Err(_) => log_warning(&format!("Field {name} not found in parquet file"), Some(path)),
            }
        }
        let mask = ProjectionMask::roots(reader_builder.parquet_schema(), projection);
        reader_builder.with_projection(mask).build()?
    } else {
        reader_builder.build()?
    };

    let schema = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;

    read.complete(batch.num_rows(), "rows");
    Ok(batch)
}

/// Read the national school directory
///
/// The file is `;`-separated with `"` quoting and may start with a UTF-8
/// byte-order mark. Every kept column is text except the coordinates, so
/// postal and commune codes keep their leading zeros. Rows with fewer fields
/// than the header read as null in the missing trailing columns.
pub fn read_geocoding_csv(path: &Path) -> Result<RecordBatch> {
    let read = FileRead::start("geocoding table", path);

    let bytes = read_without_bom(path, "reading geocoding table")?;

    let format = Format::default()
        .with_header(true)
        .with_delimiter(b';')
        .with_quote(b'"');
    // Only the header is needed: every column type is fixed below.
    let (header, _) = format.infer_schema(Cursor::new(&bytes), Some(0))?;

    let schema = geocoding_schema(&header);
    let projection = GEOCODING_COLUMNS
        .iter()
        .map(|column| {
            schema
                .index_of(column)
                .map_err(|_| IpsMapError::missing_column(&path.display().to_string(), column))
        })
        .collect::<Result<Vec<_>>>()?;

    let reader = ReaderBuilder::new(schema)
        .with_header(true)
        .with_delimiter(b';')
        .with_quote(b'"')
        .with_truncated_rows(true)
        .with_projection(projection)
        .build(Cursor::new(bytes))?;

    let projected: SchemaRef = reader.schema();
    let batches = reader.collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&projected, &batches)?;

    read.complete(batch.num_rows(), "rows");
    Ok(batch)
}

fn geocoding_schema(header: &Schema) -> SchemaRef {
    let fields = header
        .fields()
        .iter()
        .map(|field| {
            let name = field.name();
            let data_type = if name == GEO_LATITUDE_COLUMN || name == GEO_LONGITUDE_COLUMN {
                DataType::Float64
            } else {
                DataType::Utf8
            };
            Field::new(name, data_type, true)
        })
        .collect::<Vec<_>>();
    Arc::new(Schema::new(fields))
}

/// Read every polygon feature of a GeoJSON file, named by the `name_key` property
///
/// Features without a polygon geometry or without a string name are skipped.
pub fn read_boundaries(path: &Path, name_key: &str) -> Result<Vec<BoundaryShape>> {
    let read = FileRead::start("boundary shapes", path);

    let bytes = read_without_bom(path, "reading boundary shapes")?;
    let geojson = GeoJson::from_reader(bytes.as_slice())?;

    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(IpsMapError::Config(format!(
                "{} holds a bare geometry, expected named features",
                path.display()
            )));
        }
    };

    let shapes = features
        .into_iter()
        .filter_map(|feature| {
            let name = feature.property(name_key)?.as_str()?.to_string();
            let geometry = feature.geometry?;
            match geometry.value {
                geojson::Value::Polygon(_) | geojson::Value::MultiPolygon(_) => {
                    Some(BoundaryShape { name, geometry })
                }
                _ => None,
            }
        })
        .collect::<Vec<_>>();

    read.complete(shapes.len(), "features");
    Ok(shapes)
}
