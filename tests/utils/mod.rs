//! Fixture data shared by the integration tests
//!
//! Writes a small but complete set of reference files into a temporary
//! directory and returns a configuration pointing at it.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use ips_map::ViewerConfig;
use parquet::arrow::ArrowWriter;
use tempfile::TempDir;

/// One score row: identifier, sector, score
pub type ScoreRow = (&'static str, &'static str, Option<f64>);

/// Middle schools: one without a score, one absent from the directory
pub const MIDDLE_ROWS: [ScoreRow; 4] = [
    ("0010001A", "public", Some(85.0)),
    ("0010002B", "privé sous contrat", Some(120.0)),
    ("0010003C", "public", None),
    ("0010004D", "public", Some(100.0)),
];

/// High schools: one listed in the directory without coordinates
pub const HIGH_ROWS: [ScoreRow; 3] = [
    ("0750001A", "public", Some(130.0)),
    ("0750002B", "privé sous contrat", Some(95.0)),
    ("0750003C", "public", Some(110.0)),
];

/// Schools expected in the joined table
pub const JOINED_COUNT: usize = 4;
/// Score range of the joined table
pub const JOINED_RANGE: (f64, f64) = (85.0, 130.0);

pub const DIRECTORY_CSV: &str = "\u{feff}Identifiant_de_l_etablissement;Nom_etablissement;Type_etablissement;Statut_public_prive;multi_uai;latitude;longitude;Nom_commune;Code_postal;Code_commune;libelle_nature
0010001A;Collège Lalande;Collège;Public;0;46.2;5.22;Bourg-en-Bresse;01000;01053;COLLEGE
0010002B;\"Collège Saint-Pierre; site nord\";Collège;Privé;0;46.21;5.23;Bourg-en-Bresse;01000;01053;COLLEGE
0010003C;Collège Jean Moulin;Collège;Public;0;45.9;6.1;Annecy;74000;74010;COLLEGE
0750001A;Lycée Charlemagne;Lycée;Public;0;48.85;2.36;Paris;75004;75104;LYCEE GENERAL ET TECHNOLOGIQUE
0750002B;Lycée Stanislas;Lycée;Privé;0;48.84;2.33;Paris;75006;75106;LYCEE GENERAL ET TECHNOLOGIQUE
0750003C;Lycée sans adresse;Lycée;Public;0;;;Paris;75007;75107;LYCEE GENERAL ET TECHNOLOGIQUE
9999999Z;École élémentaire;Ecole;Public;0;43.6;1.44;Toulouse;31000;31555;ECOLE ELEMENTAIRE
";

pub const COUNTRIES_GEOJSON: &str = r#"{"type":"FeatureCollection","features":[
  {"type":"Feature","properties":{"NAME":"Belgium"},
   "geometry":{"type":"Polygon","coordinates":[[[2.5,49.5],[6.4,49.5],[6.4,51.5],[2.5,49.5]]]}},
  {"type":"Feature","properties":{"NAME":"France"},
   "geometry":{"type":"MultiPolygon","coordinates":[
     [[[-4.8,48.4],[2.5,51.1],[8.2,48.9],[7.5,43.8],[3.1,42.4],[-1.8,43.4],[-4.8,48.4]]],
     [[[8.5,41.4],[9.6,41.4],[9.4,43.0],[8.5,41.4]]]
   ]}}
]}"#;

/// Write a score table as parquet with the given score column name
pub fn write_score_parquet(path: &Path, score_column: &str, rows: &[ScoreRow]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("uai", DataType::Utf8, false),
        Field::new("nom_de_l_etablissment", DataType::Utf8, true),
        Field::new("secteur", DataType::Utf8, true),
        Field::new(score_column, DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.0))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| format!("Etablissement {}", r.0)),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.1))),
            Arc::new(Float64Array::from(
                rows.iter().map(|r| r.2).collect::<Vec<_>>(),
            )),
        ],
    )
    .unwrap();

    let file = fs::File::create(path).unwrap();
    let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();
}

/// Write every reference file into a fresh directory
///
/// The directory is removed when the returned [`TempDir`] is dropped.
pub fn reference_fixture() -> (TempDir, ViewerConfig) {
    let dir = tempfile::tempdir().unwrap();

    let mut config = ViewerConfig::default();
    config.paths.data_dir = dir.path().to_path_buf();

    let paths = &config.paths;
    write_score_parquet(
        &paths.resolve(&paths.middle_scores.file),
        &paths.middle_scores.score_column,
        &MIDDLE_ROWS,
    );
    write_score_parquet(
        &paths.resolve(&paths.high_scores.file),
        &paths.high_scores.score_column,
        &HIGH_ROWS,
    );
    fs::write(paths.geocoding_path(), DIRECTORY_CSV).unwrap();
    fs::write(paths.boundary_path(), COUNTRIES_GEOJSON).unwrap();

    (dir, config)
}
