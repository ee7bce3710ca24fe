//! End-to-end tests: reference files on disk through to the rendered page

mod utils;

use std::fs;

use ips_map::colormap::IPS_PALETTE;
use ips_map::join::{ID_COLUMN, LEVEL_COLUMN};
use ips_map::loader::GEOCODING_COLUMNS;
use ips_map::{
    Dataset, FilterFlags, GeoPoint, Interaction, IpsMapError, SchoolLevel, ViewState, ViewerConfig,
    Viewport, filter_schools, load_reference_data,
};

use utils::{JOINED_COUNT, JOINED_RANGE, reference_fixture, write_score_parquet};

fn flags(middle: bool, high: bool, public: bool, private: bool) -> FilterFlags {
    FilterFlags {
        show_middle: middle,
        show_high: high,
        show_public: public,
        show_private: private,
    }
}

fn view(flags: FilterFlags) -> ViewState {
    ViewState {
        flags,
        ..ViewState::default()
    }
}

#[test]
fn reference_files_load_with_their_shapes() {
    let (_dir, config) = reference_fixture();
    let reference = load_reference_data(&config).unwrap();

    assert_eq!(reference.boundaries.len(), 2);
    assert_eq!(reference.scores.len(), 2);
    assert_eq!(reference.scores[0].level, SchoolLevel::Middle);
    assert_eq!(reference.scores[0].batch.num_rows(), 4);
    assert_eq!(reference.scores[1].level, SchoolLevel::High);
    assert_eq!(reference.scores[1].score_column, "ips_voie_gt");
    assert_eq!(reference.scores[1].batch.num_columns(), 3);

    assert_eq!(reference.geocoding.num_rows(), 7);
    assert_eq!(reference.geocoding.num_columns(), GEOCODING_COLUMNS.len());

    let france = reference.boundary("NAME", "France").unwrap();
    assert!(matches!(
        france.geometry.value,
        geojson::Value::MultiPolygon(_)
    ));
}

#[test]
fn join_drops_unscored_and_unlocated_schools() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let records = dataset.schools().records().unwrap();
    assert_eq!(records.len(), JOINED_COUNT);

    let mut ids = records.iter().map(|r| r.uai.as_str()).collect::<Vec<_>>();
    ids.sort_unstable();
    assert_eq!(ids, ["0010001A", "0010002B", "0750001A", "0750002B"]);

    let scale = dataset.scale();
    assert_eq!((scale.vmin, scale.vmax), JOINED_RANGE);
    assert_eq!(scale.caption, "Indice de Position Sociale (IPS)");

    let stanislas = records.iter().find(|r| r.uai == "0750002B").unwrap();
    assert_eq!(stanislas.level, SchoolLevel::High);
    assert_eq!(stanislas.point, GeoPoint::new(48.84, 2.33));
    assert_eq!(stanislas.postal_code.as_deref(), Some("75006"));
    assert_eq!(stanislas.sector, "privé sous contrat");
}

#[test]
fn null_score_is_dropped_before_the_join() {
    let (_dir, config) = reference_fixture();
    let paths = &config.paths;
    write_score_parquet(
        &paths.resolve(&paths.middle_scores.file),
        &paths.middle_scores.score_column,
        &[("A1", "public", Some(95.0)), ("A2", "public", None)],
    );
    write_score_parquet(
        &paths.resolve(&paths.high_scores.file),
        &paths.high_scores.score_column,
        &[("B1", "public", Some(101.0))],
    );
    fs::write(
        paths.geocoding_path(),
        "Identifiant_de_l_etablissement;Nom_etablissement;multi_uai;latitude;longitude;Nom_commune;Code_postal;Code_commune;libelle_nature\n\
         A1;Collège A;0;48.8;2.3;Paris;75001;75101;COLLEGE\n\
         A2;Collège B;0;48.9;2.4;Paris;75002;75102;COLLEGE\n",
    )
    .unwrap();

    let dataset = Dataset::load(config).unwrap();
    let records = dataset.schools().records().unwrap();

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].uai, "A1");
    assert_eq!(records[0].score, 95.0);
    assert_eq!(records[0].point, GeoPoint::new(48.8, 2.3));
}

#[test]
fn initial_view_shows_public_middle_schools() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let doc = dataset.render(&ViewState::default()).unwrap();
    assert_eq!(doc.viewport.center, GeoPoint::new(46.2276, 2.2137));
    assert_eq!(doc.viewport.zoom, 6);
    assert_eq!(doc.title, "Carte des établissements avec IPS");
    assert_eq!(doc.boundary.name, "France");
    assert_eq!(doc.schools.name, "Établissements");

    assert_eq!(doc.schools.markers.len(), 1);
    let marker = &doc.schools.markers[0];
    assert_eq!(marker.location, GeoPoint::new(46.2, 5.22));
    assert_eq!(marker.popup, "Bourg-en-Bresse<br>IPS: 85.0<br>collège<br>public");
    // Lowest score of the whole table
    assert_eq!(marker.fill_color, IPS_PALETTE[0]);
    assert_eq!(marker.radius, 5.0);
    assert_eq!(marker.fill_opacity, 0.9);
}

#[test]
fn filtered_rows_satisfy_every_checked_box() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let selection = filter_schools(dataset.schools(), &flags(true, false, true, false)).unwrap();
    let batch = selection.batch().unwrap();
    let levels = batch
        .column_by_name(LEVEL_COLUMN)
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap();
    let sectors = batch
        .column_by_name("secteur")
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap();
    for row in 0..batch.num_rows() {
        assert_eq!(levels.value(row), "collège");
        assert_eq!(sectors.value(row), "public");
    }

    let selection = filter_schools(dataset.schools(), &flags(false, true, false, true)).unwrap();
    let ids = selection
        .batch()
        .unwrap()
        .column_by_name(ID_COLUMN)
        .unwrap()
        .as_any()
        .downcast_ref::<arrow::array::StringArray>()
        .unwrap()
        .iter()
        .flatten()
        .collect::<Vec<_>>();
    assert_eq!(ids, ["0750002B"]);

    let everything = filter_schools(dataset.schools(), &flags(true, true, true, true)).unwrap();
    assert_eq!(everything.num_rows(), JOINED_COUNT);
}

#[test]
fn both_levels_off_renders_nothing() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    for (public, private) in [(true, true), (true, false), (false, true), (false, false)] {
        let doc = dataset
            .render(&view(flags(false, false, public, private)))
            .unwrap();
        assert!(doc.schools.markers.is_empty());
        // The outline and legend are drawn regardless.
        assert_eq!(doc.legend.vmax, JOINED_RANGE.1);
    }

    let doc = dataset.render(&view(flags(true, true, false, false))).unwrap();
    assert!(doc.schools.markers.is_empty());
}

#[test]
fn colors_do_not_depend_on_the_filter() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let all = dataset.render(&view(flags(true, true, true, true))).unwrap();
    assert_eq!(all.schools.markers.len(), JOINED_COUNT);

    for narrow in [
        flags(true, false, true, false),
        flags(false, true, false, true),
        flags(true, true, false, true),
    ] {
        let doc = dataset.render(&view(narrow)).unwrap();
        assert_eq!(doc.legend, all.legend);
        for marker in &doc.schools.markers {
            let same = all
                .schools
                .markers
                .iter()
                .find(|m| m.location == marker.location)
                .unwrap();
            assert_eq!(marker.fill_color, same.fill_color);
        }
    }

    let highest = all
        .schools
        .markers
        .iter()
        .find(|m| m.location == GeoPoint::new(48.85, 2.36))
        .unwrap();
    assert_eq!(highest.fill_color, IPS_PALETTE[8]);
}

#[test]
fn rendering_twice_gives_the_same_page() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();
    let state = view(flags(true, true, true, false));

    let first = dataset.render(&state).unwrap();
    let second = dataset.render(&state).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_html().unwrap(), second.to_html().unwrap());
}

#[test]
fn page_reflects_the_checkboxes() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let html = dataset
        .render(&view(flags(false, true, false, true)))
        .unwrap()
        .to_html()
        .unwrap();
    assert!(html.contains(r#"name="middle"  onchange"#));
    assert!(html.contains(r#"name="high" checked onchange"#));
    assert!(html.contains(r#"name="private" checked onchange"#));
    assert!(html.contains("<title>Carte des établissements avec IPS</title>"));
    assert!(html.contains("Paris<br>IPS: 95.0<br>lycée<br>privé sous contrat"));
}

#[test]
fn view_state_carries_across_interactions() {
    let (_dir, config) = reference_fixture();
    let dataset = Dataset::load(config).unwrap();

    let state = ViewState::default();
    let (state, doc) = dataset
        .render_step(
            state,
            &Interaction {
                flags: flags(true, true, true, true),
                viewport: None,
            },
        )
        .unwrap();
    assert_eq!(state.viewport, Viewport::default());
    assert_eq!(doc.schools.markers.len(), JOINED_COUNT);

    let lyon = Viewport {
        center: GeoPoint::new(45.76, 4.83),
        zoom: 11,
    };
    let (state, doc) = dataset
        .render_step(
            state,
            &Interaction {
                flags: state.flags,
                viewport: Some(lyon),
            },
        )
        .unwrap();
    assert_eq!(doc.viewport, lyon);

    let (state, doc) = dataset
        .render_step(
            state,
            &Interaction {
                flags: flags(false, true, true, true),
                viewport: None,
            },
        )
        .unwrap();
    assert_eq!(state.viewport, lyon);
    assert_eq!(doc.viewport, lyon);
    assert_eq!(doc.schools.markers.len(), 2);
}

#[test]
fn unknown_country_is_fatal() {
    let (_dir, mut config) = reference_fixture();
    config.boundary_name = "Atlantis".to_string();

    let err = Dataset::load(config).unwrap_err();
    assert!(matches!(err, IpsMapError::BoundaryNotFound { .. }));
}

#[test]
fn missing_score_file_is_fatal() {
    let (dir, config) = reference_fixture();
    fs::remove_file(dir.path().join(&config.paths.high_scores.file)).unwrap();

    let err = Dataset::load(config).unwrap_err();
    assert!(matches!(err, IpsMapError::Io { .. }));
}

#[test]
fn missing_score_column_is_fatal() {
    let (_dir, config) = reference_fixture();
    let paths = &config.paths;
    write_score_parquet(
        &paths.resolve(&paths.high_scores.file),
        "ips_etab",
        &[("0750001A", "public", Some(130.0))],
    );

    let err = Dataset::load(config).unwrap_err();
    assert!(matches!(err, IpsMapError::MissingColumn { .. }));
}

#[test]
fn shared_dataset_is_loaded_once() {
    let (_dir, config) = reference_fixture();
    let first = Dataset::global(&config).unwrap();
    let second = Dataset::global(&ViewerConfig::default()).unwrap();

    assert!(std::ptr::eq(first, second));
    assert_eq!(first.schools().num_rows(), JOINED_COUNT);
}
