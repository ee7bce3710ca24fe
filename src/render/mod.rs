//! Map rendering
//!
//! [`render_map`] turns the filtered schools, the country outline, the color
//! scale and the view state into a [`MapDocument`]: a plain description of
//! every layer on the map. [`MapDocument::to_html`] lays it out as a Leaflet
//! page. The same inputs always give the same document.

mod html;

use serde::Serialize;

use crate::colormap::{Legend, LinearColormap, Rgb};
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::filter::Selection;
use crate::join::{JoinedRecord, records_from_batch};
use crate::loader::BoundaryShape;
use crate::session::{FilterFlags, GeoPoint, ViewState, Viewport};

pub use self::html::escape_html;

/// Page title
pub const MAP_TITLE: &str = "Carte des établissements avec IPS";
/// Name of the marker layer
pub const SCHOOL_LAYER: &str = "Établissements";

/// Country outline: stroke only
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryLayer {
    pub name: String,
    pub geometry: geojson::Geometry,
    pub color: String,
    pub weight: u32,
    pub fill: bool,
}

/// One school on the map
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    pub location: GeoPoint,
    pub radius: f64,
    pub color: Rgb,
    pub fill_color: Rgb,
    pub fill_opacity: f64,
    pub popup: String,
}

/// Group of school markers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerLayer {
    pub name: String,
    pub markers: Vec<CircleMarker>,
}

/// Facts about the running program shown next to the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostics {
    pub version: String,
    pub platform: String,
    pub working_dir: String,
}

impl Diagnostics {
    #[must_use]
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            working_dir: std::env::current_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|_| "unknown".to_string()),
        }
    }
}

/// Everything drawn on one render
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapDocument {
    pub title: String,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub flags: FilterFlags,
    pub boundary: BoundaryLayer,
    pub schools: MarkerLayer,
    pub legend: Legend,
    pub diagnostics: Diagnostics,
}

/// Label of a school marker: commune, score, level and sector
///
/// The score always shows a decimal part, `85.0` rather than `85`.
#[must_use]
pub fn popup_text(record: &JoinedRecord) -> String {
    format!(
        "{}<br>IPS: {:?}<br>{}<br>{}",
        escape_html(record.commune.as_deref().unwrap_or_default()),
        record.score,
        record.level,
        escape_html(&record.sector)
    )
}

/// Build the map for the current view state
pub fn render_map(
    selection: &Selection,
    boundary: &BoundaryShape,
    scale: &LinearColormap,
    state: &ViewState,
    config: &ViewerConfig,
) -> Result<MapDocument> {
    let records = match selection.batch() {
        Some(batch) => records_from_batch(batch)?,
        None => Vec::new(),
    };

    let markers = records
        .iter()
        .map(|record| {
            let color = scale.color(record.score);
            CircleMarker {
                location: record.point,
                radius: config.marker_radius,
                color,
                fill_color: color,
                fill_opacity: config.marker_fill_opacity,
                popup: popup_text(record),
            }
        })
        .collect::<Vec<_>>();

    log::debug!("Rendering {} markers", markers.len());

    Ok(MapDocument {
        title: MAP_TITLE.to_string(),
        viewport: state.viewport,
        width: config.map_width,
        height: config.map_height,
        flags: state.flags,
        boundary: BoundaryLayer {
            name: boundary.name.clone(),
            geometry: boundary.geometry.clone(),
            color: "black".to_string(),
            weight: 1,
            fill: false,
        },
        schools: MarkerLayer {
            name: SCHOOL_LAYER.to_string(),
            markers,
        },
        legend: scale.legend(),
        diagnostics: Diagnostics::current(),
    })
}
