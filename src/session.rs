//! Per-session view state: viewport and filter checkboxes
//!
//! A [`ViewState`] is a plain value. The host loop hands it to the render
//! step, applies the next [`Interaction`] to it and keeps the result for the
//! following render. Nothing here outlives the session.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Center of France, used as the initial map center
pub const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 46.2276,
    lon: 2.2137,
};

/// Initial zoom level, showing the whole of metropolitan France
pub const DEFAULT_ZOOM: u8 = 6;

/// A WGS84 coordinate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    #[must_use]
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// School level of an establishment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolLevel {
    /// Collège
    Middle,
    /// Lycée
    High,
}

impl SchoolLevel {
    /// Label stored in the joined table and shown on markers
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Middle => "collège",
            Self::High => "lycée",
        }
    }
}

impl fmt::Display for SchoolLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Value of the `secteur` column for publicly operated schools; anything else is private
pub const PUBLIC_SECTOR: &str = "public";

/// The four checkbox values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterFlags {
    pub show_middle: bool,
    pub show_high: bool,
    pub show_public: bool,
    pub show_private: bool,
}

impl Default for FilterFlags {
    fn default() -> Self {
        Self {
            show_middle: true,
            show_high: false,
            show_public: true,
            show_private: false,
        }
    }
}

/// Map center and zoom
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            center: DEFAULT_CENTER,
            zoom: DEFAULT_ZOOM,
        }
    }
}

/// Everything the renderer needs to know about the current session
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewState {
    pub viewport: Viewport,
    pub flags: FilterFlags,
}

/// What the user did since the last render
///
/// Checkbox values are always reported. The viewport is only reported when
/// the map widget has a center and a zoom to give back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub flags: FilterFlags,
    pub viewport: Option<Viewport>,
}

impl ViewState {
    /// State for the next render after `interaction`
    #[must_use]
    pub fn apply(self, interaction: &Interaction) -> Self {
        let viewport = match interaction.viewport {
            Some(moved) if moved != self.viewport => {
                log::debug!(
                    "Viewport moved to ({:.4}, {:.4}) zoom {}",
                    moved.center.lat,
                    moved.center.lon,
                    moved.zoom
                );
                moved
            }
            _ => self.viewport,
        };
        if interaction.flags != self.flags {
            log::debug!("Filter flags changed to {:?}", interaction.flags);
        }
        Self {
            viewport,
            flags: interaction.flags,
        }
    }
}
