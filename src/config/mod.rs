//! Configuration for the IPS map viewer.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{IpsMapError, Result};
use crate::session::SchoolLevel;

/// Where a score table lives and which column carries the IPS value
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreSource {
    /// File name relative to the data directory
    pub file: String,
    /// School level every row of this table is tagged with
    pub level: SchoolLevel,
    /// Column holding the score
    pub score_column: String,
}

/// Paths of the four reference datasets
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataPaths {
    /// Directory every other file name is resolved against
    pub data_dir: PathBuf,
    /// Natural Earth countries as GeoJSON
    pub boundary_file: String,
    /// Middle school scores
    pub middle_scores: ScoreSource,
    /// High school scores
    pub high_scores: ScoreSource,
    /// National school directory (`;`-separated)
    pub geocoding_file: String,
}

impl Default for DataPaths {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            boundary_file: "ne_110m_admin_0_countries.geojson".to_string(),
            middle_scores: ScoreSource {
                file: "fr-en-ips-colleges-ap2022.parquet".to_string(),
                level: SchoolLevel::Middle,
                score_column: "ips".to_string(),
            },
            high_scores: ScoreSource {
                file: "fr-en-ips-lycees-ap2022.parquet".to_string(),
                level: SchoolLevel::High,
                score_column: "ips_voie_gt".to_string(),
            },
            geocoding_file: "fr-en-annuaire-education.csv".to_string(),
        }
    }
}

impl DataPaths {
    /// Resolve a file name against the data directory
    #[must_use]
    pub fn resolve(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    #[must_use]
    pub fn boundary_path(&self) -> PathBuf {
        self.resolve(&self.boundary_file)
    }

    #[must_use]
    pub fn geocoding_path(&self) -> PathBuf {
        self.resolve(&self.geocoding_file)
    }

    /// Both score sources, middle schools first
    #[must_use]
    pub fn score_sources(&self) -> [&ScoreSource; 2] {
        [&self.middle_scores, &self.high_scores]
    }
}

/// Configuration for the viewer
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Input datasets
    pub paths: DataPaths,
    /// Property of the boundary features holding the country name
    pub boundary_name_key: String,
    /// Country whose border is drawn
    pub boundary_name: String,
    /// Address the map page is served on
    pub bind_address: String,
    /// Map widget width in pixels
    pub map_width: u32,
    /// Map widget height in pixels
    pub map_height: u32,
    /// Circle marker radius in pixels
    pub marker_radius: f64,
    /// Circle marker fill opacity
    pub marker_fill_opacity: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            paths: DataPaths::default(),
            boundary_name_key: "NAME".to_string(),
            boundary_name: "France".to_string(),
            bind_address: "127.0.0.1:8501".to_string(),
            map_width: 800,
            map_height: 600,
            marker_radius: 5.0,
            marker_fill_opacity: 0.9,
        }
    }
}

impl ViewerConfig {
    /// Read a JSON configuration file; missing keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| IpsMapError::io(path, e))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| IpsMapError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`ViewerConfig::load`], but an absent file yields the defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            log::info!("Reading configuration from {}", path.display());
            Self::load(path)
        } else {
            log::debug!("No configuration at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> Result<()> {
        if self.paths.middle_scores.level != SchoolLevel::Middle
            || self.paths.high_scores.level != SchoolLevel::High
        {
            return Err(IpsMapError::Config(
                "middle_scores and high_scores must be tagged middle and high".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.marker_fill_opacity) {
            return Err(IpsMapError::Config(format!(
                "marker_fill_opacity must be within [0, 1], got {}",
                self.marker_fill_opacity
            )));
        }
        Ok(())
    }
}
