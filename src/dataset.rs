//! Process-wide school dataset and the per-interaction render step
//!
//! The reference files are read, joined and turned into a color scale once.
//! The result is immutable and shared by every render for the rest of the
//! process.

use std::sync::OnceLock;
use std::time::Instant;

use crate::colormap::LinearColormap;
use crate::config::ViewerConfig;
use crate::error::Result;
use crate::filter::filter_schools;
use crate::join::{SchoolTable, join_scores};
use crate::loader::{BoundaryShape, ReferenceData, load_reference_data};
use crate::render::{MapDocument, render_map};
use crate::session::{Interaction, ViewState};
use crate::utils::logging::{create_spinner, finish_progress_bar};

static DATASET: OnceLock<Dataset> = OnceLock::new();

/// Joined schools, country outline and color scale
#[derive(Debug, Clone)]
pub struct Dataset {
    config: ViewerConfig,
    boundary: BoundaryShape,
    schools: SchoolTable,
    scale: LinearColormap,
}

impl Dataset {
    /// Join already loaded reference data
    pub fn from_reference(config: ViewerConfig, reference: &ReferenceData) -> Result<Self> {
        let boundary = reference
            .boundary(&config.boundary_name_key, &config.boundary_name)?
            .clone();
        let schools = join_scores(&reference.scores, &reference.geocoding)?;
        let scale = LinearColormap::for_schools(&schools)?;

        Ok(Self {
            config,
            boundary,
            schools,
            scale,
        })
    }

    /// Read the reference files named by `config` and join them
    pub fn load(config: ViewerConfig) -> Result<Self> {
        let spinner = create_spinner(Some("Loading reference data"));
        let start = Instant::now();

        let loaded = load_reference_data(&config)
            .and_then(|reference| Self::from_reference(config, &reference));
        let dataset = match loaded {
            Ok(dataset) => dataset,
            Err(e) => {
                spinner.abandon_with_message("Loading reference data failed");
                return Err(e);
            }
        };

        finish_progress_bar(&spinner, Some("Reference data loaded"));
        log::info!(
            "Joined {} schools with a location in {:?}",
            dataset.schools.num_rows(),
            start.elapsed()
        );
        Ok(dataset)
    }

    /// The shared dataset, loaded on first use
    ///
    /// Later calls return the first dataset and ignore `config`.
    pub fn global(config: &ViewerConfig) -> Result<&'static Self> {
        if let Some(dataset) = DATASET.get() {
            return Ok(dataset);
        }
        let dataset = Self::load(config.clone())?;
        Ok(DATASET.get_or_init(|| dataset))
    }

    #[must_use]
    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    #[must_use]
    pub fn schools(&self) -> &SchoolTable {
        &self.schools
    }

    #[must_use]
    pub fn boundary(&self) -> &BoundaryShape {
        &self.boundary
    }

    /// Scale over the full joined table, independent of any filter
    #[must_use]
    pub fn scale(&self) -> &LinearColormap {
        &self.scale
    }

    /// Filter and draw the map for `state`
    pub fn render(&self, state: &ViewState) -> Result<MapDocument> {
        let selection = filter_schools(&self.schools, &state.flags)?;
        render_map(&selection, &self.boundary, &self.scale, state, &self.config)
    }

    /// Apply one interaction and render the resulting state
    pub fn render_step(
        &self,
        state: ViewState,
        interaction: &Interaction,
    ) -> Result<(ViewState, MapDocument)> {
        let next = state.apply(interaction);
        let document = self.render(&next)?;
        Ok((next, document))
    }
}
