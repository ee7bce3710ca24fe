//! Interactive map of the social position index (IPS) of French middle and
//! high schools.
//!
//! Static reference files are loaded once, IPS scores are joined to school
//! locations, and every interaction re-filters the joined table and redraws
//! the map with a color scale fixed over the full score range.

pub mod colormap;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod join;
pub mod loader;
pub mod render;
pub mod server;
pub mod session;
pub mod utils;

// Re-export the most common types for easier use
pub use colormap::{IPS_PALETTE, Legend, LinearColormap, Rgb};
pub use config::{DataPaths, ScoreSource, ViewerConfig};
pub use dataset::Dataset;
pub use error::{IpsMapError, Result};
pub use filter::{Expr, Selection, filter_schools};
pub use join::{JoinedRecord, SchoolTable, join_scores};
pub use loader::{BoundaryShape, ReferenceData, ScoreTable, load_reference_data};
pub use render::{MapDocument, render_map};
pub use session::{FilterFlags, GeoPoint, Interaction, SchoolLevel, ViewState, Viewport};

// Arrow types
pub use arrow::record_batch::RecordBatch;
