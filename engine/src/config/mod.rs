// Engine configuration
pub mod settings;

pub use settings::{ChartSettings, NarrativeSettings, PriceSourceSettings, ProfileSettings, RunSettings};
