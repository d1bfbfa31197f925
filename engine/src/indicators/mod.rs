// Breadth indicators computed across every column of a price table
pub mod advance_decline;
pub mod high_low;
pub mod percent_above_ma;
pub mod rolling;
pub mod sma;

pub use advance_decline::{advance_decline_counts, advance_decline_line, AdvanceDeclineDay, AdvanceDeclineLine};
pub use high_low::{high_low_net, HighLowNet};
pub use percent_above_ma::{count_above_ma, percent_above_ma, CountAboveMa, PercentAboveMa};
pub use sma::Sma;

use crate::error::Result;
use crate::models::PriceTable;
use serde_json::Value;
use shared::models::Series;

// Common trait for all breadth indicators. Implementations are stateless: the
// same table always yields the same series.
pub trait BreadthIndicator: Send + Sync {
    type Value;

    fn name(&self) -> &str;
    fn parameters(&self) -> Value; // Parameters used for this indicator instance
    fn calculate(&self, prices: &PriceTable) -> Result<Series<Self::Value>>;
}
