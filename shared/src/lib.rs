// Data models shared by the engine (writer side) and the report crate (reader side).
pub mod models;
pub mod utils;

pub use models::{BreadthSnapshot, CountSeries, PercentSeries, Series};
