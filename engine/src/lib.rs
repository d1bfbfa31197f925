// Engine library root
// Breadth calculator plus the price ingestion and output around it.

pub mod config;
pub mod data;
pub mod error;
pub mod indicators;
pub mod models;
pub mod services;

pub use error::{BreadthError, Result};
pub use models::PriceTable;
