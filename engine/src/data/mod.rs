// Price ingestion (sources, CSV parsing, table alignment) and series output
pub mod csv_parser;
pub mod output;
pub mod price_source;
pub mod table_builder;

pub use price_source::{CsvDirectorySource, PriceSource, YahooChartSource};
pub use table_builder::PriceTableBuilder;
