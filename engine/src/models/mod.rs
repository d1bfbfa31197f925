// Engine-side models. Series and snapshot types that cross crate boundaries live
// in `shared::models`; the price table only exists inside the engine.
pub mod price_table;

pub use price_table::PriceTable;
