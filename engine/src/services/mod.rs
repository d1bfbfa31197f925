// Services orchestrating the calculator: compute every configured series, then persist them.
pub mod breadth_service;

pub use breadth_service::{BreadthPipeline, BreadthReport};
