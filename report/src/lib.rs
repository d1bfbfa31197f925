// Consumers of the persisted breadth series: charts and the narrative summary
pub mod chart;
pub mod narrative;
pub mod reader;
pub mod summary;

pub use chart::ChartRenderer;
pub use narrative::{summarize_with_fallback, ChatCompletionSummarizer, Summarizer, TemplateSummarizer};
pub use reader::{read_count_series, read_percent_series, read_snapshot};
pub use summary::write_summary_html;
