// Market breadth entry point: fetch, compute, persist, chart, summarize
use anyhow::{Context, Result};
use engine::config::RunSettings;
use engine::data::csv_parser::load_universe;
use engine::data::{price_source, PriceTableBuilder};
use engine::services::BreadthPipeline;
use report::{read_snapshot, summarize_with_fallback, write_summary_html, ChartRenderer, ChatCompletionSummarizer, Summarizer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = RunSettings::load().context("Failed to load run settings")?;
    let (profile_name, profile) = settings.active_profile()?;
    info!(profile = %profile_name, market = %profile.market, version = %settings.version, "Starting market breadth run");

    let tickers = load_universe(&profile.universe_file)
        .with_context(|| format!("Failed to load universe '{}'", profile.universe_file.display()))?;
    info!(tickers = tickers.len(), "Loaded universe");

    let source = price_source::from_settings(&profile.price_source)?;
    let table = PriceTableBuilder::new(&*source)
        .with_history_rows(profile.history_rows)
        .with_min_observations(profile.min_observations)
        .build(&tickers, profile.start_date)
        .await;

    let pipeline = BreadthPipeline::new(profile.ma_windows.clone(), profile.high_low_lookback)
        .with_count_above_ma(profile.count_above_ma);
    let report = pipeline
        .run(&table, &settings.output_dir)
        .context("Breadth computation failed, no files were written")?;
    if let Some(latest) = report.snapshot(&profile.market) {
        info!(
            as_of = %latest.as_of,
            percent_above_ma = ?latest.percent_above_ma,
            high_low_net = latest.high_low_net,
            advance_decline = latest.advance_decline,
            "Latest breadth readings"
        );
    }

    let mut chart_settings = settings.chart.clone();
    chart_settings.start_date.get_or_insert(profile.start_date);
    ChartRenderer::new(&chart_settings).build_charts(&settings.output_dir, pipeline.ma_windows(), profile.count_above_ma)?;

    let snapshot = read_snapshot(&settings.output_dir, &profile.market, pipeline.ma_windows())?;
    let provider = ChatCompletionSummarizer::from_settings(&settings.narrative)?;
    let text = summarize_with_fallback(provider.as_ref().map(|p| p as &dyn Summarizer), &snapshot).await;
    write_summary_html(&settings.output_dir, &text)?;

    info!(output_dir = %settings.output_dir.display(), as_of = %snapshot.as_of, "Market breadth run complete");
    Ok(())
}
