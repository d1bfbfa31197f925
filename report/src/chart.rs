// Static HTML charts (inline SVG) for the persisted breadth series
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use engine::config::ChartSettings;
use engine::indicators::Sma;
use shared::models::{CountSeries, PercentSeries};
use shared::utils::{breadth_count_file_name, breadth_file_name, chart_file_name, ADVANCE_DECLINE_FILE, HIGH_LOW_FILE};

use crate::reader::{read_count_series, read_percent_series};

const MARGIN_LEFT: f64 = 60.0;
const MARGIN_RIGHT: f64 = 30.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 40.0;

/// Maps dates and values onto the plot area.
struct Frame {
    width: f64,
    height: f64,
    start: NaiveDate,
    end: NaiveDate,
    min_value: f64,
    max_value: f64,
}

impl Frame {
    fn plot_width(&self) -> f64 {
        self.width - MARGIN_LEFT - MARGIN_RIGHT
    }

    fn plot_height(&self) -> f64 {
        self.height - MARGIN_TOP - MARGIN_BOTTOM
    }

    fn x(&self, date: NaiveDate) -> f64 {
        let span = (self.end - self.start).num_days().max(1) as f64;
        MARGIN_LEFT + (date - self.start).num_days() as f64 / span * self.plot_width()
    }

    fn y(&self, value: f64) -> f64 {
        let range = if (self.max_value - self.min_value) > 0.0 { self.max_value - self.min_value } else { 1.0 };
        MARGIN_TOP + (self.max_value - value) / range * self.plot_height()
    }
}

pub struct ChartRenderer<'a> {
    settings: &'a ChartSettings,
}

impl<'a> ChartRenderer<'a> {
    pub fn new(settings: &'a ChartSettings) -> Self {
        Self { settings }
    }

    /// Renders every chart for the series files in `dir` and returns the paths
    /// written. `with_counts` adds the count-above-MA charts.
    pub fn build_charts(&self, dir: &Path, windows: &[usize], with_counts: bool) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        for &window in windows {
            let csv_name = breadth_file_name(window);
            let series = read_percent_series(dir.join(&csv_name))?;
            let html = self.render_breadth_chart(window, &series)?;
            written.push(write_chart(dir, &csv_name, &html)?);
        }

        if with_counts {
            for &window in windows {
                let csv_name = breadth_count_file_name(window);
                let series = read_count_series(dir.join(&csv_name))?;
                let html = self.render_count_chart(window, &series);
                written.push(write_chart(dir, &csv_name, &html)?);
            }
        }

        for (csv_name, title) in [(HIGH_LOW_FILE, "52-Week Highs minus Lows"), (ADVANCE_DECLINE_FILE, "Advance-Decline Line")] {
            let series = read_count_series(dir.join(csv_name))?;
            let html = self.render_bar_chart(title, &series);
            written.push(write_chart(dir, csv_name, &html)?);
        }

        tracing::info!(dir = %dir.display(), charts = written.len(), "Rendered charts");
        Ok(written)
    }

    /// Percent-above-MA line with its smoothing average on a fixed 0-100 scale.
    pub fn render_breadth_chart(&self, window: usize, series: &PercentSeries) -> Result<String> {
        let title = format!("% of Stocks Above {}D MA", window);
        let Some(frame) = self.frame(&series.dates, self.settings.breadth_height, 0.0, 100.0) else {
            return Ok(empty_page(&title));
        };

        let sma = Sma::new(self.settings.smoothing_window)?;
        let smoothing = sma.calculate(&series.values);

        let mut body = String::new();
        body.push_str(&grid(&frame, &[0.0, 25.0, 50.0, 75.0, 100.0]));
        body.push_str(&polylines(&frame, &series.dates, &series.values, &self.settings.line_color));
        body.push_str(&polylines(&frame, &series.dates, &smoothing, &self.settings.smoothing_color));
        body.push_str(&date_labels(&frame));
        body.push_str(&legend(&[
            (format!("% > {}D MA", window), self.settings.line_color.as_str()),
            (format!("{}D SMA", sma.period()), self.settings.smoothing_color.as_str()),
        ]));

        Ok(page(&title, &frame, &body))
    }

    /// Number of tickers above the MA, scaled from 0 to the largest count.
    pub fn render_count_chart(&self, window: usize, series: &CountSeries) -> String {
        let title = format!("Number of Stocks Above {}D MA", window);
        let max_value = series.values.iter().flatten().copied().max().unwrap_or(0).max(1) as f64;
        let Some(frame) = self.frame(&series.dates, self.settings.simple_height, 0.0, max_value) else {
            return empty_page(&title);
        };

        let values: Vec<Option<f64>> = series.values.iter().map(|v| v.map(|v| v as f64)).collect();

        let mut body = String::new();
        body.push_str(&grid(&frame, &[0.0, (max_value / 2.0).round(), max_value]));
        body.push_str(&polylines(&frame, &series.dates, &values, &self.settings.line_color));
        body.push_str(&date_labels(&frame));
        body.push_str(&legend(&[(format!("Stocks above {}D MA", window), self.settings.line_color.as_str())]));

        page(&title, &frame, &body)
    }

    /// Signed bars around a zero line.
    pub fn render_bar_chart(&self, title: &str, series: &CountSeries) -> String {
        let visible: Vec<(NaiveDate, i64)> = series
            .iter()
            .filter(|(date, _)| self.settings.start_date.map_or(true, |start| *date >= start))
            .filter_map(|(date, value)| value.map(|v| (date, v)))
            .collect();

        let min_value = visible.iter().map(|(_, v)| *v).min().unwrap_or(0).min(0) as f64;
        let max_value = visible.iter().map(|(_, v)| *v).max().unwrap_or(0).max(0) as f64;
        let Some(frame) = self.frame(&series.dates, self.settings.simple_height, min_value, max_value) else {
            return empty_page(title);
        };

        let bar_width = (frame.plot_width() / visible.len().max(1) as f64).max(1.0);
        let zero_y = frame.y(0.0);

        let mut body = String::new();
        body.push_str(&grid(&frame, &[min_value, 0.0, max_value]));
        for (date, value) in &visible {
            let x = frame.x(*date) - bar_width / 2.0;
            let y = frame.y(*value as f64);
            let (top, height) = if y < zero_y { (y, zero_y - y) } else { (zero_y, y - zero_y) };
            let color = if *value >= 0 { &self.settings.bar_positive_color } else { &self.settings.bar_negative_color };
            body.push_str(&format!(
                "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" fill=\"{}\"><title>{} {}</title></rect>\n",
                x, top, bar_width, height, color, date, value
            ));
        }
        body.push_str(&date_labels(&frame));

        page(title, &frame, &body)
    }

    /// `None` when no dates fall inside the chart window.
    fn frame(&self, dates: &[NaiveDate], height: u32, min_value: f64, max_value: f64) -> Option<Frame> {
        let end = *dates.last()?;
        let start = self.settings.start_date.unwrap_or(*dates.first()?);
        if start > end {
            return None;
        }
        Some(Frame {
            width: self.settings.width as f64,
            height: height as f64,
            start,
            end,
            min_value,
            max_value,
        })
    }
}

fn write_chart(dir: &Path, csv_name: &str, html: &str) -> Result<PathBuf> {
    let path = dir.join(chart_file_name(csv_name));
    fs::write(&path, html).with_context(|| format!("Failed to write chart '{}'", path.display()))?;
    Ok(path)
}

/// One polyline per unbroken run of defined values inside the frame.
fn polylines(frame: &Frame, dates: &[NaiveDate], values: &[Option<f64>], color: &str) -> String {
    let mut out = String::new();
    let mut points = String::new();

    let mut flush = |points: &mut String| {
        let trimmed = points.trim_end();
        if !trimmed.is_empty() {
            out.push_str(&format!(
                "<polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\"/>\n",
                trimmed, color
            ));
        }
        points.clear();
    };

    for (date, value) in dates.iter().zip(values) {
        if *date < frame.start {
            continue;
        }
        match value {
            Some(v) => points.push_str(&format!("{:.2},{:.2} ", frame.x(*date), frame.y(*v))),
            None => flush(&mut points),
        }
    }
    flush(&mut points);
    out
}

fn grid(frame: &Frame, levels: &[f64]) -> String {
    let mut out = String::new();
    let left = MARGIN_LEFT;
    let right = frame.width - MARGIN_RIGHT;
    for level in levels {
        let y = frame.y(*level);
        out.push_str(&format!(
            "<line x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"#e0e0e0\" stroke-dasharray=\"4 4\"/>\n",
            left, y, right, y
        ));
        out.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"12\" text-anchor=\"end\" fill=\"#555\">{}</text>\n",
            left - 6.0,
            y + 4.0,
            level
        ));
    }
    out
}

fn date_labels(frame: &Frame) -> String {
    let y = frame.height - MARGIN_BOTTOM + 18.0;
    let mid = frame.start + (frame.end - frame.start) / 2;
    [(frame.start, "start"), (mid, "middle"), (frame.end, "end")]
        .iter()
        .map(|(date, anchor)| {
            format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" font-size=\"12\" text-anchor=\"{}\" fill=\"#555\">{}</text>\n",
                frame.x(*date),
                y,
                anchor,
                date
            )
        })
        .collect()
}

fn legend(entries: &[(String, &str)]) -> String {
    entries
        .iter()
        .enumerate()
        .map(|(idx, (label, color))| {
            let x = MARGIN_LEFT + idx as f64 * 160.0;
            format!(
                "<rect x=\"{:.2}\" y=\"14\" width=\"14\" height=\"3\" fill=\"{}\"/><text x=\"{:.2}\" y=\"20\" font-size=\"12\">{}</text>\n",
                x,
                color,
                x + 20.0,
                escape(label)
            )
        })
        .collect()
}

fn page(title: &str, frame: &Frame, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{title}</title>\n<style>body {{ font-family: system-ui; margin: 12px; }}</style>\n</head>\n<body>\n<h3>{title}</h3>\n<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {w} {h}\" width=\"100%\">\n{body}</svg>\n</body>\n</html>\n",
        title = escape(title),
        w = frame.width,
        h = frame.height,
        body = body
    )
}

fn empty_page(title: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"UTF-8\">\n<title>{title}</title>\n</head>\n<body>\n<h3>{title}</h3>\n<p>No data in range.</p>\n</body>\n</html>\n",
        title = escape(title)
    )
}

pub(crate) fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Series;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn settings() -> ChartSettings {
        ChartSettings {
            smoothing_window: 2,
            ..ChartSettings::default()
        }
    }

    #[test]
    fn test_breadth_chart_breaks_line_on_missing_values() {
        let settings = settings();
        let renderer = ChartRenderer::new(&settings);
        let series = Series::new(
            vec![day(1), day(2), day(3), day(4), day(5)],
            vec![Some(10.0), Some(20.0), None, Some(40.0), Some(50.0)],
        );

        let html = renderer.render_breadth_chart(20, &series).unwrap();

        assert!(html.contains("% of Stocks Above 20D MA"));
        // Two segments for the raw series plus two for the smoothing line.
        assert_eq!(html.matches("<polyline").count(), 4);
        assert!(html.contains("2024-01-05"));
    }

    #[test]
    fn test_chart_start_clips_earlier_points() {
        let settings = ChartSettings {
            start_date: Some(day(3)),
            ..settings()
        };
        let renderer = ChartRenderer::new(&settings);
        let series = Series::new(vec![day(1), day(2), day(3), day(4)], vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);

        let html = renderer.render_breadth_chart(60, &series).unwrap();

        assert!(!html.contains("2024-01-01"));
        assert!(html.contains("2024-01-03"));
    }

    #[test]
    fn test_bar_chart_colors_by_sign() {
        let settings = settings();
        let renderer = ChartRenderer::new(&settings);
        let series = Series::new(vec![day(1), day(2), day(3)], vec![Some(0), Some(5), Some(-3)]);

        let html = renderer.render_bar_chart("Advance-Decline Line", &series);

        assert_eq!(html.matches("<rect").count(), 3);
        assert!(html.contains(&settings.bar_positive_color));
        assert!(html.contains(&settings.bar_negative_color));
    }

    #[test]
    fn test_empty_series_renders_placeholder() {
        let settings = settings();
        let renderer = ChartRenderer::new(&settings);
        let series: CountSeries = Series::new(Vec::new(), Vec::new());

        assert!(renderer.render_bar_chart("Empty", &series).contains("No data in range."));
    }

    #[test]
    fn test_build_charts_writes_html_next_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("breadth_20.csv"), "date,percent\n2024-01-02,\n2024-01-03,55.00\n").unwrap();
        fs::write(dir.path().join(HIGH_LOW_FILE), "date,value\n2024-01-02,0\n2024-01-03,3\n").unwrap();
        fs::write(dir.path().join(ADVANCE_DECLINE_FILE), "date,value\n2024-01-02,0\n2024-01-03,-2\n").unwrap();

        let settings = settings();
        let written = ChartRenderer::new(&settings).build_charts(dir.path(), &[20], false).unwrap();

        assert_eq!(written.len(), 3);
        assert!(!dir.path().join("breadth_count_20.html").exists());
        assert!(dir.path().join("breadth_20.html").is_file());
        assert!(dir.path().join("high_low_52w.html").is_file());
        assert!(dir.path().join("advance_decline.html").is_file());
    }

    #[test]
    fn test_build_charts_with_counts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("breadth_50.csv"), "date,percent\n2024-01-02,40.00\n").unwrap();
        fs::write(dir.path().join("breadth_count_50.csv"), "date,value\n2024-01-02,0\n2024-01-03,12\n").unwrap();
        fs::write(dir.path().join(HIGH_LOW_FILE), "date,value\n2024-01-02,0\n").unwrap();
        fs::write(dir.path().join(ADVANCE_DECLINE_FILE), "date,value\n2024-01-02,0\n").unwrap();

        let settings = settings();
        let written = ChartRenderer::new(&settings).build_charts(dir.path(), &[50], true).unwrap();

        assert_eq!(written.len(), 4);
        let html = fs::read_to_string(dir.path().join("breadth_count_50.html")).unwrap();
        assert!(html.contains("Number of Stocks Above 50D MA"));
        assert_eq!(html.matches("<polyline").count(), 1);
    }

    #[test]
    fn test_breadth_legend_names_smoothing_period() {
        let settings = settings();
        let series = Series::new(vec![day(1), day(2)], vec![Some(10.0), Some(20.0)]);
        let html = ChartRenderer::new(&settings).render_breadth_chart(20, &series).unwrap();
        assert!(html.contains("2D SMA"));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("S&P <500>"), "S&amp;P &lt;500&gt;");
    }
}
