// Output schema shared by the writer (engine) and the readers (report).
// Changing a name here changes the on-disk contract for every consumer.

pub const HIGH_LOW_FILE: &str = "high_low_52w.csv";
pub const ADVANCE_DECLINE_FILE: &str = "advance_decline.csv";
pub const SUMMARY_FILE: &str = "ai_summary.html";

pub const PERCENT_COLUMN: &str = "percent";
pub const VALUE_COLUMN: &str = "value";

pub fn breadth_file_name(window: usize) -> String {
    format!("breadth_{}.csv", window)
}

pub fn breadth_count_file_name(window: usize) -> String {
    format!("breadth_count_{}.csv", window)
}

/// Chart file that sits next to a series file: `breadth_20.csv` -> `breadth_20.html`.
pub fn chart_file_name(csv_name: &str) -> String {
    match csv_name.strip_suffix(".csv") {
        Some(stem) => format!("{}.html", stem),
        None => format!("{}.html", csv_name),
    }
}

/// Percentages are persisted with two decimals.
pub fn format_percent(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names() {
        assert_eq!(breadth_file_name(200), "breadth_200.csv");
        assert_eq!(breadth_count_file_name(50), "breadth_count_50.csv");
        assert_eq!(chart_file_name(&breadth_count_file_name(50)), "breadth_count_50.html");
        assert_eq!(chart_file_name("breadth_20.csv"), "breadth_20.html");
        assert_eq!(chart_file_name(HIGH_LOW_FILE), "high_low_52w.html");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(100.0 / 3.0), "33.33");
        assert_eq!(format_percent(0.0), "0.00");
        assert_eq!(format_percent(66.666), "66.67");
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.3333), 33.33);
        assert_eq!(round2(12.345_6), 12.35);
    }
}
