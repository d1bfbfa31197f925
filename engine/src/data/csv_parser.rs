use std::collections::{BTreeMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};

use crate::error::{BreadthError, Result};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct PriceCsvParser;

impl PriceCsvParser {
    // CSV Header: Date,Open,High,Low,Close,Adj Close,Volume (only Date and a close column are required)
    // Example Row: 2024-01-02,187.15,188.44,183.89,185.64,184.94,82488700
    pub fn load_closes(file_path: impl AsRef<Path>, start: NaiveDate) -> Result<BTreeMap<NaiveDate, f64>> {
        let file_path = file_path.as_ref();
        let file = File::open(file_path).map_err(|e| {
            BreadthError::CsvDataFormatError(format!("Failed to open CSV file '{}': {}", file_path.display(), e))
        })?;
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(BufReader::new(file));

        let headers = rdr.headers()?.clone();
        let date_pos = Self::position(&headers, &["Date"])
            .ok_or_else(|| BreadthError::CsvDataFormatError(format!("Missing 'Date' column in '{}'", file_path.display())))?;
        // Adjusted close wins when the file carries both.
        let close_pos = Self::position(&headers, &["Adj Close", "Close"])
            .ok_or_else(|| BreadthError::CsvDataFormatError(format!("Missing 'Close' column in '{}'", file_path.display())))?;

        let mut closes = BTreeMap::new();
        for (idx, result) in rdr.records().enumerate() {
            let line = idx + 2;
            let record = result?;

            let date_str = record.get(date_pos).map(str::trim).unwrap_or_default();
            let date = parse_date(date_str)
                .map_err(|e| BreadthError::CsvDataFormatError(format!("Error parsing 'Date' at line {}: {}", line, e)))?;
            if date < start {
                continue;
            }

            let close_str = record.get(close_pos).map(str::trim).unwrap_or_default();
            if close_str.is_empty() {
                continue;
            }
            let close: f64 = close_str.parse().map_err(|e| {
                BreadthError::CsvDataFormatError(format!("Error parsing close '{}' at line {}: {}", close_str, line, e))
            })?;
            if !close.is_finite() || close <= 0.0 {
                tracing::debug!(path = %file_path.display(), line, close, "Skipping non-positive close");
                continue;
            }

            if closes.insert(date, close).is_some() {
                return Err(BreadthError::CsvDataFormatError(format!(
                    "Duplicate date {} at line {} in '{}'",
                    date,
                    line,
                    file_path.display()
                )));
            }
        }
        Ok(closes)
    }

    fn position(headers: &StringRecord, names: &[&str]) -> Option<usize> {
        names
            .iter()
            .find_map(|name| headers.iter().position(|header| header.trim().eq_ignore_ascii_case(name)))
    }
}

/// Accepts plain ISO dates and ISO timestamps ("2024-01-02 00:00:00").
pub fn parse_date(s: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT)
}

/// Index universe: the `Symbol` column when the file has one, otherwise the
/// first column. Blanks are dropped and duplicates keep their first position.
pub fn load_universe(file_path: impl AsRef<Path>) -> Result<Vec<String>> {
    let file_path = file_path.as_ref();
    let file = File::open(file_path).map_err(|e| {
        BreadthError::ConfigError(format!("Failed to open universe file '{}': {}", file_path.display(), e))
    })?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let headers = rdr.headers()?.clone();
    let symbol_pos = headers
        .iter()
        .position(|header| header.trim().eq_ignore_ascii_case("Symbol"))
        .unwrap_or(0);

    let mut seen = HashSet::new();
    let mut tickers = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let Some(symbol) = record.get(symbol_pos).map(str::trim) else {
            continue;
        };
        if symbol.is_empty() {
            continue;
        }
        if seen.insert(symbol.to_string()) {
            tickers.push(symbol.to_string());
        }
    }
    Ok(tickers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", content).unwrap();
        file
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_load_closes_prefers_adjusted_close() {
        let csv_content = "\
Date,Open,High,Low,Close,Adj Close,Volume
2024-01-02,187.15,188.44,183.89,185.64,184.94,82488700
2024-01-03,184.22,185.88,183.43,184.25,183.55,58414500";
        let tmp_file = create_test_csv(csv_content);
        let closes = PriceCsvParser::load_closes(tmp_file.path(), date("2024-01-01")).unwrap();

        assert_eq!(closes.len(), 2);
        assert_eq!(closes[&date("2024-01-02")], 184.94);
        assert_eq!(closes[&date("2024-01-03")], 183.55);
    }

    #[test]
    fn test_load_closes_skips_blank_zero_and_early_rows() {
        let csv_content = "\
Date,Close
2023-12-29,10.0
2024-01-02,
2024-01-03,0
2024-01-04 00:00:00,12.5";
        let tmp_file = create_test_csv(csv_content);
        let closes = PriceCsvParser::load_closes(tmp_file.path(), date("2024-01-01")).unwrap();

        assert_eq!(closes.len(), 1);
        assert_eq!(closes[&date("2024-01-04")], 12.5);
    }

    #[test]
    fn test_load_closes_missing_close_column() {
        let tmp_file = create_test_csv("Date,Open\n2024-01-02,1.0");
        let result = PriceCsvParser::load_closes(tmp_file.path(), date("2024-01-01"));
        assert!(result.unwrap_err().to_string().contains("Missing 'Close' column"));
    }

    #[test]
    fn test_load_closes_invalid_number() {
        let tmp_file = create_test_csv("Date,Close\n2024-01-02,abc");
        let result = PriceCsvParser::load_closes(tmp_file.path(), date("2024-01-01"));
        assert!(result.unwrap_err().to_string().contains("Error parsing close 'abc' at line 2"));
    }

    #[test]
    fn test_load_closes_duplicate_date() {
        let tmp_file = create_test_csv("Date,Close\n2024-01-02,1.0\n2024-01-02,2.0");
        let result = PriceCsvParser::load_closes(tmp_file.path(), date("2024-01-01"));
        assert!(result.unwrap_err().to_string().contains("Duplicate date 2024-01-02"));
    }

    #[test]
    fn test_load_universe_uses_symbol_column() {
        let tmp_file = create_test_csv("Name,Symbol,Sector\nApple,AAPL,Tech\nMicrosoft,MSFT,Tech\nApple again,AAPL,Tech\nBlank,,Tech");
        let tickers = load_universe(tmp_file.path()).unwrap();
        assert_eq!(tickers, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[test]
    fn test_load_universe_falls_back_to_first_column() {
        let tmp_file = create_test_csv("Code,Name\n005930,Samsung\n000660,SK hynix");
        let tickers = load_universe(tmp_file.path()).unwrap();
        assert_eq!(tickers, vec!["005930".to_string(), "000660".to_string()]);
    }
}
