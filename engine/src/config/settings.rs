// Run settings: one JSON document with a profile per market variant.
// The embedded default can be replaced by a file named in BREADTH_CONFIG, and
// BREADTH_PROFILE picks the profile.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{BreadthError, Result};
use crate::indicators::high_low::DEFAULT_LOOKBACK;

pub const CONFIG_PATH_ENV: &str = "BREADTH_CONFIG";
pub const PROFILE_ENV: &str = "BREADTH_PROFILE";

const DEFAULT_CONFIG: &str = include_str!("../../config/default.json");

#[derive(Debug, Deserialize, Clone)]
pub struct RunSettings {
    pub version: String,
    pub default_profile: String,
    pub output_dir: PathBuf,
    pub profiles: BTreeMap<String, ProfileSettings>,
    #[serde(default)]
    pub chart: ChartSettings,
    #[serde(default)]
    pub narrative: NarrativeSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileSettings {
    pub market: String,
    pub universe_file: PathBuf,
    pub price_source: PriceSourceSettings,
    pub start_date: NaiveDate,
    #[serde(default = "default_ma_windows")]
    pub ma_windows: Vec<usize>,
    #[serde(default = "default_lookback")]
    pub high_low_lookback: usize,
    #[serde(default = "default_min_observations")]
    pub min_observations: usize,
    /// Keep only the most recent N rows of each ticker's history.
    #[serde(default)]
    pub history_rows: Option<usize>,
    /// Also emit `breadth_count_{W}.csv` with the number of tickers above each MA.
    #[serde(default)]
    pub count_above_ma: bool,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceSourceSettings {
    Yahoo {
        #[serde(default = "default_yahoo_url")]
        base_url: String,
        #[serde(default = "default_fetch_timeout")]
        timeout_secs: u64,
    },
    CsvDir {
        path: PathBuf,
    },
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ChartSettings {
    pub start_date: Option<NaiveDate>,
    pub breadth_height: u32,
    pub simple_height: u32,
    pub width: u32,
    pub smoothing_window: usize,
    pub line_color: String,
    pub smoothing_color: String,
    pub bar_positive_color: String,
    pub bar_negative_color: String,
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            start_date: None,
            breadth_height: 900,
            simple_height: 700,
            width: 1400,
            smoothing_window: 21,
            line_color: "#1f77b4".to_string(),
            smoothing_color: "#ff7f0e".to_string(),
            bar_positive_color: "#26a69a".to_string(),
            bar_negative_color: "#ef5350".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NarrativeSettings {
    pub enabled: bool,
    pub endpoint: String,
    pub model: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for NarrativeSettings {
    fn default() -> Self {
        NarrativeSettings {
            enabled: true,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

fn default_ma_windows() -> Vec<usize> {
    vec![20, 60, 120, 200]
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_min_observations() -> usize {
    1
}

fn default_yahoo_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}

fn default_fetch_timeout() -> u64 {
    30
}

impl RunSettings {
    pub fn load_default() -> Result<Self> {
        Self::from_json(DEFAULT_CONFIG)
    }

    pub fn from_json(config_str: &str) -> Result<Self> {
        let settings: RunSettings = serde_json::from_str(config_str)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path).map_err(|e| {
            BreadthError::ConfigError(format!("Failed to read config file '{}': {}", path.display(), e))
        })?;
        Self::from_json(&config_str)
    }

    /// Embedded defaults unless BREADTH_CONFIG points at a file.
    pub fn load() -> Result<Self> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => {
                tracing::info!(path = %PathBuf::from(&path).display(), "Loading run settings from file");
                Self::from_file(path)
            }
            None => Self::load_default(),
        }
    }

    pub fn profile(&self, name: &str) -> Result<&ProfileSettings> {
        self.profiles.get(name).ok_or_else(|| {
            BreadthError::ConfigError(format!(
                "Unknown profile '{}', expected one of: {}",
                name,
                self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })
    }

    /// Profile named by BREADTH_PROFILE, or `default_profile`.
    pub fn active_profile(&self) -> Result<(String, &ProfileSettings)> {
        let name = std::env::var(PROFILE_ENV).unwrap_or_else(|_| self.default_profile.clone());
        let profile = self.profile(&name)?;
        Ok((name, profile))
    }

    pub fn validate(&self) -> Result<()> {
        self.profile(&self.default_profile)?;

        for (name, profile) in &self.profiles {
            if profile.ma_windows.is_empty() {
                return Err(BreadthError::ConfigError(format!("Profile '{}' has no MA windows", name)));
            }
            if profile.ma_windows.contains(&0) {
                return Err(BreadthError::ConfigError(format!("Profile '{}' has an MA window of 0", name)));
            }
            if profile.history_rows == Some(0) {
                return Err(BreadthError::ConfigError(format!("Profile '{}' keeps 0 history rows", name)));
            }
            if profile.high_low_lookback == 0 {
                return Err(BreadthError::ConfigError(format!("Profile '{}' has a high/low lookback of 0", name)));
            }
        }

        if self.chart.smoothing_window == 0 {
            return Err(BreadthError::ConfigError("Chart smoothing window must be greater than 0".to_string()));
        }

        Ok(())
    }
}
