use crate::analyzer::ChapterScope;
use chrono::{Datelike, Utc};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://api.census.gov/data/timeseries/intltrade/imports/hs";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("cannot parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Calendar quarter; each one is three consecutive months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
pub enum Quarter {
    #[default]
    Q1,
    Q2,
    Q3,
    Q4,
}

impl Quarter {
    pub fn months(&self) -> [u32; 3] {
        match self {
            Quarter::Q1 => [1, 2, 3],
            Quarter::Q2 => [4, 5, 6],
            Quarter::Q3 => [7, 8, 9],
            Quarter::Q4 => [10, 11, 12],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Quarter::Q1 => "Q1 (Jan-Mar)",
            Quarter::Q2 => "Q2 (Apr-Jun)",
            Quarter::Q3 => "Q3 (Jul-Sep)",
            Quarter::Q4 => "Q4 (Oct-Dec)",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub endpoint: String,
    /// Classification granularity requested from the API (`HS4` = 4-digit codes).
    pub commodity_level: String,
    pub api_key: Option<String>,
    pub timeout_seconds: u64,
    pub max_concurrent_requests: usize,
    pub user_agent: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            commodity_level: "HS4".to_string(),
            api_key: None,
            timeout_seconds: 30,
            max_concurrent_requests: 3,
            user_agent: format!("TrendScout/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Defaults to the current calendar year.
    pub year: Option<i32>,
    pub quarter: Quarter,
    pub min_volume_millions: f64,
    /// `None` leaves the band open at the top.
    pub max_volume_millions: Option<f64>,
    pub gem_mode: bool,
    pub gem_growth_threshold: f64,
    pub noise_floor: f64,
    /// `ALL` or a chapter prefix such as `84`.
    pub chapter: String,
    pub chapter_prefix_len: usize,
    pub top_n: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            year: None,
            quarter: Quarter::Q1,
            min_volume_millions: 50.0,
            max_volume_millions: None,
            gem_mode: false,
            gem_growth_threshold: 200.0,
            noise_floor: 5_000.0,
            chapter: "ALL".to_string(),
            chapter_prefix_len: 2,
            top_n: 15,
        }
    }
}

impl AnalysisConfig {
    pub fn resolved_year(&self) -> i32 {
        self.year.unwrap_or_else(|| Utc::now().year())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub source: SourceConfig,
    pub analysis: AnalysisConfig,
    /// SQLite month cache; `null` disables caching.
    pub cache_path: Option<String>,
    pub export_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            analysis: AnalysisConfig::default(),
            cache_path: Some("trade_cache.db".to_string()),
            export_path: None,
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let a = &self.analysis;
        let year = a.resolved_year();
        if !(1990..=2100).contains(&year) {
            return Err(ConfigError::Invalid(format!("year {} out of range", year)));
        }
        if !a.min_volume_millions.is_finite() || a.min_volume_millions < 0.0 {
            return Err(ConfigError::Invalid("min_volume_millions must be >= 0".into()));
        }
        if let Some(max) = a.max_volume_millions {
            if max.is_nan() || max < a.min_volume_millions {
                return Err(ConfigError::Invalid(format!(
                    "volume band is empty: min {} > max {}",
                    a.min_volume_millions, max
                )));
            }
        }
        if !a.noise_floor.is_finite() || a.noise_floor < 0.0 {
            return Err(ConfigError::Invalid("noise_floor must be >= 0".into()));
        }
        if !a.gem_growth_threshold.is_finite() {
            return Err(ConfigError::Invalid("gem_growth_threshold must be finite".into()));
        }
        if a.chapter.trim().is_empty() {
            return Err(ConfigError::Invalid("chapter must be ALL or a code prefix".into()));
        }
        if a.chapter_prefix_len == 0 {
            return Err(ConfigError::Invalid("chapter_prefix_len must be > 0".into()));
        }
        if let ChapterScope::Chapter(prefix) = ChapterScope::parse(&a.chapter) {
            let len = prefix.chars().count();
            if len != a.chapter_prefix_len {
                return Err(ConfigError::Invalid(format!(
                    "chapter {:?} has {} characters, chapter_prefix_len is {}",
                    prefix, len, a.chapter_prefix_len
                )));
            }
        }
        if a.top_n == 0 {
            return Err(ConfigError::Invalid("top_n must be > 0".into()));
        }
        if self.source.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid("max_concurrent_requests must be > 0".into()));
        }
        if self.source.timeout_seconds == 0 {
            return Err(ConfigError::Invalid("timeout_seconds must be > 0".into()));
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}
