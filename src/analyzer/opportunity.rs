use crate::model::{Classification, ClassifiedRow, ComparisonRow};

/// Inclusive range of current-year values treated as the standard market.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeBand {
    pub min: f64,
    pub max: f64,
}

impl VolumeBand {
    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// Band given in millions, open at the top when `max` is `None`.
    pub fn from_millions(min: f64, max: Option<f64>) -> Self {
        Self {
            min: min * 1_000_000.0,
            max: max.map_or(f64::INFINITY, |m| m * 1_000_000.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpportunityConfig {
    pub band: VolumeBand,
    pub gem_enabled: bool,
    /// Minimum growth in percent for a gem.
    pub gem_growth_threshold: f64,
    /// Values at or below this never qualify as gems.
    pub noise_floor: f64,
}

/// Standard if inside the band, otherwise Gem when gem mode is on and the row
/// sits between the noise floor and the band with enough growth.
pub fn classify_row(row: &ComparisonRow, cfg: &OpportunityConfig) -> Classification {
    let value = row.value_current;

    if cfg.band.contains(value) {
        return Classification::Standard;
    }

    let is_gem = cfg.gem_enabled
        && value < cfg.band.min
        && value > cfg.noise_floor
        && row
            .growth_pct
            .is_some_and(|growth| growth >= cfg.gem_growth_threshold);

    if is_gem {
        Classification::Gem
    } else {
        Classification::Excluded
    }
}

/// Tags every row; nothing is dropped here.
pub fn classify(rows: Vec<ComparisonRow>, cfg: &OpportunityConfig) -> Vec<ClassifiedRow> {
    rows.into_iter()
        .map(|row| {
            let classification = classify_row(&row, cfg);
            ClassifiedRow { row, classification }
        })
        .collect()
}
