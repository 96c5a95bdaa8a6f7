//! Pipeline configuration loaded from YAML

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::MiningError;
use crate::filter::BusinessFilter;

/// Top-level configuration file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub paths: PathsConfig,
    pub cleaning: CleaningConfig,
    pub mining: MiningConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("data/retail.db"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Raw Online Retail II export
    pub raw_input: PathBuf,
    /// Cleaned transactions CSV
    pub cleaned: PathBuf,
    /// Directory for rules and BI tables
    pub processed_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_input: PathBuf::from("data/external/online_retail_II.csv"),
            cleaned: PathBuf::from("data/processed/cleaned_retail.csv"),
            processed_dir: PathBuf::from("data/processed"),
        }
    }
}

impl PathsConfig {
    pub fn rules_csv(&self) -> PathBuf {
        self.processed_dir.join("association_rules.csv")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Only lines priced strictly above this are kept
    pub min_unit_price: f64,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self { min_unit_price: 5.0 }
    }
}

/// Thresholds for the mining stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MiningConfig {
    /// Lowest minimum support the dynamic threshold may use
    pub support_floor: f64,
    /// Baskets an itemset should cover before it counts as frequent
    pub min_basket_count: f64,
    /// Fixed minimum support, bypassing the dynamic threshold
    pub min_support_override: Option<f64>,
    pub max_itemset_len: Option<usize>,
    pub min_conviction: f64,
    pub min_confidence: f64,
    pub min_lift: f64,
    pub min_support: f64,
}

impl Default for MiningConfig {
    fn default() -> Self {
        let filter = BusinessFilter::default();
        Self {
            support_floor: 0.01,
            min_basket_count: 50.0,
            min_support_override: None,
            max_itemset_len: None,
            min_conviction: 1.2,
            min_confidence: filter.min_confidence,
            min_lift: filter.min_lift,
            min_support: filter.min_support,
        }
    }
}

impl MiningConfig {
    pub fn business_filter(&self) -> BusinessFilter {
        BusinessFilter {
            min_confidence: self.min_confidence,
            min_lift: self.min_lift,
            min_support: self.min_support,
        }
    }

    /// Check every threshold is finite and in range
    pub fn validate(&self) -> Result<(), MiningError> {
        let fraction = |name: &'static str, value: f64| {
            if value.is_finite() && value > 0.0 && value <= 1.0 {
                Ok(())
            } else {
                Err(MiningError::InvalidThreshold {
                    name,
                    value,
                    expected: "a fraction in (0, 1]",
                })
            }
        };
        let non_negative = |name: &'static str, value: f64| {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(MiningError::InvalidThreshold {
                    name,
                    value,
                    expected: "a finite value >= 0",
                })
            }
        };

        fraction("support_floor", self.support_floor)?;
        if let Some(value) = self.min_support_override {
            fraction("min_support_override", value)?;
        }
        fraction("min_confidence", self.min_confidence)?;
        fraction("min_support", self.min_support)?;
        non_negative("min_conviction", self.min_conviction)?;
        non_negative("min_lift", self.min_lift)?;

        if !(self.min_basket_count.is_finite() && self.min_basket_count > 0.0) {
            return Err(MiningError::InvalidThreshold {
                name: "min_basket_count",
                value: self.min_basket_count,
                expected: "a positive basket count",
            });
        }
        if self.max_itemset_len == Some(0) {
            return Err(MiningError::InvalidThreshold {
                name: "max_itemset_len",
                value: 0.0,
                expected: "at least 1",
            });
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load a YAML configuration file
    pub fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config = Self::from_yaml(&text)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> crate::Result<Self> {
        let config: Self = serde_yaml::from_str(text)?;
        config.mining.validate()?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise fall back to defaults
    pub fn load_or_default(path: Option<&Path>) -> crate::Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
