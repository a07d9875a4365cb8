//! Column-role configuration for record construction

use serde::{Deserialize, Serialize};

use crate::period::Frequency;

/// Declares which columns of an entity table play which roles
///
/// Shared by the direct constructors and the long-table splitter; every
/// field except the target is optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Name of the target value column
    pub target: String,

    /// Timestamp column; `None` auto-detects the table's single
    /// datetime-typed column
    pub timestamp: Option<String>,

    /// Step size of the time axis; `None` infers it from the first
    /// entity's timestamps
    pub freq: Option<Frequency>,

    /// Dynamic real covariate columns, may extend beyond the observed
    /// horizon
    pub feat_dynamic_real: Vec<String>,

    /// Dynamic real covariate columns observed only up to the horizon
    pub past_feat_dynamic_real: Vec<String>,

    /// Static categorical covariate columns, constant per entity
    pub feat_static_cat: Vec<String>,

    /// Static real covariate columns, constant per entity
    pub feat_static_real: Vec<String>,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            target: "target".to_string(),
            timestamp: None,
            freq: None,
            feat_dynamic_real: Vec::new(),
            past_feat_dynamic_real: Vec::new(),
            feat_static_cat: Vec::new(),
            feat_static_real: Vec::new(),
        }
    }
}

impl DatasetConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the target column
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    /// Builder method to set the timestamp column
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    /// Builder method to set the frequency
    pub fn with_freq(mut self, freq: Frequency) -> Self {
        self.freq = Some(freq);
        self
    }

    /// Builder method to set the dynamic real feature columns
    pub fn with_feat_dynamic_real(mut self, columns: &[&str]) -> Self {
        self.feat_dynamic_real = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Builder method to set the past-only dynamic real feature columns
    pub fn with_past_feat_dynamic_real(mut self, columns: &[&str]) -> Self {
        self.past_feat_dynamic_real = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Builder method to set the static categorical feature columns
    pub fn with_feat_static_cat(mut self, columns: &[&str]) -> Self {
        self.feat_static_cat = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Builder method to set the static real feature columns
    pub fn with_feat_static_real(mut self, columns: &[&str]) -> Self {
        self.feat_static_real = columns.iter().map(|c| c.to_string()).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DatasetConfig::default();
        assert_eq!(config.target, "target");
        assert!(config.timestamp.is_none());
        assert!(config.freq.is_none());
        assert!(config.feat_dynamic_real.is_empty());
    }

    #[test]
    fn test_builder_methods() {
        let config = DatasetConfig::new()
            .with_target("demand")
            .with_timestamp("time")
            .with_freq("2H".parse().unwrap())
            .with_feat_dynamic_real(&["price", "promo"])
            .with_feat_static_cat(&["category"]);
        assert_eq!(config.target, "demand");
        assert_eq!(config.timestamp.as_deref(), Some("time"));
        assert_eq!(config.freq.unwrap().to_string(), "2H");
        assert_eq!(config.feat_dynamic_real, ["price", "promo"]);
        assert_eq!(config.feat_static_cat, ["category"]);
    }
}
