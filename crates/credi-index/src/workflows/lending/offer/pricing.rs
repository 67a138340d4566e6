use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the APR is derived from the Credibility Index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AprModel {
    /// Base APR of the pricing tier the index falls into.
    #[default]
    Tiered,
    /// Piecewise-linear APR that moves with every index point.
    Continuous,
}

impl AprModel {
    pub const fn label(self) -> &'static str {
        match self {
            AprModel::Tiered => "tiered",
            AprModel::Continuous => "continuous",
        }
    }
}

impl fmt::Display for AprModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AprModel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tiered" | "step" => Ok(AprModel::Tiered),
            "continuous" | "linear" => Ok(AprModel::Continuous),
            other => Err(format!("unknown APR model '{other}'")),
        }
    }
}

/// One row of the risk-based pricing table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    /// Lowest index (inclusive) that qualifies for this tier.
    pub min_index: u8,
    pub approval_ratio: f64,
    pub base_apr: f64,
}

const STANDARD_TIERS: [PricingTier; 4] = [
    PricingTier {
        min_index: 80,
        approval_ratio: 1.0,
        base_apr: 5.5,
    },
    PricingTier {
        min_index: 60,
        approval_ratio: 0.9,
        base_apr: 7.5,
    },
    PricingTier {
        min_index: 40,
        approval_ratio: 0.7,
        base_apr: 10.0,
    },
    PricingTier {
        min_index: 0,
        approval_ratio: 0.5,
        base_apr: 15.0,
    },
];

/// Approval ratio and APR lookup keyed by Credibility Index.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingTable {
    tiers: [PricingTier; 4],
    apr_model: AprModel,
}

impl PricingTable {
    pub fn new(apr_model: AprModel) -> Self {
        Self {
            tiers: STANDARD_TIERS,
            apr_model,
        }
    }

    pub fn apr_model(&self) -> AprModel {
        self.apr_model
    }

    pub fn tiers(&self) -> &[PricingTier] {
        &self.tiers
    }

    /// Tier for `index`; tiers are ordered by descending `min_index` and the last one starts at 0.
    pub fn tier_for(&self, index: u8) -> &PricingTier {
        self.tiers
            .iter()
            .find(|tier| index >= tier.min_index)
            .unwrap_or(&self.tiers[self.tiers.len() - 1])
    }

    pub fn apr_for(&self, index: u8) -> f64 {
        match self.apr_model {
            AprModel::Tiered => self.tier_for(index).base_apr,
            AprModel::Continuous => continuous_apr(index),
        }
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self::new(AprModel::default())
    }
}

/// Piecewise-linear APR, rounded to two decimals and capped at 18%.
pub fn continuous_apr(index: u8) -> f64 {
    let score = f64::from(index.min(100));
    let apr = if score >= 90.0 {
        3.5 + (100.0 - score) * 0.15
    } else if score >= 80.0 {
        5.0 + (90.0 - score) * 0.20
    } else if score >= 70.0 {
        7.0 + (80.0 - score) * 0.20
    } else if score >= 60.0 {
        9.0 + (70.0 - score) * 0.30
    } else {
        (12.0 + (60.0 - score) * 0.15).min(18.0)
    };
    (apr * 100.0).round() / 100.0
}
