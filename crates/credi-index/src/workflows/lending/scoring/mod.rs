mod config;
mod rules;

pub use config::{BucketTable, FactorWeights, RampCaps, ScoringTable, ScoringTableError};

use std::collections::BTreeMap;
use std::sync::OnceLock;

use serde::Serialize;
use tracing::warn;

use super::domain::{ApplicationInput, RiskTier, ScoreFactor};

/// Stateless engine applying a scoring table to validated applications.
#[derive(Debug, Clone, Default)]
pub struct CredibilityEngine {
    table: ScoringTable,
}

impl CredibilityEngine {
    pub fn new(table: ScoringTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &ScoringTable {
        &self.table
    }

    pub fn score(&self, input: &ApplicationInput) -> CredibilityScore {
        let readings = rules::read_factors(input, &self.table);
        let (components, raw_index) = rules::weigh(readings, &self.table);

        for component in components.iter().filter(|component| component.fallback) {
            warn!(
                factor = component.factor.label(),
                normalized = component.normalized,
                "scored unrecognized bucket with table fallback"
            );
        }

        let value = raw_index.round().clamp(0.0, 100.0) as u8;

        CredibilityScore {
            value,
            raw_index,
            tier: RiskTier::from_index(value),
            components,
        }
    }
}

/// Score an application with the canonical table.
pub fn compute_credibility_score(input: &ApplicationInput) -> CredibilityScore {
    static CANONICAL: OnceLock<CredibilityEngine> = OnceLock::new();
    CANONICAL
        .get_or_init(CredibilityEngine::default)
        .score(input)
}

/// Weighted share of one factor in the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorContribution {
    pub factor: ScoreFactor,
    pub symbol: &'static str,
    pub weight: f64,
    pub normalized: f64,
    /// Points this factor adds to the 0..=100 index.
    pub contribution: f64,
    pub fallback: bool,
    pub notes: String,
}

/// Credibility Index with the breakdown that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredibilityScore {
    #[serde(rename = "credibilityIndex")]
    pub value: u8,
    pub raw_index: f64,
    pub tier: RiskTier,
    pub components: Vec<FactorContribution>,
}

impl CredibilityScore {
    /// Bare score for callers that only carry the index, e.g. a standalone offer quote.
    pub fn from_index(value: u8) -> Self {
        let value = value.min(100);
        Self {
            value,
            raw_index: f64::from(value),
            tier: RiskTier::from_index(value),
            components: Vec::new(),
        }
    }

    /// Factor to normalized value, as rendered by the dashboard breakdown.
    pub fn sub_factors(&self) -> BTreeMap<ScoreFactor, f64> {
        self.components
            .iter()
            .map(|component| (component.factor, component.normalized))
            .collect()
    }

    pub fn used_fallback(&self) -> bool {
        self.components.iter().any(|component| component.fallback)
    }
}
