use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::super::domain::{
    DebtToIncome, EmploymentStatus, IncomeStability, LoanPurpose, MissedPayments, SavingsRatio,
    ScoreFactor,
};

const WEIGHT_SUM_TOLERANCE: f64 = 1e-9;

/// Weight applied to each normalized factor. The canonical set sums to exactly 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FactorWeights {
    pub loan_amount: f64,
    pub loan_purpose: f64,
    pub loan_term: f64,
    pub employment: f64,
    pub monthly_income: f64,
    pub savings: f64,
    pub income_stability: f64,
    pub missed_payments: f64,
    pub debt_to_income: f64,
}

impl FactorWeights {
    pub const CANONICAL: FactorWeights = FactorWeights {
        loan_amount: 0.10,
        loan_purpose: 0.10,
        loan_term: 0.10,
        employment: 0.15,
        monthly_income: 0.15,
        savings: 0.10,
        income_stability: 0.10,
        missed_payments: 0.15,
        debt_to_income: 0.05,
    };

    pub fn weight(&self, factor: ScoreFactor) -> f64 {
        match factor {
            ScoreFactor::LoanAmount => self.loan_amount,
            ScoreFactor::LoanPurpose => self.loan_purpose,
            ScoreFactor::LoanTerm => self.loan_term,
            ScoreFactor::Employment => self.employment,
            ScoreFactor::MonthlyIncome => self.monthly_income,
            ScoreFactor::Savings => self.savings,
            ScoreFactor::IncomeStability => self.income_stability,
            ScoreFactor::MissedPayments => self.missed_payments,
            ScoreFactor::DebtToIncome => self.debt_to_income,
        }
    }

    pub fn total(&self) -> f64 {
        ScoreFactor::ALL
            .iter()
            .map(|factor| self.weight(*factor))
            .sum()
    }
}

impl Default for FactorWeights {
    fn default() -> Self {
        Self::CANONICAL
    }
}

/// Amounts at which the linear ramps saturate at 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RampCaps {
    pub loan_amount: f64,
    pub loan_term_months: f64,
    pub monthly_income: f64,
}

impl Default for RampCaps {
    fn default() -> Self {
        Self {
            loan_amount: 50_000.0,
            loan_term_months: 36.0,
            monthly_income: 15_000.0,
        }
    }
}

/// Total mapping from a bucket to its normalized value with a declared fallback for labels the
/// table does not list. Every known label must have an entry; the fallback only ever scores
/// unrecognized input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketTable<K: Ord> {
    pub values: BTreeMap<K, f64>,
    pub fallback: f64,
}

impl<K: Ord> BucketTable<K> {
    pub fn new(entries: impl IntoIterator<Item = (K, f64)>, fallback: f64) -> Self {
        Self {
            values: entries.into_iter().collect(),
            fallback,
        }
    }

    /// Normalized value for `key`, plus whether the fallback was used.
    pub fn resolve(&self, key: &K) -> (f64, bool) {
        match self.values.get(key) {
            Some(value) => (*value, false),
            None => (self.fallback, true),
        }
    }

    /// First known bucket without an entry.
    fn missing<'a>(&self, known: &'a [K]) -> Option<&'a K> {
        known.iter().find(|key| !self.values.contains_key(*key))
    }

    fn out_of_range(&self) -> Option<f64> {
        self.values
            .values()
            .copied()
            .chain(std::iter::once(self.fallback))
            .find(|value| !(0.0..=1.0).contains(value))
    }
}

/// Weights, ramp caps, and bucket maps behind the Credibility Index. Serializes to JSON so the
/// table can be tuned without a rebuild.
///
/// The default table scores an unrecognized label like the worst known bucket of its factor,
/// so an unexpected "7+" missed-payments label never outranks "6+".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringTable {
    pub weights: FactorWeights,
    pub caps: RampCaps,
    pub loan_purpose: BucketTable<LoanPurpose>,
    pub employment: BucketTable<EmploymentStatus>,
    pub savings: BucketTable<SavingsRatio>,
    pub income_stability: BucketTable<IncomeStability>,
    pub missed_payments: BucketTable<MissedPayments>,
    pub debt_to_income: BucketTable<DebtToIncome>,
}

impl Default for ScoringTable {
    fn default() -> Self {
        Self {
            weights: FactorWeights::CANONICAL,
            caps: RampCaps::default(),
            loan_purpose: BucketTable::new(
                [
                    (LoanPurpose::Debt, 0.90),
                    (LoanPurpose::Home, 0.85),
                    (LoanPurpose::Education, 0.80),
                    (LoanPurpose::Business, 0.75),
                    (LoanPurpose::Medical, 0.70),
                    (LoanPurpose::Emergency, 0.60),
                ],
                0.60,
            ),
            employment: BucketTable::new(
                [
                    (EmploymentStatus::FullTime, 1.00),
                    (EmploymentStatus::SelfEmployed, 0.85),
                    (EmploymentStatus::PartTime, 0.70),
                    (EmploymentStatus::Student, 0.50),
                    (EmploymentStatus::Unemployed, 0.30),
                ],
                0.30,
            ),
            savings: BucketTable::new(
                [
                    (SavingsRatio::OverFifty, 1.00),
                    (SavingsRatio::TwentyFiveToFifty, 0.85),
                    (SavingsRatio::TenToTwentyFive, 0.70),
                    (SavingsRatio::UpToTen, 0.50),
                ],
                0.50,
            ),
            income_stability: BucketTable::new(
                [
                    (IncomeStability::Consistent, 1.00),
                    (IncomeStability::Fluctuation, 0.70),
                    (IncomeStability::Variable, 0.40),
                ],
                0.40,
            ),
            missed_payments: BucketTable::new(
                [
                    (MissedPayments::Zero, 1.00),
                    (MissedPayments::OneToTwo, 0.70),
                    (MissedPayments::ThreeToFive, 0.40),
                    (MissedPayments::SixOrMore, 0.10),
                ],
                0.10,
            ),
            debt_to_income: BucketTable::new(
                [
                    (DebtToIncome::UpToTwenty, 1.00),
                    (DebtToIncome::TwentyOneToForty, 0.80),
                    (DebtToIncome::FortyOneToSixty, 0.50),
                    (DebtToIncome::OverSixty, 0.20),
                ],
                0.20,
            ),
        }
    }
}

impl ScoringTable {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ScoringTableError> {
        let table: ScoringTable = serde_json::from_reader(reader)?;
        table.validate()?;
        Ok(table)
    }

    pub fn from_path(path: &Path) -> Result<Self, ScoringTableError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    /// Reject tables that could push the index outside 0..=100 or that leave a known bucket to
    /// the fallback.
    pub fn validate(&self) -> Result<(), ScoringTableError> {
        for factor in ScoreFactor::ALL {
            let weight = self.weights.weight(factor);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ScoringTableError::InvalidWeight { factor, weight });
            }
        }

        let total = self.weights.total();
        if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ScoringTableError::WeightSum { total });
        }

        for (name, cap) in [
            ("loanAmount", self.caps.loan_amount),
            ("loanTermMonths", self.caps.loan_term_months),
            ("monthlyIncome", self.caps.monthly_income),
        ] {
            if !cap.is_finite() || cap <= 0.0 {
                return Err(ScoringTableError::InvalidCap { name, cap });
            }
        }

        let missing = [
            (
                ScoreFactor::LoanPurpose,
                self.loan_purpose.missing(LoanPurpose::KNOWN).map(ToString::to_string),
            ),
            (
                ScoreFactor::Employment,
                self.employment.missing(EmploymentStatus::KNOWN).map(ToString::to_string),
            ),
            (
                ScoreFactor::Savings,
                self.savings.missing(SavingsRatio::KNOWN).map(ToString::to_string),
            ),
            (
                ScoreFactor::IncomeStability,
                self.income_stability
                    .missing(IncomeStability::KNOWN)
                    .map(ToString::to_string),
            ),
            (
                ScoreFactor::MissedPayments,
                self.missed_payments
                    .missing(MissedPayments::KNOWN)
                    .map(ToString::to_string),
            ),
            (
                ScoreFactor::DebtToIncome,
                self.debt_to_income.missing(DebtToIncome::KNOWN).map(ToString::to_string),
            ),
        ];
        if let Some((factor, Some(label))) = missing.into_iter().find(|(_, gap)| gap.is_some()) {
            return Err(ScoringTableError::MissingBucket { factor, label });
        }

        let buckets = [
            (ScoreFactor::LoanPurpose, self.loan_purpose.out_of_range()),
            (ScoreFactor::Employment, self.employment.out_of_range()),
            (ScoreFactor::Savings, self.savings.out_of_range()),
            (
                ScoreFactor::IncomeStability,
                self.income_stability.out_of_range(),
            ),
            (
                ScoreFactor::MissedPayments,
                self.missed_payments.out_of_range(),
            ),
            (ScoreFactor::DebtToIncome, self.debt_to_income.out_of_range()),
        ];
        if let Some((factor, Some(value))) = buckets.into_iter().find(|(_, bad)| bad.is_some()) {
            return Err(ScoringTableError::BucketOutOfRange { factor, value });
        }

        Ok(())
    }
}

/// Errors raised while loading or validating a scoring table.
#[derive(Debug, thiserror::Error)]
pub enum ScoringTableError {
    #[error("failed to read scoring table: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid scoring table JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("weights must sum to 1.0 (found {total})")]
    WeightSum { total: f64 },
    #[error("weight for {factor:?} must be a non-negative number (found {weight})")]
    InvalidWeight { factor: ScoreFactor, weight: f64 },
    #[error("ramp cap {name} must be positive (found {cap})")]
    InvalidCap { name: &'static str, cap: f64 },
    #[error("bucket value for {factor:?} must lie within 0..=1 (found {value})")]
    BucketOutOfRange { factor: ScoreFactor, value: f64 },
    #[error("bucket table for {factor:?} has no entry for '{label}'")]
    MissingBucket { factor: ScoreFactor, label: String },
}
