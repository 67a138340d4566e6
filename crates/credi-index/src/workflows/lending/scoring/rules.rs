use super::super::domain::{ApplicationInput, ScoreFactor};
use super::config::ScoringTable;
use super::FactorContribution;

/// Normalized reading of one factor before weighting.
pub(crate) struct FactorReading {
    pub factor: ScoreFactor,
    pub normalized: f64,
    pub fallback: bool,
    pub notes: String,
}

pub(crate) fn read_factors(input: &ApplicationInput, table: &ScoringTable) -> Vec<FactorReading> {
    ScoreFactor::ALL
        .iter()
        .map(|factor| read_factor(*factor, input, table))
        .collect()
}

fn read_factor(factor: ScoreFactor, input: &ApplicationInput, table: &ScoringTable) -> FactorReading {
    let caps = &table.caps;
    match factor {
        ScoreFactor::LoanAmount => ramp_reading(factor, input.loan_amount, caps.loan_amount),
        ScoreFactor::LoanTerm => ramp_reading(
            factor,
            f64::from(input.loan_term_months),
            caps.loan_term_months,
        ),
        ScoreFactor::MonthlyIncome => {
            ramp_reading(factor, input.monthly_income, caps.monthly_income)
        }
        ScoreFactor::LoanPurpose => {
            let (normalized, fallback) = table.loan_purpose.resolve(&input.loan_purpose);
            bucket_reading(factor, input.loan_purpose.label(), normalized, fallback)
        }
        ScoreFactor::Employment => {
            let (normalized, fallback) = table.employment.resolve(&input.employment_status);
            bucket_reading(factor, input.employment_status.label(), normalized, fallback)
        }
        ScoreFactor::Savings => {
            let (normalized, fallback) = table.savings.resolve(&input.savings_ratio);
            bucket_reading(factor, input.savings_ratio.label(), normalized, fallback)
        }
        ScoreFactor::IncomeStability => {
            let (normalized, fallback) = table.income_stability.resolve(&input.income_stability);
            bucket_reading(factor, input.income_stability.label(), normalized, fallback)
        }
        ScoreFactor::MissedPayments => {
            let (normalized, fallback) = table.missed_payments.resolve(&input.missed_payments);
            bucket_reading(factor, input.missed_payments.label(), normalized, fallback)
        }
        ScoreFactor::DebtToIncome => {
            let (normalized, fallback) = table.debt_to_income.resolve(&input.debt_to_income);
            bucket_reading(factor, input.debt_to_income.label(), normalized, fallback)
        }
    }
}

/// `min(value / cap, 1.0)`, floored at zero.
pub(crate) fn ramp(value: f64, cap: f64) -> f64 {
    (value / cap).clamp(0.0, 1.0)
}

fn ramp_reading(factor: ScoreFactor, value: f64, cap: f64) -> FactorReading {
    let normalized = ramp(value, cap);
    FactorReading {
        factor,
        normalized,
        fallback: false,
        notes: if normalized >= 1.0 {
            format!("{value} at or above cap {cap}")
        } else {
            format!("{value} of cap {cap}")
        },
    }
}

fn bucket_reading(
    factor: ScoreFactor,
    label: &str,
    normalized: f64,
    fallback: bool,
) -> FactorReading {
    let notes = if fallback {
        format!("unrecognized bucket '{label}' scored with fallback {normalized:.2}")
    } else {
        format!("bucket '{label}'")
    };
    FactorReading {
        factor,
        normalized,
        fallback,
        notes,
    }
}

/// Weighs each reading and returns the contributions with the unrounded index. Summation runs
/// in formula order starting from zero.
pub(crate) fn weigh(
    readings: Vec<FactorReading>,
    table: &ScoringTable,
) -> (Vec<FactorContribution>, f64) {
    let mut weighted_sum = 0.0;
    let mut contributions = Vec::with_capacity(readings.len());

    for reading in readings {
        let weight = table.weights.weight(reading.factor);
        let weighted = weight * reading.normalized;
        weighted_sum += weighted;
        contributions.push(FactorContribution {
            factor: reading.factor,
            symbol: reading.factor.symbol(),
            weight,
            normalized: reading.normalized,
            contribution: 100.0 * weighted,
            fallback: reading.fallback,
            notes: reading.notes,
        });
    }

    (contributions, 100.0 * weighted_sum)
}
