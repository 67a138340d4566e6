use chrono::Utc;

use super::domain::{ApplicationInput, ApplicationSubmission};

/// Validation errors raised by the intake guard before anything reaches the scoring formula.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("loan amount must be positive (found {found})")]
    NonPositiveLoanAmount { found: f64 },
    #[error("loan amount must be between {min} and {max} (found {found})")]
    LoanAmountOutOfRange { min: f64, max: f64, found: f64 },
    #[error("loan term must be between {min} and {max} months (found {found})")]
    LoanTermOutOfRange { min: u32, max: u32, found: u32 },
    #[error("monthly income cannot be negative (found {found})")]
    NegativeIncome { found: f64 },
    #[error("credibility index must be between 0 and 100 (found {found})")]
    IndexOutOfRange { found: u16 },
}

impl IntakeViolation {
    /// Form field the violation refers to, for inline error display.
    pub fn field(&self) -> &'static str {
        match self {
            IntakeViolation::NonFinite { field } => field,
            IntakeViolation::NonPositiveLoanAmount { .. }
            | IntakeViolation::LoanAmountOutOfRange { .. } => "loanAmount",
            IntakeViolation::LoanTermOutOfRange { .. } => "loanTermMonths",
            IntakeViolation::NegativeIncome { .. } => "monthlyIncome",
            IntakeViolation::IndexOutOfRange { .. } => "credibilityIndex",
        }
    }
}

const DEFAULT_MIN_LOAN_AMOUNT: f64 = 1_000.0;
const DEFAULT_MAX_LOAN_AMOUNT: f64 = 1_000_000.0;
const DEFAULT_MIN_TERM_MONTHS: u32 = 6;
const DEFAULT_MAX_TERM_MONTHS: u32 = 360;

/// Accepted ranges for the numeric form fields.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakePolicy {
    pub min_loan_amount: f64,
    pub max_loan_amount: f64,
    pub min_term_months: u32,
    pub max_term_months: u32,
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self {
            min_loan_amount: DEFAULT_MIN_LOAN_AMOUNT,
            max_loan_amount: DEFAULT_MAX_LOAN_AMOUNT,
            min_term_months: DEFAULT_MIN_TERM_MONTHS,
            max_term_months: DEFAULT_MAX_TERM_MONTHS,
        }
    }
}

/// Guard responsible for producing `ApplicationInput` instances.
#[derive(Debug, Clone, Default)]
pub struct IntakeGuard {
    policy: IntakePolicy,
}

impl IntakeGuard {
    pub fn with_policy(policy: IntakePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    /// Convert a posted form into a validated, timestamped application.
    pub fn admit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationInput, IntakeViolation> {
        self.check_amount_and_term(submission.loan_amount, submission.loan_term_months)?;

        if !submission.monthly_income.is_finite() {
            return Err(IntakeViolation::NonFinite {
                field: "monthlyIncome",
            });
        }
        if submission.monthly_income < 0.0 {
            return Err(IntakeViolation::NegativeIncome {
                found: submission.monthly_income,
            });
        }

        Ok(ApplicationInput {
            loan_amount: submission.loan_amount,
            loan_purpose: submission.loan_purpose,
            loan_term_months: submission.loan_term_months,
            employment_status: submission.employment_status,
            monthly_income: submission.monthly_income,
            savings_ratio: submission.savings_ratio,
            income_stability: submission.income_stability,
            missed_payments: submission.missed_payments,
            debt_to_income: submission.debt_to_income,
            submitted_at: Utc::now(),
        })
    }

    /// Validate the inputs of a standalone offer quote.
    pub fn check_quote(
        &self,
        credibility_index: u16,
        requested_amount: f64,
        term_months: u32,
    ) -> Result<u8, IntakeViolation> {
        let index = u8::try_from(credibility_index)
            .ok()
            .filter(|index| *index <= 100)
            .ok_or(IntakeViolation::IndexOutOfRange {
                found: credibility_index,
            })?;
        self.check_amount_and_term(requested_amount, term_months)?;
        Ok(index)
    }

    fn check_amount_and_term(&self, amount: f64, term_months: u32) -> Result<(), IntakeViolation> {
        if !amount.is_finite() {
            return Err(IntakeViolation::NonFinite {
                field: "loanAmount",
            });
        }
        if amount <= 0.0 {
            return Err(IntakeViolation::NonPositiveLoanAmount { found: amount });
        }
        if amount < self.policy.min_loan_amount || amount > self.policy.max_loan_amount {
            return Err(IntakeViolation::LoanAmountOutOfRange {
                min: self.policy.min_loan_amount,
                max: self.policy.max_loan_amount,
                found: amount,
            });
        }

        if term_months < self.policy.min_term_months || term_months > self.policy.max_term_months
        {
            return Err(IntakeViolation::LoanTermOutOfRange {
                min: self.policy.min_term_months,
                max: self.policy.max_term_months,
                found: term_months,
            });
        }

        Ok(())
    }
}
