use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ApplicationSubmission, DebtToIncome, EmploymentStatus, IncomeStability, LoanPurpose,
    MissedPayments, SavingsRatio,
};
use super::repository::ApplicationRepository;
use super::service::{Assessment, LendingService, LendingServiceError};

#[derive(Debug)]
pub enum BatchImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for BatchImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchImportError::Io(err) => write!(f, "failed to read application batch: {}", err),
            BatchImportError::Csv(err) => write!(f, "invalid application CSV data: {}", err),
        }
    }
}

impl std::error::Error for BatchImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BatchImportError::Io(err) => Some(err),
            BatchImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for BatchImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for BatchImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

#[derive(Debug, Deserialize)]
struct BatchRow {
    loan_amount: f64,
    loan_purpose: LoanPurpose,
    loan_term_months: u32,
    employment_status: EmploymentStatus,
    monthly_income: f64,
    savings_ratio: SavingsRatio,
    income_stability: IncomeStability,
    missed_payments: MissedPayments,
    debt_to_income: DebtToIncome,
}

impl From<BatchRow> for ApplicationSubmission {
    fn from(row: BatchRow) -> Self {
        Self {
            loan_amount: row.loan_amount,
            loan_purpose: row.loan_purpose,
            loan_term_months: row.loan_term_months,
            employment_status: row.employment_status,
            monthly_income: row.monthly_income,
            savings_ratio: row.savings_ratio,
            income_stability: row.income_stability,
            missed_payments: row.missed_payments,
            debt_to_income: row.debt_to_income,
        }
    }
}

/// Parse a CSV of loan applications. Cells are trimmed; bucket labels are matched
/// case-insensitively like the JSON intake.
pub fn parse_submissions<R: Read>(reader: R) -> Result<Vec<ApplicationSubmission>, BatchImportError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut submissions = Vec::new();

    for row in csv_reader.deserialize::<BatchRow>() {
        submissions.push(row?.into());
    }

    Ok(submissions)
}

pub fn load_submissions<P: AsRef<Path>>(
    path: P,
) -> Result<Vec<ApplicationSubmission>, BatchImportError> {
    let file = File::open(path)?;
    parse_submissions(file)
}

/// Result of scoring one CSV row; `row` is 1-based and excludes the header.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchOutcome {
    pub row: usize,
    #[serde(flatten)]
    pub result: BatchResult,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BatchResult {
    Scored(Assessment),
    Rejected { error: String },
}

impl BatchOutcome {
    pub fn assessment(&self) -> Option<&Assessment> {
        match &self.result {
            BatchResult::Scored(assessment) => Some(assessment),
            BatchResult::Rejected { .. } => None,
        }
    }
}

/// Assess every submission; rejected rows are reported alongside the scored ones.
pub fn score_batch<R>(
    service: &LendingService<R>,
    submissions: Vec<ApplicationSubmission>,
) -> Vec<BatchOutcome>
where
    R: ApplicationRepository + 'static,
{
    let outcomes: Vec<BatchOutcome> = submissions
        .into_iter()
        .enumerate()
        .map(|(index, submission)| {
            let row = index + 1;
            let result = match service.assess(submission) {
                Ok(assessment) => BatchResult::Scored(assessment),
                Err(LendingServiceError::Intake(violation)) => {
                    warn!(row, field = violation.field(), error = %violation, "rejected batch row");
                    BatchResult::Rejected {
                        error: violation.to_string(),
                    }
                }
                Err(other) => BatchResult::Rejected {
                    error: other.to_string(),
                },
            };
            BatchOutcome { row, result }
        })
        .collect();

    let scored = outcomes
        .iter()
        .filter(|outcome| outcome.assessment().is_some())
        .count();
    info!(
        rows = outcomes.len(),
        scored,
        rejected = outcomes.len() - scored,
        "scored application batch"
    );

    outcomes
}
