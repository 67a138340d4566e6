use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Declares a categorical bucket whose wire labels map onto variants. Labels outside the
/// known set land in `Unrecognized` so intake never fails on a new form option.
macro_rules! bucket_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(from = "String", into = "String")]
        pub enum $name {
            $($variant,)+
            Unrecognized(String),
        }

        impl $name {
            pub const KNOWN: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &str {
                match self {
                    $($name::$variant => $label,)+
                    $name::Unrecognized(raw) => raw.as_str(),
                }
            }

            pub fn is_recognized(&self) -> bool {
                !matches!(self, $name::Unrecognized(_))
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($label => $name::$variant,)+
                    _ => $name::Unrecognized(raw),
                }
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::from(raw.to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.label().to_string()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

bucket_enum! {
    /// Stated reason for borrowing.
    LoanPurpose {
        Debt => "debt",
        Home => "home",
        Education => "education",
        Medical => "medical",
        Business => "business",
        Emergency => "emergency",
    }
}

bucket_enum! {
    EmploymentStatus {
        FullTime => "fulltime",
        PartTime => "parttime",
        SelfEmployed => "selfemployed",
        Student => "student",
        Unemployed => "unemployed",
    }
}

bucket_enum! {
    /// Share of monthly income the applicant saves, in percent.
    SavingsRatio {
        UpToTen => "0-10",
        TenToTwentyFive => "10-25",
        TwentyFiveToFifty => "25-50",
        OverFifty => "50+",
    }
}

bucket_enum! {
    IncomeStability {
        Consistent => "consistent",
        Fluctuation => "fluctuation",
        Variable => "variable",
    }
}

bucket_enum! {
    /// Missed payments over the look-back window.
    MissedPayments {
        Zero => "0",
        OneToTwo => "1-2",
        ThreeToFive => "3-5",
        SixOrMore => "6+",
    }
}

bucket_enum! {
    /// Debt service as a percentage of income.
    DebtToIncome {
        UpToTwenty => "0-20",
        TwentyOneToForty => "21-40",
        FortyOneToSixty => "41-60",
        OverSixty => "61+",
    }
}

/// Identifier for the browser session that owns the latest application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Raw loan application as posted by the form, before intake validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub loan_amount: f64,
    pub loan_purpose: LoanPurpose,
    pub loan_term_months: u32,
    pub employment_status: EmploymentStatus,
    pub monthly_income: f64,
    pub savings_ratio: SavingsRatio,
    pub income_stability: IncomeStability,
    pub missed_payments: MissedPayments,
    pub debt_to_income: DebtToIncome,
}

/// Validated application. Numeric fields are finite, the loan amount is positive, and income
/// is non-negative; the intake guard is the only producer outside of tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInput {
    pub loan_amount: f64,
    pub loan_purpose: LoanPurpose,
    pub loan_term_months: u32,
    pub employment_status: EmploymentStatus,
    pub monthly_income: f64,
    pub savings_ratio: SavingsRatio,
    pub income_stability: IncomeStability,
    pub missed_payments: MissedPayments,
    pub debt_to_income: DebtToIncome,
    pub submitted_at: DateTime<Utc>,
}

/// The nine weighted factors of the Credibility Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ScoreFactor {
    LoanAmount,
    LoanPurpose,
    LoanTerm,
    Employment,
    MonthlyIncome,
    Savings,
    IncomeStability,
    MissedPayments,
    DebtToIncome,
}

impl ScoreFactor {
    /// Formula order; summation follows it so results are reproducible bit for bit.
    pub const ALL: [ScoreFactor; 9] = [
        ScoreFactor::LoanAmount,
        ScoreFactor::LoanPurpose,
        ScoreFactor::LoanTerm,
        ScoreFactor::Employment,
        ScoreFactor::MonthlyIncome,
        ScoreFactor::Savings,
        ScoreFactor::IncomeStability,
        ScoreFactor::MissedPayments,
        ScoreFactor::DebtToIncome,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            ScoreFactor::LoanAmount => "L",
            ScoreFactor::LoanPurpose => "P",
            ScoreFactor::LoanTerm => "T",
            ScoreFactor::Employment => "E",
            ScoreFactor::MonthlyIncome => "I",
            ScoreFactor::Savings => "S",
            ScoreFactor::IncomeStability => "ST",
            ScoreFactor::MissedPayments => "M",
            ScoreFactor::DebtToIncome => "D",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            ScoreFactor::LoanAmount => "loan amount",
            ScoreFactor::LoanPurpose => "loan purpose",
            ScoreFactor::LoanTerm => "loan term",
            ScoreFactor::Employment => "employment status",
            ScoreFactor::MonthlyIncome => "monthly income",
            ScoreFactor::Savings => "savings ratio",
            ScoreFactor::IncomeStability => "income stability",
            ScoreFactor::MissedPayments => "missed payments",
            ScoreFactor::DebtToIncome => "debt-to-income",
        }
    }
}

/// Risk classification derived from the Credibility Index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

impl RiskTier {
    /// Lower bounds are inclusive: 80 is low risk, 79 is medium.
    pub const fn from_index(index: u8) -> Self {
        if index >= 80 {
            RiskTier::Low
        } else if index >= 60 {
            RiskTier::Medium
        } else {
            RiskTier::High
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk",
            RiskTier::Medium => "Medium Risk",
            RiskTier::High => "High Risk",
        }
    }
}
