use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Financial snapshot the advice providers reason about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialProfile {
    pub monthly_income: f64,
    pub total_debt: f64,
    pub credit_history_years: f64,
    pub recent_inquiries: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employment_status: Option<String>,
    /// Percent of income saved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub savings_ratio: Option<f64>,
}

impl FinancialProfile {
    /// Context assumed by the chat endpoint when the client sends none.
    pub fn chat_default() -> Self {
        Self {
            monthly_income: 5000.0,
            total_debt: 1400.0,
            credit_history_years: 5.0,
            recent_inquiries: 2.0,
            employment_status: None,
            savings_ratio: None,
        }
    }

    /// Debt relative to monthly income; `None` without income.
    pub fn debt_ratio(&self) -> Option<f64> {
        (self.monthly_income > 0.0).then(|| self.total_debt / self.monthly_income)
    }

    /// Analysis request sent to the primary provider.
    pub fn analysis_prompt(&self, question: Option<&str>) -> String {
        let mut prompt = String::from("User financial profile:\n");
        let _ = writeln!(prompt, "- Monthly Income: ${}", self.monthly_income);
        let _ = writeln!(prompt, "- Total Debt: ${}", self.total_debt);
        let _ = writeln!(
            prompt,
            "- Credit History: {} years",
            self.credit_history_years
        );
        let _ = writeln!(
            prompt,
            "- Recent Credit Inquiries: {}",
            self.recent_inquiries
        );
        if let Some(status) = &self.employment_status {
            let _ = writeln!(prompt, "- Employment Status: {status}");
        }
        if let Some(ratio) = self.savings_ratio {
            let _ = writeln!(prompt, "- Savings Ratio: {ratio}%");
        }
        if let Some(question) = question {
            let _ = writeln!(prompt, "\nThe user asks: {question}");
        }
        prompt.push_str(
            "\nAnalyze this financial profile and explain:\n\
             1. Why their Credibility Index might be low or high\n\
             2. Key factors affecting their creditworthiness\n\
             3. Specific recommendations for improvement\n\n\
             Provide a clear, empathetic explanation in 2-3 paragraphs.\n",
        );
        prompt
    }
}

/// Text handed to a provider together with the profile it was rendered from.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvicePrompt {
    pub text: String,
    pub profile: FinancialProfile,
    pub question: Option<String>,
}

/// Free text in, free text out. Implementations wrap a hosted model or a local fallback.
pub trait AdviceProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn complete(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError>;
}

/// Failure reported by an advice provider.
#[derive(Debug, thiserror::Error)]
pub enum AdviceError {
    #[error("{provider} is not configured: {reason}")]
    NotConfigured {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} request failed: {reason}")]
    Unavailable {
        provider: &'static str,
        reason: String,
    },
    #[error("{provider} returned no text")]
    EmptyResponse { provider: &'static str },
}
