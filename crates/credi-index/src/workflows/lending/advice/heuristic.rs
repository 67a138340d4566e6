use super::provider::{AdviceError, AdvicePrompt, AdviceProvider, FinancialProfile};

const HIGH_DEBT_RATIO: f64 = 0.40;
const MODERATE_DEBT_RATIO: f64 = 0.20;
const THIN_HISTORY_YEARS: f64 = 2.0;
const ESTABLISHED_HISTORY_YEARS: f64 = 7.0;
const MANY_INQUIRIES: f64 = 3.0;
const HEALTHY_SAVINGS_PERCENT: f64 = 20.0;

/// Offline provider that writes rule-based guidance from the structured profile. Keeps the
/// assistant usable when no hosted model is configured.
#[derive(Debug, Clone, Default)]
pub struct HeuristicAnalyst;

impl AdviceProvider for HeuristicAnalyst {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn complete(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        let profile = &prompt.profile;
        let mut paragraphs = Vec::with_capacity(4);

        if let Some(question) = prompt.question.as_deref().map(str::trim) {
            if !question.is_empty() {
                paragraphs.push(format!("You asked: \"{question}\"."));
            }
        }

        let (strengths, concerns) = assess(profile);
        paragraphs.push(standing(&strengths, &concerns));
        paragraphs.push(factors(profile));
        paragraphs.push(recommendations(profile));

        Ok(paragraphs.join("\n\n"))
    }
}

fn assess(profile: &FinancialProfile) -> (Vec<&'static str>, Vec<&'static str>) {
    let mut strengths = Vec::new();
    let mut concerns = Vec::new();

    match profile.debt_ratio() {
        Some(ratio) if ratio <= MODERATE_DEBT_RATIO => strengths.push("a light debt load"),
        Some(ratio) if ratio > HIGH_DEBT_RATIO => concerns.push("debt that is heavy relative to income"),
        Some(_) => {}
        None => concerns.push("no reported income"),
    }

    if profile.credit_history_years >= ESTABLISHED_HISTORY_YEARS {
        strengths.push("a long credit history");
    } else if profile.credit_history_years < THIN_HISTORY_YEARS {
        concerns.push("a short credit history");
    }

    if profile.recent_inquiries >= MANY_INQUIRIES {
        concerns.push("several recent credit inquiries");
    } else if profile.recent_inquiries == 0.0 {
        strengths.push("no recent credit inquiries");
    }

    match profile.savings_ratio {
        Some(ratio) if ratio >= HEALTHY_SAVINGS_PERCENT => strengths.push("a healthy savings habit"),
        Some(_) => concerns.push("a thin savings cushion"),
        None => {}
    }

    (strengths, concerns)
}

fn standing(strengths: &[&str], concerns: &[&str]) -> String {
    match (strengths.is_empty(), concerns.is_empty()) {
        (false, true) => format!(
            "Your Credibility Index is likely on the higher side: you show {}.",
            strengths.join(", ")
        ),
        (true, false) => format!(
            "Your Credibility Index is likely being held back by {}.",
            concerns.join(", ")
        ),
        (false, false) => format!(
            "Your profile is mixed. You show {}, but the index is weighed down by {}.",
            strengths.join(", "),
            concerns.join(", ")
        ),
        (true, true) => {
            "Your profile sits in the middle of the range with no standout strengths or concerns."
                .to_string()
        }
    }
}

fn factors(profile: &FinancialProfile) -> String {
    let debt = match profile.debt_ratio() {
        Some(ratio) => format!(
            "your debt is about {:.0}% of your monthly income",
            ratio * 100.0
        ),
        None => "without income on record, lenders cannot measure repayment capacity".to_string(),
    };
    let employment = profile
        .employment_status
        .as_deref()
        .map(|status| format!(" Your employment status ({status}) also feeds stability checks."))
        .unwrap_or_default();

    format!(
        "The biggest drivers are repayment history and capacity: {debt}, you have {} years of \
         credit history, and {} recent inquiries.{employment}",
        profile.credit_history_years, profile.recent_inquiries
    )
}

fn recommendations(profile: &FinancialProfile) -> String {
    let mut steps = Vec::new();

    if profile
        .debt_ratio()
        .map_or(true, |ratio| ratio > MODERATE_DEBT_RATIO)
    {
        steps.push("pay down revolving balances to bring debt under 20% of income");
    }
    if profile.recent_inquiries >= MANY_INQUIRIES {
        steps.push("pause new credit applications for six months");
    }
    if profile.credit_history_years < THIN_HISTORY_YEARS {
        steps.push("keep your oldest accounts open to let your history mature");
    }
    if profile
        .savings_ratio
        .map_or(true, |ratio| ratio < HEALTHY_SAVINGS_PERCENT)
    {
        steps.push("automate a monthly transfer into savings");
    }
    steps.push("set up automatic payments so no due date is missed");

    format!("Recommended next steps: {}.", steps.join("; "))
}
