mod amortization;
mod pricing;

pub use amortization::{monthly_payment, AmortizationSchedule, Installment};
pub use pricing::{continuous_apr, AprModel, PricingTable, PricingTier};

use std::sync::OnceLock;

use serde::Serialize;

use super::domain::RiskTier;
use super::scoring::CredibilityScore;

/// Prices loans from a Credibility Index using a pricing table.
#[derive(Debug, Clone, Default)]
pub struct OfferCalculator {
    pricing: PricingTable,
}

impl OfferCalculator {
    pub fn new(pricing: PricingTable) -> Self {
        Self { pricing }
    }

    pub fn pricing(&self) -> &PricingTable {
        &self.pricing
    }

    /// Derive offer terms. `requested_amount` must already be validated as finite and positive.
    ///
    /// Each stage rounds to whole dollars the way the offer card displays it: the approved
    /// amount, then the monthly payment, and the total is the rounded payment times the term.
    pub fn quote(
        &self,
        score: &CredibilityScore,
        requested_amount: f64,
        term_months: u32,
    ) -> LoanOffer {
        let index = score.value;
        let tier = self.pricing.tier_for(index);
        let apr = self.pricing.apr_for(index);

        let approved = (requested_amount * tier.approval_ratio)
            .round()
            .min(requested_amount.floor())
            .max(0.0);
        let approved_amount = approved as u64;

        let term_months = term_months.max(1);
        let monthly = monthly_payment(approved_amount as f64, apr, term_months)
            .round()
            .max(0.0) as u64;

        LoanOffer {
            credibility_index: index,
            tier: score.tier,
            requested_amount,
            approved_amount,
            approval_ratio: tier.approval_ratio,
            apr,
            apr_model: self.pricing.apr_model(),
            term_months,
            monthly_payment: monthly,
            total_payment: monthly * u64::from(term_months),
        }
    }
}

/// Quote an offer with the standard tiered pricing table.
pub fn compute_loan_offer(
    score: &CredibilityScore,
    requested_amount: f64,
    term_months: u32,
) -> LoanOffer {
    static STANDARD: OnceLock<OfferCalculator> = OnceLock::new();
    STANDARD
        .get_or_init(OfferCalculator::default)
        .quote(score, requested_amount, term_months)
}

/// Terms offered for an application. Money fields are whole dollars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanOffer {
    pub credibility_index: u8,
    pub tier: RiskTier,
    pub requested_amount: f64,
    pub approved_amount: u64,
    pub approval_ratio: f64,
    pub apr: f64,
    pub apr_model: AprModel,
    pub term_months: u32,
    pub monthly_payment: u64,
    pub total_payment: u64,
}

impl LoanOffer {
    pub fn total_interest(&self) -> i64 {
        self.total_payment as i64 - self.approved_amount as i64
    }

    pub fn decision(&self) -> OfferDecision {
        if self.credibility_index >= 60 {
            OfferDecision::Approved
        } else {
            OfferDecision::ConditionalApproval
        }
    }

    pub fn is_partial(&self) -> bool {
        (self.approved_amount as f64) < self.requested_amount.floor()
    }

    pub fn schedule(&self) -> AmortizationSchedule {
        AmortizationSchedule::build(self.approved_amount as f64, self.apr, self.term_months)
    }
}

/// Headline shown with the offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferDecision {
    Approved,
    ConditionalApproval,
}

impl OfferDecision {
    pub const fn label(self) -> &'static str {
        match self {
            OfferDecision::Approved => "Approved",
            OfferDecision::ConditionalApproval => "Conditional Approval",
        }
    }
}
