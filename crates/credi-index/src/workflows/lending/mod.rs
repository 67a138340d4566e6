//! Loan application workflow: intake validation, Credibility Index scoring, offer pricing,
//! per-session application state, and the advice assistant.

pub mod advice;
pub mod batch;
pub mod domain;
pub mod intake;
pub mod offer;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use advice::{
    AdviceError, AdviceOutcome, AdvicePipeline, AdvicePrompt, AdviceProvider, FinancialProfile,
    GoogleAnalyst, HeuristicAnalyst, HttpTransport, JsonTransport, LettaRefiner, TransportError,
};
pub use batch::{
    load_submissions, parse_submissions, score_batch, BatchImportError, BatchOutcome, BatchResult,
};
pub use domain::{
    ApplicationInput, ApplicationSubmission, DebtToIncome, EmploymentStatus, IncomeStability,
    LoanPurpose, MissedPayments, RiskTier, SavingsRatio, ScoreFactor, SessionId,
};
pub use intake::{IntakeGuard, IntakePolicy, IntakeViolation};
pub use offer::{
    compute_loan_offer, monthly_payment, AmortizationSchedule, AprModel, Installment, LoanOffer,
    OfferCalculator, OfferDecision, PricingTable, PricingTier,
};
pub use repository::{ApplicationRecord, ApplicationRepository, ApplicationView, RepositoryError};
pub use router::{advice_router, lending_router};
pub use scoring::{
    compute_credibility_score, CredibilityEngine, CredibilityScore, FactorContribution,
    ScoringTable, ScoringTableError,
};
pub use service::{Assessment, LendingPolicy, LendingService, LendingServiceError};
