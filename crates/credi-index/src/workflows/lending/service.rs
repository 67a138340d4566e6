use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::domain::{ApplicationInput, ApplicationSubmission, SessionId};
use super::intake::{IntakeGuard, IntakePolicy, IntakeViolation};
use super::offer::{AmortizationSchedule, LoanOffer, OfferCalculator, PricingTable};
use super::repository::{ApplicationRecord, ApplicationRepository, RepositoryError};
use super::scoring::{CredibilityEngine, CredibilityScore, ScoringTable};

/// Tunables for the lending workflow.
#[derive(Debug, Clone, Default)]
pub struct LendingPolicy {
    pub scoring: ScoringTable,
    pub pricing: PricingTable,
    pub intake: IntakePolicy,
}

/// Score and offer computed together from one validated input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub input: ApplicationInput,
    pub score: CredibilityScore,
    pub offer: LoanOffer,
}

/// Service composing the intake guard, scoring engine, offer calculator, and session store.
pub struct LendingService<R> {
    guard: Arc<IntakeGuard>,
    engine: Arc<CredibilityEngine>,
    calculator: Arc<OfferCalculator>,
    repository: Arc<R>,
}

impl<R> LendingService<R>
where
    R: ApplicationRepository + 'static,
{
    pub fn new(repository: Arc<R>, policy: LendingPolicy) -> Self {
        let LendingPolicy {
            scoring,
            pricing,
            intake,
        } = policy;

        Self {
            guard: Arc::new(IntakeGuard::with_policy(intake)),
            engine: Arc::new(CredibilityEngine::new(scoring)),
            calculator: Arc::new(OfferCalculator::new(pricing)),
            repository,
        }
    }

    /// Validate, score, and price a submission without touching session state.
    pub fn assess(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<Assessment, LendingServiceError> {
        let input = self.guard.admit(submission)?;
        let score = self.engine.score(&input);
        let offer = self
            .calculator
            .quote(&score, input.loan_amount, input.loan_term_months);

        debug!(
            credibility_index = score.value,
            tier = score.tier.label(),
            approved_amount = offer.approved_amount,
            apr = offer.apr,
            "assessed application"
        );

        Ok(Assessment {
            input,
            score,
            offer,
        })
    }

    /// Assess a submission and make it the session's current application.
    pub fn submit(
        &self,
        session_id: SessionId,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, LendingServiceError> {
        let Assessment {
            input,
            score,
            offer,
        } = self.assess(submission)?;

        let record = ApplicationRecord {
            session_id,
            input,
            score,
            offer,
        };

        let replaced = self.repository.save(record.clone())?;
        info!(
            session = %record.session_id,
            credibility_index = record.score.value,
            replaced = replaced.is_some(),
            "stored application"
        );

        Ok(record)
    }

    /// Fetch the session's current application.
    pub fn current(&self, session_id: &SessionId) -> Result<ApplicationRecord, LendingServiceError> {
        let record = self
            .repository
            .fetch(session_id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn withdraw(&self, session_id: &SessionId) -> Result<(), LendingServiceError> {
        if self.repository.discard(session_id)? {
            info!(session = %session_id, "withdrew application");
            Ok(())
        } else {
            Err(RepositoryError::NotFound.into())
        }
    }

    /// Price a loan for an index computed elsewhere.
    pub fn quote(
        &self,
        credibility_index: u16,
        requested_amount: f64,
        term_months: u32,
    ) -> Result<LoanOffer, LendingServiceError> {
        let index = self
            .guard
            .check_quote(credibility_index, requested_amount, term_months)?;
        let score = CredibilityScore::from_index(index);
        Ok(self.calculator.quote(&score, requested_amount, term_months))
    }

    pub fn schedule(
        &self,
        session_id: &SessionId,
    ) -> Result<AmortizationSchedule, LendingServiceError> {
        Ok(self.current(session_id)?.offer.schedule())
    }
}

/// Error raised by the lending service.
#[derive(Debug, thiserror::Error)]
pub enum LendingServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
