use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{ApplicationInput, RiskTier, ScoreFactor, SessionId};
use super::offer::LoanOffer;
use super::scoring::CredibilityScore;

/// Latest application computed for a session. Records are replaced, never edited.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub session_id: SessionId,
    pub input: ApplicationInput,
    pub score: CredibilityScore,
    pub offer: LoanOffer,
}

impl ApplicationRecord {
    pub fn view(&self) -> ApplicationView {
        let decision = self.offer.decision();
        ApplicationView {
            session_id: self.session_id.clone(),
            credibility_index: self.score.value,
            tier: self.score.tier,
            tier_label: self.score.tier.label(),
            decision: decision.label(),
            partial_approval: self.offer.is_partial(),
            sub_factors: self.score.sub_factors(),
            offer: self.offer.clone(),
            total_interest: self.offer.total_interest(),
            submitted_at: self.input.submitted_at,
        }
    }
}

/// Storage abstraction for the per-session application state.
pub trait ApplicationRepository: Send + Sync {
    /// Store `record`, returning the record it replaced, if any.
    fn save(&self, record: ApplicationRecord)
        -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn fetch(&self, session: &SessionId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    /// Drop the session's record; returns whether one existed.
    fn discard(&self, session: &SessionId) -> Result<bool, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Dashboard payload for a stored application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationView {
    pub session_id: SessionId,
    pub credibility_index: u8,
    pub tier: RiskTier,
    pub tier_label: &'static str,
    pub decision: &'static str,
    pub partial_approval: bool,
    pub sub_factors: BTreeMap<ScoreFactor, f64>,
    pub offer: LoanOffer,
    pub total_interest: i64,
    pub submitted_at: DateTime<Utc>,
}
