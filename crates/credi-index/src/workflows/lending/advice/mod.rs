//! Advice assistant: an analyst provider drafts guidance, an optional refiner rewrites it.

mod heuristic;
mod hosted;
mod provider;
mod transport;

pub use heuristic::HeuristicAnalyst;
pub use hosted::{GoogleAnalyst, LettaRefiner, GOOGLE_BASE_URL, GOOGLE_MODEL, LETTA_BASE_URL};
pub use provider::{AdviceError, AdvicePrompt, AdviceProvider, FinancialProfile};
pub use transport::{HttpTransport, JsonTransport, TransportError};

use std::sync::Arc;

use tracing::{info, warn};

/// Text produced by the pipeline and which providers produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdviceOutcome {
    pub text: String,
    pub analyst: &'static str,
    pub refined_by: Option<&'static str>,
}

impl AdviceOutcome {
    pub fn refined(&self) -> bool {
        self.refined_by.is_some()
    }
}

/// Two-stage advice pipeline. Analyst failures surface to the caller; refiner failures fall
/// back to the analyst's draft.
pub struct AdvicePipeline {
    analyst: Arc<dyn AdviceProvider>,
    refiner: Option<Arc<dyn AdviceProvider>>,
}

impl AdvicePipeline {
    pub fn new(analyst: Arc<dyn AdviceProvider>) -> Self {
        Self {
            analyst,
            refiner: None,
        }
    }

    pub fn with_refiner(mut self, refiner: Arc<dyn AdviceProvider>) -> Self {
        self.refiner = Some(refiner);
        self
    }

    /// Offline pipeline backed by [`HeuristicAnalyst`].
    pub fn offline() -> Self {
        Self::new(Arc::new(HeuristicAnalyst))
    }

    pub fn analyst_name(&self) -> &'static str {
        self.analyst.name()
    }

    pub fn refiner_name(&self) -> Option<&'static str> {
        self.refiner.as_ref().map(|refiner| refiner.name())
    }

    pub fn advise(
        &self,
        profile: &FinancialProfile,
        question: Option<&str>,
        refine: bool,
    ) -> Result<AdviceOutcome, AdviceError> {
        let prompt = AdvicePrompt {
            text: profile.analysis_prompt(question),
            profile: profile.clone(),
            question: question.map(str::to_string),
        };

        let draft = self.analyst.complete(&prompt)?;
        if draft.trim().is_empty() {
            return Err(AdviceError::EmptyResponse {
                provider: self.analyst.name(),
            });
        }
        info!(provider = self.analyst.name(), "analysis drafted");

        let mut outcome = AdviceOutcome {
            text: draft,
            analyst: self.analyst.name(),
            refined_by: None,
        };

        if !refine {
            return Ok(outcome);
        }

        let Some(refiner) = &self.refiner else {
            warn!("refinement requested but no refiner is configured; returning analysis");
            return Ok(outcome);
        };

        let follow_up = AdvicePrompt {
            text: outcome.text.clone(),
            profile: prompt.profile,
            question: prompt.question,
        };
        match refiner.complete(&follow_up) {
            Ok(text) if !text.trim().is_empty() => {
                info!(provider = refiner.name(), "analysis refined");
                outcome.text = text;
                outcome.refined_by = Some(refiner.name());
            }
            Ok(_) => warn!(
                provider = refiner.name(),
                "refiner returned no text; returning analysis"
            ),
            Err(err) => warn!(
                provider = refiner.name(),
                error = %err,
                "refiner failed; returning analysis"
            ),
        }

        Ok(outcome)
    }
}
