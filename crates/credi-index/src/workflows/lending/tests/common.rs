use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use serde_json::Value;

use crate::workflows::lending::advice::{
    AdviceError, AdvicePrompt, AdviceProvider, JsonTransport, TransportError,
};
use crate::workflows::lending::domain::{
    ApplicationInput, ApplicationSubmission, DebtToIncome, EmploymentStatus, IncomeStability,
    LoanPurpose, MissedPayments, SavingsRatio, SessionId,
};
use crate::workflows::lending::intake::IntakeGuard;
use crate::workflows::lending::repository::{
    ApplicationRecord, ApplicationRepository, RepositoryError,
};
use crate::workflows::lending::service::{LendingPolicy, LendingService};

/// Reference application; scores 69.33 before rounding.
pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        loan_amount: 5000.0,
        loan_purpose: LoanPurpose::Debt,
        loan_term_months: 12,
        employment_status: EmploymentStatus::FullTime,
        monthly_income: 4000.0,
        savings_ratio: SavingsRatio::TenToTwentyFive,
        income_stability: IncomeStability::Consistent,
        missed_payments: MissedPayments::Zero,
        debt_to_income: DebtToIncome::UpToTwenty,
    }
}

/// Strongest profile the canonical table can express.
pub(super) fn strong_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        loan_amount: 50_000.0,
        loan_term_months: 36,
        monthly_income: 15_000.0,
        savings_ratio: SavingsRatio::OverFifty,
        ..submission()
    }
}

pub(super) fn weak_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        loan_amount: 1000.0,
        loan_purpose: LoanPurpose::Emergency,
        loan_term_months: 6,
        employment_status: EmploymentStatus::Unemployed,
        monthly_income: 0.0,
        savings_ratio: SavingsRatio::UpToTen,
        income_stability: IncomeStability::Variable,
        missed_payments: MissedPayments::SixOrMore,
        debt_to_income: DebtToIncome::OverSixty,
    }
}

pub(super) fn admitted(submission: ApplicationSubmission) -> ApplicationInput {
    IntakeGuard::default()
        .admit(submission)
        .expect("fixture passes intake")
}

pub(super) fn session(id: &str) -> SessionId {
    SessionId(id.to_string())
}

pub(super) fn build_service() -> (LendingService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = LendingService::new(repository.clone(), LendingPolicy::default());
    (service, repository)
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) records: Arc<Mutex<HashMap<SessionId, ApplicationRecord>>>,
}

impl MemoryRepository {
    pub(super) fn len(&self) -> usize {
        self.records.lock().expect("repository mutex poisoned").len()
    }
}

impl ApplicationRepository for MemoryRepository {
    fn save(
        &self,
        record: ApplicationRecord,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.insert(record.session_id.clone(), record))
    }

    fn fetch(&self, session: &SessionId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(session).cloned())
    }

    fn discard(&self, session: &SessionId) -> Result<bool, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.remove(session).is_some())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn save(
        &self,
        _record: ApplicationRecord,
    ) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _session: &SessionId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn discard(&self, _session: &SessionId) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Provider returning canned text and recording the prompts it saw.
#[derive(Default)]
pub(super) struct ScriptedProvider {
    pub(super) reply: String,
    pub(super) prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub(super) fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompt mutex poisoned").clone()
    }
}

impl AdviceProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn complete(&self, prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        self.prompts
            .lock()
            .expect("prompt mutex poisoned")
            .push(prompt.text.clone());
        Ok(self.reply.clone())
    }
}

pub(super) struct OfflineProvider;

impl AdviceProvider for OfflineProvider {
    fn name(&self) -> &'static str {
        "offline"
    }

    fn complete(&self, _prompt: &AdvicePrompt) -> Result<String, AdviceError> {
        Err(AdviceError::Unavailable {
            provider: "offline",
            reason: "connection refused".to_string(),
        })
    }
}

/// Request captured by [`FakeTransport`].
#[derive(Debug, Clone)]
pub(super) struct SentRequest {
    pub(super) url: String,
    pub(super) headers: Vec<(String, String)>,
    pub(super) body: Value,
}

/// Transport replaying one scripted reply for every request.
pub(super) struct FakeTransport {
    reply: Result<Value, TransportError>,
    sent: Mutex<Vec<SentRequest>>,
}

impl FakeTransport {
    pub(super) fn replying(reply: Value) -> Self {
        Self::new(Ok(reply))
    }

    pub(super) fn failing(err: TransportError) -> Self {
        Self::new(Err(err))
    }

    fn new(reply: Result<Value, TransportError>) -> Self {
        Self {
            reply,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn sent(&self) -> Vec<SentRequest> {
        self.sent.lock().expect("transport mutex poisoned").clone()
    }
}

impl JsonTransport for FakeTransport {
    fn post_json(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &Value,
    ) -> Result<Value, TransportError> {
        self.sent
            .lock()
            .expect("transport mutex poisoned")
            .push(SentRequest {
                url: url.to_string(),
                headers: headers
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
                body: body.clone(),
            });
        self.reply.clone()
    }
}

pub(super) fn json_request(method: Method, uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(body).expect("json body")))
        .expect("request builds")
}

pub(super) fn empty_request(method: Method, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .expect("request builds")
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
