use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::advice::{AdviceError, AdviceOutcome, AdvicePipeline, FinancialProfile};
use super::domain::{ApplicationSubmission, SessionId};
use super::repository::{ApplicationRepository, RepositoryError};
use super::service::{LendingService, LendingServiceError};

/// Router exposing scoring, quoting, and the per-session application endpoints.
pub fn lending_router<R>(service: Arc<LendingService<R>>) -> Router
where
    R: ApplicationRepository + 'static,
{
    Router::new()
        .route("/api/v1/lending/score", post(score_handler::<R>))
        .route("/api/v1/lending/offer", post(offer_handler::<R>))
        .route(
            "/api/v1/lending/sessions/:session_id/application",
            post(submit_handler::<R>)
                .get(current_handler::<R>)
                .delete(withdraw_handler::<R>),
        )
        .route(
            "/api/v1/lending/sessions/:session_id/schedule",
            get(schedule_handler::<R>),
        )
        .with_state(service)
}

/// Router exposing the advice assistant.
pub fn advice_router(pipeline: Arc<AdvicePipeline>) -> Router {
    Router::new()
        .route("/loan-advice", post(loan_advice_handler))
        .route("/chat", post(chat_handler))
        .with_state(pipeline)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct QuoteRequest {
    pub(crate) credibility_index: u16,
    pub(crate) requested_amount: f64,
    pub(crate) term_months: u32,
}

pub(crate) async fn score_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    match service.assess(submission) {
        Ok(assessment) => (StatusCode::OK, axum::Json(assessment.score)).into_response(),
        Err(err) => service_error(err, None),
    }
}

pub(crate) async fn offer_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    axum::Json(request): axum::Json<QuoteRequest>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    match service.quote(
        request.credibility_index,
        request.requested_amount,
        request.term_months,
    ) {
        Ok(offer) => (StatusCode::OK, axum::Json(offer)).into_response(),
        Err(err) => service_error(err, None),
    }
}

pub(crate) async fn submit_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    Path(session_id): Path<String>,
    axum::Json(submission): axum::Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let session = SessionId(session_id);
    match service.submit(session.clone(), submission) {
        Ok(record) => (StatusCode::CREATED, axum::Json(record.view())).into_response(),
        Err(err) => service_error(err, Some(&session)),
    }
}

pub(crate) async fn current_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let session = SessionId(session_id);
    match service.current(&session) {
        Ok(record) => (StatusCode::OK, axum::Json(record.view())).into_response(),
        Err(err) => service_error(err, Some(&session)),
    }
}

pub(crate) async fn withdraw_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let session = SessionId(session_id);
    match service.withdraw(&session) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => service_error(err, Some(&session)),
    }
}

pub(crate) async fn schedule_handler<R>(
    State(service): State<Arc<LendingService<R>>>,
    Path(session_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
{
    let session = SessionId(session_id);
    match service.schedule(&session) {
        Ok(schedule) => (StatusCode::OK, axum::Json(schedule)).into_response(),
        Err(err) => service_error(err, Some(&session)),
    }
}

fn service_error(err: LendingServiceError, session: Option<&SessionId>) -> Response {
    match err {
        LendingServiceError::Intake(violation) => {
            let payload = json!({
                "error": violation.to_string(),
                "field": violation.field(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        LendingServiceError::Repository(RepositoryError::NotFound) => {
            let payload = json!({
                "error": "no application for session",
                "sessionId": session.map(|id| id.0.as_str()),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            error!(error = %other, "lending request failed");
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoanAdviceRequest {
    pub(crate) income: Option<f64>,
    pub(crate) debt: Option<f64>,
    pub(crate) credit_history_years: Option<f64>,
    pub(crate) recent_inquiries: Option<f64>,
    pub(crate) employment_status: Option<String>,
    pub(crate) savings_ratio: Option<f64>,
    #[serde(default)]
    pub(crate) use_letta: bool,
}

impl LoanAdviceRequest {
    /// Income and debt must be present and non-zero; history and inquiries only present.
    fn profile(self) -> Option<FinancialProfile> {
        let income = self.income.filter(|value| *value != 0.0)?;
        let debt = self.debt.filter(|value| *value != 0.0)?;
        Some(FinancialProfile {
            monthly_income: income,
            total_debt: debt,
            credit_history_years: self.credit_history_years?,
            recent_inquiries: self.recent_inquiries?,
            employment_status: self.employment_status,
            savings_ratio: self.savings_ratio,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatContext {
    pub(crate) income: Option<f64>,
    pub(crate) debt: Option<f64>,
    pub(crate) credit_history_years: Option<f64>,
    pub(crate) recent_inquiries: Option<f64>,
}

impl ChatContext {
    /// Zero and absent fields both take the chat defaults.
    pub(crate) fn profile(self) -> FinancialProfile {
        let defaults = FinancialProfile::chat_default();
        FinancialProfile {
            monthly_income: or_default(self.income, defaults.monthly_income),
            total_debt: or_default(self.debt, defaults.total_debt),
            credit_history_years: or_default(
                self.credit_history_years,
                defaults.credit_history_years,
            ),
            recent_inquiries: or_default(self.recent_inquiries, defaults.recent_inquiries),
            ..defaults
        }
    }
}

fn or_default(value: Option<f64>, default: f64) -> f64 {
    value
        .filter(|value| value.is_finite() && *value != 0.0)
        .unwrap_or(default)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatRequest {
    pub(crate) message: Option<String>,
    #[serde(default)]
    pub(crate) context: Option<ChatContext>,
    #[serde(default)]
    pub(crate) use_letta: bool,
}

pub(crate) async fn loan_advice_handler(
    State(pipeline): State<Arc<AdvicePipeline>>,
    axum::Json(request): axum::Json<LoanAdviceRequest>,
) -> Response {
    let refine = request.use_letta;
    let Some(profile) = request.profile() else {
        let payload = json!({
            "error": "Missing required fields: income, debt, creditHistoryYears, recentInquiries",
        });
        return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
    };

    match run_pipeline(pipeline, profile, None, refine).await {
        Ok(outcome) => {
            let payload = json!({
                "success": true,
                "output": outcome.text,
                "usedLetta": outcome.refined(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(details) => advice_failure("Failed to generate loan advice", details),
    }
}

pub(crate) async fn chat_handler(
    State(pipeline): State<Arc<AdvicePipeline>>,
    axum::Json(request): axum::Json<ChatRequest>,
) -> Response {
    let message = match request.message.as_deref().map(str::trim) {
        Some(message) if !message.is_empty() => message.to_string(),
        _ => {
            let payload = json!({ "error": "Message is required" });
            return (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response();
        }
    };
    let profile = request.context.unwrap_or_default().profile();

    match run_pipeline(pipeline, profile, Some(message), request.use_letta).await {
        Ok(outcome) => {
            let payload = json!({
                "success": true,
                "response": outcome.text,
                "usedLetta": outcome.refined(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(details) => advice_failure("Failed to process chat message", details),
    }
}

/// Providers are synchronous and may block on I/O.
async fn run_pipeline(
    pipeline: Arc<AdvicePipeline>,
    profile: FinancialProfile,
    question: Option<String>,
    refine: bool,
) -> Result<AdviceOutcome, String> {
    let joined = tokio::task::spawn_blocking(move || {
        pipeline.advise(&profile, question.as_deref(), refine)
    })
    .await;

    match joined {
        Ok(Ok(outcome)) => Ok(outcome),
        Ok(Err(err)) => Err(advice_details(&err)),
        Err(join) => Err(join.to_string()),
    }
}

fn advice_details(err: &AdviceError) -> String {
    error!(error = %err, "advice provider failed");
    err.to_string()
}

fn advice_failure(message: &str, details: String) -> Response {
    let payload = json!({
        "error": message,
        "details": details,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
}
