use super::common::*;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::workflows::lending::domain::ApplicationSubmission;
use crate::workflows::lending::router::{lending_router, submit_handler};
use crate::workflows::lending::service::{LendingPolicy, LendingService};

fn router() -> axum::Router {
    let (service, _) = build_service();
    lending_router(Arc::new(service))
}

fn submission_json(submission: &ApplicationSubmission) -> serde_json::Value {
    serde_json::to_value(submission).expect("submission serializes")
}

#[tokio::test]
async fn score_route_returns_index_and_components() {
    let response = router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/lending/score",
            &submission_json(&submission()),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["credibilityIndex"], 69);
    assert_eq!(payload["tier"], "medium");
    assert_eq!(payload["components"].as_array().map(Vec::len), Some(9));
    assert_eq!(payload["components"][0]["factor"], "loanAmount");
}

#[tokio::test]
async fn score_route_accepts_form_labels() {
    let body = json!({
        "loanAmount": 5000,
        "loanPurpose": "Debt",
        "loanTermMonths": 12,
        "employmentStatus": "fulltime",
        "monthlyIncome": 4000,
        "savingsRatio": "10-25",
        "incomeStability": "consistent",
        "missedPayments": "0",
        "debtToIncome": "0-20"
    });

    let response = router()
        .oneshot(json_request(Method::POST, "/api/v1/lending/score", &body))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["credibilityIndex"], 69);
}

#[tokio::test]
async fn score_route_rejects_invalid_numbers() {
    let response = router()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/lending/score",
            &submission_json(&ApplicationSubmission {
                monthly_income: -50.0,
                ..submission()
            }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert_eq!(payload["field"], "monthlyIncome");
}

#[tokio::test]
async fn offer_route_quotes_and_validates() {
    let router = router();

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            "/api/v1/lending/offer",
            &json!({ "credibilityIndex": 70, "requestedAmount": 5000, "termMonths": 12 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["approvedAmount"], 4500);
    assert_eq!(payload["monthlyPayment"], 390);
    assert_eq!(payload["totalPayment"], 4680);
    assert_eq!(payload["aprModel"], "tiered");

    let response = router
        .oneshot(json_request(
            Method::POST,
            "/api/v1/lending/offer",
            &json!({ "credibilityIndex": 150, "requestedAmount": 5000, "termMonths": 12 }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn session_application_lifecycle() {
    let router = router();
    let uri = "/api/v1/lending/sessions/browser-9/application";

    let response = router
        .clone()
        .oneshot(json_request(
            Method::POST,
            uri,
            &submission_json(&submission()),
        ))
        .await
        .expect("submit executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["sessionId"], "browser-9");
    assert_eq!(payload["decision"], "Approved");
    assert_eq!(payload["partialApproval"], true);
    assert_eq!(payload["subFactors"]["employment"], 1.0);

    let response = router
        .clone()
        .oneshot(empty_request(Method::GET, uri))
        .await
        .expect("fetch executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["credibilityIndex"], 69);
    assert_eq!(payload["tierLabel"], "Medium Risk");
    assert_eq!(payload["offer"]["approvedAmount"], 4500);

    let response = router
        .clone()
        .oneshot(empty_request(
            Method::GET,
            "/api/v1/lending/sessions/browser-9/schedule",
        ))
        .await
        .expect("schedule executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["installments"].as_array().map(Vec::len), Some(12));

    let response = router
        .clone()
        .oneshot(empty_request(Method::DELETE, uri))
        .await
        .expect("withdraw executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(empty_request(Method::GET, uri))
        .await
        .expect("fetch executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert_eq!(payload["sessionId"], "browser-9");
}

#[tokio::test]
async fn unknown_session_schedule_is_not_found() {
    let response = router()
        .oneshot(empty_request(
            Method::GET,
            "/api/v1/lending/sessions/nobody/schedule",
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let response = router()
        .oneshot(empty_request(Method::GET, "/api/v1/lending/score"))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn submit_handler_returns_internal_error_on_repository_failure() {
    let service = Arc::new(LendingService::new(
        Arc::new(UnavailableRepository),
        LendingPolicy::default(),
    ));

    let response = submit_handler::<UnavailableRepository>(
        State(service),
        axum::extract::Path("browser-10".to_string()),
        axum::Json(submission()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .is_some_and(|error| error.contains("database offline")));
}
