use super::common::*;
use std::sync::Arc;

use crate::workflows::lending::domain::{ApplicationSubmission, RiskTier};
use crate::workflows::lending::intake::IntakeViolation;
use crate::workflows::lending::offer::{AprModel, PricingTable};
use crate::workflows::lending::repository::RepositoryError;
use crate::workflows::lending::service::{LendingPolicy, LendingService, LendingServiceError};

#[test]
fn assess_scores_and_prices_without_storing() {
    let (service, repository) = build_service();

    let assessment = service.assess(submission()).expect("assessment succeeds");

    assert_eq!(assessment.score.value, 69);
    assert_eq!(assessment.offer.approved_amount, 4500);
    assert_eq!(assessment.input.loan_purpose.label(), "debt");
    assert_eq!(repository.len(), 0);
}

#[test]
fn submit_replaces_the_session_application() {
    let (service, repository) = build_service();
    let id = session("browser-1");

    let first = service
        .submit(id.clone(), submission())
        .expect("first submission");
    assert_eq!(first.score.value, 69);

    let second = service
        .submit(id.clone(), strong_submission())
        .expect("second submission");
    assert_eq!(second.score.tier, RiskTier::Low);

    assert_eq!(repository.len(), 1);
    let current = service.current(&id).expect("record stored");
    assert_eq!(current.score.value, 99);
    assert_eq!(current.view().tier_label, "Low Risk");
}

#[test]
fn sessions_are_isolated() {
    let (service, repository) = build_service();

    service
        .submit(session("a"), submission())
        .expect("submission a");
    service
        .submit(session("b"), weak_submission())
        .expect("submission b");

    assert_eq!(repository.len(), 2);
    assert_eq!(service.current(&session("a")).expect("a").score.value, 69);
    assert_eq!(service.current(&session("b")).expect("b").score.value, 24);
}

#[test]
fn rejected_submissions_leave_state_untouched() {
    let (service, repository) = build_service();
    let id = session("browser-2");
    service.submit(id.clone(), submission()).expect("seed");

    let err = service
        .submit(
            id.clone(),
            ApplicationSubmission {
                monthly_income: -20.0,
                ..submission()
            },
        )
        .expect_err("negative income rejected");

    assert!(matches!(
        err,
        LendingServiceError::Intake(IntakeViolation::NegativeIncome { .. })
    ));
    assert_eq!(repository.len(), 1);
    assert_eq!(service.current(&id).expect("still stored").score.value, 69);
}

#[test]
fn missing_sessions_report_not_found() {
    let (service, _) = build_service();

    let err = service
        .current(&session("ghost"))
        .expect_err("nothing stored");
    assert!(matches!(
        err,
        LendingServiceError::Repository(RepositoryError::NotFound)
    ));
    assert!(service.schedule(&session("ghost")).is_err());
    assert!(service.withdraw(&session("ghost")).is_err());
}

#[test]
fn withdraw_discards_the_record() {
    let (service, repository) = build_service();
    let id = session("browser-3");
    service.submit(id.clone(), submission()).expect("seed");

    service.withdraw(&id).expect("withdraw succeeds");

    assert_eq!(repository.len(), 0);
    assert!(service.current(&id).is_err());
}

#[test]
fn schedule_reflects_the_stored_offer() {
    let (service, _) = build_service();
    let id = session("browser-4");
    service.submit(id.clone(), submission()).expect("seed");

    let schedule = service.schedule(&id).expect("schedule builds");

    assert_eq!(schedule.principal, 4500.0);
    assert_eq!(schedule.installments.len(), 12);
}

#[test]
fn quote_validates_before_pricing() {
    let (service, _) = build_service();

    let offer = service.quote(85, 8000.0, 24).expect("valid quote");
    assert_eq!(offer.approved_amount, 8000);
    assert_eq!(offer.apr, 5.5);

    let err = service.quote(150, 8000.0, 24).expect_err("index too high");
    assert!(matches!(
        err,
        LendingServiceError::Intake(IntakeViolation::IndexOutOfRange { found: 150 })
    ));
}

#[test]
fn policy_selects_the_apr_model() {
    let service = LendingService::new(
        Arc::new(MemoryRepository::default()),
        LendingPolicy {
            pricing: PricingTable::new(AprModel::Continuous),
            ..LendingPolicy::default()
        },
    );

    let assessment = service.assess(submission()).expect("assessment succeeds");

    assert_eq!(assessment.offer.apr_model, AprModel::Continuous);
    assert_eq!(assessment.offer.apr, 9.3);
}

#[test]
fn repository_failures_surface() {
    let service = LendingService::new(Arc::new(UnavailableRepository), LendingPolicy::default());

    let err = service
        .submit(session("browser-5"), submission())
        .expect_err("store offline");

    assert!(matches!(
        err,
        LendingServiceError::Repository(RepositoryError::Unavailable(_))
    ));
}
