use super::common::*;

use crate::workflows::lending::domain::RiskTier;
use crate::workflows::lending::offer::{
    compute_loan_offer, monthly_payment, AprModel, OfferCalculator, OfferDecision, PricingTable,
};
use crate::workflows::lending::scoring::{compute_credibility_score, CredibilityScore};

#[test]
fn reference_quote_prices_eight_thousand_over_a_year() {
    let payment = monthly_payment(8000.0, 6.2, 12).round() as u64;

    assert!((689..=690).contains(&payment));
    assert_eq!(payment, 689);
    assert_eq!(payment * 12, 8268);
}

#[test]
fn tier_table_drives_approval_and_apr() {
    let cases = [
        (85, 5000, 5.5, 429),
        (70, 4500, 7.5, 390),
        (50, 3500, 10.0, 308),
        (30, 2500, 15.0, 226),
    ];

    for (index, approved, apr, monthly) in cases {
        let offer = compute_loan_offer(&CredibilityScore::from_index(index), 5000.0, 12);
        assert_eq!(offer.approved_amount, approved, "index {index}");
        assert_eq!(offer.apr, apr, "index {index}");
        assert_eq!(offer.monthly_payment, monthly, "index {index}");
        assert_eq!(offer.total_payment, monthly * 12);
        assert_eq!(offer.apr_model, AprModel::Tiered);
    }
}

#[test]
fn reference_application_receives_a_partial_medium_risk_offer() {
    let score = compute_credibility_score(&admitted(submission()));
    let offer = compute_loan_offer(&score, 5000.0, 12);

    assert_eq!(offer.credibility_index, 69);
    assert_eq!(offer.tier, RiskTier::Medium);
    assert_eq!(offer.approved_amount, 4500);
    assert_eq!(offer.monthly_payment, 390);
    assert_eq!(offer.total_payment, 4680);
    assert_eq!(offer.total_interest(), 180);
    assert_eq!(offer.decision(), OfferDecision::Approved);
    assert!(offer.is_partial());
}

#[test]
fn approved_amount_never_decreases_with_score() {
    let mut previous = 0;
    for index in 0..=100u8 {
        let offer = compute_loan_offer(&CredibilityScore::from_index(index), 12_345.0, 24);
        assert!(
            offer.approved_amount >= previous,
            "approval dropped at index {index}"
        );
        assert!(offer.approved_amount <= 12_345);
        previous = offer.approved_amount;
    }
}

#[test]
fn decision_turns_conditional_below_sixty() {
    let approved = compute_loan_offer(&CredibilityScore::from_index(60), 5000.0, 12);
    let conditional = compute_loan_offer(&CredibilityScore::from_index(59), 5000.0, 12);

    assert_eq!(approved.decision().label(), "Approved");
    assert_eq!(conditional.decision().label(), "Conditional Approval");
}

#[test]
fn continuous_model_prices_between_tiers() {
    let calculator = OfferCalculator::new(PricingTable::new(AprModel::Continuous));

    let offer = calculator.quote(&CredibilityScore::from_index(90), 5000.0, 12);
    assert_eq!(offer.apr, 5.0);
    assert_eq!(offer.apr_model, AprModel::Continuous);
    assert_eq!(offer.approved_amount, 5000);

    let lower = calculator.quote(&CredibilityScore::from_index(65), 5000.0, 12);
    assert_eq!(lower.apr, 10.5);
    assert_eq!(lower.approved_amount, 4500);
}

#[test]
fn zero_rate_and_zero_term_do_not_panic() {
    assert_eq!(monthly_payment(1200.0, 0.0, 12), 100.0);
    assert_eq!(monthly_payment(1200.0, 0.0, 0), 1200.0);

    let offer = compute_loan_offer(&CredibilityScore::from_index(10), 2000.0, 0);
    assert_eq!(offer.term_months, 1);
    assert_eq!(offer.total_payment, offer.monthly_payment);
}

#[test]
fn schedule_matches_the_offer_terms() {
    let offer = compute_loan_offer(&CredibilityScore::from_index(69), 5000.0, 12);
    let schedule = offer.schedule();

    assert_eq!(schedule.installments.len(), 12);
    assert_eq!(schedule.principal, 4500.0);
    assert_eq!(schedule.apr, 7.5);
    let last = schedule.installments.last().expect("installments present");
    assert_eq!(last.balance, 0.0);
    assert!((schedule.total_paid() - offer.total_payment as f64).abs() < 12.0);
}
