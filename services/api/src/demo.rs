use crate::infra::{advice_pipeline, build_lending_service, parse_apr_model};
use chrono::Utc;
use clap::Args;
use credi_index::config::AppConfig;
use credi_index::error::AppError;
use credi_index::workflows::lending::{
    load_submissions, score_batch, AmortizationSchedule, ApplicationSubmission, ApplicationView,
    AprModel, Assessment, BatchResult, CredibilityScore, FinancialProfile, LoanOffer, SessionId,
};
use std::path::PathBuf;

const DEMO_LOAN_AMOUNT: f64 = 8000.0;

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Requested loan amount in dollars
    #[arg(long)]
    pub(crate) amount: f64,
    /// Loan purpose (debt, home, education, medical, business, emergency)
    #[arg(long)]
    pub(crate) purpose: String,
    /// Loan term in months
    #[arg(long)]
    pub(crate) term: u32,
    /// Employment status (fulltime, parttime, selfemployed, student, unemployed)
    #[arg(long)]
    pub(crate) employment: String,
    /// Monthly income in dollars
    #[arg(long)]
    pub(crate) income: f64,
    /// Savings ratio bucket (0-10, 10-25, 25-50, 50+)
    #[arg(long)]
    pub(crate) savings: String,
    /// Income stability (consistent, fluctuation, variable)
    #[arg(long)]
    pub(crate) stability: String,
    /// Missed payments bucket (0, 1-2, 3-5, 6+)
    #[arg(long)]
    pub(crate) missed: String,
    /// Debt-to-income bucket (0-20, 21-40, 41-60, 61+)
    #[arg(long)]
    pub(crate) dti: String,
    /// Override the configured APR model (tiered or continuous)
    #[arg(long, value_parser = parse_apr_model)]
    pub(crate) apr_model: Option<AprModel>,
    /// Print the assessment as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

impl ScoreArgs {
    fn submission(&self) -> ApplicationSubmission {
        ApplicationSubmission {
            loan_amount: self.amount,
            loan_purpose: self.purpose.as_str().into(),
            loan_term_months: self.term,
            employment_status: self.employment.as_str().into(),
            monthly_income: self.income,
            savings_ratio: self.savings.as_str().into(),
            income_stability: self.stability.as_str().into(),
            missed_payments: self.missed.as_str().into(),
            debt_to_income: self.dti.as_str().into(),
        }
    }
}

#[derive(Args, Debug)]
pub(crate) struct BatchArgs {
    /// CSV file with one application per row
    #[arg(long)]
    pub(crate) csv: PathBuf,
    /// Override the configured APR model (tiered or continuous)
    #[arg(long, value_parser = parse_apr_model)]
    pub(crate) apr_model: Option<AprModel>,
    /// Print the outcomes as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Session identifier used for the walkthrough
    #[arg(long, default_value = "demo-session")]
    pub(crate) session: String,
    /// Override the configured APR model (tiered or continuous)
    #[arg(long, value_parser = parse_apr_model)]
    pub(crate) apr_model: Option<AprModel>,
    /// Number of amortization rows to print
    #[arg(long, default_value_t = 3)]
    pub(crate) schedule_rows: usize,
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, _) = build_lending_service(&config.lending, args.apr_model)?;

    let assessment = service.assess(args.submission())?;

    if args.json {
        print_json(&assessment);
    } else {
        render_assessment(&assessment);
    }
    Ok(())
}

pub(crate) fn run_batch(args: BatchArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let (service, _) = build_lending_service(&config.lending, args.apr_model)?;

    let submissions = load_submissions(&args.csv)?;
    let outcomes = score_batch(&service, submissions);

    if args.json {
        print_json(&outcomes);
        return Ok(());
    }

    println!(
        "Batch {} scored at {}",
        args.csv.display(),
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    );
    let mut scored = 0;
    for outcome in &outcomes {
        match &outcome.result {
            BatchResult::Scored(assessment) => {
                scored += 1;
                let offer = &assessment.offer;
                println!(
                    "- row {}: index {} ({}) -> ${} approved at {:.2}% APR, ${}/mo for {} months",
                    outcome.row,
                    assessment.score.value,
                    assessment.score.tier.label(),
                    offer.approved_amount,
                    offer.apr,
                    offer.monthly_payment,
                    offer.term_months
                );
            }
            BatchResult::Rejected { error } => {
                println!("- row {}: rejected ({})", outcome.row, error);
            }
        }
    }
    println!(
        "{} of {} rows scored, {} rejected",
        scored,
        outcomes.len(),
        outcomes.len() - scored
    );

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        session,
        apr_model,
        schedule_rows,
    } = args;

    let config = AppConfig::load()?;
    let (service, repository) = build_lending_service(&config.lending, apr_model)?;
    let session = SessionId(session);

    println!("Credibility Index demo (session {session})");

    let first = demo_submission();
    println!("\n1. Submitting an application");
    let record = service.submit(session.clone(), first.clone())?;
    render_view(&record.view());

    println!("\n2. Revising the application with a clean payment history and more savings");
    let revised = ApplicationSubmission {
        missed_payments: "0".into(),
        savings_ratio: "25-50".into(),
        ..first
    };
    let record = service.submit(session.clone(), revised)?;
    render_view(&record.view());
    println!(
        "  Sessions stored: {} (the revision replaced the first application)",
        repository.sessions()
    );

    println!("\n3. Repayment schedule");
    let schedule = service.schedule(&session)?;
    render_schedule(&schedule, schedule_rows);

    println!("\n4. Standalone quote for an index of 85");
    let quote = service.quote(85, DEMO_LOAN_AMOUNT, 24)?;
    render_offer(&quote);

    println!("\n5. Advice preview");
    let profile = FinancialProfile {
        monthly_income: record.input.monthly_income,
        total_debt: record.offer.monthly_payment as f64,
        credit_history_years: 4.0,
        recent_inquiries: 1.0,
        employment_status: Some(record.input.employment_status.label().to_string()),
        savings_ratio: None,
    };
    let pipeline = advice_pipeline(&config.advice);
    println!("  (analyst: {})", pipeline.analyst_name());
    match tokio::task::block_in_place(|| pipeline.advise(&profile, None, false)) {
        Ok(outcome) => {
            for paragraph in outcome.text.split("\n\n") {
                println!("  {paragraph}");
            }
        }
        Err(err) => println!("  Advice unavailable: {err}"),
    }

    println!("\n6. Withdrawing the application");
    service.withdraw(&session)?;
    println!("  Sessions stored: {}", repository.sessions());

    Ok(())
}

fn demo_submission() -> ApplicationSubmission {
    ApplicationSubmission {
        loan_amount: DEMO_LOAN_AMOUNT,
        loan_purpose: "education".into(),
        loan_term_months: 24,
        employment_status: "selfemployed".into(),
        monthly_income: 6000.0,
        savings_ratio: "10-25".into(),
        income_stability: "fluctuation".into(),
        missed_payments: "1-2".into(),
        debt_to_income: "21-40".into(),
    }
}

fn render_assessment(assessment: &Assessment) {
    render_score(&assessment.score);
    render_offer(&assessment.offer);
}

fn render_score(score: &CredibilityScore) {
    println!(
        "Credibility Index: {} ({}), raw {:.2}",
        score.value,
        score.tier.label(),
        score.raw_index
    );
    println!("Factor breakdown:");
    for component in &score.components {
        println!(
            "  {:<2} {:<18} w={:.2} n={:.3} +{:>5.2}  {}",
            component.symbol,
            component.factor.label(),
            component.weight,
            component.normalized,
            component.contribution,
            component.notes
        );
    }
}

fn render_offer(offer: &LoanOffer) {
    println!(
        "Offer ({} APR): {}{}",
        offer.apr_model,
        offer.decision().label(),
        if offer.is_partial() {
            " (partial approval)"
        } else {
            ""
        }
    );
    println!(
        "  Requested ${:.0} | approved ${} ({:.0}%) | APR {:.2}%",
        offer.requested_amount,
        offer.approved_amount,
        offer.approval_ratio * 100.0,
        offer.apr
    );
    println!(
        "  {} months at ${}/mo, total ${} (interest ${})",
        offer.term_months,
        offer.monthly_payment,
        offer.total_payment,
        offer.total_interest()
    );
}

fn render_view(view: &ApplicationView) {
    println!(
        "  Index {} ({}) -> {} | submitted {}",
        view.credibility_index,
        view.tier_label,
        view.decision,
        view.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    let factors: Vec<String> = view
        .sub_factors
        .iter()
        .map(|(factor, value)| format!("{}={:.2}", factor.symbol(), value))
        .collect();
    println!("  Sub-factors: {}", factors.join(" "));
    println!(
        "  ${} approved at {:.2}% over {} months: ${}/mo",
        view.offer.approved_amount, view.offer.apr, view.offer.term_months, view.offer.monthly_payment
    );
}

fn render_schedule(schedule: &AmortizationSchedule, rows: usize) {
    println!(
        "  {:>5} {:>10} {:>10} {:>10} {:>12}",
        "month", "payment", "interest", "principal", "balance"
    );
    for row in schedule.installments.iter().take(rows) {
        println!(
            "  {:>5} {:>10.2} {:>10.2} {:>10.2} {:>12.2}",
            row.month, row.payment, row.interest, row.principal, row.balance
        );
    }
    if schedule.installments.len() > rows {
        println!("  ... {} more months", schedule.installments.len() - rows);
    }
    println!(
        "  Total paid ${:.2}, interest ${:.2}",
        schedule.total_paid(),
        schedule.total_interest()
    );
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("JSON output unavailable: {err}"),
    }
}
