use serde::Serialize;

/// Level monthly payment that retires `principal` over `term_months` at `apr` percent.
///
/// A zero rate degenerates to straight-line repayment and a zero term to a single payment of
/// the full principal, so the annuity denominator is never zero.
pub fn monthly_payment(principal: f64, apr: f64, term_months: u32) -> f64 {
    if term_months == 0 {
        return principal;
    }

    let periods = f64::from(term_months);
    let monthly_rate = apr / 100.0 / 12.0;
    if monthly_rate == 0.0 {
        return principal / periods;
    }

    let growth = (1.0 + monthly_rate).powf(periods);
    principal * monthly_rate * growth / (growth - 1.0)
}

fn to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// One month of an amortization schedule. Amounts are in dollars rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Installment {
    pub month: u32,
    pub payment: f64,
    pub interest: f64,
    pub principal: f64,
    pub balance: f64,
}

/// Month-by-month split of payments into interest and principal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmortizationSchedule {
    pub principal: f64,
    pub apr: f64,
    pub term_months: u32,
    pub installments: Vec<Installment>,
}

impl AmortizationSchedule {
    /// The final installment absorbs cent-level drift so the balance closes at exactly zero.
    pub fn build(principal: f64, apr: f64, term_months: u32) -> Self {
        let term_months = term_months.max(1);
        let monthly_rate = apr / 100.0 / 12.0;
        let level_payment = to_cents(monthly_payment(principal, apr, term_months));

        let mut balance = to_cents(principal);
        let mut installments = Vec::with_capacity(term_months as usize);

        for month in 1..=term_months {
            let interest = to_cents(balance * monthly_rate);
            let principal_paid = if month == term_months {
                balance
            } else {
                to_cents(level_payment - interest).clamp(0.0, balance)
            };
            balance = to_cents(balance - principal_paid);

            installments.push(Installment {
                month,
                payment: to_cents(principal_paid + interest),
                interest,
                principal: principal_paid,
                balance,
            });
        }

        Self {
            principal,
            apr,
            term_months,
            installments,
        }
    }

    pub fn total_interest(&self) -> f64 {
        to_cents(self.installments.iter().map(|row| row.interest).sum())
    }

    pub fn total_paid(&self) -> f64 {
        to_cents(self.installments.iter().map(|row| row.payment).sum())
    }
}
