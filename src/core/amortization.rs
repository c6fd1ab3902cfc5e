use super::types::AmortizationMonth;

/// Fixed-rate, fully amortizing loan schedule.
#[derive(Debug, Clone)]
pub struct AmortizationSchedule {
    principal: f64,
    payment: f64,
    months: Vec<AmortizationMonth>,
}

pub fn monthly_payment(principal: f64, annual_rate: f64, term_months: u32) -> f64 {
    if term_months == 0 {
        return principal;
    }
    let n = term_months as f64;
    let r = annual_rate / 12.0;
    if r == 0.0 {
        return principal / n;
    }
    let growth = (1.0 + r).powf(n);
    principal * r * growth / (growth - 1.0)
}

impl AmortizationSchedule {
    pub fn new(principal: f64, annual_rate: f64, term_years: u32) -> Self {
        let term_months = term_years * 12;
        let payment = monthly_payment(principal, annual_rate, term_months);
        let r = annual_rate / 12.0;

        let mut months = Vec::with_capacity(term_months as usize);
        let mut balance = principal;
        for month in 1..=term_months {
            let interest = balance * r;
            let mut principal_component = payment - interest;
            balance -= principal_component;

            if month == term_months {
                principal_component += balance;
                balance = 0.0;
            } else {
                debug_assert!(
                    balance >= -1e-6,
                    "balance went negative at month {month}: {balance}"
                );
            }

            months.push(AmortizationMonth {
                month,
                payment,
                principal_component,
                interest_component: interest,
                remaining_balance: balance,
            });
        }

        Self {
            principal,
            payment,
            months,
        }
    }

    pub fn principal(&self) -> f64 {
        self.principal
    }

    pub fn payment(&self) -> f64 {
        self.payment
    }

    pub fn term_months(&self) -> u32 {
        self.months.len() as u32
    }

    pub fn months(&self) -> &[AmortizationMonth] {
        &self.months
    }

    /// Row for a 1-based month; `None` once the loan is paid off.
    pub fn month(&self, month: u32) -> Option<&AmortizationMonth> {
        if month == 0 {
            return None;
        }
        self.months.get(month as usize - 1)
    }

    /// Balance after `month` payments.
    pub fn balance_after(&self, month: u32) -> f64 {
        if month == 0 {
            return self.principal;
        }
        self.month(month)
            .map(|row| row.remaining_balance)
            .unwrap_or(0.0)
    }
}
