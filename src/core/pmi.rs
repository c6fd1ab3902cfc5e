use super::amortization::AmortizationSchedule;
use super::ownership::home_value;
use super::types::SimulationInputs;

pub const PMI_DOWN_PAYMENT_THRESHOLD: f64 = 0.20;
/// Automatic termination against the original purchase price.
pub const ORIGINAL_VALUE_LTV: f64 = 0.78;
/// Borrower-requested removal against the current appraised value.
pub const CURRENT_VALUE_LTV: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PmiTracker {
    monthly_premium: f64,
    removal_month: Option<u32>,
}

impl PmiTracker {
    pub fn new(inputs: &SimulationInputs, schedule: &AmortizationSchedule) -> Self {
        if inputs.down_payment_percent >= PMI_DOWN_PAYMENT_THRESHOLD {
            return Self {
                monthly_premium: 0.0,
                removal_month: None,
            };
        }

        let monthly_premium = inputs.pmi_rate / 12.0 * schedule.principal();
        let removal_month = (1..=schedule.term_months()).find(|&month| {
            let balance = schedule.balance_after(month);
            let value = home_value(inputs.purchase_price, inputs.annual_appreciation, month);
            balance <= ORIGINAL_VALUE_LTV * inputs.purchase_price
                || balance <= CURRENT_VALUE_LTV * value
        });

        Self {
            monthly_premium,
            removal_month,
        }
    }

    pub fn is_active(&self) -> bool {
        self.removal_month.is_some()
    }

    /// First month with no premium. Never revisited once found.
    pub fn removal_month(&self) -> Option<u32> {
        self.removal_month
    }

    pub fn monthly_premium(&self) -> f64 {
        self.monthly_premium
    }

    pub fn monthly_cost(&self, month: u32) -> f64 {
        match self.removal_month {
            Some(removed) if month < removed => self.monthly_premium,
            _ => 0.0,
        }
    }
}
