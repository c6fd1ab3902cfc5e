use super::types::SimulationInputs;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RentCostModel {
    starting_rent: f64,
    annual_increase: f64,
    renter_insurance: f64,
    deposit: f64,
    broker_fee: f64,
}

impl RentCostModel {
    pub fn new(inputs: &SimulationInputs) -> Self {
        Self {
            starting_rent: inputs.monthly_rent,
            annual_increase: inputs.annual_rent_increase,
            renter_insurance: inputs.renter_insurance,
            deposit: inputs.security_deposit * inputs.monthly_rent,
            broker_fee: inputs.broker_fee * inputs.monthly_rent * 12.0,
        }
    }

    /// Rent steps up at the start of months 13, 25, ...
    pub fn rent_for_month(&self, month: u32) -> f64 {
        let lease_year = month.saturating_sub(1) / 12;
        self.starting_rent * (1.0 + self.annual_increase).powi(lease_year as i32)
    }

    pub fn monthly_outlay(&self, month: u32) -> f64 {
        self.rent_for_month(month) + self.renter_insurance
    }

    /// Refundable; held outside the portfolio until the horizon.
    pub fn deposit_held(&self) -> f64 {
        self.deposit
    }

    pub fn broker_fee_spent(&self) -> f64 {
        self.broker_fee
    }

    pub fn upfront_cash(&self) -> f64 {
        self.deposit + self.broker_fee
    }
}
