use super::amortization::AmortizationSchedule;
use super::pmi::PmiTracker;
use super::tax::TaxBenefit;
use super::types::SimulationInputs;

/// Purchase price compounded monthly at the annual appreciation rate.
pub fn home_value(purchase_price: f64, annual_appreciation: f64, month: u32) -> f64 {
    purchase_price * (1.0 + annual_appreciation).powf(month as f64 / 12.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OwnershipMonth {
    pub month: u32,
    pub mortgage_payment: f64,
    pub principal: f64,
    pub interest: f64,
    pub property_tax: f64,
    pub home_insurance: f64,
    pub hoa: f64,
    pub maintenance: f64,
    pub pmi: f64,
    pub home_value: f64,
    pub loan_balance: f64,
}

impl OwnershipMonth {
    pub fn pretax_total(&self) -> f64 {
        self.mortgage_payment
            + self.property_tax
            + self.home_insurance
            + self.hoa
            + self.maintenance
            + self.pmi
    }

    /// Pretax cost less this month's even share of the year's tax benefit.
    pub fn posttax_total(&self, benefit: &TaxBenefit) -> f64 {
        self.pretax_total() - benefit.monthly_share()
    }

    pub fn home_equity(&self) -> f64 {
        self.home_value - self.loan_balance
    }
}

#[derive(Debug, Clone)]
pub struct OwnershipCostModel {
    purchase_price: f64,
    annual_appreciation: f64,
    property_tax_rate: f64,
    home_insurance_rate: f64,
    hoa_monthly: f64,
    maintenance_rate: f64,
    upfront_cash: f64,
    schedule: AmortizationSchedule,
    pmi: PmiTracker,
}

impl OwnershipCostModel {
    pub fn new(inputs: &SimulationInputs) -> Self {
        let loan_amount = inputs.loan_amount();
        let schedule =
            AmortizationSchedule::new(loan_amount, inputs.mortgage_rate, inputs.loan_term_years);
        let pmi = PmiTracker::new(inputs, &schedule);
        Self {
            purchase_price: inputs.purchase_price,
            annual_appreciation: inputs.annual_appreciation,
            property_tax_rate: inputs.property_tax_rate,
            home_insurance_rate: inputs.home_insurance_rate,
            hoa_monthly: inputs.hoa_monthly,
            maintenance_rate: inputs.maintenance_rate,
            upfront_cash: inputs.down_payment()
                + inputs.buyer_closing_costs_percent * loan_amount,
            schedule,
            pmi,
        }
    }

    pub fn schedule(&self) -> &AmortizationSchedule {
        &self.schedule
    }

    pub fn pmi(&self) -> &PmiTracker {
        &self.pmi
    }

    pub fn loan_amount(&self) -> f64 {
        self.schedule.principal()
    }

    /// Down payment plus closing costs paid on day one.
    pub fn upfront_cash(&self) -> f64 {
        self.upfront_cash
    }

    pub fn home_value(&self, month: u32) -> f64 {
        home_value(self.purchase_price, self.annual_appreciation, month)
    }

    pub fn month(&self, month: u32) -> OwnershipMonth {
        let value = self.home_value(month);
        let (mortgage_payment, principal, interest) = match self.schedule.month(month) {
            Some(row) => (row.payment, row.principal_component, row.interest_component),
            None => (0.0, 0.0, 0.0),
        };

        OwnershipMonth {
            month,
            mortgage_payment,
            principal,
            interest,
            property_tax: self.property_tax_rate * value / 12.0,
            home_insurance: self.home_insurance_rate * value / 12.0,
            hoa: self.hoa_monthly,
            maintenance: self.maintenance_rate * self.purchase_price / 12.0,
            pmi: self.pmi.monthly_cost(month),
            home_value: value,
            loan_balance: self.schedule.balance_after(month),
        }
    }
}
