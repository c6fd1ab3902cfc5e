use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilingStatus {
    Single,
    Married,
}

impl FilingStatus {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "single" => Some(Self::Single),
            "married" => Some(Self::Married),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Married => "married",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    Buy,
    Rent,
    TossUp,
}

/// One household's rent, purchase, financing and tax assumptions.
///
/// Rates are decimal fractions (0.035 = 3.5%). `security_deposit` is measured in
/// months of rent and `broker_fee` as a fraction of one year's rent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationInputs {
    pub monthly_rent: f64,
    pub annual_rent_increase: f64,
    pub renter_insurance: f64,
    pub security_deposit: f64,
    pub broker_fee: f64,

    pub purchase_price: f64,
    pub down_payment_percent: f64,
    pub mortgage_rate: f64,
    pub loan_term_years: u32,
    pub property_tax_rate: f64,
    pub home_insurance_rate: f64,
    pub hoa_monthly: f64,
    pub maintenance_rate: f64,
    pub pmi_rate: f64,
    pub buyer_closing_costs_percent: f64,
    pub selling_costs_percent: f64,

    pub holding_period_years: u32,
    pub annual_appreciation: f64,
    pub annual_investment_return: f64,
    pub marginal_tax_rate: f64,
    pub state_tax_rate: f64,
    pub filing_status: FilingStatus,
    pub capital_gains_tax_rate: f64,
}

impl Default for SimulationInputs {
    fn default() -> Self {
        Self {
            monthly_rent: 2_000.0,
            annual_rent_increase: 0.03,
            renter_insurance: 30.0,
            security_deposit: 1.0,
            broker_fee: 0.0,
            purchase_price: 400_000.0,
            down_payment_percent: 0.20,
            mortgage_rate: 0.068,
            loan_term_years: 30,
            property_tax_rate: 0.011,
            home_insurance_rate: 0.005,
            hoa_monthly: 0.0,
            maintenance_rate: 0.015,
            pmi_rate: 0.0075,
            buyer_closing_costs_percent: 0.03,
            selling_costs_percent: 0.08,
            holding_period_years: 7,
            annual_appreciation: 0.035,
            annual_investment_return: 0.07,
            marginal_tax_rate: 0.22,
            state_tax_rate: 0.05,
            filing_status: FilingStatus::Single,
            capital_gains_tax_rate: 0.15,
        }
    }
}

impl SimulationInputs {
    pub fn loan_amount(&self) -> f64 {
        self.purchase_price * (1.0 - self.down_payment_percent)
    }

    pub fn down_payment(&self) -> f64 {
        self.purchase_price * self.down_payment_percent
    }

    pub fn total_months(&self) -> u32 {
        self.holding_period_years * 12
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmortizationMonth {
    pub month: u32,
    pub payment: f64,
    pub principal_component: f64,
    pub interest_component: f64,
    pub remaining_balance: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyCashflow {
    pub month: u32,
    pub rent_cost: f64,
    pub ownership_cost_pretax: f64,
    pub tax_benefit: f64,
    pub ownership_cost_posttax: f64,
    pub investable_surplus_renter: f64,
    pub investable_surplus_buyer: f64,
    pub pmi: f64,
    pub home_value: f64,
    pub loan_balance: f64,
    pub renter_portfolio: f64,
    pub buyer_portfolio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YearlySnapshot {
    pub year: u32,
    pub renter_wealth: f64,
    pub buyer_wealth: f64,
    pub net_benefit: f64,
    pub home_equity: f64,
    pub renter_portfolio: f64,
    pub buyer_portfolio: f64,
    pub tax_benefit: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    pub verdict: Verdict,
    pub break_even_year: Option<u32>,
    pub net_benefit_at_horizon: f64,
    pub renter_wealth_at_horizon: f64,
    pub buyer_wealth_at_horizon: f64,
    pub yearly_snapshots: Vec<YearlySnapshot>,
    pub monthly_rent: f64,
    pub monthly_ownership_cost: f64,
    pub monthly_mortgage_payment: f64,
    pub itemization_beneficial: bool,
    pub pmi_removed_month: Option<u32>,
    /// Starting rent at which both paths end the horizon equally wealthy. This is a
    /// break-even rent found by re-running the horizon, not the monthly ownership
    /// cost net of equity built.
    pub rent_equivalent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityResult {
    pub variable: &'static str,
    pub label: &'static str,
    pub low_value: f64,
    pub high_value: f64,
    pub low_outcome: f64,
    pub high_outcome: f64,
    pub base_outcome: f64,
    pub impact: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonteCarloResult {
    pub simulations: u32,
    pub buy_wins_pct: f64,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    pub distribution: Vec<f64>,
}
