use super::config::EngineConfig;
use super::engine::net_benefit_at_horizon;
use super::error::SimResult;
use super::types::{SensitivityResult, SimulationInputs};
use super::validation::{
    APPRECIATION_RANGE, INVESTMENT_RETURN_RANGE, MAINTENANCE_RANGE, MAX_HOLDING_YEARS,
    MORTGAGE_RATE_RANGE, PROPERTY_TAX_RANGE, RENT_INCREASE_RANGE, SELLING_COSTS_RANGE, validate,
    validate_config,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SensitivityVariable {
    Appreciation,
    InvestmentReturn,
    MortgageRate,
    RentGrowth,
    HoldingPeriod,
    PropertyTax,
    SellingCosts,
    Maintenance,
}

impl SensitivityVariable {
    pub const ALL: [Self; 8] = [
        Self::Appreciation,
        Self::InvestmentReturn,
        Self::MortgageRate,
        Self::RentGrowth,
        Self::HoldingPeriod,
        Self::PropertyTax,
        Self::SellingCosts,
        Self::Maintenance,
    ];

    pub fn field(self) -> &'static str {
        match self {
            Self::Appreciation => "annual_appreciation",
            Self::InvestmentReturn => "annual_investment_return",
            Self::MortgageRate => "mortgage_rate",
            Self::RentGrowth => "annual_rent_increase",
            Self::HoldingPeriod => "holding_period_years",
            Self::PropertyTax => "property_tax_rate",
            Self::SellingCosts => "selling_costs_percent",
            Self::Maintenance => "maintenance_rate",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Appreciation => "Home Appreciation",
            Self::InvestmentReturn => "Investment Return",
            Self::MortgageRate => "Mortgage Rate",
            Self::RentGrowth => "Rent Growth",
            Self::HoldingPeriod => "Holding Period",
            Self::PropertyTax => "Property Tax Rate",
            Self::SellingCosts => "Selling Costs",
            Self::Maintenance => "Maintenance Rate",
        }
    }

    /// Distance from the base value to each end of the swing.
    pub fn delta(self) -> f64 {
        match self {
            Self::Appreciation | Self::InvestmentReturn | Self::SellingCosts => 0.02,
            Self::MortgageRate | Self::RentGrowth => 0.01,
            Self::HoldingPeriod => 2.0,
            Self::PropertyTax | Self::Maintenance => 0.005,
        }
    }

    fn range(self) -> (f64, f64) {
        match self {
            Self::Appreciation => APPRECIATION_RANGE,
            Self::InvestmentReturn => INVESTMENT_RETURN_RANGE,
            Self::MortgageRate => MORTGAGE_RATE_RANGE,
            Self::RentGrowth => RENT_INCREASE_RANGE,
            Self::HoldingPeriod => (1.0, MAX_HOLDING_YEARS as f64),
            Self::PropertyTax => PROPERTY_TAX_RANGE,
            Self::SellingCosts => SELLING_COSTS_RANGE,
            Self::Maintenance => MAINTENANCE_RANGE,
        }
    }

    fn get(self, inputs: &SimulationInputs) -> f64 {
        match self {
            Self::Appreciation => inputs.annual_appreciation,
            Self::InvestmentReturn => inputs.annual_investment_return,
            Self::MortgageRate => inputs.mortgage_rate,
            Self::RentGrowth => inputs.annual_rent_increase,
            Self::HoldingPeriod => inputs.holding_period_years as f64,
            Self::PropertyTax => inputs.property_tax_rate,
            Self::SellingCosts => inputs.selling_costs_percent,
            Self::Maintenance => inputs.maintenance_rate,
        }
    }

    fn with_value(self, base: &SimulationInputs, value: f64) -> SimulationInputs {
        let mut inputs = base.clone();
        match self {
            Self::Appreciation => inputs.annual_appreciation = value,
            Self::InvestmentReturn => inputs.annual_investment_return = value,
            Self::MortgageRate => inputs.mortgage_rate = value,
            Self::RentGrowth => inputs.annual_rent_increase = value,
            Self::HoldingPeriod => inputs.holding_period_years = value.round() as u32,
            Self::PropertyTax => inputs.property_tax_rate = value,
            Self::SellingCosts => inputs.selling_costs_percent = value,
            Self::Maintenance => inputs.maintenance_rate = value,
        }
        inputs
    }

    fn swing(self, inputs: &SimulationInputs) -> (f64, f64) {
        let (min, max) = self.range();
        let base = self.get(inputs);
        let delta = self.delta();
        ((base - delta).clamp(min, max), (base + delta).clamp(min, max))
    }
}

/// Net benefit at the low and high end of each variable's swing, widest spread first.
pub fn run_sensitivity_analysis(
    inputs: SimulationInputs,
    config: &EngineConfig,
) -> SimResult<Vec<SensitivityResult>> {
    validate(&inputs)?;
    validate_config(config)?;
    let base_outcome = net_benefit_at_horizon(&inputs, config);

    let mut results: Vec<SensitivityResult> = SensitivityVariable::ALL
        .iter()
        .map(|&variable| {
            let (low_value, high_value) = variable.swing(&inputs);
            let low_outcome = net_benefit_at_horizon(&variable.with_value(&inputs, low_value), config);
            let high_outcome =
                net_benefit_at_horizon(&variable.with_value(&inputs, high_value), config);
            SensitivityResult {
                variable: variable.field(),
                label: variable.label(),
                low_value,
                high_value,
                low_outcome,
                high_outcome,
                base_outcome,
                impact: (high_outcome - low_outcome).abs(),
            }
        })
        .collect();

    results.sort_by(|a, b| b.impact.total_cmp(&a.impact));
    Ok(results)
}
