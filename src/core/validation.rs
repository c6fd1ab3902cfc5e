use super::config::EngineConfig;
use super::error::{SimResult, SimulationError};
use super::types::SimulationInputs;

pub const LOAN_TERMS: [u32; 5] = [10, 15, 20, 25, 30];
pub const MAX_HOLDING_YEARS: u32 = 30;

pub const APPRECIATION_RANGE: (f64, f64) = (-0.10, 0.15);
pub const INVESTMENT_RETURN_RANGE: (f64, f64) = (0.0, 0.15);
pub const RENT_INCREASE_RANGE: (f64, f64) = (0.0, 0.20);
pub const MORTGAGE_RATE_RANGE: (f64, f64) = (0.0, 0.20);
pub const PROPERTY_TAX_RANGE: (f64, f64) = (0.0, 0.05);
pub const MAINTENANCE_RANGE: (f64, f64) = (0.0, 0.05);
pub const SELLING_COSTS_RANGE: (f64, f64) = (0.0, 0.15);

/// Rejects inputs outside their documented domain. The first offending field wins.
pub fn validate(inputs: &SimulationInputs) -> SimResult<()> {
    for (field, value) in [
        ("monthly_rent", inputs.monthly_rent),
        ("renter_insurance", inputs.renter_insurance),
        ("security_deposit", inputs.security_deposit),
        ("hoa_monthly", inputs.hoa_monthly),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::invalid(field, "must be a finite value >= 0"));
        }
    }

    if !inputs.purchase_price.is_finite() || inputs.purchase_price <= 0.0 {
        return Err(SimulationError::invalid(
            "purchase_price",
            "must be a finite value > 0",
        ));
    }

    for (field, value, (min, max)) in [
        ("annual_rent_increase", inputs.annual_rent_increase, RENT_INCREASE_RANGE),
        ("broker_fee", inputs.broker_fee, (0.0, 1.0)),
        ("down_payment_percent", inputs.down_payment_percent, (0.0, 1.0)),
        ("mortgage_rate", inputs.mortgage_rate, MORTGAGE_RATE_RANGE),
        ("property_tax_rate", inputs.property_tax_rate, PROPERTY_TAX_RANGE),
        ("home_insurance_rate", inputs.home_insurance_rate, (0.0, 0.02)),
        ("maintenance_rate", inputs.maintenance_rate, MAINTENANCE_RANGE),
        ("pmi_rate", inputs.pmi_rate, (0.0, 0.02)),
        (
            "buyer_closing_costs_percent",
            inputs.buyer_closing_costs_percent,
            (0.0, 0.10),
        ),
        (
            "selling_costs_percent",
            inputs.selling_costs_percent,
            SELLING_COSTS_RANGE,
        ),
        ("annual_appreciation", inputs.annual_appreciation, APPRECIATION_RANGE),
        (
            "annual_investment_return",
            inputs.annual_investment_return,
            INVESTMENT_RETURN_RANGE,
        ),
        ("marginal_tax_rate", inputs.marginal_tax_rate, (0.0, 0.50)),
        ("state_tax_rate", inputs.state_tax_rate, (0.0, 0.15)),
        (
            "capital_gains_tax_rate",
            inputs.capital_gains_tax_rate,
            (0.0, 0.30),
        ),
    ] {
        if !value.is_finite() || !(min..=max).contains(&value) {
            return Err(SimulationError::invalid(
                field,
                format!("must be between {min} and {max}"),
            ));
        }
    }

    if !LOAN_TERMS.contains(&inputs.loan_term_years) {
        return Err(SimulationError::invalid(
            "loan_term_years",
            "must be one of 10, 15, 20, 25, 30",
        ));
    }

    if !(1..=MAX_HOLDING_YEARS).contains(&inputs.holding_period_years) {
        return Err(SimulationError::invalid(
            "holding_period_years",
            format!("must be between 1 and {MAX_HOLDING_YEARS}"),
        ));
    }

    Ok(())
}

/// Rejects engine settings that would silently skew every run.
pub fn validate_config(config: &EngineConfig) -> SimResult<()> {
    for (field, value) in [
        ("household_agi", config.household_agi),
        ("toss_up_band", config.toss_up_band),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::invalid(field, "must be a finite value >= 0"));
        }
    }

    if config
        .pmi_deduction_fraction
        .is_some_and(|fraction| !(0.0..=1.0).contains(&fraction))
    {
        return Err(SimulationError::invalid(
            "pmi_deduction_fraction",
            "must be between 0 and 1",
        ));
    }

    config.tax_rules.validate()
}
