use super::tax_rules::TaxRules;

/// Knobs that shape a run but are not household inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub tax_rules: TaxRules,
    /// Calendar tax year of simulated year 1.
    pub first_tax_year: i32,
    /// Income proxy for the state tax estimate and the AGI-based phase-outs.
    pub household_agi: f64,
    /// Overrides the AGI-derived PMI deduction fraction when set.
    pub pmi_deduction_fraction: Option<f64>,
    /// Net benefits within this band either way are a toss-up.
    pub toss_up_band: f64,
    pub solve_rent_equivalent: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tax_rules: TaxRules::default(),
            first_tax_year: 2026,
            household_agi: 100_000.0,
            pmi_deduction_fraction: None,
            toss_up_band: 10_000.0,
            solve_rent_equivalent: true,
        }
    }
}
