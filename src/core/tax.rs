use super::config::EngineConfig;
use super::tax_rules::TaxRules;
use super::types::{FilingStatus, SimulationInputs};

/// Deductible outlays gathered over one tax year.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaxYearActivity {
    pub tax_year: i32,
    pub interest_paid: f64,
    pub property_tax_paid: f64,
    pub pmi_paid: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TaxBenefit {
    pub tax_year: i32,
    pub deductible_interest: f64,
    pub salt_deduction: f64,
    pub deductible_pmi: f64,
    pub itemized_total: f64,
    pub standard_deduction: f64,
    pub annual_benefit: f64,
    pub itemization_beneficial: bool,
}

impl TaxBenefit {
    pub fn monthly_share(&self) -> f64 {
        self.annual_benefit / 12.0
    }
}

/// Federal benefit of owning: itemized deductions in excess of the standard deduction,
/// valued at the household's marginal rate.
#[derive(Debug, Clone)]
pub struct TaxModel<'a> {
    rules: &'a TaxRules,
    filing_status: FilingStatus,
    marginal_rate: f64,
    household_agi: f64,
    state_income_tax: f64,
    interest_fraction: f64,
    pmi_fraction_override: Option<f64>,
}

impl<'a> TaxModel<'a> {
    pub fn new(inputs: &SimulationInputs, config: &'a EngineConfig) -> Self {
        let rules = &config.tax_rules;
        Self {
            rules,
            filing_status: inputs.filing_status,
            marginal_rate: inputs.marginal_tax_rate,
            household_agi: config.household_agi,
            state_income_tax: config.household_agi * inputs.state_tax_rate,
            interest_fraction: rules.mortgage_interest_fraction(inputs.loan_amount()),
            pmi_fraction_override: config.pmi_deduction_fraction,
        }
    }

    fn pmi_fraction(&self, tax_year: i32) -> f64 {
        if tax_year < self.rules.pmi_deductible_from_year {
            return 0.0;
        }
        match self.pmi_fraction_override {
            Some(fraction) => fraction.clamp(0.0, 1.0),
            None => self
                .rules
                .pmi_deductible_fraction(tax_year, self.household_agi),
        }
    }

    pub fn benefit(&self, activity: &TaxYearActivity) -> TaxBenefit {
        let year = activity.tax_year;
        let deductible_interest = activity.interest_paid * self.interest_fraction;
        let salt_cap = self.rules.salt_cap(year, self.household_agi);
        let salt_deduction = (activity.property_tax_paid + self.state_income_tax).min(salt_cap);
        let deductible_pmi = activity.pmi_paid * self.pmi_fraction(year);

        let itemized_total = deductible_interest + salt_deduction + deductible_pmi;
        let standard_deduction = self.rules.standard_deduction(year, self.filing_status);
        let annual_benefit = (itemized_total - standard_deduction).max(0.0) * self.marginal_rate;

        TaxBenefit {
            tax_year: year,
            deductible_interest,
            salt_deduction,
            deductible_pmi,
            itemized_total,
            standard_deduction,
            annual_benefit,
            itemization_beneficial: itemized_total > standard_deduction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn activity(year: i32, interest: f64, property_tax: f64, pmi: f64) -> TaxYearActivity {
        TaxYearActivity {
            tax_year: year,
            interest_paid: interest,
            property_tax_paid: property_tax,
            pmi_paid: pmi,
        }
    }

    #[test]
    fn itemizing_above_standard_deduction_yields_marginal_benefit() {
        let config = EngineConfig::default();
        let inputs = SimulationInputs::default();
        let model = TaxModel::new(&inputs, &config);

        let benefit = model.benefit(&activity(2026, 21_000.0, 4_400.0, 0.0));
        assert_approx(benefit.deductible_interest, 21_000.0);
        assert_approx(benefit.salt_deduction, 4_400.0 + 5_000.0);
        assert_approx(benefit.standard_deduction, 16_065.0);
        assert_approx(benefit.itemized_total, 30_400.0);
        assert_approx(benefit.annual_benefit, (30_400.0 - 16_065.0) * 0.22);
        assert!(benefit.itemization_beneficial);
        assert_approx(benefit.monthly_share(), benefit.annual_benefit / 12.0);
    }

    #[test]
    fn married_couple_below_standard_deduction_gets_nothing() {
        let config = EngineConfig::default();
        let mut inputs = SimulationInputs::default();
        inputs.filing_status = FilingStatus::Married;
        let model = TaxModel::new(&inputs, &config);

        let benefit = model.benefit(&activity(2026, 21_000.0, 4_400.0, 0.0));
        assert_approx(benefit.annual_benefit, 0.0);
        assert!(!benefit.itemization_beneficial);
    }

    #[test]
    fn interest_on_jumbo_loan_is_prorated() {
        let config = EngineConfig::default();
        let mut inputs = SimulationInputs::default();
        inputs.purchase_price = 1_250_000.0;
        let model = TaxModel::new(&inputs, &config);

        let benefit = model.benefit(&activity(2026, 60_000.0, 0.0, 0.0));
        assert_approx(benefit.deductible_interest, 60_000.0 * 0.75);
    }

    #[test]
    fn salt_deduction_is_capped_and_reverts() {
        let config = EngineConfig::default();
        let mut inputs = SimulationInputs::default();
        inputs.state_tax_rate = 0.10;
        let model = TaxModel::new(&inputs, &config);

        let before = model.benefit(&activity(2029, 0.0, 45_000.0, 0.0));
        assert_approx(before.salt_deduction, 40_000.0 * 1.01_f64.powi(4));
        let after = model.benefit(&activity(2030, 0.0, 45_000.0, 0.0));
        assert_approx(after.salt_deduction, 10_000.0);
    }

    #[test]
    fn pmi_deduction_follows_override_and_start_year() {
        let mut config = EngineConfig::default();
        let inputs = SimulationInputs::default();

        let derived = TaxModel::new(&inputs, &config);
        assert_approx(
            derived.benefit(&activity(2026, 0.0, 0.0, 2_400.0)).deductible_pmi,
            2_400.0,
        );
        assert_approx(
            derived.benefit(&activity(2025, 0.0, 0.0, 2_400.0)).deductible_pmi,
            0.0,
        );

        config.pmi_deduction_fraction = Some(0.25);
        let overridden = TaxModel::new(&inputs, &config);
        assert_approx(
            overridden.benefit(&activity(2026, 0.0, 0.0, 2_400.0)).deductible_pmi,
            600.0,
        );
    }

    #[test]
    fn high_agi_loses_pmi_deduction_and_shrinks_salt_cap() {
        let mut config = EngineConfig::default();
        config.household_agi = 600_000.0;
        let inputs = SimulationInputs::default();
        let model = TaxModel::new(&inputs, &config);

        let benefit = model.benefit(&activity(2026, 0.0, 30_000.0, 2_400.0));
        assert_approx(benefit.deductible_pmi, 0.0);
        assert_approx(benefit.salt_deduction, 40_400.0 * 0.7);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_benefit_is_non_negative_and_bounded(
            interest in 0u32..120_000,
            property_tax in 0u32..40_000,
            pmi in 0u32..6_000,
            year_offset in 0i32..30,
            marginal_bp in 0u32..5_001,
            married in proptest::bool::ANY
        ) {
            let config = EngineConfig::default();
            let mut inputs = SimulationInputs::default();
            inputs.marginal_tax_rate = marginal_bp as f64 / 10_000.0;
            inputs.filing_status = if married { FilingStatus::Married } else { FilingStatus::Single };
            let model = TaxModel::new(&inputs, &config);

            let benefit = model.benefit(&activity(
                2026 + year_offset,
                interest as f64,
                property_tax as f64,
                pmi as f64,
            ));
            prop_assert!(benefit.annual_benefit >= 0.0);
            prop_assert!(benefit.annual_benefit <= benefit.itemized_total * inputs.marginal_tax_rate + 1e-9);
            prop_assert!(benefit.itemization_beneficial == (benefit.itemized_total > benefit.standard_deduction));
        }
    }
}
