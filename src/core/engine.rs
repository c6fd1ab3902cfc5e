use log::{debug, trace};

use super::config::EngineConfig;
use super::error::SimResult;
use super::ownership::{OwnershipCostModel, OwnershipMonth};
use super::portfolio::InvestmentPortfolio;
use super::renting::RentCostModel;
use super::settlement::{SettlementInputs, settle};
use super::solver;
use super::tax::{TaxBenefit, TaxModel, TaxYearActivity};
use super::types::{MonthlyCashflow, SimulationInputs, SimulationResult, YearlySnapshot};
use super::validation::{validate, validate_config};
use super::verdict::{classify, find_break_even_year};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Initialized,
    Running,
    Settling,
    Complete,
}

#[derive(Debug, Clone)]
pub(crate) struct RunOutcome {
    pub result: SimulationResult,
    pub monthly: Vec<MonthlyCashflow>,
}

/// Runs one simulation with the default engine configuration.
pub fn simulate(inputs: SimulationInputs) -> SimResult<SimulationResult> {
    simulate_with(inputs, &EngineConfig::default())
}

pub fn simulate_with(
    inputs: SimulationInputs,
    config: &EngineConfig,
) -> SimResult<SimulationResult> {
    validate(&inputs)?;
    validate_config(config)?;
    let mut result = run(&inputs, config, false).result;
    if config.solve_rent_equivalent {
        result.rent_equivalent = solver::rent_equivalent(&inputs, config);
    }

    debug!(
        "simulated {} years: verdict {:?}, net benefit {:.2}, break-even {:?}",
        inputs.holding_period_years,
        result.verdict,
        result.net_benefit_at_horizon,
        result.break_even_year
    );
    Ok(result)
}

/// Month-by-month cashflows for the same run `simulate_with` performs.
pub fn run_monthly_trace(
    inputs: SimulationInputs,
    config: &EngineConfig,
) -> SimResult<Vec<MonthlyCashflow>> {
    validate(&inputs)?;
    validate_config(config)?;
    Ok(run(&inputs, config, true).monthly)
}

/// Net benefit at the horizon for inputs already known to be in range.
pub(crate) fn net_benefit_at_horizon(inputs: &SimulationInputs, config: &EngineConfig) -> f64 {
    run(inputs, config, false).result.net_benefit_at_horizon
}

pub(crate) fn run(inputs: &SimulationInputs, config: &EngineConfig, trace_months: bool) -> RunOutcome {
    let mut simulation = Simulation::new(inputs, config, trace_months);
    simulation.seed_portfolios();
    for year in 1..=inputs.holding_period_years {
        simulation.run_year(year);
    }
    simulation.finish()
}

struct Simulation<'a> {
    inputs: &'a SimulationInputs,
    config: &'a EngineConfig,
    phase: Phase,
    ownership: OwnershipCostModel,
    rent: RentCostModel,
    tax: TaxModel<'a>,
    renter: InvestmentPortfolio,
    buyer: InvestmentPortfolio,
    snapshots: Vec<YearlySnapshot>,
    monthly: Option<Vec<MonthlyCashflow>>,
    itemization_beneficial: bool,
    final_rent: f64,
    final_ownership_cost: f64,
}

impl<'a> Simulation<'a> {
    fn new(inputs: &'a SimulationInputs, config: &'a EngineConfig, trace_months: bool) -> Self {
        let total_months = inputs.total_months() as usize;
        Self {
            inputs,
            config,
            phase: Phase::Initialized,
            ownership: OwnershipCostModel::new(inputs),
            rent: RentCostModel::new(inputs),
            tax: TaxModel::new(inputs, config),
            renter: InvestmentPortfolio::new(inputs.annual_investment_return),
            buyer: InvestmentPortfolio::new(inputs.annual_investment_return),
            snapshots: Vec::with_capacity(inputs.holding_period_years as usize),
            monthly: trace_months.then(|| Vec::with_capacity(total_months)),
            itemization_beneficial: false,
            final_rent: inputs.monthly_rent,
            final_ownership_cost: 0.0,
        }
    }

    fn transition(&mut self, next: Phase) {
        trace!("simulation phase {:?} -> {:?}", self.phase, next);
        self.phase = next;
    }

    /// Whoever spends less on day one invests the difference.
    fn seed_portfolios(&mut self) {
        debug_assert_eq!(self.phase, Phase::Initialized);
        let seed = self.ownership.upfront_cash() - self.rent.upfront_cash();
        if seed > 0.0 {
            self.renter.seed(seed);
        } else if seed < 0.0 {
            self.buyer.seed(-seed);
        }
        self.transition(Phase::Running);
    }

    fn run_year(&mut self, year: u32) {
        debug_assert_eq!(self.phase, Phase::Running);
        let first_month = (year - 1) * 12 + 1;
        let months: Vec<OwnershipMonth> = (first_month..first_month + 12)
            .map(|month| self.ownership.month(month))
            .collect();

        let benefit = self.tax.benefit(&TaxYearActivity {
            tax_year: self.config.first_tax_year + year as i32 - 1,
            interest_paid: months.iter().map(|m| m.interest).sum(),
            property_tax_paid: months.iter().map(|m| m.property_tax).sum(),
            pmi_paid: months.iter().map(|m| m.pmi).sum(),
        });
        if year == 1 {
            self.itemization_beneficial = benefit.itemization_beneficial;
        }

        for own in &months {
            self.run_month(own, &benefit);
        }

        let year_end = &months[months.len() - 1];
        let home_equity = year_end.home_equity();
        let deposit = if year == self.inputs.holding_period_years {
            self.rent.deposit_held()
        } else {
            0.0
        };
        let buyer_wealth = home_equity + self.buyer.balance();
        let renter_wealth = self.renter.balance() + deposit;
        self.snapshots.push(YearlySnapshot {
            year,
            renter_wealth,
            buyer_wealth,
            net_benefit: buyer_wealth - renter_wealth,
            home_equity,
            renter_portfolio: self.renter.balance(),
            buyer_portfolio: self.buyer.balance(),
            tax_benefit: benefit.annual_benefit,
        });

        if year == self.inputs.holding_period_years {
            self.transition(Phase::Settling);
        }
    }

    fn run_month(&mut self, own: &OwnershipMonth, benefit: &TaxBenefit) {
        let rent_cost = self.rent.monthly_outlay(own.month);
        let pretax = own.pretax_total();
        let posttax = own.posttax_total(benefit);

        let difference = posttax - rent_cost;
        let renter_surplus = difference.max(0.0);
        let buyer_surplus = (-difference).max(0.0);
        self.renter.step(renter_surplus);
        self.buyer.step(buyer_surplus);

        self.final_rent = self.rent.rent_for_month(own.month);
        self.final_ownership_cost = posttax;

        if let Some(monthly) = self.monthly.as_mut() {
            monthly.push(MonthlyCashflow {
                month: own.month,
                rent_cost,
                ownership_cost_pretax: pretax,
                tax_benefit: benefit.monthly_share(),
                ownership_cost_posttax: posttax,
                investable_surplus_renter: renter_surplus,
                investable_surplus_buyer: buyer_surplus,
                pmi: own.pmi,
                home_value: own.home_value,
                loan_balance: own.loan_balance,
                renter_portfolio: self.renter.balance(),
                buyer_portfolio: self.buyer.balance(),
            });
        }
    }

    fn finish(mut self) -> RunOutcome {
        debug_assert_eq!(self.phase, Phase::Settling);
        let final_month = self.inputs.total_months();
        let settlement = settle(
            self.inputs,
            &self.config.tax_rules,
            SettlementInputs {
                sale_price: self.ownership.home_value(final_month),
                loan_balance: self.ownership.schedule().balance_after(final_month),
                deposit_held: self.rent.deposit_held(),
                buyer_portfolio: &self.buyer,
                renter_portfolio: &self.renter,
            },
        );

        let net_benefit = settlement.buyer_wealth - settlement.renter_wealth;
        let result = SimulationResult {
            verdict: classify(net_benefit, self.config.toss_up_band),
            break_even_year: find_break_even_year(&self.snapshots),
            net_benefit_at_horizon: net_benefit,
            renter_wealth_at_horizon: settlement.renter_wealth,
            buyer_wealth_at_horizon: settlement.buyer_wealth,
            yearly_snapshots: std::mem::take(&mut self.snapshots),
            monthly_rent: self.final_rent,
            monthly_ownership_cost: self.final_ownership_cost,
            monthly_mortgage_payment: self.ownership.schedule().payment(),
            itemization_beneficial: self.itemization_beneficial,
            pmi_removed_month: self.ownership.pmi().removal_month(),
            rent_equivalent: None,
        };
        self.transition(Phase::Complete);

        RunOutcome {
            result,
            monthly: self.monthly.take().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{FilingStatus, Verdict};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn baseline() -> SimulationInputs {
        SimulationInputs::default()
    }

    fn quiet_config() -> EngineConfig {
        EngineConfig {
            solve_rent_equivalent: false,
            ..EngineConfig::default()
        }
    }

    fn result_for(inputs: SimulationInputs) -> SimulationResult {
        simulate_with(inputs, &quiet_config()).expect("inputs are valid")
    }

    #[test]
    fn oracle_default_scenario_matches_hand_model() {
        let result = result_for(baseline());

        assert_approx_tol(result.monthly_mortgage_payment, 2_086.16, 0.01);
        assert_approx_tol(result.net_benefit_at_horizon, -32_811.46, 1.0);
        assert_approx_tol(result.buyer_wealth_at_horizon, 177_445.62, 1.0);
        assert_approx_tol(result.renter_wealth_at_horizon, 210_257.08, 1.0);
        assert_eq!(result.verdict, Verdict::Rent);
        assert_eq!(result.break_even_year, None);
        assert!(result.itemization_beneficial);
        assert_eq!(result.pmi_removed_month, None);
        assert_approx_tol(result.monthly_ownership_cost, 3_047.13, 0.05);
        assert_approx_tol(result.monthly_rent, 2_000.0 * 1.03_f64.powi(6), 1e-9);

        let expected_net = [-6_544.19, -5_487.64, -4_437.33, -3_401.24, -2_421.12, -1_517.56, -2_706.44];
        assert_eq!(result.yearly_snapshots.len(), expected_net.len());
        for (snapshot, expected) in result.yearly_snapshots.iter().zip(expected_net) {
            assert_approx_tol(snapshot.net_benefit, expected, 0.5);
        }
    }

    #[test]
    fn stronger_appreciation_finds_break_even_in_year_three() {
        let mut inputs = baseline();
        inputs.annual_appreciation = 0.04;
        let result = result_for(inputs);
        assert_eq!(result.break_even_year, Some(3));
        assert_approx_tol(result.net_benefit_at_horizon, -17_733.8, 1.0);
        assert_eq!(result.verdict, Verdict::Rent);
    }

    #[test]
    fn near_zero_outcome_is_a_toss_up() {
        let mut inputs = baseline();
        inputs.annual_appreciation = 0.045;
        let result = result_for(inputs);
        assert_eq!(result.break_even_year, Some(2));
        assert_eq!(result.verdict, Verdict::TossUp);
        assert!(result.net_benefit_at_horizon.abs() <= 10_000.0);
    }

    #[test]
    fn expensive_rent_favours_buying_from_year_one() {
        let mut inputs = baseline();
        inputs.monthly_rent = 2_600.0;
        let result = result_for(inputs);
        assert_eq!(result.break_even_year, Some(1));
        assert_eq!(result.verdict, Verdict::Buy);
        assert_approx_tol(result.net_benefit_at_horizon, 35_109.50, 1.0);
    }

    #[test]
    fn zero_rate_loan_is_handled_without_division() {
        let mut inputs = baseline();
        inputs.mortgage_rate = 0.0;
        let result = result_for(inputs);
        assert_approx_tol(result.monthly_mortgage_payment, 320_000.0 / 360.0, 1e-9);
        assert!(!result.itemization_beneficial);
        assert_eq!(result.verdict, Verdict::Buy);
        assert_eq!(result.break_even_year, Some(1));
    }

    #[test]
    fn flat_market_favours_renting() {
        let mut inputs = baseline();
        inputs.annual_appreciation = 0.0;
        inputs.annual_investment_return = 0.0;
        let result = result_for(inputs);
        assert_eq!(result.verdict, Verdict::Rent);
        assert_approx_tol(result.net_benefit_at_horizon, -67_652.60, 1.0);
    }

    #[test]
    fn expensive_married_purchase_favours_renting() {
        let mut inputs = baseline();
        inputs.purchase_price = 1_200_000.0;
        inputs.filing_status = FilingStatus::Married;
        let result = result_for(inputs);
        assert_eq!(result.verdict, Verdict::Rent);
        assert!(result.net_benefit_at_horizon < -500_000.0);
    }

    #[test]
    fn low_down_payment_carries_pmi_until_removal() {
        let config = quiet_config();
        let mut inputs = baseline();
        inputs.down_payment_percent = 0.03;
        let result = simulate_with(inputs.clone(), &config).expect("valid");
        assert_approx_tol(result.monthly_mortgage_payment, 2_529.47, 0.01);
        assert_eq!(result.pmi_removed_month, Some(50));

        let low = run_monthly_trace(inputs.clone(), &config).expect("valid");
        inputs.pmi_rate = 0.0;
        let without_pmi = run_monthly_trace(inputs, &config).expect("valid");
        let premium = 0.0075 / 12.0 * 388_000.0;
        for (row, bare) in low.iter().zip(&without_pmi) {
            let expected = if row.month < 50 { premium } else { 0.0 };
            assert_approx_tol(row.pmi, expected, 1e-9);
            assert_approx_tol(
                row.ownership_cost_pretax - bare.ownership_cost_pretax,
                expected,
                1e-9,
            );
        }
    }

    #[test]
    fn low_down_payment_costs_more_than_twenty_percent_down_while_pmi_runs() {
        let config = quiet_config();
        let mut low_inputs = baseline();
        low_inputs.down_payment_percent = 0.03;
        let low = run_monthly_trace(low_inputs, &config).expect("valid");
        let high = run_monthly_trace(baseline(), &config).expect("valid");

        for (low_row, high_row) in low.iter().zip(&high).take(49) {
            assert!(low_row.ownership_cost_pretax > high_row.ownership_cost_pretax);
            assert!(low_row.pmi > 0.0);
        }
        for row in low.iter().skip(49) {
            assert_eq!(row.pmi, 0.0);
        }
    }

    #[test]
    fn monthly_trace_surpluses_are_one_sided_and_consistent() {
        let trace = run_monthly_trace(baseline(), &quiet_config()).expect("valid");
        assert_eq!(trace.len(), 84);
        for row in &trace {
            assert!(row.investable_surplus_renter >= 0.0);
            assert!(row.investable_surplus_buyer >= 0.0);
            assert!(row.investable_surplus_renter == 0.0 || row.investable_surplus_buyer == 0.0);
            assert_approx_tol(
                row.ownership_cost_posttax,
                row.ownership_cost_pretax - row.tax_benefit,
                1e-9,
            );
            assert_approx_tol(
                row.investable_surplus_renter - row.investable_surplus_buyer,
                row.ownership_cost_posttax - row.rent_cost,
                1e-9,
            );
        }
        assert_eq!(trace[0].month, 1);
        assert_eq!(trace[83].month, 84);
    }

    #[test]
    fn holding_beyond_loan_term_pays_no_principal_and_interest() {
        let config = quiet_config();
        let mut inputs = baseline();
        inputs.loan_term_years = 10;
        inputs.holding_period_years = 12;
        let trace = run_monthly_trace(inputs.clone(), &config).expect("valid");
        assert_eq!(trace[130].loan_balance, 0.0);
        let result = simulate_with(inputs, &config).expect("valid");
        assert_eq!(result.yearly_snapshots.len(), 12);
        assert_approx_tol(
            result.yearly_snapshots[11].home_equity,
            400_000.0 * 1.035_f64.powi(12),
            1e-6,
        );
    }

    #[test]
    fn deposit_only_counts_in_the_final_snapshot() {
        let mut inputs = baseline();
        inputs.security_deposit = 3.0;
        let result = result_for(inputs);
        let snapshots = &result.yearly_snapshots;
        for snapshot in &snapshots[..snapshots.len() - 1] {
            assert_approx_tol(snapshot.renter_wealth, snapshot.renter_portfolio, 1e-9);
        }
        let last = snapshots.last().expect("seven snapshots");
        assert_approx_tol(last.renter_wealth, last.renter_portfolio + 6_000.0, 1e-9);
    }

    #[test]
    fn rejects_invalid_inputs_before_running() {
        let mut inputs = baseline();
        inputs.loan_term_years = 12;
        let err = simulate(inputs).expect_err("12-year term is invalid");
        assert_eq!(err.field(), "loan_term_years");
    }

    #[test]
    fn rejects_engine_settings_that_would_skew_the_verdict() {
        let mut inputs = baseline();
        inputs.annual_appreciation = 0.045;

        let negative_band = EngineConfig {
            toss_up_band: -1.0,
            ..quiet_config()
        };
        let err = simulate_with(inputs.clone(), &negative_band).expect_err("negative band");
        assert_eq!(err.field(), "toss_up_band");
        assert_eq!(err.kind(), "invalid_input");

        let unknown_agi = EngineConfig {
            household_agi: f64::NAN,
            ..quiet_config()
        };
        let err = run_monthly_trace(inputs, &unknown_agi).expect_err("NaN AGI");
        assert_eq!(err.field(), "household_agi");
    }

    #[test]
    fn default_simulate_solves_rent_equivalent() {
        let result = simulate(baseline()).expect("valid");
        let rent = result.rent_equivalent.expect("crossing exists");
        assert!(rent > 2_000.0);
        assert!(rent < 2_600.0);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let first = simulate(baseline()).expect("valid");
        let second = simulate(baseline()).expect("valid");
        assert_eq!(first, second);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(32))]

        #[test]
        fn prop_results_are_finite_and_internally_consistent(
            rent in 500u32..6_000,
            price_k in 100u32..1_500,
            down_bp in 0u32..10_001,
            rate_bp in 0u32..1_200,
            years in 1u32..31,
            appreciation_bp in -1_000i32..1_501,
            return_bp in 0u32..1_501,
            married in proptest::bool::ANY
        ) {
            let mut inputs = baseline();
            inputs.monthly_rent = rent as f64;
            inputs.purchase_price = price_k as f64 * 1_000.0;
            inputs.down_payment_percent = down_bp as f64 / 10_000.0;
            inputs.mortgage_rate = rate_bp as f64 / 10_000.0;
            inputs.holding_period_years = years;
            inputs.annual_appreciation = appreciation_bp as f64 / 10_000.0;
            inputs.annual_investment_return = return_bp as f64 / 10_000.0;
            inputs.filing_status = if married { FilingStatus::Married } else { FilingStatus::Single };

            let result = simulate_with(inputs.clone(), &quiet_config()).expect("generated inputs are valid");

            prop_assert!(result.net_benefit_at_horizon.is_finite());
            prop_assert!(
                (result.net_benefit_at_horizon
                    - (result.buyer_wealth_at_horizon - result.renter_wealth_at_horizon))
                    .abs()
                    < 1e-6
            );
            prop_assert_eq!(result.yearly_snapshots.len(), years as usize);
            for (index, snapshot) in result.yearly_snapshots.iter().enumerate() {
                prop_assert_eq!(snapshot.year, index as u32 + 1);
            }
            if let Some(year) = result.break_even_year {
                prop_assert!(year >= 1 && year <= years);
            }
            prop_assert_eq!(
                result.verdict,
                classify(result.net_benefit_at_horizon, 10_000.0)
            );

            let again = simulate_with(inputs, &quiet_config());
            prop_assert_eq!(again.ok(), Some(result));
        }
    }
}
