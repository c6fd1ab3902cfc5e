mod amortization;
mod config;
mod engine;
mod error;
mod montecarlo;
mod ownership;
mod pmi;
mod portfolio;
mod renting;
mod sensitivity;
mod settlement;
mod solver;
mod tax;
mod tax_rules;
mod types;
mod validation;
mod verdict;

pub use amortization::{AmortizationSchedule, monthly_payment};
pub use config::EngineConfig;
pub use engine::{run_monthly_trace, simulate, simulate_with};
pub use error::{SimResult, SimulationError};
pub use montecarlo::{
    DEFAULT_SEED, DEFAULT_SIMULATIONS, MAX_SIMULATIONS, MonteCarloConfig, run_monte_carlo,
};
pub use ownership::{OwnershipCostModel, OwnershipMonth, home_value};
pub use pmi::PmiTracker;
pub use portfolio::{InvestmentPortfolio, PortfolioState};
pub use renting::RentCostModel;
pub use sensitivity::{SensitivityVariable, run_sensitivity_analysis};
pub use settlement::{Settlement, SettlementInputs, settle};
pub use solver::{RentSolveConfig, RentSolveIteration, RentSolveResult, solve_rent_equivalent};
pub use tax::{TaxBenefit, TaxModel, TaxYearActivity};
pub use tax_rules::TaxRules;
pub use types::{
    AmortizationMonth, FilingStatus, MonteCarloResult, MonthlyCashflow, SensitivityResult,
    SimulationInputs, SimulationResult, Verdict, YearlySnapshot,
};
pub use validation::{validate, validate_config};
pub use verdict::{classify, find_break_even_year};
