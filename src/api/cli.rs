use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;

use crate::core::{
    EngineConfig, FilingStatus, MonteCarloConfig, RentSolveConfig, SimulationError,
    SimulationInputs, TaxRules, run_monte_carlo, run_sensitivity_analysis, simulate_with,
    solve_rent_equivalent, validate_config,
};

#[derive(Error, Debug)]
pub enum CliError {
    #[error("failed to read tax rules from {path}: {source}")]
    ReadTaxRules {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse tax rules from {path}: {source}")]
    ParseTaxRules {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("--pmi-deduction-percent must be between 0 and 100")]
    PmiDeductionPercent,
    #[error(transparent)]
    Simulation(#[from] SimulationError),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "ownvsrent",
    about = "Month-by-month rent vs. buy simulator (amortization, PMI, itemized deductions, sale-time tax)"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the JSON API.
    Serve(ServeArgs),
    /// Run one simulation and print the result as JSON.
    Calculate(RunArgs),
    /// Swing the key assumptions and rank them by impact.
    Sensitivity(RunArgs),
    /// Rerun with randomized appreciation, returns and rent growth.
    MonteCarlo(MonteCarloArgs),
    /// Solve for the starting rent at which both paths break even.
    RentEquivalent(RunArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    #[arg(long, env = "OWNVSRENT_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,
    #[arg(long, env = "OWNVSRENT_PORT", default_value_t = 8080)]
    pub port: u16,
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
}

#[derive(Args, Debug)]
pub struct MonteCarloArgs {
    #[command(flatten)]
    pub inputs: InputArgs,
    #[command(flatten)]
    pub engine: EngineArgs,
    #[arg(long, default_value_t = crate::core::DEFAULT_SIMULATIONS)]
    pub simulations: u32,
    #[arg(long, default_value_t = crate::core::DEFAULT_SEED)]
    pub seed: u64,
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// JSON file with a replacement tax-rule schedule.
    #[arg(long)]
    pub tax_rules: Option<PathBuf>,
    #[arg(long, default_value_t = 2026)]
    pub first_tax_year: i32,
    #[arg(long, default_value_t = 100_000.0)]
    pub household_agi: f64,
    /// Overrides the AGI-derived PMI deduction share.
    #[arg(long)]
    pub pmi_deduction_percent: Option<f64>,
    #[arg(long, default_value_t = 10_000.0)]
    pub toss_up_band: f64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliFilingStatus {
    Single,
    Married,
}

impl From<CliFilingStatus> for FilingStatus {
    fn from(value: CliFilingStatus) -> Self {
        match value {
            CliFilingStatus::Single => FilingStatus::Single,
            CliFilingStatus::Married => FilingStatus::Married,
        }
    }
}

/// Household inputs. Rates are given in percent.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    #[arg(long, default_value_t = 2_000.0)]
    pub monthly_rent: f64,
    #[arg(long, default_value_t = 3.0)]
    pub annual_rent_increase: f64,
    #[arg(long, default_value_t = 30.0)]
    pub renter_insurance: f64,
    /// Months of rent.
    #[arg(long, default_value_t = 1.0)]
    pub security_deposit: f64,
    /// Percent of one year's rent.
    #[arg(long, default_value_t = 0.0)]
    pub broker_fee: f64,

    #[arg(long, default_value_t = 400_000.0)]
    pub purchase_price: f64,
    #[arg(long, default_value_t = 20.0)]
    pub down_payment: f64,
    #[arg(long, default_value_t = 6.8)]
    pub mortgage_rate: f64,
    #[arg(long, default_value_t = 30)]
    pub loan_term_years: u32,
    #[arg(long, default_value_t = 1.1)]
    pub property_tax_rate: f64,
    #[arg(long, default_value_t = 0.5)]
    pub home_insurance_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    pub hoa_monthly: f64,
    #[arg(long, default_value_t = 1.5)]
    pub maintenance_rate: f64,
    #[arg(long, default_value_t = 0.75)]
    pub pmi_rate: f64,
    #[arg(long, default_value_t = 3.0)]
    pub closing_costs: f64,
    #[arg(long, default_value_t = 8.0)]
    pub selling_costs: f64,

    #[arg(long, default_value_t = 7)]
    pub holding_period_years: u32,
    #[arg(long, default_value_t = 3.5)]
    pub appreciation: f64,
    #[arg(long, default_value_t = 7.0)]
    pub investment_return: f64,
    #[arg(long, default_value_t = 22.0)]
    pub marginal_tax_rate: f64,
    #[arg(long, default_value_t = 5.0)]
    pub state_tax_rate: f64,
    #[arg(long, value_enum, default_value_t = CliFilingStatus::Single)]
    pub filing_status: CliFilingStatus,
    #[arg(long, default_value_t = 15.0)]
    pub capital_gains_tax_rate: f64,
}

pub fn build_inputs(args: &InputArgs) -> SimulationInputs {
    SimulationInputs {
        monthly_rent: args.monthly_rent,
        annual_rent_increase: args.annual_rent_increase / 100.0,
        renter_insurance: args.renter_insurance,
        security_deposit: args.security_deposit,
        broker_fee: args.broker_fee / 100.0,
        purchase_price: args.purchase_price,
        down_payment_percent: args.down_payment / 100.0,
        mortgage_rate: args.mortgage_rate / 100.0,
        loan_term_years: args.loan_term_years,
        property_tax_rate: args.property_tax_rate / 100.0,
        home_insurance_rate: args.home_insurance_rate / 100.0,
        hoa_monthly: args.hoa_monthly,
        maintenance_rate: args.maintenance_rate / 100.0,
        pmi_rate: args.pmi_rate / 100.0,
        buyer_closing_costs_percent: args.closing_costs / 100.0,
        selling_costs_percent: args.selling_costs / 100.0,
        holding_period_years: args.holding_period_years,
        annual_appreciation: args.appreciation / 100.0,
        annual_investment_return: args.investment_return / 100.0,
        marginal_tax_rate: args.marginal_tax_rate / 100.0,
        state_tax_rate: args.state_tax_rate / 100.0,
        filing_status: args.filing_status.into(),
        capital_gains_tax_rate: args.capital_gains_tax_rate / 100.0,
    }
}

pub fn build_engine_config(args: &EngineArgs) -> Result<EngineConfig, CliError> {
    let tax_rules = match &args.tax_rules {
        Some(path) => load_tax_rules(path)?,
        None => TaxRules::default(),
    };

    let pmi_deduction_fraction = match args.pmi_deduction_percent {
        Some(percent) if (0.0..=100.0).contains(&percent) => Some(percent / 100.0),
        Some(_) => return Err(CliError::PmiDeductionPercent),
        None => None,
    };

    let config = EngineConfig {
        tax_rules,
        first_tax_year: args.first_tax_year,
        household_agi: args.household_agi,
        pmi_deduction_fraction,
        toss_up_band: args.toss_up_band,
        ..EngineConfig::default()
    };
    validate_config(&config)?;
    Ok(config)
}

fn load_tax_rules(path: &Path) -> Result<TaxRules, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::ReadTaxRules {
        path: path.to_path_buf(),
        source,
    })?;
    let rules: TaxRules =
        serde_json::from_str(&raw).map_err(|source| CliError::ParseTaxRules {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("loaded tax rules {} from {}", rules.version, path.display());
    Ok(rules)
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Serve(args) => {
            let config = build_engine_config(&args.engine)?;
            let addr = SocketAddr::new(args.host, args.port);
            super::run_http_server(addr, config).await?;
        }
        Commands::Calculate(args) => {
            let config = build_engine_config(&args.engine)?;
            print_json(&simulate_with(build_inputs(&args.inputs), &config)?)?;
        }
        Commands::Sensitivity(args) => {
            let config = build_engine_config(&args.engine)?;
            print_json(&run_sensitivity_analysis(build_inputs(&args.inputs), &config)?)?;
        }
        Commands::MonteCarlo(args) => {
            let config = build_engine_config(&args.engine)?;
            let run_config = MonteCarloConfig {
                simulations: args.simulations,
                seed: args.seed,
                ..MonteCarloConfig::default()
            };
            print_json(&run_monte_carlo(build_inputs(&args.inputs), &config, run_config)?)?;
        }
        Commands::RentEquivalent(args) => {
            let config = build_engine_config(&args.engine)?;
            let solved = solve_rent_equivalent(
                build_inputs(&args.inputs),
                &config,
                RentSolveConfig::default(),
            )?;
            print_json(&RentEquivalentOutput {
                rent_equivalent: solved.solved_rent,
                net_benefit_at_solution: solved.net_benefit_at_solution,
                iterations: solved.iterations.len(),
                converged: solved.converged,
                feasible: solved.feasible,
                message: solved.message,
            })?;
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct RentEquivalentOutput {
    rent_equivalent: Option<f64>,
    net_benefit_at_solution: Option<f64>,
    iterations: usize,
    converged: bool,
    feasible: bool,
    message: String,
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ownvsrent").chain(args.iter().copied()))
            .expect("arguments parse")
    }

    #[test]
    fn default_flags_match_default_household() {
        let Commands::Calculate(args) = parse(&["calculate"]).command else {
            panic!("expected calculate");
        };
        let inputs = build_inputs(&args.inputs);
        let defaults = SimulationInputs::default();

        assert_approx(inputs.monthly_rent, defaults.monthly_rent);
        assert_approx(inputs.annual_rent_increase, defaults.annual_rent_increase);
        assert_approx(inputs.down_payment_percent, defaults.down_payment_percent);
        assert_approx(inputs.mortgage_rate, defaults.mortgage_rate);
        assert_approx(inputs.property_tax_rate, defaults.property_tax_rate);
        assert_approx(inputs.pmi_rate, defaults.pmi_rate);
        assert_approx(inputs.annual_appreciation, defaults.annual_appreciation);
        assert_approx(inputs.capital_gains_tax_rate, defaults.capital_gains_tax_rate);
        assert_eq!(inputs.loan_term_years, defaults.loan_term_years);
        assert_eq!(inputs.holding_period_years, defaults.holding_period_years);
        assert_eq!(inputs.filing_status, defaults.filing_status);
    }

    #[test]
    fn percent_flags_convert_to_fractions() {
        let Commands::Calculate(args) = parse(&[
            "calculate",
            "--down-payment",
            "5",
            "--mortgage-rate",
            "7.25",
            "--filing-status",
            "married",
        ])
        .command
        else {
            panic!("expected calculate");
        };
        let inputs = build_inputs(&args.inputs);
        assert_approx(inputs.down_payment_percent, 0.05);
        assert_approx(inputs.mortgage_rate, 0.0725);
        assert_eq!(inputs.filing_status, FilingStatus::Married);
    }

    #[test]
    fn monte_carlo_flags_parse() {
        let Commands::MonteCarlo(args) =
            parse(&["monte-carlo", "--simulations", "250", "--seed", "7"]).command
        else {
            panic!("expected monte-carlo");
        };
        assert_eq!(args.simulations, 250);
        assert_eq!(args.seed, 7);
    }

    #[test]
    fn engine_flags_build_config() {
        let Commands::RentEquivalent(args) = parse(&[
            "rent-equivalent",
            "--first-tax-year",
            "2027",
            "--household-agi",
            "105000",
            "--pmi-deduction-percent",
            "40",
            "--toss-up-band",
            "2500",
        ])
        .command
        else {
            panic!("expected rent-equivalent");
        };
        let config = build_engine_config(&args.engine).expect("valid engine flags");
        assert_eq!(config.first_tax_year, 2027);
        assert_approx(config.household_agi, 105_000.0);
        assert_eq!(config.pmi_deduction_fraction, Some(0.4));
        assert_approx(config.toss_up_band, 2_500.0);
        assert_eq!(config.tax_rules, TaxRules::default());
    }

    #[test]
    fn out_of_range_pmi_deduction_is_rejected() {
        let Commands::Calculate(args) =
            parse(&["calculate", "--pmi-deduction-percent", "140"]).command
        else {
            panic!("expected calculate");
        };
        assert!(matches!(
            build_engine_config(&args.engine),
            Err(CliError::PmiDeductionPercent)
        ));
    }

    #[test]
    fn tax_rules_load_from_json_file() {
        let mut rules = TaxRules::default();
        rules.version = "test-schedule".to_string();
        rules.salt_cap_after_reversion = 20_000.0;
        let path = std::env::temp_dir().join(format!(
            "ownvsrent-tax-rules-{}.json",
            std::process::id()
        ));
        fs::write(&path, serde_json::to_string(&rules).expect("serialize")).expect("write");

        let args = EngineArgs {
            tax_rules: Some(path.clone()),
            first_tax_year: 2026,
            household_agi: 100_000.0,
            pmi_deduction_percent: None,
            toss_up_band: 10_000.0,
        };
        let config = build_engine_config(&args).expect("rules load");
        fs::remove_file(&path).ok();
        assert_eq!(config.tax_rules, rules);
    }

    #[test]
    fn negative_toss_up_band_is_rejected() {
        let Commands::Calculate(args) = parse(&["calculate", "--toss-up-band=-1"]).command else {
            panic!("expected calculate");
        };
        let err = build_engine_config(&args.engine).expect_err("negative band");
        assert!(matches!(
            err,
            CliError::Simulation(SimulationError::InvalidInput { field: "toss_up_band", .. })
        ));
    }

    #[test]
    fn tax_rules_with_negative_amounts_are_rejected() {
        let rules = TaxRules {
            mortgage_interest_debt_limit: -1.0,
            ..TaxRules::default()
        };
        let path = std::env::temp_dir().join(format!(
            "ownvsrent-negative-rules-{}.json",
            std::process::id()
        ));
        fs::write(&path, serde_json::to_string(&rules).expect("serialize")).expect("write");

        let args = EngineArgs {
            tax_rules: Some(path.clone()),
            first_tax_year: 2026,
            household_agi: 100_000.0,
            pmi_deduction_percent: None,
            toss_up_band: 10_000.0,
        };
        let result = build_engine_config(&args);
        fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(CliError::Simulation(SimulationError::InvalidInput {
                field: "mortgage_interest_debt_limit",
                ..
            }))
        ));
    }

    #[test]
    fn missing_tax_rules_file_is_reported() {
        let args = EngineArgs {
            tax_rules: Some(PathBuf::from("/nonexistent/ownvsrent/rules.json")),
            first_tax_year: 2026,
            household_agi: 100_000.0,
            pmi_deduction_percent: None,
            toss_up_band: 10_000.0,
        };
        assert!(matches!(
            build_engine_config(&args),
            Err(CliError::ReadTaxRules { .. })
        ));
    }
}
