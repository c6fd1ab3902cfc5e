use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_distr::{Distribution, StandardNormal};
use rayon::prelude::*;

use super::config::EngineConfig;
use super::engine::net_benefit_at_horizon;
use super::error::{SimResult, SimulationError};
use super::types::{MonteCarloResult, SimulationInputs, Verdict};
use super::validation::{self, validate};
use super::verdict::classify;

pub const DEFAULT_SIMULATIONS: u32 = 1_000;
pub const MAX_SIMULATIONS: u32 = 100_000;
pub const DEFAULT_SEED: u64 = 42;

const APPRECIATION_BOUNDS: (f64, f64) = (-0.15, 0.20);
const INVESTMENT_RETURN_BOUNDS: (f64, f64) = (-0.10, 0.25);
const RENT_INCREASE_BOUNDS: (f64, f64) = (0.0, 0.15);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonteCarloConfig {
    pub simulations: u32,
    pub seed: u64,
    pub appreciation_std_dev: f64,
    pub investment_return_std_dev: f64,
    pub rent_increase_std_dev: f64,
}

impl Default for MonteCarloConfig {
    fn default() -> Self {
        Self {
            simulations: DEFAULT_SIMULATIONS,
            seed: DEFAULT_SEED,
            appreciation_std_dev: 0.05,
            investment_return_std_dev: 0.15,
            rent_increase_std_dev: 0.02,
        }
    }
}

#[derive(Clone, Copy)]
struct MarketSample {
    appreciation: f64,
    investment_return: f64,
    rent_increase: f64,
}

/// Reruns the simulation with appreciation, investment return and rent growth drawn
/// around the inputs' values. Each run has its own seeded stream, so the result does
/// not depend on how rayon schedules the runs.
pub fn run_monte_carlo(
    inputs: SimulationInputs,
    engine: &EngineConfig,
    config: MonteCarloConfig,
) -> SimResult<MonteCarloResult> {
    validate(&inputs)?;
    validation::validate_config(engine)?;
    validate_config(config)?;

    let mut distribution: Vec<f64> = (0..config.simulations)
        .into_par_iter()
        .map(|scenario_id| {
            let mut rng = ChaCha20Rng::seed_from_u64(derive_seed(config.seed, scenario_id));
            let sample = sample_market(&inputs, config, &mut rng);
            let mut scenario = inputs.clone();
            scenario.annual_appreciation = sample.appreciation;
            scenario.annual_investment_return = sample.investment_return;
            scenario.annual_rent_increase = sample.rent_increase;
            net_benefit_at_horizon(&scenario, engine)
        })
        .collect();

    let buy_wins = distribution
        .iter()
        .filter(|&&net| classify(net, engine.toss_up_band) == Verdict::Buy)
        .count();

    let median = percentile(&mut distribution, 50.0);
    let p10 = percentile(&mut distribution, 10.0);
    let p90 = percentile(&mut distribution, 90.0);

    log::debug!(
        "monte carlo: {} runs, buy wins {buy_wins}, median {median:.2}",
        config.simulations
    );

    Ok(MonteCarloResult {
        simulations: config.simulations,
        buy_wins_pct: buy_wins as f64 / config.simulations as f64 * 100.0,
        median,
        p10,
        p90,
        distribution,
    })
}

fn validate_config(config: MonteCarloConfig) -> SimResult<()> {
    if !(1..=MAX_SIMULATIONS).contains(&config.simulations) {
        return Err(SimulationError::invalid(
            "simulations",
            format!("must be between 1 and {MAX_SIMULATIONS}"),
        ));
    }
    for (field, value) in [
        ("appreciation_std_dev", config.appreciation_std_dev),
        ("investment_return_std_dev", config.investment_return_std_dev),
        ("rent_increase_std_dev", config.rent_increase_std_dev),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(SimulationError::invalid(field, "must be a finite value >= 0"));
        }
    }
    Ok(())
}

fn sample_market(
    inputs: &SimulationInputs,
    config: MonteCarloConfig,
    rng: &mut ChaCha20Rng,
) -> MarketSample {
    let z1: f64 = StandardNormal.sample(rng);
    let z2: f64 = StandardNormal.sample(rng);
    let z3: f64 = StandardNormal.sample(rng);

    MarketSample {
        appreciation: (inputs.annual_appreciation + config.appreciation_std_dev * z1)
            .clamp(APPRECIATION_BOUNDS.0, APPRECIATION_BOUNDS.1),
        investment_return: (inputs.annual_investment_return
            + config.investment_return_std_dev * z2)
            .clamp(INVESTMENT_RETURN_BOUNDS.0, INVESTMENT_RETURN_BOUNDS.1),
        rent_increase: (inputs.annual_rent_increase + config.rent_increase_std_dev * z3)
            .clamp(RENT_INCREASE_BOUNDS.0, RENT_INCREASE_BOUNDS.1),
    }
}

fn derive_seed(base_seed: u64, scenario_id: u32) -> u64 {
    let mixed = base_seed ^ ((scenario_id as u64) << 32) ^ scenario_id as u64;
    splitmix64(mixed)
}

fn splitmix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Linear interpolation between closest ranks. Sorts `values` in place.
fn percentile(values: &mut [f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    values.sort_by(|a, b| a.total_cmp(b));

    let n = values.len();
    if n == 1 {
        return values[0];
    }

    let rank = (p / 100.0) * (n as f64 - 1.0);
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    if lower == upper {
        values[lower]
    } else {
        let w = rank - lower as f64;
        values[lower] * (1.0 - w) + values[upper] * w
    }
}
