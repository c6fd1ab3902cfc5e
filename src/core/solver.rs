use super::config::EngineConfig;
use super::engine::net_benefit_at_horizon;
use super::error::{SimResult, SimulationError};
use super::types::SimulationInputs;
use super::validation::{self, validate};

#[derive(Debug, Clone, Copy)]
pub struct RentSolveConfig {
    /// Initial upper bound on the starting rent.
    pub search_max: f64,
    /// Times the upper bound may double before giving up on a crossing.
    pub max_bracket_doublings: u32,
    pub tolerance: f64,
    pub max_iterations: u32,
}

impl Default for RentSolveConfig {
    fn default() -> Self {
        Self {
            search_max: 10_000.0,
            max_bracket_doublings: 16,
            tolerance: 0.01,
            max_iterations: 60,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RentSolveIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate_rent: f64,
    pub net_benefit: f64,
}

#[derive(Debug, Clone)]
pub struct RentSolveResult {
    pub solved_rent: Option<f64>,
    pub net_benefit_at_solution: Option<f64>,
    pub search_max: f64,
    pub iterations: Vec<RentSolveIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Finds the starting monthly rent at which buying and renting end the horizon
/// equally wealthy. Net benefit rises with rent, so bisection on its sign applies.
/// The answer is a break-even rent, not an ownership cost less equity.
pub fn solve_rent_equivalent(
    inputs: SimulationInputs,
    engine: &EngineConfig,
    config: RentSolveConfig,
) -> SimResult<RentSolveResult> {
    validate(&inputs)?;
    validation::validate_config(engine)?;
    validate_config(config)?;
    Ok(bisect(&inputs, engine, config))
}

/// Rent equivalent for already-validated inputs with the default search settings.
pub(crate) fn rent_equivalent(inputs: &SimulationInputs, engine: &EngineConfig) -> Option<f64> {
    bisect(inputs, engine, RentSolveConfig::default()).solved_rent
}

fn bisect(inputs: &SimulationInputs, engine: &EngineConfig, config: RentSolveConfig) -> RentSolveResult {
    let evaluate = |rent: f64| {
        let mut candidate = inputs.clone();
        candidate.monthly_rent = rent;
        net_benefit_at_horizon(&candidate, engine)
    };

    let at_zero = evaluate(0.0);
    if at_zero >= 0.0 {
        return RentSolveResult {
            solved_rent: Some(0.0),
            net_benefit_at_solution: Some(at_zero),
            search_max: config.search_max,
            iterations: Vec::new(),
            converged: true,
            feasible: true,
            message: "Buying wins even at zero rent.".to_string(),
        };
    }

    let mut hi = config.search_max;
    let mut at_hi = evaluate(hi);
    let mut doublings = 0;
    while at_hi < 0.0 && doublings < config.max_bracket_doublings {
        hi *= 2.0;
        at_hi = evaluate(hi);
        doublings += 1;
    }
    if at_hi < 0.0 {
        return RentSolveResult {
            solved_rent: None,
            net_benefit_at_solution: None,
            search_max: hi,
            iterations: Vec::new(),
            converged: false,
            feasible: false,
            message: "Renting wins at every rent within the search bounds.".to_string(),
        };
    }

    let mut lo = 0.0;
    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let mut converged = false;
    let mut it = 0;
    while it < config.max_iterations {
        it += 1;
        let mid = (lo + hi) * 0.5;
        let net_benefit = evaluate(mid);
        iterations.push(RentSolveIteration {
            iteration: it,
            lower_bound: lo,
            upper_bound: hi,
            candidate_rent: mid,
            net_benefit,
        });

        if net_benefit >= 0.0 {
            hi = mid;
        } else {
            lo = mid;
        }

        if (hi - lo).abs() <= config.tolerance {
            converged = true;
            break;
        }
    }

    let solved = (lo + hi) * 0.5;
    RentSolveResult {
        solved_rent: Some(solved),
        net_benefit_at_solution: Some(evaluate(solved)),
        search_max: config.search_max * 2f64.powi(doublings as i32),
        iterations,
        converged,
        feasible: true,
        message: if converged {
            "Solved rent equivalent.".to_string()
        } else {
            "Reached max iterations before tolerance was met; returning best estimate."
                .to_string()
        },
    }
}

fn validate_config(config: RentSolveConfig) -> SimResult<()> {
    if !config.search_max.is_finite() || config.search_max <= 0.0 {
        return Err(SimulationError::invalid("search_max", "must be > 0"));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(SimulationError::invalid("tolerance", "must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(SimulationError::invalid("max_iterations", "must be > 0"));
    }
    Ok(())
}
