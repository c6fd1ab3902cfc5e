#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PortfolioState {
    pub balance: f64,
    pub total_contributions: f64,
}

/// Forward-only investment account compounding monthly.
#[derive(Debug, Clone)]
pub struct InvestmentPortfolio {
    monthly_growth: f64,
    state: PortfolioState,
}

impl InvestmentPortfolio {
    pub fn new(annual_return: f64) -> Self {
        Self {
            monthly_growth: (1.0 + annual_return).powf(1.0 / 12.0),
            state: PortfolioState::default(),
        }
    }

    /// Month-0 deposit. Counts toward cost basis.
    pub fn seed(&mut self, amount: f64) {
        self.contribute(amount);
    }

    /// Grow one month, then add this month's contribution.
    pub fn step(&mut self, contribution: f64) {
        self.state.balance *= self.monthly_growth;
        self.contribute(contribution);
    }

    fn contribute(&mut self, amount: f64) {
        debug_assert!(amount >= 0.0, "negative contribution: {amount}");
        self.state.balance += amount;
        self.state.total_contributions += amount;
    }

    pub fn state(&self) -> PortfolioState {
        self.state
    }

    pub fn balance(&self) -> f64 {
        self.state.balance
    }

    pub fn unrealized_gain(&self) -> f64 {
        (self.state.balance - self.state.total_contributions).max(0.0)
    }

    /// Liquidation value after capital-gains tax on the gain above cost basis.
    pub fn after_tax_value(&self, capital_gains_rate: f64) -> f64 {
        self.state.balance - self.unrealized_gain() * capital_gains_rate
    }
}
