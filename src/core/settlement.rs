use super::portfolio::InvestmentPortfolio;
use super::tax_rules::TaxRules;
use super::types::SimulationInputs;

/// Sale-time breakdown at the horizon month.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    pub sale_price: f64,
    pub loan_payoff: f64,
    pub selling_costs: f64,
    pub raw_gain: f64,
    pub exclusion: f64,
    pub capital_gains_tax: f64,
    pub net_sale_proceeds: f64,
    pub buyer_portfolio_after_tax: f64,
    pub renter_portfolio_after_tax: f64,
    pub deposit_returned: f64,
    pub buyer_wealth: f64,
    pub renter_wealth: f64,
}

pub struct SettlementInputs<'a> {
    pub sale_price: f64,
    pub loan_balance: f64,
    pub deposit_held: f64,
    pub buyer_portfolio: &'a InvestmentPortfolio,
    pub renter_portfolio: &'a InvestmentPortfolio,
}

pub fn settle(inputs: &SimulationInputs, rules: &TaxRules, at: SettlementInputs<'_>) -> Settlement {
    let cg_rate = inputs.capital_gains_tax_rate;
    let selling_costs = at.sale_price * inputs.selling_costs_percent;
    let raw_gain = at.sale_price - inputs.purchase_price;
    let exclusion = rules.home_sale_exclusion(inputs.filing_status, inputs.holding_period_years);
    let capital_gains_tax = (raw_gain - exclusion).max(0.0) * cg_rate;
    let net_sale_proceeds = at.sale_price - at.loan_balance - selling_costs - capital_gains_tax;

    let buyer_portfolio_after_tax = at.buyer_portfolio.after_tax_value(cg_rate);
    let renter_portfolio_after_tax = at.renter_portfolio.after_tax_value(cg_rate);

    Settlement {
        sale_price: at.sale_price,
        loan_payoff: at.loan_balance,
        selling_costs,
        raw_gain,
        exclusion,
        capital_gains_tax,
        net_sale_proceeds,
        buyer_portfolio_after_tax,
        renter_portfolio_after_tax,
        deposit_returned: at.deposit_held,
        buyer_wealth: net_sale_proceeds + buyer_portfolio_after_tax,
        renter_wealth: renter_portfolio_after_tax + at.deposit_held,
    }
}
