//! Versioned federal tax constants.
//!
//! Every amount that legislation can move lives here rather than in the
//! simulation code, so a new schedule is a new `TaxRules` value (or JSON file).

use serde::{Deserialize, Serialize};

use super::error::{SimResult, SimulationError};
use super::types::FilingStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRules {
    pub version: String,
    /// Year the base amounts below are quoted in.
    pub base_year: i32,

    pub standard_deduction_single: f64,
    pub standard_deduction_married: f64,
    pub standard_deduction_growth: f64,

    pub salt_cap_base: f64,
    pub salt_cap_growth: f64,
    /// First tax year the temporary cap no longer applies.
    pub salt_cap_reversion_year: i32,
    pub salt_cap_after_reversion: f64,
    pub salt_phase_out_magi: f64,
    pub salt_phase_out_reduction: f64,
    pub salt_phase_out_floor: f64,

    pub mortgage_interest_debt_limit: f64,

    pub pmi_deductible_from_year: i32,
    pub pmi_phase_out_agi_start: f64,
    pub pmi_phase_out_agi_end: f64,

    pub home_sale_exclusion_single: f64,
    pub home_sale_exclusion_married: f64,
    pub home_sale_min_ownership_years: u32,
}

impl Default for TaxRules {
    fn default() -> Self {
        Self::obbba_2025()
    }
}

impl TaxRules {
    /// TCJA limits as amended in July 2025.
    pub fn obbba_2025() -> Self {
        Self {
            version: "obbba-2025".to_string(),
            base_year: 2025,
            standard_deduction_single: 15_750.0,
            standard_deduction_married: 31_500.0,
            standard_deduction_growth: 0.02,
            salt_cap_base: 40_000.0,
            salt_cap_growth: 0.01,
            salt_cap_reversion_year: 2030,
            salt_cap_after_reversion: 10_000.0,
            salt_phase_out_magi: 500_000.0,
            salt_phase_out_reduction: 0.30,
            salt_phase_out_floor: 10_000.0,
            mortgage_interest_debt_limit: 750_000.0,
            pmi_deductible_from_year: 2026,
            pmi_phase_out_agi_start: 100_000.0,
            pmi_phase_out_agi_end: 110_000.0,
            home_sale_exclusion_single: 250_000.0,
            home_sale_exclusion_married: 500_000.0,
            home_sale_min_ownership_years: 2,
        }
    }

    /// Amounts must be finite and non-negative; shares must lie in [0, 1].
    pub fn validate(&self) -> SimResult<()> {
        for (field, value) in [
            ("standard_deduction_single", self.standard_deduction_single),
            ("standard_deduction_married", self.standard_deduction_married),
            ("salt_cap_base", self.salt_cap_base),
            ("salt_cap_after_reversion", self.salt_cap_after_reversion),
            ("salt_phase_out_magi", self.salt_phase_out_magi),
            ("salt_phase_out_floor", self.salt_phase_out_floor),
            ("mortgage_interest_debt_limit", self.mortgage_interest_debt_limit),
            ("pmi_phase_out_agi_start", self.pmi_phase_out_agi_start),
            ("pmi_phase_out_agi_end", self.pmi_phase_out_agi_end),
            ("home_sale_exclusion_single", self.home_sale_exclusion_single),
            ("home_sale_exclusion_married", self.home_sale_exclusion_married),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SimulationError::invalid(field, "must be a finite value >= 0"));
            }
        }

        for (field, value) in [
            ("standard_deduction_growth", self.standard_deduction_growth),
            ("salt_cap_growth", self.salt_cap_growth),
        ] {
            if !value.is_finite() || value <= -1.0 {
                return Err(SimulationError::invalid(field, "must be a finite rate above -1"));
            }
        }

        if !(0.0..=1.0).contains(&self.salt_phase_out_reduction) {
            return Err(SimulationError::invalid(
                "salt_phase_out_reduction",
                "must be between 0 and 1",
            ));
        }

        if self.pmi_phase_out_agi_end < self.pmi_phase_out_agi_start {
            return Err(SimulationError::invalid(
                "pmi_phase_out_agi_end",
                "must not be below pmi_phase_out_agi_start",
            ));
        }

        Ok(())
    }

    fn years_since_base(&self, year: i32) -> i32 {
        (year - self.base_year).max(0)
    }

    pub fn standard_deduction(&self, year: i32, filing_status: FilingStatus) -> f64 {
        let base = match filing_status {
            FilingStatus::Single => self.standard_deduction_single,
            FilingStatus::Married => self.standard_deduction_married,
        };
        base * (1.0 + self.standard_deduction_growth).powi(self.years_since_base(year))
    }

    pub fn salt_cap(&self, year: i32, magi: f64) -> f64 {
        let mut cap = if year >= self.salt_cap_reversion_year {
            self.salt_cap_after_reversion
        } else {
            self.salt_cap_base * (1.0 + self.salt_cap_growth).powi(self.years_since_base(year))
        };

        if magi > self.salt_phase_out_magi {
            cap = (cap * (1.0 - self.salt_phase_out_reduction)).max(self.salt_phase_out_floor);
        }
        cap
    }

    /// Share of interest deductible when acquisition debt exceeds the limit.
    pub fn mortgage_interest_fraction(&self, original_loan_amount: f64) -> f64 {
        if original_loan_amount <= 0.0 {
            return 0.0;
        }
        (self.mortgage_interest_debt_limit / original_loan_amount).min(1.0)
    }

    pub fn pmi_deductible_fraction(&self, year: i32, agi: f64) -> f64 {
        if year < self.pmi_deductible_from_year {
            return 0.0;
        }
        if agi <= self.pmi_phase_out_agi_start {
            return 1.0;
        }
        if agi >= self.pmi_phase_out_agi_end {
            return 0.0;
        }
        let span = self.pmi_phase_out_agi_end - self.pmi_phase_out_agi_start;
        1.0 - (agi - self.pmi_phase_out_agi_start) / span
    }

    pub fn home_sale_exclusion(&self, filing_status: FilingStatus, years_owned: u32) -> f64 {
        if years_owned < self.home_sale_min_ownership_years {
            return 0.0;
        }
        match filing_status {
            FilingStatus::Single => self.home_sale_exclusion_single,
            FilingStatus::Married => self.home_sale_exclusion_married,
        }
    }
}
