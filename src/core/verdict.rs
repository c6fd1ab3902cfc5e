use super::types::{Verdict, YearlySnapshot};

pub fn classify(net_benefit: f64, toss_up_band: f64) -> Verdict {
    if net_benefit.abs() <= toss_up_band {
        Verdict::TossUp
    } else if net_benefit > 0.0 {
        Verdict::Buy
    } else {
        Verdict::Rent
    }
}

/// First year buying is strictly ahead. A later reversal does not revoke it.
pub fn find_break_even_year(snapshots: &[YearlySnapshot]) -> Option<u32> {
    snapshots
        .iter()
        .find(|snapshot| snapshot.net_benefit > 0.0)
        .map(|snapshot| snapshot.year)
}
