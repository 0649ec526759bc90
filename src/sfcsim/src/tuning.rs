//! Per-demand VNF capacity tuning.
//!
//! The tuner drives a VNF's working capacity until the demand magnitude
//! sits inside the target utilization band. The running capacity is held
//! by the orchestrator and threaded through every demand, so later demands
//! are tuned relative to whatever the previous demand left behind.

use log::debug;

use crate::Capacity;

/// Lower edge of the utilization band: shrink while demand < 0.2 * capacity.
pub const LOWER_UTIL: f64 = 0.2;
/// Upper edge of the utilization band: grow while demand > 0.8 * capacity.
pub const UPPER_UTIL: f64 = 0.8;

/// Returns the adjusted capacity for one VNF given the current demand.
///
/// Shrinks by halving, then grows by 50% steps; the two loops are mutually
/// exclusive per step, so for positive inputs the result is reached in
/// finitely many steps and satisfies
/// `LOWER_UTIL * c' <= demand <= UPPER_UTIL * c'`.
///
/// Callers must reject non-positive demands at ingestion; a demand of zero
/// would drive the shrink loop forever.
pub fn tuned_capacity(capacity: Capacity, demand: f64) -> Capacity {
    debug_assert!(capacity > 0.0, "working capacity must stay positive");
    debug_assert!(demand > 0.0, "demand magnitudes must be positive");

    let mut c = capacity;
    while demand < LOWER_UTIL * c {
        c *= 0.5;
    }
    while demand > UPPER_UTIL * c {
        c *= 1.5;
    }

    if c != capacity {
        debug!("capacity tuned from {} to {} for demand {}", capacity, c, demand);
    }
    c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shrink_lands_in_band() {
        // 0.2 * 10000 = 2000 > 1500 triggers exactly one halving
        assert_eq!(tuned_capacity(10000.0, 1500.0), 5000.0);
    }

    #[test]
    fn grow_lands_in_band() {
        // 1000 -> 1500 -> 2250 -> 3375 -> 5062.5 -> 7593.75
        let c = tuned_capacity(1000.0, 5000.0);
        assert_eq!(c, 7593.75);
        assert!(LOWER_UTIL * c <= 5000.0 && 5000.0 <= UPPER_UTIL * c);
    }

    #[test]
    fn in_band_capacity_is_untouched() {
        assert_eq!(tuned_capacity(1000.0, 500.0), 1000.0);
    }

    #[test]
    fn band_property_holds() {
        for &c in &[1.0, 100.0, 8000.0, 12345.6] {
            for &d in &[0.5, 42.0, 777.0, 9000.0, 1e6] {
                let t = tuned_capacity(c, d);
                assert!(
                    LOWER_UTIL * t <= d && d <= UPPER_UTIL * t,
                    "capacity {} for demand {} escaped the band (from {})",
                    t,
                    d,
                    c
                );
            }
        }
    }
}
