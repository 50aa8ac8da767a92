use tracing::*;

use crate::config::{BIG_UBER, BIG_DRIVER, SMALL_TRIP};
use crate::data::*;
use super::Pair;

/// Tier weights of the scalarised objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub uber: f64,
    pub driver: f64,
    pub trip: f64,
}

impl Default for Weights {
    fn default() -> Self { Weights::reference() }
}

/// Largest values the two lower tiers can take for a given instance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveBounds {
    pub drivers: usize,
    /// Every driver has at most one pair, so this is `drivers * (longest pair)`.
    pub max_travel_total: Time,
}

impl ObjectiveBounds {
    pub fn of(data: &PickupInstance, pairs: &[Pair]) -> Self {
        let longest = pairs.iter().map(|p| p.travel_time).fold(0.0, f64::max);
        ObjectiveBounds {
            drivers: data.drivers.len(),
            max_travel_total: longest * data.drivers.len() as f64,
        }
    }
}

/// Smallest power of ten strictly greater than `x`.
fn power_of_ten_above(x: f64) -> f64 {
    let mut p = 1.0;
    while p <= x {
        p *= 10.0;
    }
    p
}

impl Weights {
    pub fn reference() -> Self {
        Weights { uber: BIG_UBER, driver: BIG_DRIVER, trip: SMALL_TRIP }
    }

    #[inline]
    pub fn objective_value(&self, uber: f64, drivers: f64, travel: Time) -> f64 {
        self.uber * uber + self.driver * drivers + self.trip * travel
    }

    /// One more driver must cost more than any travel saving, and one more student on the ride
    /// service more than any combination of driver and travel savings.
    pub fn is_dominant(&self, bounds: &ObjectiveBounds) -> bool {
        let travel = self.trip * bounds.max_travel_total;
        self.driver > travel && self.uber > self.driver * bounds.drivers as f64 + travel
    }

    /// Raise the upper tiers to the next power of ten above their bound where they are not already
    /// dominant.  Lower tiers are never touched.
    pub fn enforce_dominance(self, bounds: &ObjectiveBounds) -> Weights {
        let mut w = self;
        let travel = w.trip * bounds.max_travel_total;
        if w.driver <= travel {
            let driver = power_of_ten_above(travel);
            warn!(old=w.driver, new=driver, max_travel=bounds.max_travel_total, "driver weight raised above the travel tier");
            w.driver = driver;
        }
        let lower = w.driver * bounds.drivers as f64 + travel;
        if w.uber <= lower {
            let uber = power_of_ten_above(lower);
            warn!(old=w.uber, new=uber, drivers=bounds.drivers, "ride-service weight raised above the driver tier");
            w.uber = uber;
        }
        debug_assert!(w.is_dominant(bounds));
        w
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn powers_of_ten() {
        assert_eq!(power_of_ten_above(0.0), 1.0);
        assert_eq!(power_of_ten_above(99.5), 100.0);
        assert_eq!(power_of_ten_above(100.0), 1000.0);
    }

    #[test]
    fn reference_weights_can_fail_dominance() {
        // a single 10-minute pair already costs as much as a driver
        let bounds = ObjectiveBounds { drivers: 1, max_travel_total: 10.0 };
        let w = Weights::reference();
        assert!(!w.is_dominant(&bounds));

        let fixed = w.enforce_dominance(&bounds);
        assert!(fixed.is_dominant(&bounds));
        assert_eq!(fixed.trip, w.trip);
        assert_eq!(fixed.driver, 1e6);
        assert_eq!(fixed.uber, w.uber);
    }

    #[test]
    fn dominant_weights_unchanged() {
        let bounds = ObjectiveBounds { drivers: 3, max_travel_total: 6.0 };
        let w = Weights::reference();
        assert!(w.is_dominant(&bounds));
        assert_eq!(w.enforce_dominance(&bounds), w);
    }

    proptest! {
        /// With enforced weights, one fewer ride-service student always wins, whatever happens to
        /// the lower tiers within their bounds; likewise one fewer driver against travel.
        #[test]
        fn lexicographic_dominance(
            drivers in 0usize..60,
            longest in 0.0f64..500.0,
            used_a in 0usize..60, used_b in 0usize..60,
            travel_a in 0.0f64..1.0, travel_b in 0.0f64..1.0,
            uber in 0u32..50,
        ) {
            let bounds = ObjectiveBounds { drivers, max_travel_total: longest * drivers as f64 };
            let w = Weights::reference().enforce_dominance(&bounds);
            prop_assert!(w.is_dominant(&bounds));

            let used_a = used_a.min(drivers) as f64;
            let used_b = used_b.min(drivers) as f64;
            let travel_a = travel_a * bounds.max_travel_total;
            let travel_b = travel_b * bounds.max_travel_total;

            let a = w.objective_value(uber as f64, used_a, travel_a);
            let b = w.objective_value(uber as f64 + 1.0, used_b, travel_b);
            prop_assert!(a < b);

            if drivers > 0 && used_a >= 1.0 {
                let fewer = w.objective_value(0.0, used_a - 1.0, travel_a);
                let more = w.objective_value(0.0, used_a, travel_b);
                prop_assert!(fewer < more);
            }
        }
    }
}
