use good_lp::{variable, Constraint, Expression, ProblemVariables, Variable};
use itertools::Itertools;
use tracing::*;

use crate::config::MAX_STOPS;
use crate::data::*;

mod weights;
pub use weights::{Weights, ObjectiveBounds};

/// Two locations a single driver may visit in one trip, `first < second`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pair {
    pub first: Loc,
    pub second: Loc,
    pub travel_time: Time,
}

impl Pair {
    #[inline]
    pub fn contains(&self, i: Loc) -> bool {
        self.first == i || self.second == i
    }
}

/// Unordered location pairs that get a pairing variable: neither end isolated, and a travel time
/// resolvable in at least one direction.  The time charged is the `first -> second` lookup.
pub fn eligible_pairs(data: &PickupInstance) -> Vec<Pair> {
    data.locs()
        .tuple_combinations()
        .filter(|&(i, k)| !data.is_isolated(i) && !data.is_isolated(k))
        .filter_map(|(i, k)| data.travel_time(i, k).map(|t| Pair { first: i, second: k, travel_time: t }))
        .collect()
}

/// The three cost tiers, highest priority first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    /// Students sent to the ride service.
    Uber,
    /// Drivers with at least one stop.
    Drivers,
    /// Travel time between the two stops of each driver.
    Travel,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Uber, Tier::Drivers, Tier::Travel];
}

/// Decision variables, indexed `[driver][location]`, `[driver][pair]` or by the single index.
#[derive(Debug, Clone)]
pub struct VarLayout {
    pub visit: Vec<Vec<Variable>>,
    pub pickup: Vec<Vec<Variable>>,
    pub used: Vec<Variable>,
    pub pair: Vec<Vec<Variable>>,
    pub uber: Vec<Variable>,
}

/// Values of the decision variables after a solve, with the same shape as [`VarLayout`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolvedValues {
    pub visit: Vec<Vec<f64>>,
    pub pickup: Vec<Vec<f64>>,
    pub used: Vec<f64>,
    pub pair: Vec<Vec<f64>>,
    pub uber: Vec<f64>,
}

impl SolvedValues {
    /// Raw (unrounded) value of a tier's sum.
    pub fn tier_total(&self, pairs: &[Pair], tier: Tier) -> f64 {
        match tier {
            Tier::Uber => self.uber.iter().sum(),
            Tier::Drivers => self.used.iter().sum(),
            Tier::Travel => self.pair.iter()
                .flat_map(|row| pairs.iter().zip(row).map(|(p, &w)| p.travel_time * w))
                .fold(0.0, |acc, t| acc + t),
        }
    }
}

impl VarLayout {
    pub fn read(&self, value: impl Fn(Variable) -> f64) -> SolvedValues {
        let grid = |vs: &Vec<Vec<Variable>>| vs.iter().map(|row| row.iter().map(|&v| value(v)).collect()).collect();
        SolvedValues {
            visit: grid(&self.visit),
            pickup: grid(&self.pickup),
            used: self.used.iter().map(|&v| value(v)).collect(),
            pair: grid(&self.pair),
            uber: self.uber.iter().map(|&v| value(v)).collect(),
        }
    }

    /// What the extractor sees when the solver returned nothing.
    pub fn zeros(&self) -> SolvedValues {
        self.read(|_| 0.0)
    }

    pub fn num_vars(&self) -> usize {
        let n = |vs: &Vec<Vec<Variable>>| vs.iter().map(Vec::len).sum::<usize>();
        n(&self.visit) + n(&self.pickup) + self.used.len() + n(&self.pair) + self.uber.len()
    }

    pub fn tier_expr(&self, pairs: &[Pair], tier: Tier) -> Expression {
        let mut expr = Expression::default();
        match tier {
            Tier::Uber => {
                for &u in &self.uber {
                    expr.add_mul(1.0, u);
                }
            }
            Tier::Drivers => {
                for &u in &self.used {
                    expr.add_mul(1.0, u);
                }
            }
            Tier::Travel => {
                for row in &self.pair {
                    for (p, &w) in pairs.iter().zip(row) {
                        expr.add_mul(p.travel_time, w);
                    }
                }
            }
        }
        expr
    }
}

/// The integer program: variables plus constraints, objective chosen at solve time.
pub struct AssignmentModel<'a> {
    pub data: &'a PickupInstance,
    pub pairs: Vec<Pair>,
    pub layout: VarLayout,
    vars: ProblemVariables,
    constraints: Vec<Constraint>,
}

impl<'a> AssignmentModel<'a> {
    #[instrument(level="info", name="build_model", skip(data), fields(id=%data.id))]
    pub fn build(data: &'a PickupInstance) -> Self {
        let pairs = eligible_pairs(data);
        let mut vars = ProblemVariables::new();

        let visit = data.vehicles()
            .map(|j| data.locs().map(|i| vars.add(variable().binary().name(format!("visit_{}_{}", j, i)))).collect_vec())
            .collect_vec();
        let pickup = data.vehicles()
            .map(|j| data.locs().map(|i| vars.add(variable().integer().min(0.0).name(format!("pickup_{}_{}", j, i)))).collect_vec())
            .collect_vec();
        let used = data.vehicles()
            .map(|j| vars.add(variable().binary().name(format!("used_{}", j))))
            .collect_vec();
        let pair = data.vehicles()
            .map(|j| pairs.iter().map(|p| vars.add(variable().binary().name(format!("pair_{}_{}_{}", j, p.first, p.second)))).collect_vec())
            .collect_vec();
        let uber = data.locs()
            .map(|i| vars.add(variable().integer().min(0.0).name(format!("uber_{}", i))))
            .collect_vec();

        let layout = VarLayout { visit, pickup, used, pair, uber };
        let constraints = Self::constraints(data, &pairs, &layout);

        debug!(pairs=pairs.len(), vars=layout.num_vars(), constraints=constraints.len(), "model built");
        AssignmentModel { data, pairs, layout, vars, constraints }
    }

    fn constraints(data: &PickupInstance, pairs: &[Pair], layout: &VarLayout) -> Vec<Constraint> {
        let VarLayout { visit, pickup, used, pair, uber } = layout;
        let mut constraints = Vec::new();
        let max_stops = MAX_STOPS as f64;

        for (j, driver) in data.drivers.iter().enumerate() {
            let cap = driver.capacity as f64;

            // pickup only where the driver stops
            for i in data.locs() {
                let mut e = Expression::default();
                e.add_mul(1.0, pickup[j][i]);
                e.add_mul(-cap, visit[j][i]);
                constraints.push(e.leq(0.0));
            }

            // total load within capacity, and any load means the driver is used
            let mut load = Expression::default();
            for i in data.locs() {
                load.add_mul(1.0, pickup[j][i]);
            }
            load.add_mul(-cap, used[j]);
            constraints.push(load.leq(0.0));

            // any stop means the driver is used
            let mut stops = Expression::default();
            for i in data.locs() {
                stops.add_mul(1.0, visit[j][i]);
            }
            stops.add_mul(-max_stops, used[j]);
            constraints.push(stops.leq(0.0));

            // ... and a used driver has at least one stop
            let mut idle = Expression::default();
            idle.add_mul(1.0, used[j]);
            for i in data.locs() {
                idle.add_mul(-1.0, visit[j][i]);
            }
            constraints.push(idle.leq(0.0));

            let mut stops = Expression::default();
            for i in data.locs() {
                stops.add_mul(1.0, visit[j][i]);
            }
            constraints.push(stops.leq(max_stops));

            // pair[j,p] = visit[j,i] AND visit[j,k]
            for (p, &w) in pairs.iter().zip(&pair[j]) {
                let (vi, vk) = (visit[j][p.first], visit[j][p.second]);

                let mut e = Expression::default();
                e.add_mul(1.0, w);
                e.add_mul(-1.0, vi);
                constraints.push(e.leq(0.0));

                let mut e = Expression::default();
                e.add_mul(1.0, w);
                e.add_mul(-1.0, vk);
                constraints.push(e.leq(0.0));

                let mut e = Expression::default();
                e.add_mul(1.0, vi);
                e.add_mul(1.0, vk);
                e.add_mul(-1.0, w);
                constraints.push(e.leq(1.0));
            }
        }

        // every student is picked up by a driver or sent to the ride service
        for i in data.locs() {
            let mut cover = Expression::default();
            for j in data.vehicles() {
                cover.add_mul(1.0, pickup[j][i]);
            }
            cover.add_mul(1.0, uber[i]);
            constraints.push(cover.eq(data.demand[i] as f64));
        }

        constraints
    }

    pub fn tier_expr(&self, tier: Tier) -> Expression {
        self.layout.tier_expr(&self.pairs, tier)
    }

    pub fn weighted_objective(&self, weights: &Weights) -> Expression {
        let mut objective = Expression::default();
        objective.add_mul(weights.uber, self.tier_expr(Tier::Uber));
        objective.add_mul(weights.driver, self.tier_expr(Tier::Drivers));
        objective.add_mul(weights.trip, self.tier_expr(Tier::Travel));
        objective
    }

    /// Restrict a tier to at most `value`, for staged solving once the tier has been optimised.
    pub fn bound_tier(&mut self, tier: Tier, value: f64) {
        const EPS: f64 = 1e-6;
        let expr = self.tier_expr(tier);
        trace!(?tier, value, "tier bounded");
        self.constraints.push(expr.leq(value + EPS));
    }

    #[inline]
    pub fn num_constraints(&self) -> usize { self.constraints.len() }

    pub fn into_parts(self) -> (ProblemVariables, Vec<Constraint>, VarLayout, Vec<Pair>) {
        (self.vars, self.constraints, self.layout, self.pairs)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;

    #[test]
    fn isolated_location_has_no_pairs() {
        let data = fixtures::instance(
            &[("a", 1), ("b", 1), ("c", 1), ("x", 1)],
            &[("d", 4)],
            &[("a", "b", 3.0), ("c", "a", 5.0)],
        );
        let x = data.location_index("x").unwrap();
        assert!(data.is_isolated(x));
        let pairs = eligible_pairs(&data);
        assert!(pairs.iter().all(|p| !p.contains(x)));
        // a-b forward, a-c via reverse lookup; b-c has no value either way
        assert_eq!(pairs, vec![
            Pair { first: 0, second: 1, travel_time: 3.0 },
            Pair { first: 0, second: 2, travel_time: 5.0 },
        ]);
    }

    #[test]
    fn model_dimensions() {
        let data = fixtures::instance(
            &[("a", 3), ("b", 2), ("c", 1)],
            &[("d1", 5), ("d2", 2)],
            &[("a", "b", 10.0)],
        );
        let model = AssignmentModel::build(&data);
        let (k, n, p) = (2, 3, 1);
        assert_eq!(model.pairs.len(), p);
        assert_eq!(model.layout.num_vars(), 2 * k * n + k + k * p + n);
        // per driver: n capacity links, load, usage both ways, stop limit, 3 per pair; plus n cover
        assert_eq!(model.num_constraints(), k * (n + 4 + 3 * p) + n);
    }

    #[test]
    fn zeros_match_layout() {
        let data = fixtures::instance(&[("a", 1), ("b", 1)], &[("d", 1)], &[("a", "b", 1.0)]);
        let model = AssignmentModel::build(&data);
        let zeros = model.layout.zeros();
        assert_eq!(zeros.visit, vec![vec![0.0, 0.0]]);
        assert_eq!(zeros.pair, vec![vec![0.0]]);
        assert_eq!(zeros.uber, vec![0.0, 0.0]);
    }
}
