use std::fmt;
use std::str::FromStr;
use good_lp::{Expression, ResolutionError};
use tracing::*;

use crate::config::{SOLVER_TIME_LIMIT, SOLVER_VERBOSE};
use crate::data::*;
use crate::model::{AssignmentModel, ObjectiveBounds, Pair, SolvedValues, Tier, Weights};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveStatus {
    Optimal,
    /// Stopped on a limit with an incumbent that is not proven optimal.
    Feasible,
    Infeasible,
    NotSolved,
}

impl SolveStatus {
    /// Whether the values came from the solver rather than being zero-filled.
    #[inline]
    pub fn has_solution(&self) -> bool {
        matches!(self, SolveStatus::Optimal | SolveStatus::Feasible)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolveStatus::Optimal => "Optimal",
            SolveStatus::Feasible => "Integer Feasible",
            SolveStatus::Infeasible => "Infeasible",
            SolveStatus::NotSolved => "Not Solved",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the three tiers are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveMode {
    /// One solve of the weighted sum, weights checked for dominance first.
    Weighted,
    /// One solve per tier, each later tier restricted to the optimum of the earlier ones.
    Staged,
}

pub const OBJECTIVE_MODE_STRINGS: [&str; 2] = ["weighted", "staged"];

impl FromStr for ObjectiveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "weighted" => Ok(Self::Weighted),
            "staged" => Ok(Self::Staged),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

impl Default for ObjectiveMode {
    fn default() -> Self { ObjectiveMode::Weighted }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Seconds per solver call.
    pub time_limit: f64,
    pub verbose: bool,
    pub weights: Weights,
    pub mode: ObjectiveMode,
}

impl Default for SolverOptions {
    fn default() -> Self {
        SolverOptions {
            time_limit: SOLVER_TIME_LIMIT,
            verbose: SOLVER_VERBOSE,
            weights: Weights::reference(),
            mode: ObjectiveMode::default(),
        }
    }
}

/// Terminal status and variable values of a run, plus the pair list the values refer to.
#[derive(Debug, Clone, PartialEq)]
pub struct Solved {
    pub status: SolveStatus,
    pub pairs: Vec<Pair>,
    pub values: SolvedValues,
    /// Weights actually used, in weighted mode.
    pub weights: Option<Weights>,
}

impl Solved {
    #[inline]
    pub fn tier_total(&self, tier: Tier) -> f64 {
        self.values.tier_total(&self.pairs, tier)
    }
}

mod backend {
    use super::*;
    use good_lp::{Constraint, ProblemVariables, Solution, SolverModel};
    use good_lp::solvers::{SolutionStatus, WithTimeLimit};
    use crate::model::VarLayout;

    type Outcome = Result<(SolveStatus, SolvedValues), ResolutionError>;

    fn finish<M>(mut problem: M, constraints: Vec<Constraint>, layout: &VarLayout) -> Outcome
        where M: SolverModel<Error=ResolutionError>
    {
        for c in constraints {
            problem = problem.with(c);
        }
        let solution = problem.solve()?;
        let status = match solution.status() {
            SolutionStatus::Optimal => SolveStatus::Optimal,
            SolutionStatus::TimeLimit | SolutionStatus::GapLimit => SolveStatus::Feasible,
        };
        Ok((status, layout.read(|v| solution.value(v))))
    }

    #[cfg(feature = "coin_cbc")]
    pub(super) fn solve(vars: ProblemVariables, objective: Expression, constraints: Vec<Constraint>, layout: &VarLayout, options: &SolverOptions) -> Outcome {
        let mut problem = vars.minimise(objective).using(good_lp::solvers::coin_cbc::coin_cbc);
        problem.set_parameter("log", if options.verbose { "1" } else { "0" });
        let problem = problem.with_time_limit(options.time_limit);
        finish(problem, constraints, layout)
    }

    #[cfg(all(feature = "highs", not(feature = "coin_cbc")))]
    pub(super) fn solve(vars: ProblemVariables, objective: Expression, constraints: Vec<Constraint>, layout: &VarLayout, options: &SolverOptions) -> Outcome {
        let problem = vars.minimise(objective)
            .using(good_lp::solvers::highs::highs)
            .set_verbose(options.verbose)
            .with_time_limit(options.time_limit);
        finish(problem, constraints, layout)
    }

    #[cfg(not(any(feature = "coin_cbc", feature = "highs")))]
    pub(super) fn solve(vars: ProblemVariables, objective: Expression, constraints: Vec<Constraint>, layout: &VarLayout, options: &SolverOptions) -> Outcome {
        // microlp writes no log of its own
        debug!(verbose=options.verbose, "microlp backend");
        let problem = vars.minimise(objective)
            .using(good_lp::solvers::microlp::microlp)
            .with_time_limit(options.time_limit);
        finish(problem, constraints, layout)
    }
}

/// Hand one model to the backend.  Whatever comes back is final: failures are logged, and the
/// values are then all zero.
#[instrument(level="info", skip_all, fields(time_limit=options.time_limit))]
pub fn solve(model: AssignmentModel<'_>, objective: Expression, options: &SolverOptions) -> Solved {
    let (vars, constraints, layout, pairs) = model.into_parts();
    let (status, values) = match backend::solve(vars, objective, constraints, &layout, options) {
        Ok(outcome) => outcome,
        Err(ResolutionError::Infeasible) => (SolveStatus::Infeasible, layout.zeros()),
        // includes running out of time before any incumbent was found
        Err(e) => {
            warn!(error=%e, "solver failed");
            (SolveStatus::NotSolved, layout.zeros())
        }
    };
    if status == SolveStatus::Optimal {
        info!(%status, "solved");
    } else {
        warn!(%status, "no proven optimum, continuing with best-effort values");
    }
    Solved { status, pairs, values, weights: None }
}

/// Build and solve in the configured [`ObjectiveMode`].
#[instrument(level="info", skip_all, fields(id=%data.id, mode=?options.mode))]
pub fn optimize(data: &PickupInstance, options: &SolverOptions) -> Solved {
    if data.locations.is_empty() {
        info!("no students to assign");
        let (_, _, layout, pairs) = AssignmentModel::build(data).into_parts();
        return Solved { status: SolveStatus::Optimal, pairs, values: layout.zeros(), weights: None };
    }

    match options.mode {
        ObjectiveMode::Weighted => {
            let model = AssignmentModel::build(data);
            let weights = options.weights.enforce_dominance(&ObjectiveBounds::of(data, &model.pairs));
            debug!(?weights);
            let objective = model.weighted_objective(&weights);
            let mut solved = solve(model, objective, options);
            solved.weights = Some(weights);
            solved
        }
        ObjectiveMode::Staged => staged(data, options),
    }
}

/// Round a count-valued objective to the integer the solver meant.
fn round_count_objective(value: f64) -> f64 {
    (value + 0.5).floor()
}

fn staged(data: &PickupInstance, options: &SolverOptions) -> Solved {
    let mut bounds: Vec<(Tier, f64)> = Vec::with_capacity(Tier::ALL.len());
    let mut best: Option<Solved> = None;

    for &tier in Tier::ALL.iter() {
        let span = info_span!("stage", ?tier);
        let _g = span.enter();

        let mut model = AssignmentModel::build(data);
        for &(t, v) in &bounds {
            model.bound_tier(t, v);
        }
        let objective = model.tier_expr(tier);
        let solved = solve(model, objective, options);

        if !solved.status.has_solution() {
            warn!(status=%solved.status, "stage failed, keeping the previous stage's values");
            return best.unwrap_or(solved);
        }

        let value = solved.tier_total(tier);
        debug!(value, "stage optimum");
        bounds.push((tier, match tier {
            Tier::Travel => value,
            _ => round_count_objective(value),
        }));

        // a stage that stopped early taints everything after it
        let status = match &best {
            Some(prev) if prev.status == SolveStatus::Feasible => SolveStatus::Feasible,
            _ => solved.status,
        };
        best = Some(Solved { status, ..solved });
    }

    // Tier::ALL is non-empty, so at least one stage ran
    best.unwrap_or_else(|| {
        let (_, _, layout, pairs) = AssignmentModel::build(data).into_parts();
        Solved { status: SolveStatus::NotSolved, pairs, values: layout.zeros(), weights: None }
    })
}
