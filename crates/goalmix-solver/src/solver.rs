use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use good_lp::solvers::microlp::microlp;
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution as LpSolution, SolverModel,
    Variable,
};

use crate::error::SolverError;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ConstraintActivity, ShadowPrice, Solution};

/// Relative slack allowed on rows that pin an optimum while ties are broken
const TIE_MARGIN: f64 = 1e-9;

/// Adapter around the external LP solver (good_lp, microlp simplex backend).
///
/// The solver itself is a black box: this type translates an [`LpProblem`]
/// into the solver's model, maps its verdict onto
/// [`SolutionStatus`](crate::SolutionStatus) and reads back primal values.
/// Shadow prices come from solving the dual program with the same backend.
///
/// Results are basic solutions and do not depend on the scale of the
/// objective. When several are optimal the one with the most of the first
/// variable wins, then the second, and so on. When several dual solutions
/// are optimal the price lands on the earliest declared row that can carry
/// it.
#[derive(Debug, Clone)]
pub struct Solver {
    /// Tolerance for snapping values and classifying binding constraints
    tolerance: f64,
    /// Wall-clock budget for a single solve
    time_limit: Option<Duration>,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            time_limit: None,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Run each solve on a worker thread and give up waiting after `limit`.
    ///
    /// The backend cannot be interrupted: after a timeout the worker keeps
    /// running detached until its solve finishes, and its result is dropped.
    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }

    /// Solve the problem. Non-optimal verdicts come back as a [`Solution`]
    /// with the matching status; an `Err` means no verdict could be reached.
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolverError> {
        problem.validate()?;

        let span = tracing::debug_span!(
            "lp_solve",
            variables = problem.num_variables(),
            constraints = problem.num_constraints()
        );
        let _enter = span.enter();

        let started = Instant::now();
        let solution = match self.time_limit {
            Some(limit) => self.solve_with_deadline(problem, limit)?,
            None => run(problem, self.tolerance),
        };

        tracing::debug!(
            status = ?solution.status,
            objective = solution.objective_value,
            elapsed_us = started.elapsed().as_micros() as u64,
            "solver finished"
        );
        Ok(solution)
    }

    fn solve_with_deadline(&self, problem: &LpProblem, limit: Duration) -> Result<Solution, SolverError> {
        let (tx, rx) = mpsc::channel();
        let worker_problem = problem.clone();
        let tolerance = self.tolerance;

        thread::Builder::new()
            .name("lp-solve".to_string())
            .spawn(move || {
                // The receiver may already be gone after a timeout.
                let _ = tx.send(run(&worker_problem, tolerance));
            })
            .map_err(|e| SolverError::Unavailable(format!("cannot start solve worker: {}", e)))?;

        match rx.recv_timeout(limit) {
            Ok(solution) => Ok(solution),
            Err(RecvTimeoutError::Timeout) => {
                tracing::warn!(limit_ms = limit.as_millis() as u64, "solve timed out");
                Err(SolverError::Timeout(limit))
            }
            Err(RecvTimeoutError::Disconnected) => Err(SolverError::Unavailable(
                "solve worker exited without a result".to_string(),
            )),
        }
    }
}

/// Solve, settle ties, price the rows and read back the analysis
fn run(problem: &LpProblem, tolerance: f64) -> Solution {
    let values = match optimize(problem, &[]) {
        Ok(values) => values,
        Err(ResolutionError::Infeasible) => {
            tracing::warn!("solver reported the problem infeasible");
            return Solution::infeasible("no production plan satisfies every constraint");
        }
        Err(ResolutionError::Unbounded) => {
            tracing::warn!("solver reported the problem unbounded");
            return Solution::unbounded("objective can grow without limit");
        }
        Err(other) => {
            tracing::warn!(error = %other, "solver stopped without a verdict");
            return Solution::not_solved(other.to_string());
        }
    };

    let values: Vec<f64> = prefer_earlier_columns(problem, values)
        .into_iter()
        .map(|value| snap(value, tolerance))
        .collect();
    let objective_value = dot(&problem.objective.coefficients, &values);

    let prices = match dual_prices(problem) {
        Ok(prices) => prices,
        Err(e) => {
            tracing::warn!(error = %e, "dual program failed");
            return Solution::not_solved(format!("cannot price constraints: {}", e));
        }
    };
    let analysis = analyze(problem, &values, &prices, tolerance);

    Solution {
        status: crate::SolutionStatus::Optimal,
        values,
        objective_value,
        analysis,
        message: None,
    }
}

/// Hand `problem` to the backend. Columns flagged in `free` have no lower
/// bound; all others are non-negative.
fn optimize(problem: &LpProblem, free: &[bool]) -> Result<Vec<f64>, ResolutionError> {
    let mut vars = ProblemVariables::new();
    let columns: Vec<Variable> = problem
        .variables
        .iter()
        .enumerate()
        .map(|(j, name)| {
            let definition = variable().name(name.clone());
            if free.get(j).copied().unwrap_or(false) {
                vars.add(definition)
            } else {
                vars.add(definition.min(0.0))
            }
        })
        .collect();

    let objective = linear_expression(&problem.objective.coefficients, &columns);
    let unsolved = if problem.objective.minimize {
        vars.minimise(objective)
    } else {
        vars.maximise(objective)
    };

    let mut model = unsolved.using(microlp);
    for c in &problem.constraints {
        let lhs = linear_expression(&c.coefficients, &columns);
        let rhs = c.rhs;
        model = match c.op {
            ConstraintOp::Le => model.with(constraint!(lhs <= rhs)),
            ConstraintOp::Ge => model.with(constraint!(lhs >= rhs)),
            ConstraintOp::Eq => model.with(constraint!(lhs == rhs)),
        };
    }

    let raw = model.solve()?;
    Ok(columns.iter().map(|&column| raw.value(column)).collect())
}

/// Walk the optimal face: maximize each column in turn while the objective
/// stays at its optimum and earlier columns keep what they got.
fn prefer_earlier_columns(problem: &LpProblem, mut values: Vec<f64>) -> Vec<f64> {
    let n = problem.num_variables();
    let best = dot(&problem.objective.coefficients, &values);

    let mut stage = problem.clone();
    let (op, bound) = if problem.objective.minimize {
        (ConstraintOp::Le, best + margin(best))
    } else {
        (ConstraintOp::Ge, best - margin(best))
    };
    stage.add_constraint("optimum", problem.objective.coefficients.clone(), op, bound);

    for j in 0..n {
        let unit = unit_row(n, j);
        stage.set_objective(unit.clone(), false);
        match optimize(&stage, &[]) {
            Ok(next) => {
                let kept = next[j];
                stage.add_constraint(format!("keep_{}", j), unit, ConstraintOp::Ge, kept - margin(kept));
                values = next;
            }
            Err(e) => {
                tracing::debug!(column = %problem.variables[j], error = %e, "tie-break stopped");
                break;
            }
        }
    }
    values
}

/// Shadow prices: change of the optimal objective per unit increase of each
/// row's right-hand side, read from the dual program.
fn dual_prices(problem: &LpProblem) -> Result<Vec<f64>, ResolutionError> {
    let m = problem.num_constraints();
    if m == 0 {
        return Ok(Vec::new());
    }

    // Work with `max c'x` and rows `s * a x <= s * b`; Ge rows flip sign.
    let sense = if problem.objective.minimize { -1.0 } else { 1.0 };
    let signs: Vec<f64> = problem
        .constraints
        .iter()
        .map(|c| if c.op == ConstraintOp::Ge { -1.0 } else { 1.0 })
        .collect();
    let free: Vec<bool> = problem.constraints.iter().map(|c| c.op == ConstraintOp::Eq).collect();

    let mut dual = LpProblem::new(problem.constraints.iter().map(|c| c.name.clone()).collect());
    let costs: Vec<f64> = problem.constraints.iter().zip(&signs).map(|(c, s)| s * c.rhs).collect();
    dual.set_objective(costs.clone(), true);
    for (j, name) in problem.variables.iter().enumerate() {
        let coefficients = problem
            .constraints
            .iter()
            .zip(&signs)
            .map(|(c, s)| s * c.coefficients[j])
            .collect();
        dual.add_constraint(name.clone(), coefficients, ConstraintOp::Ge, sense * problem.objective.coefficients[j]);
    }

    let mut prices = optimize(&dual, &free)?;
    let best = dot(&costs, &prices);
    dual.add_constraint("optimum", costs, ConstraintOp::Le, best + margin(best));

    // Push value off the latest rows first so it settles on earlier ones.
    for i in (0..m).rev().filter(|&i| !free[i]) {
        let unit = unit_row(m, i);
        dual.set_objective(unit.clone(), true);
        match optimize(&dual, &free) {
            Ok(next) => {
                let kept = next[i];
                dual.add_constraint(format!("keep_{}", i), unit, ConstraintOp::Le, kept + margin(kept));
                prices = next;
            }
            Err(e) => {
                tracing::debug!(row = %problem.constraints[i].name, error = %e, "dual tie-break stopped");
                break;
            }
        }
    }

    Ok(prices.iter().zip(&signs).map(|(u, s)| sense * s * u).collect())
}

fn linear_expression(coefficients: &[f64], columns: &[Variable]) -> Expression {
    let mut expr = Expression::from(0.0);
    for (&coef, &column) in coefficients.iter().zip(columns) {
        if coef != 0.0 {
            expr += coef * column;
        }
    }
    expr
}

fn analyze(problem: &LpProblem, values: &[f64], prices: &[f64], tolerance: f64) -> Analysis {
    let mut shadow_prices = Vec::with_capacity(problem.num_constraints());
    let mut activities = Vec::with_capacity(problem.num_constraints());

    for (constraint, &price) in problem.constraints.iter().zip(prices) {
        let value = snap(price, tolerance);
        let interpretation = if value == 0.0 {
            "Non-binding constraint".to_string()
        } else if value > 0.0 {
            format!("Increasing RHS by 1 unit would increase the objective by {:.4}", value)
        } else {
            format!("Increasing RHS by 1 unit would decrease the objective by {:.4}", -value)
        };
        shadow_prices.push(ShadowPrice {
            constraint: constraint.name.clone(),
            value,
            interpretation,
        });

        activities.push(ConstraintActivity {
            constraint: constraint.name.clone(),
            lhs: constraint.activity(values),
            rhs: constraint.rhs,
            slack: snap(constraint.slack(values), tolerance),
        });
    }

    let binding_constraints = shadow_prices
        .iter()
        .filter(|sp| sp.value != 0.0)
        .map(|sp| sp.constraint.clone())
        .collect();

    Analysis {
        shadow_prices,
        activities,
        binding_constraints,
    }
}

fn dot(coefficients: &[f64], values: &[f64]) -> f64 {
    coefficients.iter().zip(values).map(|(c, v)| c * v).sum()
}

fn unit_row(len: usize, at: usize) -> Vec<f64> {
    let mut row = vec![0.0; len];
    row[at] = 1.0;
    row
}

fn margin(value: f64) -> f64 {
    TIE_MARGIN * value.abs().max(1.0)
}

fn snap(value: f64, tolerance: f64) -> f64 {
    if value.abs() < tolerance { 0.0 } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SolutionStatus;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    /// Gears and shafts through a lathe and a mill; both machines fill up at
    /// 30 gears and 30 shafts.
    fn lathe_and_mill() -> LpProblem {
        let mut problem = LpProblem::new(names(&["gear", "shaft"]));
        problem.set_objective(vec![40.0, 30.0], false);
        problem.add_constraint("lathe", vec![3.0, 1.0], ConstraintOp::Le, 120.0);
        problem.add_constraint("mill", vec![1.0, 2.0], ConstraintOp::Le, 90.0);
        problem.add_constraint("gear_demand", vec![1.0, 0.0], ConstraintOp::Le, 50.0);
        problem
    }

    /// Heat treatment plus a demand cap on the second product. The cap and
    /// the oven both bind at the optimum.
    fn oven_and_cap(profit: [f64; 2]) -> LpProblem {
        let mut problem = LpProblem::new(names(&["product_a", "product_b"]));
        problem.set_objective(profit.to_vec(), false);
        problem.add_constraint("oven", vec![4.0, 2.0], ConstraintOp::Le, 160.0);
        problem.add_constraint("b_demand", vec![0.0, 1.0], ConstraintOp::Le, 80.0);
        problem
    }

    #[test]
    fn test_product_mix() {
        let solution = Solver::new().solve(&lathe_and_mill()).unwrap();

        assert_eq!(solution.status, SolutionStatus::Optimal);
        assert!((solution.values[0] - 30.0).abs() < 1e-6, "gears = {}", solution.values[0]);
        assert!((solution.values[1] - 30.0).abs() < 1e-6, "shafts = {}", solution.values[1]);
        assert!((solution.objective_value - 2100.0).abs() < 1e-4);
    }

    #[test]
    fn test_shadow_prices_and_slack() {
        let solution = Solver::new().solve(&lathe_and_mill()).unwrap();

        assert!((solution.shadow_price("lathe").unwrap() - 10.0).abs() < 1e-6);
        assert!((solution.shadow_price("mill").unwrap() - 10.0).abs() < 1e-6);
        assert_eq!(solution.shadow_price("gear_demand"), Some(0.0));

        assert!((solution.activity("gear_demand").unwrap().slack - 20.0).abs() < 1e-6);
        assert_eq!(solution.activity("lathe").unwrap().slack, 0.0);
        assert_eq!(solution.analysis.binding_constraints, names(&["lathe", "mill"]));
    }

    #[test]
    fn test_cost_minimization_with_output_floor() {
        // Day shift hours cost 12, night hours 18; 50 hours are required and
        // the day shift has 40.
        let mut problem = LpProblem::new(names(&["day", "night"]));
        problem.set_objective(vec![12.0, 18.0], true);
        problem.add_constraint("output", vec![1.0, 1.0], ConstraintOp::Ge, 50.0);
        problem.add_constraint("day_hours", vec![1.0, 0.0], ConstraintOp::Le, 40.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert!((solution.values[0] - 40.0).abs() < 1e-6);
        assert!((solution.values[1] - 10.0).abs() < 1e-6);
        assert!((solution.objective_value - 660.0).abs() < 1e-4);
        // Another required hour is a night hour; another day hour saves 6.
        assert!((solution.shadow_price("output").unwrap() - 18.0).abs() < 1e-6);
        assert!((solution.shadow_price("day_hours").unwrap() + 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_equality_row_price_can_be_negative() {
        // Exactly 30 units must ship; shaft capacity is wasted on them.
        let mut problem = LpProblem::new(names(&["gear", "shaft"]));
        problem.set_objective(vec![5.0, 1.0], false);
        problem.add_constraint("capacity", vec![1.0, 1.0], ConstraintOp::Le, 40.0);
        problem.add_constraint("shafts_shipped", vec![0.0, 1.0], ConstraintOp::Eq, 30.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert!((solution.values[0] - 10.0).abs() < 1e-6);
        assert!((solution.shadow_price("capacity").unwrap() - 5.0).abs() < 1e-6);
        assert!((solution.shadow_price("shafts_shipped").unwrap() + 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_tied_mixes_prefer_the_first_product() {
        // 30/4 = 15/2 per oven hour: every mix on the oven row is optimal.
        for scale in [1.0, 0.5, 3.0, 10.0] {
            let solution = Solver::new().solve(&oven_and_cap([30.0 * scale, 15.0 * scale])).unwrap();

            assert!((solution.values[0] - 40.0).abs() < 1e-6, "x{}: a = {}", scale, solution.values[0]);
            assert_eq!(solution.values[1], 0.0, "x{}", scale);
            assert!((solution.objective_value - 1200.0 * scale).abs() < 1e-4 * scale);
        }
    }

    #[test]
    fn test_degenerate_prices_land_on_the_earlier_row() {
        // At b = 80 the oven and the demand cap both bind; any oven price in
        // [22.5, 30] is optimal.
        let solution = Solver::new().solve(&oven_and_cap([90.0, 60.0])).unwrap();

        assert_eq!(solution.values[0], 0.0);
        assert!((solution.values[1] - 80.0).abs() < 1e-6);
        assert!((solution.shadow_price("oven").unwrap() - 30.0).abs() < 1e-6);
        assert_eq!(solution.shadow_price("b_demand"), Some(0.0));
    }

    #[test]
    fn test_overcommitted_plan_is_infeasible() {
        let mut problem = LpProblem::new(names(&["gear"]));
        problem.set_objective(vec![40.0], false);
        problem.add_constraint("committed", vec![1.0], ConstraintOp::Ge, 50.0);
        problem.add_constraint("lathe", vec![2.0], ConstraintOp::Le, 60.0);

        let solution = Solver::new().solve(&problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Infeasible);
        assert!(solution.values.is_empty());
        assert!(solution.message.is_some());
    }

    #[test]
    fn test_negative_capacity_is_infeasible() {
        let mut problem = LpProblem::new(names(&["x"]));
        problem.set_objective(vec![1.0], false);
        problem.add_constraint("capacity", vec![1.0], ConstraintOp::Le, -1.0);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Infeasible);
    }

    #[test]
    fn test_unconstrained_column_is_unbounded() {
        let mut problem = LpProblem::new(names(&["x"]));
        problem.set_objective(vec![1.0], false);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);
        assert!(!solution.is_optimal());
    }

    #[test]
    fn test_open_direction_is_unbounded() {
        // x - y <= 1 leaves x = y + 1 free to grow.
        let mut problem = LpProblem::new(names(&["x", "y"]));
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("gap", vec![1.0, -1.0], ConstraintOp::Le, 1.0);

        let solution = Solver::new().solve(&problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);
    }

    #[test]
    fn test_time_limit_path_returns_solution() {
        let solver = Solver::new().with_time_limit(Duration::from_secs(30));
        let solution = solver.solve(&lathe_and_mill()).unwrap();

        assert!(solution.is_optimal());
        assert!((solution.objective_value - 2100.0).abs() < 1e-4);
    }

    #[test]
    fn test_time_limit_expires() {
        let n = 120;
        let mut problem = LpProblem::new((0..n).map(|j| format!("p{}", j)).collect());
        problem.set_objective((0..n).map(|j| 1.0 + (j % 5) as f64).collect(), false);
        for i in 0..n {
            let row = (0..n).map(|j| 1.0 + ((i * j) % 7) as f64).collect();
            problem.add_constraint(format!("wc{}", i), row, ConstraintOp::Le, 100.0 + i as f64);
        }

        let limit = Duration::from_nanos(1);
        let err = Solver::new().with_time_limit(limit).solve(&problem).unwrap_err();
        assert_eq!(err, SolverError::Timeout(limit));
    }

    #[test]
    fn test_malformed_problem_is_rejected_before_solving() {
        let mut problem = lathe_and_mill();
        problem.constraints[0].coefficients.pop();

        let err = Solver::new().solve(&problem).unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }
}
