use std::time::Duration;

use goalmix_solver::{LpProblem, Solution, SolutionStatus, Solver};

use crate::analysis::{analyze, BottleneckRule, PlanResults};
use crate::builder::build_problem;
use crate::error::PlanError;
use crate::model::ProductionModel;
use crate::params::Parameters;

/// Knobs of a single solve
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOptions {
    pub rule: BottleneckRule,
    /// Values within this distance of zero are reported as zero
    pub tolerance: f64,
    /// Wall-clock budget for the solver; None solves on the caller's thread
    pub time_limit: Option<Duration>,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            rule: BottleneckRule::default(),
            tolerance: 1e-6,
            time_limit: None,
        }
    }
}

impl PlanOptions {
    pub fn with_rule(mut self, rule: BottleneckRule) -> Self {
        self.rule = rule;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    fn solver(&self) -> Solver {
        let solver = Solver::new().with_tolerance(self.tolerance);
        match self.time_limit {
            Some(limit) => solver.with_time_limit(limit),
            None => solver,
        }
    }
}

/// Solve the teaching plant for the given slider values.
///
/// Returns the results record together with the linear program that was
/// solved; the latter is for diagnostics only.
pub fn solve(params: &Parameters) -> Result<(PlanResults, LpProblem), PlanError> {
    solve_parameters(params, &PlanOptions::default())
}

pub fn solve_parameters(params: &Parameters, options: &PlanOptions) -> Result<(PlanResults, LpProblem), PlanError> {
    params.validate()?;
    solve_with(&ProductionModel::from(params), options)
}

/// Solve an arbitrary production model
pub fn solve_with(model: &ProductionModel, options: &PlanOptions) -> Result<(PlanResults, LpProblem), PlanError> {
    options.rule.validate()?;
    let problem = build_problem(model)?;
    let solution = accept(options.solver().solve(&problem)?)?;

    let results = analyze(model, &problem, &solution, options.rule);
    tracing::info!(
        model = %results.model,
        throughput = results.total_throughput,
        bottleneck = %results.bottleneck,
        "production plan solved"
    );
    Ok((results, problem))
}

/// Only optimal solutions make a plan
fn accept(solution: Solution) -> Result<Solution, PlanError> {
    match solution.status {
        SolutionStatus::Optimal => Ok(solution),
        SolutionStatus::Infeasible => Err(PlanError::Infeasible),
        SolutionStatus::Unbounded => Err(PlanError::Unbounded),
        SolutionStatus::NotSolved => Err(PlanError::NotSolved(solution.message.unwrap_or_default())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use goalmix_solver::SolverError;

    use crate::analysis::LoadStatus;
    use crate::error::{ModelError, ParameterError};
    use crate::model::{Product, WorkCenter};

    #[test]
    fn test_baseline_produces_only_product_b() {
        let (results, problem) = solve(&Parameters::default()).unwrap();

        assert!(results.product_a().abs() < 1e-4, "A = {}", results.product_a());
        assert!((results.product_b() - 80.0).abs() < 1e-4, "B = {}", results.product_b());
        assert!((results.total_throughput - 4800.0).abs() < 1e-2);
        assert_eq!(results.bottleneck.label(), "Heat Treatment");

        let heat = results.work_center("heat_treatment").unwrap();
        assert!((heat.utilization - 100.0).abs() < 1e-3);
        assert_eq!(heat.status, LoadStatus::AtCapacity);
        assert_eq!(problem.num_constraints(), 5);
    }

    #[test]
    fn test_baseline_shadow_prices() {
        let (results, _) = solve(&Parameters::default()).unwrap();

        // Heat treatment and the product B cap both bind; the price goes to
        // the work center.
        let heat = results.constraint("heat_treatment_capacity").unwrap().shadow_price;
        assert!((heat - 30.0).abs() < 1e-6, "heat dual = {}", heat);
        assert_eq!(results.constraint("product_b_demand").unwrap().shadow_price, 0.0);
        assert_eq!(results.binding_constraints, vec!["heat_treatment_capacity".to_string()]);
        assert_eq!(results.constraint("machining_capacity").unwrap().shadow_price, 0.0);
        assert_eq!(results.constraint("assembly_capacity").unwrap().shadow_price, 0.0);

        let machining = results.work_center("machining").unwrap();
        assert!((machining.slack - 80.0).abs() < 1e-3);
        assert!((machining.utilization - 60.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_range_parameter_is_reported() {
        let params = Parameters {
            heat_treatment_capacity: 500.0,
            ..Parameters::default()
        };
        assert!(matches!(
            solve(&params),
            Err(PlanError::Parameter(ParameterError::OutOfRange { .. }))
        ));
    }

    #[test]
    fn test_missing_coefficient_is_reported() {
        let mut model = ProductionModel::goal_plant(&Parameters::default());
        model.work_centers[1].processing_times.clear();

        assert!(matches!(
            solve_with(&model, &PlanOptions::default()),
            Err(PlanError::Model(ModelError::MissingProcessingTime { .. }))
        ));
    }

    #[test]
    fn test_shadow_price_rule_on_baseline() {
        let options = PlanOptions::default().with_rule(BottleneckRule::ShadowPrice);
        let (results, _) = solve_parameters(&Parameters::default(), &options).unwrap();
        assert_eq!(results.bottleneck.work_center(), Some("heat_treatment"));
    }

    #[test]
    fn test_invalid_threshold_is_rejected_before_solving() {
        for threshold in [f64::NAN, 150.0] {
            let options = PlanOptions::default().with_rule(BottleneckRule::Utilization { threshold });
            assert!(matches!(
                solve_parameters(&Parameters::default(), &options),
                Err(PlanError::Parameter(_))
            ));
        }
    }

    #[test]
    fn test_only_optimal_solutions_are_accepted() {
        assert!(matches!(accept(Solution::infeasible("no plan")), Err(PlanError::Infeasible)));
        assert!(matches!(accept(Solution::unbounded("no limit")), Err(PlanError::Unbounded)));
        assert_eq!(
            accept(Solution::not_solved("numerical trouble")),
            Err(PlanError::NotSolved("numerical trouble".to_string()))
        );

        let mut optimal = Solution::not_solved("");
        optimal.status = SolutionStatus::Optimal;
        optimal.message = None;
        assert!(accept(optimal).is_ok());
    }

    #[test]
    fn test_solver_timeout_surfaces_as_solver_error() {
        let mut model = ProductionModel::new("Wide plant");
        for p in 0..60 {
            model = model.with_product(Product::new(format!("p{}", p), format!("P{}", p), 10.0 + p as f64, 100.0));
        }
        for w in 0..60 {
            let mut wc = WorkCenter::new(format!("wc{}", w), format!("WC{}", w), 500.0);
            for p in 0..60 {
                wc = wc.time(format!("p{}", p), 1.0 + ((w * p) % 7) as f64);
            }
            model = model.with_work_center(wc);
        }

        let limit = Duration::from_nanos(1);
        let options = PlanOptions::default().with_time_limit(limit);
        assert_eq!(
            solve_with(&model, &options).unwrap_err(),
            PlanError::Solver(SolverError::Timeout(limit))
        );
    }

    #[test]
    fn test_time_limited_solve() {
        let options = PlanOptions::default().with_time_limit(Duration::from_secs(30));
        let (results, _) = solve_parameters(&Parameters::default(), &options).unwrap();
        assert!((results.total_throughput - 4800.0).abs() < 1e-2);
    }
}
