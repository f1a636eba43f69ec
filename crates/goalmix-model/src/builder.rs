use goalmix_solver::{ConstraintOp, LpProblem};

use crate::error::ModelError;
use crate::model::{Product, ProductionModel, WorkCenter};

/// Name of the capacity row of a work center
pub fn capacity_constraint(work_center: &WorkCenter) -> String {
    format!("{}_capacity", work_center.name)
}

/// Name of the demand row of a product
pub fn demand_constraint(product: &Product) -> String {
    format!("{}_demand", product.name)
}

/// Translate a validated production model into a linear program:
/// maximize total throughput, one capacity row per work center followed by
/// one demand row per product.
pub fn build_problem(model: &ProductionModel) -> Result<LpProblem, ModelError> {
    model.validate()?;

    let names = model.products.iter().map(|p| p.name.clone()).collect();
    let mut problem = LpProblem::new(names);
    problem.set_objective(model.products.iter().map(|p| p.profit).collect(), false);

    for wc in &model.work_centers {
        let coefficients = model
            .products
            .iter()
            .map(|p| model.processing_time(wc, p))
            .collect::<Result<Vec<_>, _>>()?;
        problem.add_constraint(capacity_constraint(wc), coefficients, ConstraintOp::Le, wc.capacity);
    }

    for (i, product) in model.products.iter().enumerate() {
        let mut coefficients = vec![0.0; model.products.len()];
        coefficients[i] = 1.0;
        problem.add_constraint(demand_constraint(product), coefficients, ConstraintOp::Le, product.demand);
    }

    tracing::debug!(
        model = %model.name,
        variables = problem.num_variables(),
        constraints = problem.num_constraints(),
        "built production model"
    );
    Ok(problem)
}
