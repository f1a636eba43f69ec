use crate::error::SolverError;

/// A linear program over non-negative continuous variables
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Variable names, in column order
    pub variables: Vec<String>,
    /// Objective function
    pub objective: Objective,
    /// Constraint rows, in declaration order
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// One coefficient per column
    pub coefficients: Vec<f64>,
    /// Product-mix problems maximize; this stays false for them
    pub minimize: bool,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Row key, e.g. `assembly_capacity`; shadow prices are reported under it
    pub name: String,
    pub coefficients: Vec<f64>,
    pub op: ConstraintOp,
    /// Capacity or demand limit
    pub rhs: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// `lhs <= rhs`
    Le,
    /// `lhs >= rhs`
    Ge,
    Eq,
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: Objective {
                coefficients: vec![0.0; n],
                minimize: false,
            },
            constraints: Vec::new(),
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>, minimize: bool) {
        self.objective = Objective { coefficients, minimize };
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, op: ConstraintOp, rhs: f64) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraint(&self, name: &str) -> Option<&Constraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Check that every row has one finite coefficient per variable
    pub fn validate(&self) -> Result<(), SolverError> {
        let n = self.num_variables();
        if self.objective.coefficients.len() != n {
            return Err(SolverError::InvalidProblem(format!(
                "objective has {} coefficients for {} variables",
                self.objective.coefficients.len(),
                n
            )));
        }
        if self.objective.coefficients.iter().any(|c| !c.is_finite()) {
            return Err(SolverError::InvalidProblem("objective has a non-finite coefficient".to_string()));
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint {} has {} coefficients for {} variables",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            if !c.rhs.is_finite() || c.coefficients.iter().any(|v| !v.is_finite()) {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint {} has a non-finite value",
                    c.name
                )));
            }
        }
        Ok(())
    }
}

impl Constraint {
    /// Left-hand side value for the given variable values
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.coefficients
            .iter()
            .zip(values)
            .map(|(coef, value)| coef * value)
            .sum()
    }

    /// Distance to the bound in the feasible direction
    pub fn slack(&self, values: &[f64]) -> f64 {
        let lhs = self.activity(values);
        match self.op {
            ConstraintOp::Le | ConstraintOp::Eq => self.rhs - lhs,
            ConstraintOp::Ge => lhs - self.rhs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_and_slack() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.add_constraint("cap", vec![2.0, 1.0], ConstraintOp::Le, 10.0);
        problem.add_constraint("min", vec![1.0, 1.0], ConstraintOp::Ge, 2.0);

        let values = [3.0, 1.0];
        let cap = problem.constraint("cap").unwrap();
        assert!((cap.activity(&values) - 7.0).abs() < 1e-12);
        assert!((cap.slack(&values) - 3.0).abs() < 1e-12);

        let min = problem.constraint("min").unwrap();
        assert!((min.slack(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_short_row() {
        let mut problem = LpProblem::new(vec!["x".to_string(), "y".to_string()]);
        problem.set_objective(vec![1.0, 1.0], false);
        problem.add_constraint("short", vec![1.0], ConstraintOp::Le, 4.0);

        let err = problem.validate().unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
        assert!(err.to_string().contains("short"));
    }

    #[test]
    fn test_validate_rejects_nan() {
        let mut problem = LpProblem::new(vec!["x".to_string()]);
        problem.set_objective(vec![f64::NAN], false);

        assert!(matches!(problem.validate(), Err(SolverError::InvalidProblem(_))));
    }
}
