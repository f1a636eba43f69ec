/// Verdict and values returned by [`Solver::solve`](crate::Solver::solve)
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Solution {
    pub status: SolutionStatus,
    /// Column values, empty when not optimal
    pub values: Vec<f64>,
    /// Objective at `values`; throughput for a product mix
    pub objective_value: f64,
    /// Dual and slack analysis (empty unless optimal)
    pub analysis: Analysis,
    /// Solver message for non-optimal outcomes
    pub message: Option<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    Optimal,
    /// No point satisfies every row
    Infeasible,
    /// The objective grows without limit
    Unbounded,
    /// The solver stopped without reaching a verdict
    NotSolved,
}

/// Sensitivity data read back from an optimal solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analysis {
    /// One dual per row, in row order
    pub shadow_prices: Vec<ShadowPrice>,

    /// Left-hand side and slack of each constraint at the optimum
    pub activities: Vec<ConstraintActivity>,

    /// Constraints with a non-zero shadow price
    pub binding_constraints: Vec<String>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowPrice {
    pub constraint: String,
    /// Objective change per unit increase of the row's rhs
    pub value: f64,
    /// Human-readable reading of `value`
    pub interpretation: String,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintActivity {
    pub constraint: String,
    /// Left-hand side at the optimum
    pub lhs: f64,
    /// Right-hand side
    pub rhs: f64,
    /// Unused room before the bound is reached
    pub slack: f64,
}

impl Solution {
    pub fn infeasible(message: impl Into<String>) -> Self {
        Self::without_values(SolutionStatus::Infeasible, message.into())
    }

    pub fn unbounded(message: impl Into<String>) -> Self {
        Self::without_values(SolutionStatus::Unbounded, message.into())
    }

    pub fn not_solved(message: impl Into<String>) -> Self {
        Self::without_values(SolutionStatus::NotSolved, message.into())
    }

    fn without_values(status: SolutionStatus, message: String) -> Self {
        Self {
            status,
            values: Vec::new(),
            objective_value: f64::NAN,
            analysis: Analysis::default(),
            message: Some(message),
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Optimal
    }

    pub fn shadow_price(&self, constraint: &str) -> Option<f64> {
        self.analysis
            .shadow_prices
            .iter()
            .find(|sp| sp.constraint == constraint)
            .map(|sp| sp.value)
    }

    pub fn activity(&self, constraint: &str) -> Option<&ConstraintActivity> {
        self.analysis.activities.iter().find(|a| a.constraint == constraint)
    }
}
