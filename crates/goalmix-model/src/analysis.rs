//! Post-processing of an optimal solution: utilization, slack, shadow
//! prices and bottleneck classification.

use std::fmt;

use goalmix_solver::{LpProblem, Solution};

use crate::error::ParameterError;
use crate::model::ProductionModel;

/// Utilization (%) at or above which a work center counts as the bottleneck
pub const DEFAULT_BOTTLENECK_THRESHOLD: f64 = 99.9;

/// Utilization (%) at or above which a work center is reported as near capacity
pub const NEAR_CAPACITY_THRESHOLD: f64 = 90.0;

/// Scores closer than this are ties; absorbs solver round-off
const TIE_EPSILON: f64 = 1e-3;

/// How the bottleneck is picked among the work centers
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "rule", rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BottleneckRule {
    /// Work center with utilization at or above `threshold` percent that is
    /// closest to 100%; the first declared wins ties.
    Utilization { threshold: f64 },
    /// Work center with the largest strictly positive capacity shadow price;
    /// the first declared wins ties.
    ShadowPrice,
}

impl Default for BottleneckRule {
    fn default() -> Self {
        Self::Utilization {
            threshold: DEFAULT_BOTTLENECK_THRESHOLD,
        }
    }
}

impl BottleneckRule {
    /// Utilization threshold used for load classification
    pub fn threshold(&self) -> f64 {
        match self {
            Self::Utilization { threshold } => *threshold,
            Self::ShadowPrice => DEFAULT_BOTTLENECK_THRESHOLD,
        }
    }

    /// The threshold must be a percentage in `0..=100`
    pub fn validate(&self) -> Result<(), ParameterError> {
        let Self::Utilization { threshold } = *self else {
            return Ok(());
        };
        if !threshold.is_finite() {
            return Err(ParameterError::NonFinite {
                field: "threshold".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ParameterError::OutOfRange {
                field: "threshold".to_string(),
                value: threshold,
                min: 0.0,
                max: 100.0,
            });
        }
        Ok(())
    }
}

/// The constraint limiting throughput
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
#[derive(Debug, Clone, PartialEq)]
pub enum Bottleneck {
    WorkCenter { name: String, label: String },
    /// No work center binds; the market is the constraint
    Demand,
}

impl Bottleneck {
    pub fn label(&self) -> &str {
        match self {
            Self::WorkCenter { label, .. } => label,
            Self::Demand => "Demand",
        }
    }

    /// Name of the bottleneck work center, if any
    pub fn work_center(&self) -> Option<&str> {
        match self {
            Self::WorkCenter { name, .. } => Some(name),
            Self::Demand => None,
        }
    }
}

impl fmt::Display for Bottleneck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    AtCapacity,
    NearCapacity,
    HasSlack,
}

impl LoadStatus {
    pub fn classify(utilization: f64, threshold: f64) -> Self {
        if utilization >= threshold {
            Self::AtCapacity
        } else if utilization >= NEAR_CAPACITY_THRESHOLD {
            Self::NearCapacity
        } else {
            Self::HasSlack
        }
    }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ProductOutput {
    pub name: String,
    pub label: String,
    /// Units to produce
    pub quantity: f64,
    pub profit: f64,
    pub demand: f64,
    /// quantity x profit
    pub contribution: f64,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct WorkCenterLoad {
    pub name: String,
    pub label: String,
    /// Hours consumed by the plan
    pub used: f64,
    pub capacity: f64,
    /// used / capacity x 100
    pub utilization: f64,
    pub slack: f64,
    /// Throughput gained per extra hour of capacity
    pub shadow_price: f64,
    pub status: LoadStatus,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Capacity,
    Demand,
}

/// One line of the constraint sensitivity table
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintRow {
    pub constraint: String,
    pub display_name: String,
    pub kind: ConstraintKind,
    pub shadow_price: f64,
    pub slack: f64,
}

/// Throughput a product earns per hour of a given work center
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyRate {
    pub product: String,
    pub label: String,
    pub work_center: String,
    /// None when the product does not visit the work center
    pub profit_per_hour: Option<f64>,
}

/// Everything a front end needs to render one solve
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PlanResults {
    pub model: String,
    pub products: Vec<ProductOutput>,
    pub total_throughput: f64,
    pub work_centers: Vec<WorkCenterLoad>,
    pub bottleneck: Bottleneck,
    pub constraints: Vec<ConstraintRow>,
    /// Constraints with a strictly positive shadow price
    pub binding_constraints: Vec<String>,
    /// Profit per hour of the bottleneck work center, empty when demand binds
    pub bottleneck_rates: Vec<HourlyRate>,
}

impl PlanResults {
    pub fn product(&self, name: &str) -> Option<&ProductOutput> {
        self.products.iter().find(|p| p.name == name)
    }

    /// Units of `product`, zero when the product is unknown
    pub fn quantity(&self, product: &str) -> f64 {
        self.product(product).map_or(0.0, |p| p.quantity)
    }

    pub fn product_a(&self) -> f64 {
        self.quantity("product_a")
    }

    pub fn product_b(&self) -> f64 {
        self.quantity("product_b")
    }

    pub fn work_center(&self, name: &str) -> Option<&WorkCenterLoad> {
        self.work_centers.iter().find(|w| w.name == name)
    }

    pub fn constraint(&self, name: &str) -> Option<&ConstraintRow> {
        self.constraints.iter().find(|c| c.constraint == name)
    }
}

/// Derive utilization, slack and the bottleneck from an optimal solution of
/// the problem built for `model`.
pub fn analyze(
    model: &ProductionModel,
    problem: &LpProblem,
    solution: &Solution,
    rule: BottleneckRule,
) -> PlanResults {
    let products: Vec<ProductOutput> = model
        .products
        .iter()
        .zip(&solution.values)
        .map(|(p, &quantity)| ProductOutput {
            name: p.name.clone(),
            label: p.label.clone(),
            quantity,
            profit: p.profit,
            demand: p.demand,
            contribution: quantity * p.profit,
        })
        .collect();

    let rows = problem
        .constraints
        .iter()
        .zip(&solution.analysis.activities)
        .zip(&solution.analysis.shadow_prices);

    let mut work_centers = Vec::with_capacity(model.work_centers.len());
    let mut constraints = Vec::with_capacity(problem.num_constraints());
    for (i, ((row, activity), price)) in rows.enumerate() {
        let kind = if i < model.work_centers.len() {
            ConstraintKind::Capacity
        } else {
            ConstraintKind::Demand
        };

        if let (ConstraintKind::Capacity, Some(wc)) = (kind, model.work_centers.get(i)) {
            let used = activity.lhs.max(0.0);
            let utilization = used / wc.capacity * 100.0;
            work_centers.push(WorkCenterLoad {
                name: wc.name.clone(),
                label: wc.label.clone(),
                used,
                capacity: wc.capacity,
                utilization,
                slack: activity.slack,
                shadow_price: price.value,
                status: LoadStatus::classify(utilization, rule.threshold()),
            });
        }

        constraints.push(ConstraintRow {
            constraint: row.name.clone(),
            display_name: display_name(&row.name),
            kind,
            shadow_price: price.value,
            slack: activity.slack,
        });
    }

    let bottleneck = classify_bottleneck(&work_centers, rule);
    let bottleneck_rates = bottleneck
        .work_center()
        .map(|name| hourly_rates(model, name))
        .unwrap_or_default();

    PlanResults {
        model: model.name.clone(),
        products,
        total_throughput: solution.objective_value,
        work_centers,
        bottleneck,
        constraints,
        binding_constraints: solution
            .analysis
            .shadow_prices
            .iter()
            .filter(|sp| sp.value > 0.0)
            .map(|sp| sp.constraint.clone())
            .collect(),
        bottleneck_rates,
    }
}

/// Pick the bottleneck work center, scanning in declared order
pub fn classify_bottleneck(loads: &[WorkCenterLoad], rule: BottleneckRule) -> Bottleneck {
    let mut best: Option<(&WorkCenterLoad, f64)> = None;

    for load in loads {
        // Lower score is better.
        let score = match rule {
            BottleneckRule::Utilization { threshold } => {
                if load.utilization < threshold {
                    continue;
                }
                (load.utilization - 100.0).abs()
            }
            BottleneckRule::ShadowPrice => {
                if load.shadow_price <= 0.0 {
                    continue;
                }
                -load.shadow_price
            }
        };

        match best {
            Some((_, best_score)) if score >= best_score - TIE_EPSILON => {}
            _ => best = Some((load, score)),
        }
    }

    match best {
        Some((load, _)) => Bottleneck::WorkCenter {
            name: load.name.clone(),
            label: load.label.clone(),
        },
        None => Bottleneck::Demand,
    }
}

/// Profit per hour of `work_center` for every product
pub fn hourly_rates(model: &ProductionModel, work_center: &str) -> Vec<HourlyRate> {
    let Some(wc) = model.work_center(work_center) else {
        return Vec::new();
    };

    model
        .products
        .iter()
        .map(|p| {
            let hours = wc.processing_times.get(&p.name).copied().unwrap_or(0.0);
            HourlyRate {
                product: p.name.clone(),
                label: p.label.clone(),
                work_center: wc.name.clone(),
                profit_per_hour: (hours > 0.0).then(|| p.profit / hours),
            }
        })
        .collect()
}

/// `heat_treatment_capacity` -> `Heat Treatment Capacity`
pub fn display_name(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
