//! Instructor scenario analysis: named what-if variations of the baseline
//! plant, a comparison table and the lessons they illustrate.

use std::fmt;

use crate::analysis::PlanResults;
use crate::error::PlanError;
use crate::model::ProductionModel;
use crate::params::Parameters;
use crate::plan::{solve_parameters, solve_with, PlanOptions};
use crate::report::money;

/// A named set of slider changes applied on top of the baseline
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: String,
    pub overrides: Vec<(String, f64)>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            overrides: Vec::new(),
        }
    }

    pub fn set(mut self, key: impl Into<String>, value: f64) -> Self {
        self.overrides.push((key.into(), value));
        self
    }

    /// Baseline parameters with this scenario's overrides applied
    pub fn parameters(&self, base: &Parameters) -> Result<Parameters, PlanError> {
        let mut params = *base;
        for (key, value) in &self.overrides {
            params.set(key, *value)?;
        }
        Ok(params)
    }
}

/// The ten classroom scenarios
pub fn standard_scenarios() -> Vec<Scenario> {
    vec![
        Scenario::new("Baseline - Default Parameters"),
        Scenario::new("Increase Bottleneck by 25%").set("heat_treatment_capacity", 200.0),
        Scenario::new("Increase Bottleneck by 50%").set("heat_treatment_capacity", 240.0),
        Scenario::new("Increase Non-Bottleneck (Machining) by 50%").set("machining_capacity", 300.0),
        Scenario::new("Equal Profit Margins ($75 each)")
            .set("profit_a", 75.0)
            .set("profit_b", 75.0),
        Scenario::new("Product A Premium Priced ($140)").set("profit_a", 140.0),
        Scenario::new("High Demand for Both Products")
            .set("demand_a", 100.0)
            .set("demand_b", 150.0),
        Scenario::new("Balanced Capacities")
            .set("heat_treatment_capacity", 180.0)
            .set("machining_capacity", 180.0)
            .set("assembly_capacity", 180.0),
        Scenario::new("Assembly as Bottleneck")
            .set("heat_treatment_capacity", 200.0)
            .set("machining_capacity", 200.0)
            .set("assembly_capacity", 140.0),
        Scenario::new("Low Demand Scenario")
            .set("demand_a", 20.0)
            .set("demand_b", 30.0),
    ]
}

/// Key metrics of one solved scenario
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioOutcome {
    pub scenario: String,
    pub product_a: f64,
    pub product_b: f64,
    pub throughput: f64,
    pub bottleneck: String,
    pub heat_treatment_utilization: f64,
}

impl ScenarioOutcome {
    fn from_results(scenario: &Scenario, results: &PlanResults) -> Self {
        Self {
            scenario: scenario.name.clone(),
            product_a: results.product_a(),
            product_b: results.product_b(),
            throughput: results.total_throughput,
            bottleneck: results.bottleneck.to_string(),
            heat_treatment_utilization: results
                .work_center("heat_treatment")
                .map_or(0.0, |wc| wc.utilization),
        }
    }
}

/// Throughput change caused by adding capacity at one work center
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct CapacityValue {
    pub work_center: String,
    pub label: String,
    pub hours_added: f64,
    pub throughput_before: f64,
    pub throughput_after: f64,
}

impl CapacityValue {
    pub fn change(&self) -> f64 {
        self.throughput_after - self.throughput_before
    }

    pub fn per_hour(&self) -> f64 {
        if self.hours_added == 0.0 {
            0.0
        } else {
            self.change() / self.hours_added
        }
    }
}

/// Re-solve `model` with `hours` more capacity at `work_center`
pub fn capacity_value(
    model: &ProductionModel,
    work_center: &str,
    hours: f64,
    options: &PlanOptions,
) -> Result<Option<CapacityValue>, PlanError> {
    let Some(index) = model.work_centers.iter().position(|w| w.name == work_center) else {
        return Ok(None);
    };

    let (before, _) = solve_with(model, options)?;
    let mut elevated = model.clone();
    elevated.work_centers[index].capacity += hours;
    let (after, _) = solve_with(&elevated, options)?;

    Ok(Some(CapacityValue {
        work_center: work_center.to_string(),
        label: model.work_centers[index].label.clone(),
        hours_added: hours,
        throughput_before: before.total_throughput,
        throughput_after: after.total_throughput,
    }))
}

/// Comparison of all scenarios plus the capacity lessons of the baseline
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioAnalysis {
    pub outcomes: Vec<ScenarioOutcome>,
    /// Value of 25% more capacity at the baseline bottleneck
    pub bottleneck_capacity: Option<CapacityValue>,
    /// Value of 50% more capacity at the first baseline work center with slack
    pub non_bottleneck_capacity: Option<CapacityValue>,
}

/// Solve every scenario against `base` and derive the capacity lessons
pub fn run_scenarios(
    base: &Parameters,
    scenarios: &[Scenario],
    options: &PlanOptions,
) -> Result<ScenarioAnalysis, PlanError> {
    let mut outcomes = Vec::with_capacity(scenarios.len());
    for scenario in scenarios {
        let params = scenario.parameters(base)?;
        let (results, _) = solve_parameters(&params, options)?;
        tracing::debug!(
            scenario = %scenario.name,
            throughput = results.total_throughput,
            bottleneck = %results.bottleneck,
            "scenario solved"
        );
        outcomes.push(ScenarioOutcome::from_results(scenario, &results));
    }

    let (baseline, _) = solve_parameters(base, options)?;
    let model = ProductionModel::from(base);

    let bottleneck_capacity = match baseline.bottleneck.work_center() {
        Some(name) => {
            let hours = model.work_center(name).map_or(0.0, |w| w.capacity * 0.25);
            capacity_value(&model, name, hours, options)?
        }
        None => None,
    };

    let non_bottleneck_capacity = match baseline
        .work_centers
        .iter()
        .find(|w| baseline.bottleneck.work_center() != Some(w.name.as_str()) && w.slack > 0.0)
    {
        Some(wc) => capacity_value(&model, &wc.name, wc.capacity * 0.5, options)?,
        None => None,
    };

    Ok(ScenarioAnalysis {
        outcomes,
        bottleneck_capacity,
        non_bottleneck_capacity,
    })
}

const WIDE_RULE: &str =
    "================================================================================";

impl fmt::Display for ScenarioAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", WIDE_RULE)?;
        writeln!(f, "SCENARIO COMPARISON SUMMARY")?;
        writeln!(f, "{}", WIDE_RULE)?;
        writeln!(
            f,
            "{:44} {:>8} {:>8} {:>12} {:>7}  {}",
            "Scenario", "A", "B", "Throughput", "HT %", "Bottleneck"
        )?;
        for o in &self.outcomes {
            writeln!(
                f,
                "{:44} {:>8.1} {:>8.1} {:>12} {:>7.1}  {}",
                o.scenario,
                o.product_a,
                o.product_b,
                money(o.throughput),
                o.heat_treatment_utilization,
                o.bottleneck
            )?;
        }

        writeln!(f)?;
        writeln!(f, "{}", WIDE_RULE)?;
        writeln!(f, "KEY INSIGHTS")?;
        writeln!(f, "{}", WIDE_RULE)?;

        if let Some(v) = &self.bottleneck_capacity {
            writeln!(f)?;
            writeln!(f, "1. Value of bottleneck capacity ({}):", v.label)?;
            writeln!(f, "   - Baseline throughput: {}", money(v.throughput_before))?;
            writeln!(f, "   - After {:.0}-hour increase: {}", v.hours_added, money(v.throughput_after))?;
            writeln!(f, "   - Increase: {}", money(v.change()))?;
            writeln!(f, "   - Value per hour: {}/hour", money(v.per_hour()))?;
        }

        if let Some(v) = &self.non_bottleneck_capacity {
            writeln!(f)?;
            writeln!(f, "2. Value of non-bottleneck capacity ({}):", v.label)?;
            writeln!(f, "   - After {:.0}-hour increase: {}", v.hours_added, money(v.throughput_after))?;
            writeln!(f, "   - Change from baseline: {}", money(v.change()))?;
        }

        writeln!(f)?;
        writeln!(f, "3. Product mix by scenario:")?;
        for o in &self.outcomes {
            writeln!(f, "   - {}: {:.1}A, {:.1}B", o.scenario, o.product_a, o.product_b)?;
        }

        writeln!(f)?;
        writeln!(f, "4. Bottleneck identification:")?;
        for o in &self.outcomes {
            writeln!(f, "   - {}: {}", o.scenario, o.bottleneck)?;
        }

        writeln!(f)?;
        writeln!(f, "{}", WIDE_RULE)?;
        writeln!(f, "THROUGHPUT COMPARISON")?;
        writeln!(f, "{}", WIDE_RULE)?;
        let max = self.outcomes.iter().map(|o| o.throughput).fold(0.0_f64, f64::max);
        for o in &self.outcomes {
            let width = if max > 0.0 { (o.throughput / max * 50.0) as usize } else { 0 };
            let name: String = o.scenario.chars().take(30).collect();
            writeln!(f, "{:30} {} {}", name, "#".repeat(width), money(o.throughput))?;
        }
        Ok(())
    }
}
