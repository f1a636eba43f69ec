use std::fmt;

use crate::analysis::{LoadStatus, PlanResults};

const RULE: &str = "----------------------------------------------------------------------";

/// Plain-text rendering of a production plan
pub struct PlanReport<'a> {
    results: &'a PlanResults,
    analysis: bool,
}

impl<'a> PlanReport<'a> {
    pub fn new(results: &'a PlanResults) -> Self {
        Self { results, analysis: false }
    }

    /// Include the constraint sensitivity table
    pub fn with_analysis(mut self, analysis: bool) -> Self {
        self.analysis = analysis;
        self
    }
}

impl fmt::Display for PlanReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.results;

        writeln!(f, "{}", r.model)?;
        writeln!(f, "Maximum throughput: {}", money(r.total_throughput))?;
        writeln!(f)?;

        writeln!(f, "Production plan")?;
        writeln!(f, "{}", RULE)?;
        for p in &r.products {
            writeln!(
                f,
                "  {:20} {:10.2} units   contribution {}",
                p.label,
                p.quantity,
                money(p.contribution)
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Work center utilization")?;
        writeln!(f, "{}", RULE)?;
        writeln!(
            f,
            "  {:20} {:>10} {:>10} {:>12} {:>10}",
            "Work center", "Used", "Capacity", "Utilization", "Slack"
        )?;
        for wc in &r.work_centers {
            let marker = if r.bottleneck.work_center() == Some(wc.name.as_str()) {
                "  <- bottleneck"
            } else if wc.status == LoadStatus::NearCapacity {
                "  (near capacity)"
            } else {
                ""
            };
            writeln!(
                f,
                "  {:20} {:>8.2} h {:>8.0} h {:>11.1}% {:>8.2} h{}",
                wc.label, wc.used, wc.capacity, wc.utilization, wc.slack, marker
            )?;
        }
        writeln!(f)?;
        writeln!(f, "System bottleneck: {}", r.bottleneck)?;

        for rate in &r.bottleneck_rates {
            if let Some(per_hour) = rate.profit_per_hour {
                writeln!(f, "  {:20} {} per bottleneck hour", rate.label, money(per_hour))?;
            }
        }

        if self.analysis {
            writeln!(f)?;
            writeln!(f, "Constraint sensitivity")?;
            writeln!(f, "{}", RULE)?;
            writeln!(f, "  {:32} {:>12} {:>10}", "Constraint", "Shadow price", "Slack")?;
            for c in &r.constraints {
                writeln!(
                    f,
                    "  {:32} {:>12} {:>10.2}",
                    c.display_name,
                    money(c.shadow_price),
                    c.slack
                )?;
            }
        }
        Ok(())
    }
}

/// `4800.0` -> `$4,800.00`
pub fn money(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}${}.{:02}", sign, grouped, cents % 100)
}
