pub mod analysis;
pub mod builder;
pub mod error;
pub mod model;
pub mod params;
pub mod plan;
pub mod report;
pub mod scenario;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use analysis::{
    Bottleneck, BottleneckRule, ConstraintKind, ConstraintRow, HourlyRate, LoadStatus, PlanResults,
    ProductOutput, WorkCenterLoad,
};
pub use builder::build_problem;
pub use error::{ModelError, ParameterError, PlanError};
pub use model::{Product, ProductionModel, WorkCenter};
pub use params::{ParameterField, Parameters};
pub use plan::{solve, solve_parameters, solve_with, PlanOptions};
pub use report::PlanReport;
pub use scenario::{run_scenarios, standard_scenarios, Scenario, ScenarioAnalysis, ScenarioOutcome};
