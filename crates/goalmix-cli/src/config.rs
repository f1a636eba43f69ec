use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use goalmix_model::{ParameterError, Parameters, PlanError, ProductionModel};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid time limit: {0} seconds")]
    TimeLimit(f64),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("Cannot serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

impl From<ParameterError> for CliError {
    fn from(err: ParameterError) -> Self {
        Self::Plan(err.into())
    }
}

/// Slider overrides given on the command line
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    /// Machining center hours per week
    #[arg(long)]
    pub machining_capacity: Option<f64>,
    /// Heat treatment hours per week
    #[arg(long)]
    pub heat_treatment_capacity: Option<f64>,
    /// Assembly center hours per week
    #[arg(long)]
    pub assembly_capacity: Option<f64>,
    /// Maximum demand for product A (units)
    #[arg(long)]
    pub demand_a: Option<f64>,
    /// Maximum demand for product B (units)
    #[arg(long)]
    pub demand_b: Option<f64>,
    /// Profit per unit of product A ($)
    #[arg(long)]
    pub profit_a: Option<f64>,
    /// Profit per unit of product B ($)
    #[arg(long)]
    pub profit_b: Option<f64>,
}

impl ParamArgs {
    fn overrides(&self) -> [(&'static str, Option<f64>); 7] {
        [
            ("machining_capacity", self.machining_capacity),
            ("heat_treatment_capacity", self.heat_treatment_capacity),
            ("assembly_capacity", self.assembly_capacity),
            ("demand_a", self.demand_a),
            ("demand_b", self.demand_b),
            ("profit_a", self.profit_a),
            ("profit_b", self.profit_b),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.overrides().iter().all(|(_, v)| v.is_none())
    }
}

/// Defaults, then the optional parameter file, then command-line flags
pub fn load_parameters(file: Option<&Path>, args: &ParamArgs) -> Result<Parameters, CliError> {
    let mut params = match file {
        Some(path) => read_json::<Parameters>(path)?,
        None => Parameters::default(),
    };

    for (key, value) in args.overrides() {
        if let Some(value) = value {
            tracing::debug!(key, value, "parameter override");
            params.set(key, value)?;
        }
    }
    Ok(params)
}

pub fn load_model(path: &Path) -> Result<ProductionModel, CliError> {
    read_json(path)
}

pub fn time_limit(seconds: Option<f64>) -> Result<Option<Duration>, CliError> {
    seconds
        .map(|s| Duration::try_from_secs_f64(s).map_err(|_| CliError::TimeLimit(s)))
        .transpose()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&source).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = ParamArgs {
            heat_treatment_capacity: Some(200.0),
            ..ParamArgs::default()
        };
        let params = load_parameters(None, &args).unwrap();
        assert_eq!(params.heat_treatment_capacity, 200.0);
        assert_eq!(params.machining_capacity, 200.0);
        assert!(!args.is_empty());
    }

    #[test]
    fn test_partial_parameter_file() {
        let path = std::env::temp_dir().join(format!("goalmix-params-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "profit_a": 140, "demand_b": 100 }"#).unwrap();

        let args = ParamArgs {
            demand_b: Some(120.0),
            ..ParamArgs::default()
        };
        let params = load_parameters(Some(&path), &args).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(params.profit_a, 140.0);
        assert_eq!(params.demand_b, 120.0);
        assert_eq!(params.heat_treatment_capacity, 160.0);
    }

    #[test]
    fn test_missing_file() {
        let err = load_model(Path::new("/nonexistent/goalmix/model.json")).unwrap_err();
        assert!(matches!(err, CliError::Io { .. }));
    }

    #[test]
    fn test_demo_model_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/job-shop.json");
        let model = load_model(&path).unwrap();
        assert_eq!(model.products.len(), 3);
        assert!(goalmix_model::build_problem(&model).is_ok());
    }

    #[test]
    fn test_time_limit() {
        assert_eq!(time_limit(None).unwrap(), None);
        assert_eq!(time_limit(Some(1.5)).unwrap(), Some(Duration::from_millis(1500)));
        assert!(matches!(time_limit(Some(-1.0)), Err(CliError::TimeLimit(_))));
    }
}
