mod config;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use goalmix_model::{
    build_problem, run_scenarios, solve_parameters, solve_with, standard_scenarios, BottleneckRule, Parameters,
    PlanOptions, PlanReport, ProductionModel,
};

use config::{CliError, ParamArgs};

#[derive(Parser)]
#[command(name = "goalmix")]
#[command(about = "Theory-of-Constraints product-mix planner", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve for the throughput-maximizing production mix
    Solve {
        #[command(flatten)]
        params: ParamArgs,
        /// JSON file with slider values (missing fields keep their defaults)
        #[arg(long)]
        params_file: Option<PathBuf>,
        /// JSON file with a full production model (ignores slider values)
        #[arg(long, conflicts_with = "preset")]
        model: Option<PathBuf>,
        /// Built-in plant to solve
        #[arg(long, value_enum, default_value = "goal")]
        preset: Preset,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
        /// Show the constraint sensitivity table
        #[arg(short, long)]
        analysis: bool,
        /// How the bottleneck is identified
        #[arg(long, value_enum, default_value = "utilization")]
        rule: Rule,
        /// Utilization (%) at which a work center counts as the bottleneck
        #[arg(long, default_value_t = 99.9)]
        threshold: f64,
        /// Give up on the solver after this many seconds
        #[arg(long)]
        time_limit: Option<f64>,
    },
    /// Run the classroom scenarios and compare them
    Scenarios {
        /// JSON file with the baseline slider values
        #[arg(long)]
        params_file: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// List the slider parameters and their ranges
    Fields {
        /// Output format
        #[arg(short, long, value_enum, default_value = "pretty")]
        format: Format,
    },
    /// Check a production model file for errors
    Check {
        /// The JSON model file to check
        file: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Pretty,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    /// Two products through machining, heat treatment and assembly
    Goal,
    /// UniCo: three models through four work centers
    Unico,
}

#[derive(Clone, Copy, ValueEnum)]
enum Rule {
    Utilization,
    ShadowPrice,
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Solve {
            params,
            params_file,
            model,
            preset,
            format,
            analysis,
            rule,
            threshold,
            time_limit,
        } => {
            let mut options = PlanOptions::default().with_rule(match rule {
                Rule::Utilization => BottleneckRule::Utilization { threshold },
                Rule::ShadowPrice => BottleneckRule::ShadowPrice,
            });
            if let Some(limit) = config::time_limit(time_limit)? {
                options = options.with_time_limit(limit);
            }

            let custom = match (&model, preset) {
                (Some(path), _) => Some(config::load_model(path)?),
                (None, Preset::Unico) => Some(ProductionModel::unico()),
                (None, Preset::Goal) => None,
            };

            let (results, _) = match custom {
                Some(model) => {
                    if !params.is_empty() || params_file.is_some() {
                        tracing::warn!("slider values are ignored when solving a full model");
                    }
                    solve_with(&model, &options)?
                }
                None => {
                    let params = config::load_parameters(params_file.as_deref(), &params)?;
                    solve_parameters(&params, &options)?
                }
            };

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                Format::Pretty => print!("{}", PlanReport::new(&results).with_analysis(analysis)),
            }
        }
        Commands::Scenarios { params_file, format } => {
            let base = config::load_parameters(params_file.as_deref(), &ParamArgs::default())?;
            let comparison = run_scenarios(&base, &standard_scenarios(), &PlanOptions::default())?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&comparison)?),
                Format::Pretty => print!("{}", comparison),
            }
        }
        Commands::Fields { format } => match format {
            Format::Json => println!("{}", serde_json::to_string_pretty(Parameters::fields())?),
            Format::Pretty => {
                let mut group = "";
                for field in Parameters::fields() {
                    if field.group != group {
                        group = field.group;
                        println!("{}", group);
                    }
                    println!(
                        "  {:26} {:>6} ..= {:<6} step {:<4} default {:<6} {}",
                        field.key, field.min, field.max, field.step, field.default, field.unit
                    );
                }
            }
        },
        Commands::Check { file } => {
            let model = config::load_model(&file)?;
            match build_problem(&model) {
                Ok(problem) => {
                    println!("✓ {} is valid", file.display());
                    println!("  {} products", model.products.len());
                    println!("  {} work centers", model.work_centers.len());
                    println!("  {} constraints", problem.num_constraints());
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
    Ok(())
}
