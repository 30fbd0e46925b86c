//! The command line interface for the scheduler.
use crate::error::ScheduleFailure;
use crate::log;
use crate::model::Model;
use crate::output::{create_output_directory, get_output_dir};
use crate::scenario::{self, scenarios};
use crate::settings::Settings;
use crate::units::Energy;
use crate::window::WindowModel;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub mod example;
use example::ExampleSubcommands;

/// The command line interface for the scheduler.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
    /// Flag to provide the CLI docs as markdown
    #[arg(long, hide = true)]
    markdown_help: bool,
}

/// Options for the run command
#[derive(Args)]
pub struct RunOpts {
    /// Directory for output files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
    /// Whether to overwrite the output directory if it already exists
    #[arg(long)]
    pub overwrite: bool,
}

/// Options for the window command
#[derive(Args)]
pub struct WindowOpts {
    /// The first hour of the window
    #[arg(long, default_value_t = 0)]
    pub start: usize,
    /// Hydrogen storage level at the start of the window [MWh] (defaults to the initial level)
    #[arg(long)]
    pub storage: Option<f64>,
    /// The scenario whose fuel cost and load level to use (defaults to the first)
    #[arg(long)]
    pub scenario: Option<String>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run every scenario of a model with the receding-horizon controller.
    Run {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
    /// Solve a single look-ahead window and print its plan.
    Window {
        /// Path to the model directory.
        model_dir: PathBuf,
        /// Other window options
        #[command(flatten)]
        opts: WindowOpts,
    },
    /// Manage example models.
    Example {
        /// The available subcommands for managing example models.
        #[command(subcommand)]
        subcommand: ExampleSubcommands,
    },
    /// Validate a model.
    Validate {
        /// The path to the model directory.
        model_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Run { model_dir, opts } => handle_run_command(&model_dir, &opts, None),
            Self::Window { model_dir, opts } => handle_window_command(&model_dir, &opts, None),
            Self::Example { subcommand } => subcommand.execute(),
            Self::Validate { model_dir } => handle_validate_command(&model_dir, None),
        }
    }
}

/// Parse CLI arguments and start the program
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    // Invoked as: `$ h2dispatch --markdown-help`
    if cli.markdown_help {
        clap_markdown::print_help_markdown::<Cli>();
        return Ok(());
    }

    let Some(command) = cli.command else {
        // Output program help
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load program settings, if not provided
fn load_settings(settings: Option<Settings>) -> Result<Settings> {
    match settings {
        Some(settings) => Ok(settings),
        None => Settings::load().context("Failed to load settings."),
    }
}

/// Handle the `run` command.
pub fn handle_run_command(
    model_path: &Path,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;

    // Get path to output folder
    let pathbuf: PathBuf;
    let output_path = if let Some(p) = opts.output_dir.as_deref() {
        p
    } else {
        pathbuf = get_output_dir(model_path)?;
        &pathbuf
    };

    // The command-line flag can only enable overwriting, not disable it
    let allow_overwrite = opts.overwrite || settings.overwrite;
    let overwrite = create_output_directory(output_path, allow_overwrite).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            output_path.display()
        )
    })?;

    // Initialise program logger
    log::init(settings.log_level.as_deref(), Some(output_path))
        .context("Failed to initialise logging.")?;

    // Load the model to run
    let model = Model::from_path(model_path).context("Failed to load model.")?;
    info!("Loaded model from {}", model_path.display());
    info!("Output folder: {}", output_path.display());

    // NB: We have to wait until the logger is initialised to display this warning
    if overwrite {
        warn!("Output folder will be overwritten");
    }

    // Run the scenarios
    scenario::run(&model, output_path)?;
    info!("Scheduling complete!");

    Ok(())
}

/// Handle the `validate` command.
pub fn handle_validate_command(model_path: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = load_settings(settings)?;

    // Initialise program logger (we won't save log files when running the validate command)
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    // Load/validate the model
    let model = Model::from_path(model_path).context("Failed to validate model.")?;
    info!(
        "Model validation successful! {} hours, {} scenario(s)",
        model.forecast.len(),
        scenarios(&model).len()
    );

    Ok(())
}

/// A row of the plan printed by the `window` command
#[derive(Serialize)]
struct WindowPlanRow {
    hour: usize,
    import: f64,
    export: f64,
    diesel: f64,
    electrolyzer: f64,
    fuel_cell: f64,
    curtailment: f64,
    storage_after: f64,
}

/// Handle the `window` command.
///
/// The plan is written to stdout as CSV.
pub fn handle_window_command(
    model_path: &Path,
    opts: &WindowOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let settings = load_settings(settings)?;
    log::init(settings.log_level.as_deref(), None).context("Failed to initialise logging.")?;

    write_window_plan(model_path, opts, io::stdout())
}

/// Solve the window described by `opts` and write its plan as CSV, one row per hour
pub fn write_window_plan<W: Write>(model_path: &Path, opts: &WindowOpts, out: W) -> Result<()> {
    let model = Model::from_path(model_path).context("Failed to load model.")?;
    let scenarios = scenarios(&model);
    let scenario = match opts.scenario.as_deref() {
        Some(id) => scenarios
            .iter()
            .find(|scenario| scenario.id == id)
            .with_context(|| format!("Scenario {id} not found"))?,
        None => &scenarios[0],
    };
    let system = scenario.system(&model.system);
    let forecast = scenario.forecast(&model.forecast);
    let storage = opts
        .storage
        .map_or(model.parameters.initial_storage, Energy);

    let window = forecast.window(opts.start, model.parameters.horizon)?;
    let window_model =
        WindowModel::build(&system, window, storage, model.parameters.grid_exchange)?;
    let plan = window_model
        .solve(&model.solver.chain())
        .map_err(|attempts| ScheduleFailure {
            scenario: scenario.id.clone(),
            hour: opts.start,
            attempts,
        })?;
    info!(
        "Scenario {}, hours {}..{}: objective {:.2}",
        scenario.id,
        opts.start,
        opts.start + window.len(),
        plan.objective.value()
    );

    let mut writer = csv::Writer::from_writer(out);
    for (offset, decision) in plan.decisions.iter().enumerate() {
        writer.serialize(WindowPlanRow {
            hour: opts.start + offset,
            import: decision.import.value(),
            export: decision.export.value(),
            diesel: decision.diesel.value(),
            electrolyzer: decision.electrolyzer.value(),
            fuel_cell: decision.fuel_cell.value(),
            curtailment: decision.curtailment.value(),
            storage_after: plan.storage[offset + 1].value(),
        })?;
    }
    writer.flush()?;

    Ok(())
}
