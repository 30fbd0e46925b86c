//! The scenario sweep, which runs the controller once per combination of fuel cost and load level.
use crate::controller::RecedingHorizon;
use crate::error::ScheduleFailure;
use crate::forecast::Forecast;
use crate::ledger::ScheduleLedger;
use crate::model::{Model, SystemConfig};
use crate::output::{DataWriter, write_metadata};
use crate::solver::SolverChain;
use crate::summary::ScenarioSummary;
use crate::units::{MoneyPerEnergy, Power};
use anyhow::{Result, ensure};
use itertools::Itertools;
use log::{error, info};
use std::path::Path;

/// One combination of sweep parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// A unique ID built from the parameter values, e.g. `fuel450_load10`
    pub id: String,
    /// Cost of diesel fuel
    pub fuel_cost: MoneyPerEnergy,
    /// Peak load to scale the forecast to, if any
    pub load_level: Option<Power>,
}

impl Scenario {
    /// The system with this scenario's fuel cost
    pub fn system(&self, base: &SystemConfig) -> SystemConfig {
        base.with_fuel_cost(self.fuel_cost)
    }

    /// The forecast with this scenario's load level
    pub fn forecast(&self, base: &Forecast) -> Forecast {
        match self.load_level {
            Some(level) => base.with_peak_load(level),
            None => base.clone(),
        }
    }
}

/// The scenarios to run for a model.
///
/// This is the cartesian product of the fuel costs and load levels in the model parameters. An
/// empty list of fuel costs means the system's own fuel cost is used; an empty list of load levels
/// means the load is not rescaled.
pub fn scenarios(model: &Model) -> Vec<Scenario> {
    let params = &model.parameters;
    let fuel_costs: Vec<Option<f64>> = if params.fuel_costs.is_empty() {
        vec![None]
    } else {
        params.fuel_costs.iter().copied().map(Some).collect()
    };
    let load_levels: Vec<Option<f64>> = if params.load_levels.is_empty() {
        vec![None]
    } else {
        params.load_levels.iter().copied().map(Some).collect()
    };

    fuel_costs
        .into_iter()
        .cartesian_product(load_levels)
        .map(|(fuel_cost, load_level)| {
            let parts = [
                fuel_cost.map(|cost| format!("fuel{cost}")),
                load_level.map(|level| format!("load{level}")),
            ];
            let id = parts.into_iter().flatten().join("_");

            Scenario {
                id: if id.is_empty() { "base".to_string() } else { id },
                fuel_cost: fuel_cost.map_or(model.system.fuel_cost, MoneyPerEnergy),
                load_level: load_level.map(Power),
            }
        })
        .collect()
}

/// Run the controller for a single scenario
pub fn run_scenario(
    model: &Model,
    scenario: &Scenario,
    chain: &SolverChain,
) -> Result<ScheduleLedger> {
    let system = scenario.system(&model.system);
    let forecast = scenario.forecast(&model.forecast);

    RecedingHorizon::new(
        &scenario.id,
        &system,
        &forecast,
        model.parameters.horizon,
        model.parameters.grid_exchange,
        model.parameters.initial_storage,
        chain,
    )
    .run()
}

/// The result of running one scenario
pub struct ScenarioOutcome {
    /// The scenario which was run
    pub scenario: Scenario,
    /// The schedule, or the reason the scenario could not be completed
    pub result: Result<ScheduleLedger>,
}

/// Run every scenario of the model in turn.
///
/// A scenario which fails does not stop the others from running.
pub fn run_sweep(model: &Model, chain: &SolverChain) -> Vec<ScenarioOutcome> {
    let scenarios = scenarios(model);
    info!(
        "Running {} scenario(s) with solvers: {}",
        scenarios.len(),
        chain.names().join(", ")
    );

    scenarios
        .into_iter()
        .map(|scenario| {
            let result = run_scenario(model, &scenario, chain);
            if let Err(err) = &result {
                log_failure(&scenario, err);
            }

            ScenarioOutcome { scenario, result }
        })
        .collect()
}

/// Run every scenario of the model and write the results to `output_path`.
///
/// Schedules and summaries are written for every scenario which completes, even if others fail.
/// It is an error for any scenario to fail.
pub fn run(model: &Model, output_path: &Path) -> Result<()> {
    let chain = model.solver.chain();
    let outcomes = run_sweep(model, &chain);

    let mut writer = DataWriter::create(output_path)?;
    let mut failed = Vec::new();
    for ScenarioOutcome { scenario, result } in &outcomes {
        let Ok(ledger) = result else {
            failed.push(scenario.id.as_str());
            continue;
        };

        let summary = ScenarioSummary::new(scenario, &scenario.system(&model.system), ledger);
        info!(
            "Scenario {}: net cost {:.2}, {:.3} hydrogen storage cycles",
            scenario.id,
            summary.net_cost.value(),
            summary.h2_equivalent_cycles.value()
        );
        writer.write_schedule(&scenario.id, ledger)?;
        writer.write_summary(&summary)?;
    }
    writer.flush()?;

    let solvers = chain.names().collect_vec();
    let ids = outcomes
        .iter()
        .map(|outcome| outcome.scenario.id.clone())
        .collect_vec();
    write_metadata(output_path, &model.model_path, &solvers, &ids)?;

    ensure!(
        failed.is_empty(),
        "{} of {} scenario(s) failed: {}",
        failed.len(),
        outcomes.len(),
        failed.join(", ")
    );

    Ok(())
}

/// Log why a scenario failed
fn log_failure(scenario: &Scenario, err: &anyhow::Error) {
    if let Some(failure) = err.downcast_ref::<ScheduleFailure>() {
        error!(
            "Scenario {} stopped at hour {}; no solver could schedule the window",
            failure.scenario, failure.hour
        );
        for attempt in &failure.attempts {
            error!("  {}: {}", attempt.solver, attempt.status);
        }
    } else {
        error!("Scenario {} failed: {err:?}", scenario.id);
    }
}
