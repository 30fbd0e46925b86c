//! The receding-horizon controller.
//!
//! For every hour of the simulation period the controller builds and solves the window starting at
//! that hour, commits the first hour's decision to the ledger and feeds the resulting storage level
//! into the next window.
use crate::error::ScheduleFailure;
use crate::forecast::Forecast;
use crate::ledger::{LedgerEntry, ScheduleLedger};
use crate::model::{GridExchange, SystemConfig};
use crate::solver::{SOLUTION_TOLERANCE, SolverChain};
use crate::units::Energy;
use crate::window::{Decision, WindowModel};
use anyhow::{Context, Result, ensure};
use log::{debug, info};

/// Largest storage bound violation which is treated as numerical noise and clamped away
const STORAGE_TOLERANCE: Energy = Energy(SOLUTION_TOLERANCE);

/// The state carried from one hour to the next
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineState {
    storage_level: Energy,
}

impl EngineState {
    /// Create the state at the start of the simulation period
    pub fn new(storage_level: Energy) -> Self {
        Self { storage_level }
    }

    /// The current hydrogen storage level
    pub fn storage_level(&self) -> Energy {
        self.storage_level
    }

    /// Apply a committed decision, moving the storage level on by one time step.
    ///
    /// The new level is computed from the committed electrolyzer and fuel cell powers, rather than
    /// taken from the solver. Violations of the storage bounds within numerical tolerance are
    /// clamped; anything larger is an error.
    pub fn advance(&mut self, system: &SystemConfig, decision: &Decision) -> Result<Energy> {
        let next = system.next_storage_level(
            self.storage_level,
            decision.electrolyzer,
            decision.fuel_cell,
        );
        ensure!(
            next >= Energy(0.0) - STORAGE_TOLERANCE
                && next <= system.storage_capacity + STORAGE_TOLERANCE,
            "Committed decision takes the storage level to {}, outside [0, {}]",
            next.value(),
            system.storage_capacity.value()
        );

        self.storage_level = next.max(Energy(0.0)).min(system.storage_capacity);
        Ok(self.storage_level)
    }
}

/// Runs a single scenario hour by hour
pub struct RecedingHorizon<'a> {
    scenario: &'a str,
    system: &'a SystemConfig,
    forecast: &'a Forecast,
    horizon: usize,
    grid_exchange: GridExchange,
    chain: &'a SolverChain,
    state: EngineState,
    hour: usize,
    ledger: ScheduleLedger,
}

impl<'a> RecedingHorizon<'a> {
    /// Create a controller at the start of the simulation period.
    ///
    /// # Arguments
    ///
    /// * `scenario` - ID of the scenario, used in logs and diagnostics
    /// * `system` - The energy district
    /// * `forecast` - The forecast for the whole simulation period
    /// * `horizon` - Number of hours in each window
    /// * `grid_exchange` - The grid exchange policy
    /// * `initial_storage` - Storage level at the start of the first hour
    /// * `chain` - Solver backends to use
    pub fn new(
        scenario: &'a str,
        system: &'a SystemConfig,
        forecast: &'a Forecast,
        horizon: usize,
        grid_exchange: GridExchange,
        initial_storage: Energy,
        chain: &'a SolverChain,
    ) -> Self {
        Self {
            scenario,
            system,
            forecast,
            horizon,
            grid_exchange,
            chain,
            state: EngineState::new(initial_storage),
            hour: 0,
            ledger: ScheduleLedger::default(),
        }
    }

    /// Whether every hour of the simulation period has been committed
    pub fn is_finished(&self) -> bool {
        self.hour >= self.forecast.len()
    }

    /// The current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Solve the window for the current hour and commit its first decision.
    ///
    /// If no solver can schedule the window, the error is a [`ScheduleFailure`].
    pub fn step(&mut self) -> Result<&LedgerEntry> {
        let hour = self.hour;
        let forecast = self.forecast;
        let window = forecast.window(hour, self.horizon)?;
        let model = WindowModel::build(
            self.system,
            window,
            self.state.storage_level(),
            self.grid_exchange,
        )
        .with_context(|| format!("Could not build window for hour {hour}"))?;

        let plan = model.solve(self.chain).map_err(|attempts| ScheduleFailure {
            scenario: self.scenario.to_string(),
            hour,
            attempts,
        })?;

        let decision = plan.first();
        let storage_after = self
            .state
            .advance(self.system, decision)
            .with_context(|| format!("Could not commit decision for hour {hour}"))?;
        debug!(
            "Hour {hour}: import {:.3}, export {:.3}, diesel {:.3}, electrolyzer {:.3}, \
            fuel cell {:.3}, storage {:.3}",
            decision.import.value(),
            decision.export.value(),
            decision.diesel.value(),
            decision.electrolyzer.value(),
            decision.fuel_cell.value(),
            storage_after.value()
        );

        self.ledger.push(LedgerEntry::new(
            hour,
            &window[0],
            decision,
            storage_after,
            plan.objective,
        ));
        self.hour += 1;

        Ok(&self.ledger.entries()[hour])
    }

    /// Run every remaining hour of the simulation period
    pub fn run(mut self) -> Result<ScheduleLedger> {
        info!(
            "Scenario {}: scheduling {} hours with a {} hour horizon",
            self.scenario,
            self.forecast.len(),
            self.horizon
        );
        while !self.is_finished() {
            self.step()?;
        }
        info!(
            "Scenario {}: finished with storage level {:.3} MWh",
            self.scenario,
            self.state.storage_level().value()
        );

        Ok(self.ledger)
    }
}
