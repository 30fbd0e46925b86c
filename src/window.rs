//! Code for building the mixed-integer model of a single look-ahead window.
//!
//! A window covers `H` consecutive hours of forecast, starting from a known hydrogen storage
//! level. The model decides the grid exchange, diesel output, electrolyzer input, fuel cell
//! output and curtailment for every hour so as to minimise the total cost over the window. Only
//! the first hour's decision is ever committed (see [`crate::controller`]).
use crate::error::{ConfigurationError, DataGapError, SolverAttempt};
use crate::forecast::ForecastRecord;
use crate::model::{GridExchange, SystemConfig};
use crate::problem::{Col, Problem};
use crate::solver::SolverChain;
use crate::units::{Energy, Money, Power};
use anyhow::{Result, ensure};
use indexmap::IndexMap;

mod constraints;
use constraints::add_window_constraints;

/// The kind of quantity a decision variable represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    /// Power imported from the grid
    Import,
    /// Power exported to the grid
    Export,
    /// Diesel generator output
    Diesel,
    /// Electrolyzer input
    Electrolyzer,
    /// Fuel cell output
    FuelCell,
    /// Surplus power which is discarded
    Curtailment,
    /// Hydrogen storage level at the start of the hour
    StorageLevel,
    /// Whether the diesel generator is running
    DieselOn,
    /// Whether the electrolyzer is running
    ElectrolyzerOn,
    /// Whether the fuel cell is running
    FuelCellOn,
    /// Whether the grid connection is importing
    ImportOn,
    /// Whether the grid connection is exporting
    ExportOn,
}

/// A map for easy lookup of variables in the problem.
///
/// The entries are ordered (see [`IndexMap`]).
///
/// We use this data structure for two things:
///
/// 1. In order define constraints for the optimisation
/// 2. To keep track of which quantity and hour each column corresponds to, for when we are reading
///    the results of the optimisation.
#[derive(Debug, Default)]
pub struct VariableMap(IndexMap<(VariableKind, usize), Col>);

impl VariableMap {
    /// Get the column for the given quantity and hour, if the model has one
    pub fn try_get(&self, kind: VariableKind, hour: usize) -> Option<Col> {
        self.0.get(&(kind, hour)).copied()
    }

    /// Get the column for the given quantity and hour
    fn get(&self, kind: VariableKind, hour: usize) -> Col {
        self.try_get(kind, hour)
            .expect("No variable found for given params")
    }

    fn insert(&mut self, kind: VariableKind, hour: usize, col: Col) {
        let existing = self.0.insert((kind, hour), col).is_some();
        assert!(!existing, "Duplicate entry for var");
    }

    /// The number of variables
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no variables
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The decisions for a single hour of a window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Decision {
    /// Power imported from the grid
    pub import: Power,
    /// Power exported to the grid
    pub export: Power,
    /// Diesel generator output
    pub diesel: Power,
    /// Electrolyzer input
    pub electrolyzer: Power,
    /// Fuel cell output
    pub fuel_cell: Power,
    /// Surplus power which is discarded
    pub curtailment: Power,
    /// Whether the diesel generator is running
    pub diesel_on: bool,
    /// Whether the electrolyzer is running
    pub electrolyzer_on: bool,
    /// Whether the fuel cell is running
    pub fuel_cell_on: bool,
}

impl Decision {
    /// Supply minus demand for the hour. Zero (within tolerance) for a valid decision.
    pub fn balance_residual(&self, record: &ForecastRecord) -> Power {
        record.renewables() + self.import + self.diesel + self.fuel_cell
            - record.load
            - self.electrolyzer
            - self.export
            - self.curtailment
    }
}

/// The solved plan for a window
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPlan {
    /// One decision per hour of the window
    pub decisions: Vec<Decision>,
    /// Hydrogen storage level at the start of each hour, plus the level at the end of the window
    pub storage: Vec<Energy>,
    /// Total cost of the plan over the whole window
    pub objective: Money,
}

impl WindowPlan {
    /// The decision for the first hour, i.e. the one which is committed
    pub fn first(&self) -> &Decision {
        &self.decisions[0]
    }
}

/// The model for one look-ahead window
#[derive(Debug)]
pub struct WindowModel {
    problem: Problem,
    variables: VariableMap,
    hours: usize,
}

impl WindowModel {
    /// Build the model for a window.
    ///
    /// # Arguments
    ///
    /// * `system` - The (validated) energy district
    /// * `window` - The forecast for each hour of the window; may be shorter than the horizon at
    ///   the end of the simulation period
    /// * `initial_storage` - Hydrogen storage level at the start of the window
    /// * `grid_exchange` - Whether import and export are mutually exclusive
    pub fn build(
        system: &SystemConfig,
        window: &[ForecastRecord],
        initial_storage: Energy,
        grid_exchange: GridExchange,
    ) -> Result<Self> {
        ensure!(
            !window.is_empty(),
            DataGapError::new("window contains no hours")
        );
        ensure!(
            initial_storage.is_finite()
                && initial_storage >= Energy(0.0)
                && initial_storage <= system.storage_capacity,
            ConfigurationError::new(format!(
                "initial storage level {} is outside [0, {}]",
                initial_storage.value(),
                system.storage_capacity.value()
            ))
        );

        let mut problem = Problem::default();
        let variables = add_variables(
            &mut problem,
            system,
            window,
            initial_storage,
            grid_exchange,
        );
        add_window_constraints(&mut problem, &variables, system, window);

        Ok(Self {
            problem,
            variables,
            hours: window.len(),
        })
    }

    /// The solver-neutral problem
    pub fn problem(&self) -> &Problem {
        &self.problem
    }

    /// The problem's variables
    pub fn variables(&self) -> &VariableMap {
        &self.variables
    }

    /// The number of hours in the window
    pub fn hours(&self) -> usize {
        self.hours
    }

    /// Solve the window with the first backend of `chain` which succeeds
    pub fn solve(&self, chain: &SolverChain) -> Result<WindowPlan, Vec<SolverAttempt>> {
        chain
            .solve(&self.problem)
            .map(|values| self.read_solution(&values))
    }

    /// Convert a solver's column values into a plan.
    ///
    /// On/off indicators are rounded, and a unit which is off is given exactly zero power.
    pub fn read_solution(&self, values: &[f64]) -> WindowPlan {
        let value = |kind, hour| values[self.variables.get(kind, hour).index()];
        let power = |kind, hour| Power(value(kind, hour).max(0.0));
        let gated = |kind, on_kind, hour| {
            let on = value(on_kind, hour) > 0.5;
            (if on { power(kind, hour) } else { Power(0.0) }, on)
        };

        let decisions = (0..self.hours)
            .map(|hour| {
                let (diesel, diesel_on) = gated(VariableKind::Diesel, VariableKind::DieselOn, hour);
                let (electrolyzer, electrolyzer_on) = gated(
                    VariableKind::Electrolyzer,
                    VariableKind::ElectrolyzerOn,
                    hour,
                );
                let (fuel_cell, fuel_cell_on) =
                    gated(VariableKind::FuelCell, VariableKind::FuelCellOn, hour);

                Decision {
                    import: power(VariableKind::Import, hour),
                    export: power(VariableKind::Export, hour),
                    diesel,
                    electrolyzer,
                    fuel_cell,
                    curtailment: power(VariableKind::Curtailment, hour),
                    diesel_on,
                    electrolyzer_on,
                    fuel_cell_on,
                }
            })
            .collect();
        let storage = (0..=self.hours)
            .map(|hour| Energy(value(VariableKind::StorageLevel, hour)))
            .collect();

        WindowPlan {
            decisions,
            storage,
            objective: Money(self.problem.objective_value(values)),
        }
    }
}

/// Add variables to the window problem.
///
/// Costs are per time step, so every cost coefficient is multiplied by the step length.
fn add_variables(
    problem: &mut Problem,
    system: &SystemConfig,
    window: &[ForecastRecord],
    initial_storage: Energy,
    grid_exchange: GridExchange,
) -> VariableMap {
    let mut variables = VariableMap::default();
    let dt = system.timestep.value();
    let diesel_cost = system.diesel_cost().value();

    for (hour, record) in window.iter().enumerate() {
        let mut add = |kind, cost: f64, max: Power| {
            let col = problem.add_column(cost * dt, 0.0..=max.value());
            variables.insert(kind, hour, col);
        };
        add(
            VariableKind::Import,
            record.import_price.value(),
            system.import_max,
        );
        add(
            VariableKind::Export,
            -record.export_price.value(),
            system.export_max,
        );
        add(VariableKind::Diesel, diesel_cost, system.diesel_nominal);
        add(
            VariableKind::Electrolyzer,
            0.0,
            system.electrolyzer_nominal,
        );
        add(VariableKind::FuelCell, 0.0, system.fuel_cell_nominal);
        // Curtailment absorbs any surplus, including output forced by a technical minimum
        add(
            VariableKind::Curtailment,
            system.curtailment_penalty.value(),
            Power(f64::INFINITY),
        );

        let mut binaries = vec![
            VariableKind::DieselOn,
            VariableKind::ElectrolyzerOn,
            VariableKind::FuelCellOn,
        ];
        if grid_exchange == GridExchange::Exclusive {
            binaries.extend([VariableKind::ImportOn, VariableKind::ExportOn]);
        }
        for kind in binaries {
            variables.insert(kind, hour, problem.add_binary_column(0.0));
        }
    }

    // The first level is fixed; the rest are free within the storage capacity
    let initial = initial_storage.value();
    variables.insert(
        VariableKind::StorageLevel,
        0,
        problem.add_column(0.0, initial..=initial),
    );
    for hour in 1..=window.len() {
        let col = problem.add_column(0.0, 0.0..=system.storage_capacity.value());
        variables.insert(VariableKind::StorageLevel, hour, col);
    }

    variables
}
