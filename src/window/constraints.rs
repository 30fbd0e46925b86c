//! Code for adding constraints to the window problem.
use super::{VariableKind, VariableMap};
use crate::forecast::ForecastRecord;
use crate::model::{GatedUnit, SystemConfig};
use crate::problem::Problem;

/// Add every constraint of the window problem.
///
/// # Arguments:
///
/// * `problem` - The optimisation problem
/// * `variables` - The variables in the problem
/// * `system` - The energy district
/// * `window` - The forecast for each hour of the window
pub fn add_window_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    system: &SystemConfig,
    window: &[ForecastRecord],
) {
    for (hour, record) in window.iter().enumerate() {
        add_power_balance_constraint(problem, variables, hour, record);

        add_gated_unit_constraints(
            problem,
            variables,
            hour,
            VariableKind::Diesel,
            VariableKind::DieselOn,
            system.diesel(),
        );
        add_gated_unit_constraints(
            problem,
            variables,
            hour,
            VariableKind::Electrolyzer,
            VariableKind::ElectrolyzerOn,
            system.electrolyzer(),
        );
        add_gated_unit_constraints(
            problem,
            variables,
            hour,
            VariableKind::FuelCell,
            VariableKind::FuelCellOn,
            system.fuel_cell(),
        );

        add_grid_exclusivity_constraints(problem, variables, system, hour);

        add_storage_dynamics_constraint(problem, variables, system, hour);
    }
}

/// Supply must equal demand exactly in every hour:
///
/// import + diesel + fuel_cell - electrolyzer - export - curtailment = load - pv - wind
fn add_power_balance_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    hour: usize,
    record: &ForecastRecord,
) {
    let residual_load = (record.load - record.renewables()).value();
    problem.add_row(
        residual_load..=residual_load,
        [
            (variables.get(VariableKind::Import, hour), 1.0),
            (variables.get(VariableKind::Diesel, hour), 1.0),
            (variables.get(VariableKind::FuelCell, hour), 1.0),
            (variables.get(VariableKind::Electrolyzer, hour), -1.0),
            (variables.get(VariableKind::Export, hour), -1.0),
            (variables.get(VariableKind::Curtailment, hour), -1.0),
        ],
    );
}

/// A unit which is on runs between its minimum and nominal power; a unit which is off runs at zero
fn add_gated_unit_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    hour: usize,
    power_kind: VariableKind,
    on_kind: VariableKind,
    unit: GatedUnit,
) {
    let power = variables.get(power_kind, hour);
    let on = variables.get(on_kind, hour);

    // power <= nominal * on
    problem.add_row(
        f64::NEG_INFINITY..=0.0,
        [(power, 1.0), (on, -unit.nominal.value())],
    );

    // power >= min * on
    problem.add_row(
        0.0..=f64::INFINITY,
        [(power, 1.0), (on, -unit.minimum.value())],
    );
}

/// Import and export are gated by binaries, at most one of which can be on.
///
/// Only applies when the model was built with the exclusive grid exchange policy.
fn add_grid_exclusivity_constraints(
    problem: &mut Problem,
    variables: &VariableMap,
    system: &SystemConfig,
    hour: usize,
) {
    let (Some(import_on), Some(export_on)) = (
        variables.try_get(VariableKind::ImportOn, hour),
        variables.try_get(VariableKind::ExportOn, hour),
    ) else {
        return;
    };

    problem.add_row(
        f64::NEG_INFINITY..=0.0,
        [
            (variables.get(VariableKind::Import, hour), 1.0),
            (import_on, -system.import_max.value()),
        ],
    );
    problem.add_row(
        f64::NEG_INFINITY..=0.0,
        [
            (variables.get(VariableKind::Export, hour), 1.0),
            (export_on, -system.export_max.value()),
        ],
    );
    problem.add_row(f64::NEG_INFINITY..=1.0, [(import_on, 1.0), (export_on, 1.0)]);
}

/// Links the storage level at the end of the hour to the level at its start:
///
/// soc[h+1] - soc[h] - dt * eta_ely * electrolyzer + dt / eta_fc * fuel_cell = 0
fn add_storage_dynamics_constraint(
    problem: &mut Problem,
    variables: &VariableMap,
    system: &SystemConfig,
    hour: usize,
) {
    let dt = system.timestep.value();
    problem.add_row(
        0.0..=0.0,
        [
            (variables.get(VariableKind::StorageLevel, hour + 1), 1.0),
            (variables.get(VariableKind::StorageLevel, hour), -1.0),
            (
                variables.get(VariableKind::Electrolyzer, hour),
                -dt * system.electrolyzer_efficiency.value(),
            ),
            (
                variables.get(VariableKind::FuelCell, hour),
                dt / system.fuel_cell_efficiency.value(),
            ),
        ],
    );
}
