//! Checks that the committed schedules of the example model respect the physics of the district.
use float_cmp::approx_eq;
use h2dispatch::model::Model;
use h2dispatch::scenario::{run_sweep, scenarios};
use h2dispatch::solver::SOLUTION_TOLERANCE;
use h2dispatch::units::{Energy, Power};
use std::path::PathBuf;

const BALANCE_TOLERANCE: f64 = 1e-6;
const STORAGE_TOLERANCE: f64 = SOLUTION_TOLERANCE;

/// Get the path to the example model.
fn get_model_dir() -> PathBuf {
    PathBuf::from("demos/simple")
}

#[test]
fn test_schedule_properties() {
    let model = Model::from_path(get_model_dir()).unwrap();
    let chain = model.solver.chain();
    let outcomes = run_sweep(&model, &chain);
    assert_eq!(outcomes.len(), scenarios(&model).len());

    for outcome in outcomes {
        let id = &outcome.scenario.id;
        let ledger = outcome.result.unwrap();
        let system = outcome.scenario.system(&model.system);

        // One entry per hour
        assert_eq!(ledger.len(), model.forecast.len(), "{id}");

        let mut level = model.parameters.initial_storage;
        for entry in ledger.iter() {
            // Power balance
            assert!(
                entry.balance_residual().abs() <= Power(BALANCE_TOLERANCE),
                "{id}: unbalanced hour {}",
                entry.hour
            );

            // Storage bounds and dynamics
            assert!(entry.storage_after >= Energy(0.0));
            assert!(entry.storage_after <= system.storage_capacity);
            let expected = system.next_storage_level(level, entry.electrolyzer, entry.fuel_cell);
            assert!(
                approx_eq!(
                    f64,
                    entry.storage_after.value(),
                    expected.value(),
                    epsilon = STORAGE_TOLERANCE
                ),
                "{id}: storage mismatch in hour {}",
                entry.hour
            );
            level = entry.storage_after;

            // Technical minima
            for (power, on, unit) in [
                (entry.diesel, entry.diesel_on, system.diesel()),
                (entry.electrolyzer, entry.electrolyzer_on, system.electrolyzer()),
                (entry.fuel_cell, entry.fuel_cell_on, system.fuel_cell()),
            ] {
                if power > Power(0.0) {
                    assert!(on, "{id}: unit running while off in hour {}", entry.hour);
                    assert!(
                        power.value() >= unit.minimum.value() - BALANCE_TOLERANCE,
                        "{id}: unit below minimum in hour {}",
                        entry.hour
                    );
                }
                assert!(power.value() <= unit.nominal.value() + BALANCE_TOLERANCE);
            }

            // Grid limits
            assert!(entry.import.value() <= system.import_max.value() + BALANCE_TOLERANCE);
            assert!(entry.export.value() <= system.export_max.value() + BALANCE_TOLERANCE);
            assert!(
                entry.import.value() <= BALANCE_TOLERANCE
                    || entry.export.value() <= BALANCE_TOLERANCE,
                "{id}: simultaneous import and export in hour {}",
                entry.hour
            );

            assert!(entry.curtailment.value() >= 0.0);
        }
    }
}
