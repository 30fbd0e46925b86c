//! Fixtures for tests
use crate::forecast::{Forecast, ForecastRecord};
use crate::model::{Model, ModelParameters, SystemConfig};
use crate::solver::{SolverChain, SolverConfig, SolverKind, SolverOptions};
use crate::units::{Dimensionless, Energy, Hours, MoneyPerEnergy, Power};
use rstest::fixture;
use std::path::PathBuf;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// A small district with every kind of unit
#[fixture]
pub fn system() -> SystemConfig {
    SystemConfig {
        pv_nominal: Power(10.0),
        wind_nominal: Power(10.0),
        import_max: Power(20.0),
        export_max: Power(10.0),
        electrolyzer_nominal: Power(4.0),
        electrolyzer_min: Power(1.0),
        electrolyzer_efficiency: Dimensionless(0.7),
        fuel_cell_nominal: Power(3.0),
        fuel_cell_min: Power(0.5),
        fuel_cell_efficiency: Dimensionless(0.5),
        diesel_nominal: Power(5.0),
        diesel_min: Power(1.5),
        diesel_efficiency: Dimensionless(0.35),
        storage_capacity: Energy(20.0),
        fuel_cost: MoneyPerEnergy(450.0),
        curtailment_penalty: MoneyPerEnergy(1.0),
        timestep: Hours(1.0),
    }
}

/// An hour with no renewables, 10 MW of load and expensive imports
fn flat_record() -> ForecastRecord {
    ForecastRecord {
        pv: Power(0.0),
        wind: Power(0.0),
        load: Power(10.0),
        import_price: MoneyPerEnergy(500.0),
        export_price: MoneyPerEnergy(0.0),
    }
}

/// A full day of flat forecast
#[fixture]
pub fn flat_window() -> Vec<ForecastRecord> {
    vec![flat_record(); 24]
}

/// A flat forecast somewhat longer than a day, so that the last windows are truncated
#[fixture]
pub fn flat_forecast() -> Forecast {
    Forecast::from_records(vec![flat_record(); 30])
}

/// A solver chain with only HiGHS
#[fixture]
pub fn solver_chain() -> SolverChain {
    SolverChain::from_kinds(&[SolverKind::Highs], &SolverOptions::default())
}

#[fixture]
pub fn model(system: SystemConfig, flat_forecast: Forecast) -> Model {
    Model {
        model_path: PathBuf::new(),
        system,
        parameters: ModelParameters {
            horizon: 6,
            ..ModelParameters::default()
        },
        solver: SolverConfig {
            order: vec![SolverKind::Highs],
            ..SolverConfig::default()
        },
        forecast: flat_forecast,
    }
}
