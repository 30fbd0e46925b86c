//! Defines the `ModelParameters` struct, which represents the `[parameters]` section of
//! `model.toml`.
use crate::error::ConfigurationError;
use crate::input::check_unique_finite;
use crate::units::Energy;
use anyhow::{Result, ensure};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

macro_rules! define_param_default {
    ($name:ident, $type: ty, $value: expr) => {
        fn $name() -> $type {
            $value
        }
    };
}

define_param_default!(default_horizon, usize, 24);

/// Run parameters for the receding-horizon controller and the scenario sweep
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ModelParameters {
    /// Number of hours in each look-ahead window
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Hydrogen storage level at the start of every scenario
    #[serde(default)]
    pub initial_storage: Energy,
    /// Whether the grid connection may import and export in the same hour
    #[serde(default)]
    pub grid_exchange: GridExchange,
    /// Fuel costs to sweep over. If empty, only the fuel cost of the system is used.
    #[serde(default)]
    pub fuel_costs: Vec<f64>,
    /// Peak load levels to sweep over. If empty, the load is used unscaled.
    #[serde(default)]
    pub load_levels: Vec<f64>,
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
            initial_storage: Energy(0.0),
            grid_exchange: GridExchange::default(),
            fuel_costs: Vec::new(),
            load_levels: Vec::new(),
        }
    }
}

/// The policy for simultaneous grid import and export
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GridExchange {
    /// Import and export are mutually exclusive within an hour
    #[default]
    #[string = "exclusive"]
    Exclusive,
    /// Import and export may both be non-zero within an hour
    #[string = "simultaneous"]
    Simultaneous,
}

/// Check that the `horizon` parameter is valid
fn check_horizon(horizon: usize) -> Result<()> {
    ensure!(
        horizon > 0,
        ConfigurationError::new("horizon must be at least one hour")
    );

    Ok(())
}

/// Check that the `initial_storage` parameter is valid for the given storage capacity
fn check_initial_storage(level: Energy, capacity: Energy) -> Result<()> {
    ensure!(
        level.is_finite() && level >= Energy(0.0) && level <= capacity,
        ConfigurationError::new(format!(
            "initial_storage must be between 0 and the storage capacity ({})",
            capacity.value()
        ))
    );

    Ok(())
}

/// Check that a list of sweep values is valid
fn check_sweep_values(name: &str, values: &[f64], allow_zero: bool) -> Result<()> {
    ensure!(
        check_unique_finite(values),
        ConfigurationError::new(format!("{name} must be composed of unique, finite values"))
    );
    ensure!(
        values
            .iter()
            .all(|&value| if allow_zero { value >= 0.0 } else { value > 0.0 }),
        ConfigurationError::new(if allow_zero {
            format!("{name} cannot contain negative values")
        } else {
            format!("{name} must only contain values greater than zero")
        })
    );

    Ok(())
}

impl ModelParameters {
    /// Validate parameters against the storage capacity of the system
    pub fn validate(&self, storage_capacity: Energy) -> Result<()> {
        // horizon
        check_horizon(self.horizon)?;

        // initial_storage
        check_initial_storage(self.initial_storage, storage_capacity)?;

        // fuel_costs
        check_sweep_values("fuel_costs", &self.fuel_costs, true)?;

        // load_levels
        check_sweep_values("load_levels", &self.load_levels, false)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fmt::Display;

    /// Helper function to assert validation result based on expected validity
    fn assert_validation_result<T, U: Display>(
        result: Result<T>,
        expected_valid: bool,
        value: U,
        expected_error_fragment: &str,
    ) {
        if expected_valid {
            assert!(
                result.is_ok(),
                "Expected value {} to be valid, but got error: {:?}",
                value,
                result.err()
            );
        } else {
            assert!(
                result.is_err(),
                "Expected value {value} to be invalid, but it was accepted",
            );
            let error_message = result.err().unwrap().to_string();
            assert!(
                error_message.contains(expected_error_fragment),
                "Error message should mention the validation constraint, got: {error_message}",
            );
        }
    }

    #[test]
    fn test_defaults() {
        let params: ModelParameters = toml::from_str("").unwrap();
        assert_eq!(params, ModelParameters::default());
        assert_eq!(params.horizon, 24);
        assert_eq!(params.grid_exchange, GridExchange::Exclusive);
    }

    #[rstest]
    #[case("exclusive", GridExchange::Exclusive)]
    #[case("simultaneous", GridExchange::Simultaneous)]
    #[case("Simultaneous", GridExchange::Simultaneous)]
    fn test_grid_exchange_is_case_insensitive(#[case] label: &str, #[case] expected: GridExchange) {
        let params: ModelParameters =
            toml::from_str(&format!("grid_exchange = \"{label}\"")).unwrap();
        assert_eq!(params.grid_exchange, expected);
        assert!(toml::from_str::<ModelParameters>("grid_exchange = \"sometimes\"").is_err());
    }

    #[test]
    fn test_deserialise_grid_exchange() {
        let params: ModelParameters = toml::from_str("grid_exchange = \"simultaneous\"").unwrap();
        assert_eq!(params.grid_exchange, GridExchange::Simultaneous);
        assert!(toml::from_str::<ModelParameters>("grid_exchange = \"sometimes\"").is_err());
    }

    #[rstest]
    #[case(1, true)]
    #[case(24, true)]
    #[case(0, false)]
    fn test_check_horizon(#[case] value: usize, #[case] expected_valid: bool) {
        assert_validation_result(
            check_horizon(value),
            expected_valid,
            value,
            "horizon must be at least one hour",
        );
    }

    #[rstest]
    #[case(0.0, true)]
    #[case(5.0, true)]
    #[case(10.0, true)] // Exactly full
    #[case(10.5, false)]
    #[case(-1.0, false)]
    #[case(f64::NAN, false)]
    fn test_check_initial_storage(#[case] value: f64, #[case] expected_valid: bool) {
        assert_validation_result(
            check_initial_storage(Energy(value), Energy(10.0)),
            expected_valid,
            value,
            "initial_storage must be between 0 and the storage capacity (10)",
        );
    }

    #[test]
    fn test_check_sweep_values() {
        assert!(check_sweep_values("fuel_costs", &[], true).is_ok());
        assert!(check_sweep_values("fuel_costs", &[0.0, 450.0], true).is_ok());
        assert!(check_sweep_values("fuel_costs", &[450.0, 450.0], true).is_err());
        assert!(check_sweep_values("fuel_costs", &[-1.0], true).is_err());
        assert!(check_sweep_values("load_levels", &[0.0], false).is_err());
        assert!(check_sweep_values("load_levels", &[f64::INFINITY], false).is_err());
    }

    #[test]
    fn test_validate_error_is_typed() {
        let params = ModelParameters {
            horizon: 0,
            ..ModelParameters::default()
        };
        let err = params.validate(Energy(10.0)).unwrap_err();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());
    }
}
