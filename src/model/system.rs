//! Defines the [`SystemConfig`] struct, the nameplate and economic data of the energy district.
use crate::error::ConfigurationError;
use crate::input::deserialise_proportion_nonzero;
use crate::units::{Dimensionless, Energy, Hours, MoneyPerEnergy, Power};
use anyhow::{Result, ensure};
use serde::Deserialize;

/// A unit with an on/off technical minimum
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GatedUnit {
    /// Power when running at full output
    pub nominal: Power,
    /// Minimum power while running
    pub minimum: Power,
}

/// The immutable description of the energy district.
///
/// Read from the `[system]` section of `model.toml`. Construct with [`SystemConfig::validate`]
/// before use; the window model assumes the checks there have passed.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SystemConfig {
    /// Nominal capacity of the PV plant
    pub pv_nominal: Power,
    /// Nominal capacity of the wind plant
    pub wind_nominal: Power,
    /// Maximum power which can be imported from the grid
    pub import_max: Power,
    /// Maximum power which can be exported to the grid
    pub export_max: Power,
    /// Nominal electrical input of the electrolyzer
    pub electrolyzer_nominal: Power,
    /// Minimum electrical input of the electrolyzer while running
    pub electrolyzer_min: Power,
    /// Fraction of electrolyzer input stored as hydrogen energy
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub electrolyzer_efficiency: Dimensionless,
    /// Nominal electrical output of the fuel cell
    pub fuel_cell_nominal: Power,
    /// Minimum electrical output of the fuel cell while running
    pub fuel_cell_min: Power,
    /// Fraction of hydrogen energy converted to electricity by the fuel cell
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub fuel_cell_efficiency: Dimensionless,
    /// Nominal output of the diesel generator
    pub diesel_nominal: Power,
    /// Minimum output of the diesel generator while running
    pub diesel_min: Power,
    /// Fraction of fuel energy converted to electricity by the diesel generator
    #[serde(deserialize_with = "deserialise_proportion_nonzero")]
    pub diesel_efficiency: Dimensionless,
    /// Capacity of the hydrogen storage
    pub storage_capacity: Energy,
    /// Cost of diesel fuel per unit of fuel energy
    pub fuel_cost: MoneyPerEnergy,
    /// Penalty applied to curtailed energy
    #[serde(default = "default_curtailment_penalty")]
    pub curtailment_penalty: MoneyPerEnergy,
    /// Length of one time step
    #[serde(default = "default_timestep")]
    pub timestep: Hours,
}

fn default_curtailment_penalty() -> MoneyPerEnergy {
    MoneyPerEnergy::new(1.0)
}

fn default_timestep() -> Hours {
    Hours::new(1.0)
}

/// Check that a power value is finite and non-negative
fn check_power(name: &str, value: Power) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Power(0.0),
        ConfigurationError::new(format!("{name} must be a finite number >= 0"))
    );

    Ok(())
}

/// Check the nominal and minimum powers of a gated unit
fn check_gated_unit(name: &str, nominal: Power, minimum: Power) -> Result<()> {
    check_power(&format!("{name}_nominal"), nominal)?;
    check_power(&format!("{name}_min"), minimum)?;
    ensure!(
        minimum <= nominal,
        ConfigurationError::new(format!(
            "{name}_min ({}) cannot be greater than {name}_nominal ({})",
            minimum.value(),
            nominal.value()
        ))
    );

    Ok(())
}

/// Check that an efficiency is in (0, 1]
fn check_efficiency(name: &str, value: Dimensionless) -> Result<()> {
    ensure!(
        value > Dimensionless(0.0) && value <= Dimensionless(1.0),
        ConfigurationError::new(format!("{name} must be > 0 and <= 1"))
    );

    Ok(())
}

/// Check that a cost is finite and non-negative
fn check_cost(name: &str, value: MoneyPerEnergy) -> Result<()> {
    ensure!(
        value.is_finite() && value >= MoneyPerEnergy(0.0),
        ConfigurationError::new(format!("{name} must be a finite number >= 0"))
    );

    Ok(())
}

impl SystemConfig {
    /// Check every invariant of the configuration
    pub fn validate(&self) -> Result<()> {
        check_power("pv_nominal", self.pv_nominal)?;
        check_power("wind_nominal", self.wind_nominal)?;
        check_power("import_max", self.import_max)?;
        check_power("export_max", self.export_max)?;
        check_gated_unit(
            "electrolyzer",
            self.electrolyzer_nominal,
            self.electrolyzer_min,
        )?;
        check_gated_unit("fuel_cell", self.fuel_cell_nominal, self.fuel_cell_min)?;
        check_gated_unit("diesel", self.diesel_nominal, self.diesel_min)?;
        check_efficiency("electrolyzer_efficiency", self.electrolyzer_efficiency)?;
        check_efficiency("fuel_cell_efficiency", self.fuel_cell_efficiency)?;
        check_efficiency("diesel_efficiency", self.diesel_efficiency)?;
        ensure!(
            self.storage_capacity.is_finite() && self.storage_capacity > Energy(0.0),
            ConfigurationError::new("storage_capacity must be a finite number > 0")
        );
        check_cost("fuel_cost", self.fuel_cost)?;
        check_cost("curtailment_penalty", self.curtailment_penalty)?;
        ensure!(
            self.timestep.is_finite() && self.timestep > Hours(0.0),
            ConfigurationError::new("timestep must be a finite number > 0")
        );

        Ok(())
    }

    /// The diesel generator's power limits
    pub fn diesel(&self) -> GatedUnit {
        GatedUnit {
            nominal: self.diesel_nominal,
            minimum: self.diesel_min,
        }
    }

    /// The electrolyzer's power limits
    pub fn electrolyzer(&self) -> GatedUnit {
        GatedUnit {
            nominal: self.electrolyzer_nominal,
            minimum: self.electrolyzer_min,
        }
    }

    /// The fuel cell's power limits
    pub fn fuel_cell(&self) -> GatedUnit {
        GatedUnit {
            nominal: self.fuel_cell_nominal,
            minimum: self.fuel_cell_min,
        }
    }

    /// Cost of one MWh of electricity from the diesel generator
    pub fn diesel_cost(&self) -> MoneyPerEnergy {
        self.fuel_cost / self.diesel_efficiency
    }

    /// The storage level after one time step with the given electrolyzer and fuel cell powers.
    ///
    /// This is the storage dynamics equation, shared by the window model and the controller.
    pub fn next_storage_level(
        &self,
        level: Energy,
        electrolyzer: Power,
        fuel_cell: Power,
    ) -> Energy {
        let charge = electrolyzer * self.electrolyzer_efficiency;
        let discharge = fuel_cell / self.fuel_cell_efficiency;
        level + (charge - discharge) * self.timestep
    }

    /// A copy of this configuration with a different fuel cost
    pub fn with_fuel_cost(&self, fuel_cost: MoneyPerEnergy) -> Self {
        Self {
            fuel_cost,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, system};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    #[rstest]
    fn test_validate_ok(system: SystemConfig) {
        assert!(system.validate().is_ok());
    }

    #[rstest]
    fn test_validate_min_above_nominal(mut system: SystemConfig) {
        system.diesel_min = Power(5.0);
        system.diesel_nominal = Power(4.0);
        assert_error!(
            system.validate(),
            "Invalid configuration: diesel_min (5) cannot be greater than diesel_nominal (4)"
        );
    }

    #[rstest]
    fn test_validate_error_is_typed(mut system: SystemConfig) {
        system.storage_capacity = Energy(0.0);
        let err = system.validate().unwrap_err();
        assert!(err.downcast_ref::<ConfigurationError>().is_some());
    }

    #[rstest]
    #[case::negative_power(|s: &mut SystemConfig| s.import_max = Power(-1.0))]
    #[case::nan_power(|s: &mut SystemConfig| s.pv_nominal = Power(f64::NAN))]
    #[case::zero_efficiency(|s: &mut SystemConfig| s.fuel_cell_efficiency = Dimensionless(0.0))]
    #[case::efficiency_above_one(|s: &mut SystemConfig| s.diesel_efficiency = Dimensionless(1.5))]
    #[case::zero_capacity(|s: &mut SystemConfig| s.storage_capacity = Energy(0.0))]
    #[case::negative_fuel_cost(|s: &mut SystemConfig| s.fuel_cost = MoneyPerEnergy(-1.0))]
    #[case::zero_timestep(|s: &mut SystemConfig| s.timestep = Hours(0.0))]
    fn test_validate_invalid(mut system: SystemConfig, #[case] modify: fn(&mut SystemConfig)) {
        modify(&mut system);
        assert!(system.validate().is_err());
    }

    #[rstest]
    fn test_next_storage_level(system: SystemConfig) {
        // 0.7 efficient electrolyzer, 0.5 efficient fuel cell, one hour steps
        let level = system.next_storage_level(Energy(2.0), Power(2.0), Power(0.0));
        assert_approx_eq!(f64, level.value(), 3.4);
        let level = system.next_storage_level(Energy(2.0), Power(0.0), Power(0.5));
        assert_approx_eq!(f64, level.value(), 1.0);
    }

    #[rstest]
    fn test_diesel_cost(system: SystemConfig) {
        let expected = system.fuel_cost.value() / system.diesel_efficiency.value();
        assert_approx_eq!(f64, system.diesel_cost().value(), expected);
    }

    #[test]
    fn test_deserialise_defaults() {
        let system: SystemConfig = toml::from_str(
            "pv_nominal = 1.0
            wind_nominal = 1.0
            import_max = 1.0
            export_max = 1.0
            electrolyzer_nominal = 1.0
            electrolyzer_min = 0.1
            electrolyzer_efficiency = 0.7
            fuel_cell_nominal = 1.0
            fuel_cell_min = 0.1
            fuel_cell_efficiency = 0.5
            diesel_nominal = 1.0
            diesel_min = 0.3
            diesel_efficiency = 0.35
            storage_capacity = 10.0
            fuel_cost = 450.0",
        )
        .unwrap();
        assert_eq!(system.timestep, Hours(1.0));
        assert_eq!(system.curtailment_penalty, MoneyPerEnergy(1.0));
        assert!(system.validate().is_ok());
    }

    #[test]
    fn test_deserialise_bad_efficiency() {
        let result: Result<SystemConfig, _> = toml::from_str(
            "pv_nominal = 1.0
            wind_nominal = 1.0
            import_max = 1.0
            export_max = 1.0
            electrolyzer_nominal = 1.0
            electrolyzer_min = 0.1
            electrolyzer_efficiency = 70.0
            fuel_cell_nominal = 1.0
            fuel_cell_min = 0.1
            fuel_cell_efficiency = 0.5
            diesel_nominal = 1.0
            diesel_min = 0.3
            diesel_efficiency = 0.35
            storage_capacity = 10.0
            fuel_cost = 450.0",
        );
        assert!(result.is_err());
    }
}
