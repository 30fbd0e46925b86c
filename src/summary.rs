//! Key performance indicators for a completed scenario.
use crate::ledger::{LedgerEntry, ScheduleLedger};
use crate::model::SystemConfig;
use crate::scenario::Scenario;
use crate::units::{Dimensionless, Energy, Money, MoneyPerEnergy, Power};
use serde::Serialize;

/// Totals and ratios over the whole simulation period of one scenario
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioSummary {
    /// ID of the scenario
    pub scenario: String,
    /// Diesel fuel cost used
    pub fuel_cost: MoneyPerEnergy,
    /// Peak load the forecast was scaled to, if any
    pub load_level: Option<Power>,
    /// Number of committed hours
    pub hours: usize,
    /// Energy demanded by the load
    pub load: Energy,
    /// Energy generated by PV
    pub pv: Energy,
    /// Energy generated by wind
    pub wind: Energy,
    /// Energy imported from the grid
    pub import: Energy,
    /// Energy exported to the grid
    pub export: Energy,
    /// Energy generated by the diesel generator
    pub diesel: Energy,
    /// Energy consumed by the electrolyzer
    pub electrolyzer: Energy,
    /// Energy generated by the fuel cell
    pub fuel_cell: Energy,
    /// Surplus energy which was curtailed
    pub curtailment: Energy,
    /// Cost of imported energy
    pub cost_import: Money,
    /// Income from exported energy
    pub income_export: Money,
    /// Cost of diesel fuel
    pub cost_diesel: Money,
    /// Import cost minus export income plus diesel cost
    pub net_cost: Money,
    /// Number of full charge/discharge cycles of the hydrogen storage
    pub h2_equivalent_cycles: Dimensionless,
    /// Fuel cell output as a percentage of electrolyzer input
    pub h2_round_trip_percent: Dimensionless,
}

impl ScenarioSummary {
    /// Summarise a scenario's ledger.
    ///
    /// # Arguments
    ///
    /// * `scenario` - The scenario which was run
    /// * `system` - The system as configured for the scenario
    /// * `ledger` - The committed schedule
    pub fn new(scenario: &Scenario, system: &SystemConfig, ledger: &ScheduleLedger) -> Self {
        let dt = system.timestep;
        let total = |power: fn(&LedgerEntry) -> Power| -> Energy {
            ledger.iter().map(|entry| power(entry) * dt).sum()
        };

        let electrolyzer = total(|e| e.electrolyzer);
        let fuel_cell = total(|e| e.fuel_cell);
        let diesel = total(|e| e.diesel);
        let cost_import: Money = ledger
            .iter()
            .map(|entry| entry.import_price * (entry.import * dt))
            .sum();
        let income_export: Money = ledger
            .iter()
            .map(|entry| entry.export_price * (entry.export * dt))
            .sum();
        let cost_diesel = system.diesel_cost() * diesel;

        let h2_equivalent_cycles =
            (electrolyzer + fuel_cell) / (system.storage_capacity * Dimensionless(2.0));
        let h2_round_trip_percent = if electrolyzer > Energy(0.0) {
            fuel_cell / electrolyzer * Dimensionless(100.0)
        } else {
            Dimensionless(0.0)
        };

        Self {
            scenario: scenario.id.clone(),
            fuel_cost: system.fuel_cost,
            load_level: scenario.load_level,
            hours: ledger.len(),
            load: total(|e| e.load),
            pv: total(|e| e.pv),
            wind: total(|e| e.wind),
            import: total(|e| e.import),
            export: total(|e| e.export),
            diesel,
            electrolyzer,
            fuel_cell,
            curtailment: total(|e| e.curtailment),
            cost_import,
            income_export,
            cost_diesel,
            net_cost: cost_import - income_export + cost_diesel,
            h2_equivalent_cycles,
            h2_round_trip_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{flat_window, system};
    use crate::forecast::ForecastRecord;
    use crate::window::Decision;
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn scenario() -> Scenario {
        Scenario {
            id: "base".into(),
            fuel_cost: MoneyPerEnergy(450.0),
            load_level: None,
        }
    }

    #[rstest]
    fn test_summary(system: SystemConfig, flat_window: Vec<ForecastRecord>) {
        let mut ledger = ScheduleLedger::default();
        let decisions = [
            Decision {
                import: Power(12.0),
                electrolyzer: Power(2.0),
                electrolyzer_on: true,
                ..Decision::default()
            },
            Decision {
                import: Power(8.5),
                fuel_cell: Power(0.5),
                fuel_cell_on: true,
                diesel: Power(1.0),
                diesel_on: true,
                ..Decision::default()
            },
        ];
        for (hour, decision) in decisions.iter().enumerate() {
            ledger.push(LedgerEntry::new(
                hour,
                &flat_window[hour],
                decision,
                Energy(0.0),
                Money(0.0),
            ));
        }

        let summary = ScenarioSummary::new(&scenario(), &system, &ledger);
        assert_eq!(summary.hours, 2);
        assert_approx_eq!(f64, summary.load.value(), 20.0);
        assert_approx_eq!(f64, summary.import.value(), 20.5);
        assert_approx_eq!(f64, summary.cost_import.value(), 10_250.0);
        assert_approx_eq!(f64, summary.income_export.value(), 0.0);
        assert_approx_eq!(
            f64,
            summary.cost_diesel.value(),
            system.diesel_cost().value()
        );
        assert_approx_eq!(
            f64,
            summary.net_cost.value(),
            10_250.0 + system.diesel_cost().value()
        );
        assert_approx_eq!(f64, summary.h2_equivalent_cycles.value(), 2.5 / 40.0);
        assert_approx_eq!(f64, summary.h2_round_trip_percent.value(), 25.0);
    }

    #[rstest]
    fn test_summary_no_electrolysis(system: SystemConfig) {
        let summary = ScenarioSummary::new(&scenario(), &system, &ScheduleLedger::default());
        assert_eq!(summary.hours, 0);
        assert_eq!(summary.h2_round_trip_percent, Dimensionless(0.0));
        assert_eq!(summary.net_cost, Money(0.0));
    }
}
