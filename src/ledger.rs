//! The schedule ledger, the committed result of a receding-horizon run.
use crate::forecast::ForecastRecord;
use crate::units::{Energy, Money, MoneyPerEnergy, Power};
use crate::window::Decision;
use serde::{Deserialize, Serialize};

/// The committed decision for one hour, along with the forecast it was based on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Hour of the simulation period
    pub hour: usize,
    /// PV generation
    pub pv: Power,
    /// Wind generation
    pub wind: Power,
    /// Electrical load
    pub load: Power,
    /// Import price
    pub import_price: MoneyPerEnergy,
    /// Export price
    pub export_price: MoneyPerEnergy,
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
    /// Surplus power which was discarded
    pub curtailment: Power,
    /// Whether the diesel generator ran
    pub diesel_on: bool,
    /// Whether the electrolyzer ran
    pub electrolyzer_on: bool,
    /// Whether the fuel cell ran
    pub fuel_cell_on: bool,
    /// Hydrogen storage level at the end of the hour
    pub storage_after: Energy,
    /// Objective value of the window solved for this hour
    pub objective: Money,
}

impl LedgerEntry {
    /// Create an entry from a committed decision
    pub fn new(
        hour: usize,
        record: &ForecastRecord,
        decision: &Decision,
        storage_after: Energy,
        objective: Money,
    ) -> Self {
        Self {
            hour,
            pv: record.pv,
            wind: record.wind,
            load: record.load,
            import_price: record.import_price,
            export_price: record.export_price,
            import: decision.import,
            export: decision.export,
            diesel: decision.diesel,
            electrolyzer: decision.electrolyzer,
            fuel_cell: decision.fuel_cell,
            curtailment: decision.curtailment,
            diesel_on: decision.diesel_on,
            electrolyzer_on: decision.electrolyzer_on,
            fuel_cell_on: decision.fuel_cell_on,
            storage_after,
            objective,
        }
    }

    /// Supply minus demand for the hour
    pub fn balance_residual(&self) -> Power {
        self.pv + self.wind + self.import + self.diesel + self.fuel_cell
            - self.load
            - self.electrolyzer
            - self.export
            - self.curtailment
    }
}

/// An append-only record of committed decisions, indexed by hour
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleLedger {
    entries: Vec<LedgerEntry>,
}

impl ScheduleLedger {
    /// Append the entry for the next hour.
    ///
    /// # Panics
    ///
    /// If the entry is not for the hour immediately after the last one.
    pub fn push(&mut self, entry: LedgerEntry) {
        assert_eq!(
            entry.hour,
            self.entries.len(),
            "Ledger entries must be added in hour order"
        );
        self.entries.push(entry);
    }

    /// The committed entries, in hour order
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// The number of committed hours
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no hours have been committed
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the committed entries
    pub fn iter(&self) -> impl Iterator<Item = &LedgerEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::flat_window;
    use rstest::rstest;

    fn entry(hour: usize, record: &ForecastRecord) -> LedgerEntry {
        let decision = Decision {
            import: record.load,
            ..Decision::default()
        };
        LedgerEntry::new(hour, record, &decision, Energy(0.0), Money(0.0))
    }

    #[rstest]
    fn test_push(flat_window: Vec<ForecastRecord>) {
        let mut ledger = ScheduleLedger::default();
        assert!(ledger.is_empty());
        ledger.push(entry(0, &flat_window[0]));
        ledger.push(entry(1, &flat_window[1]));
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[1].hour, 1);
        assert!(ledger.iter().all(|e| e.balance_residual() == Power(0.0)));
    }

    #[rstest]
    #[should_panic(expected = "Ledger entries must be added in hour order")]
    fn test_push_out_of_order(flat_window: Vec<ForecastRecord>) {
        let mut ledger = ScheduleLedger::default();
        ledger.push(entry(1, &flat_window[0]));
    }
}
