//! Code for reading the hourly forecast of renewable output, load and grid prices.
use crate::error::DataGapError;
use crate::input::{input_err_msg, read_csv};
use crate::model::SystemConfig;
use crate::units::{Dimensionless, MoneyPerEnergy, Power};
use anyhow::{Context, Result, ensure};
use serde::Deserialize;
use std::path::Path;

const FORECAST_FILE_NAME: &str = "forecast.csv";

/// One row of `forecast.csv`
#[derive(Debug, Clone, Deserialize, PartialEq)]
struct ForecastRaw {
    hour: usize,
    pv: f64,
    wind: f64,
    load: f64,
    import_price: f64,
    export_price: f64,
}

/// The forecast for a single hour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRecord {
    /// PV generation
    pub pv: Power,
    /// Wind generation
    pub wind: Power,
    /// Electrical load
    pub load: Power,
    /// Price paid for imported electricity
    pub import_price: MoneyPerEnergy,
    /// Price received for exported electricity
    pub export_price: MoneyPerEnergy,
}

impl ForecastRecord {
    /// Total renewable generation
    pub fn renewables(&self) -> Power {
        self.pv + self.wind
    }
}

/// An hourly forecast covering the whole simulation period
#[derive(Debug, Clone, PartialEq)]
pub struct Forecast {
    records: Vec<ForecastRecord>,
}

impl Forecast {
    /// Read the forecast from `forecast.csv` in the model directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    /// * `system` - The system, whose nominal capacities scale the renewable profiles
    pub fn from_path<P: AsRef<Path>>(model_dir: P, system: &SystemConfig) -> Result<Self> {
        let file_path = model_dir.as_ref().join(FORECAST_FILE_NAME);
        let raw = read_csv::<ForecastRaw>(&file_path)?;
        Self::from_raw(raw, system).with_context(|| input_err_msg(&file_path))
    }

    fn from_raw(raw: Vec<ForecastRaw>, system: &SystemConfig) -> Result<Self> {
        let mut records = Vec::with_capacity(raw.len());
        for (expected_hour, row) in raw.into_iter().enumerate() {
            ensure!(
                row.hour == expected_hour,
                DataGapError::new(format!(
                    "expected hour {expected_hour} but found hour {}",
                    row.hour
                ))
            );

            let values = [
                row.pv,
                row.wind,
                row.load,
                row.import_price,
                row.export_price,
            ];
            ensure!(
                values.iter().all(|value| value.is_finite()),
                DataGapError::new(format!("hour {} contains non-finite values", row.hour))
            );
            ensure!(
                (0.0..=1.0).contains(&row.pv) && (0.0..=1.0).contains(&row.wind),
                "pv and wind must be between 0 and 1 (hour {})",
                row.hour
            );
            ensure!(row.load >= 0.0, "load cannot be negative (hour {})", row.hour);

            records.push(ForecastRecord {
                pv: system.pv_nominal * Dimensionless(row.pv),
                wind: system.wind_nominal * Dimensionless(row.wind),
                load: Power(row.load),
                import_price: MoneyPerEnergy(row.import_price),
                export_price: MoneyPerEnergy(row.export_price),
            });
        }

        Ok(Self { records })
    }

    /// Create a forecast directly from hourly records
    pub fn from_records(records: Vec<ForecastRecord>) -> Self {
        Self { records }
    }

    /// The number of hours covered by the forecast
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the forecast covers no hours at all
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every hourly record, in order
    pub fn records(&self) -> &[ForecastRecord] {
        &self.records
    }

    /// Get up to `count` consecutive records starting at hour `start`.
    ///
    /// The window is truncated at the end of the forecast. It is an error for `start` to lie
    /// outside the forecast.
    pub fn window(&self, start: usize, count: usize) -> Result<&[ForecastRecord]> {
        ensure!(
            start < self.records.len(),
            DataGapError::new(format!(
                "hour {start} is outside the forecast, which covers {} hours",
                self.records.len()
            ))
        );

        let end = start.saturating_add(count).min(self.records.len());
        Ok(&self.records[start..end])
    }

    /// A copy of the forecast with the load scaled so that its peak equals `level`.
    ///
    /// A load series which is zero throughout is left unchanged.
    pub fn with_peak_load(&self, level: Power) -> Self {
        let peak = self
            .records
            .iter()
            .map(|record| record.load)
            .fold(Power(0.0), Power::max);
        if peak <= Power(0.0) {
            return self.clone();
        }

        let factor = level / peak;
        let records = self
            .records
            .iter()
            .map(|record| ForecastRecord {
                load: record.load * factor,
                ..*record
            })
            .collect();

        Self { records }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, system};
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    fn raw(hour: usize, load: f64) -> ForecastRaw {
        ForecastRaw {
            hour,
            pv: 0.5,
            wind: 0.25,
            load,
            import_price: 500.0,
            export_price: 50.0,
        }
    }

    #[fixture]
    fn forecast(system: SystemConfig) -> Forecast {
        Forecast::from_raw((0..5).map(|hour| raw(hour, hour as f64)).collect(), &system).unwrap()
    }

    #[rstest]
    fn test_from_raw_scales_renewables(system: SystemConfig) {
        let forecast = Forecast::from_raw(vec![raw(0, 3.0)], &system).unwrap();
        let record = forecast.records()[0];
        assert_eq!(record.pv, system.pv_nominal * Dimensionless(0.5));
        assert_eq!(record.wind, system.wind_nominal * Dimensionless(0.25));
        assert_eq!(record.load, Power(3.0));
    }

    #[rstest]
    fn test_from_raw_gap(system: SystemConfig) {
        assert_error!(
            Forecast::from_raw(vec![raw(0, 1.0), raw(2, 1.0)], &system),
            "Forecast data unavailable: expected hour 1 but found hour 2"
        );
    }

    #[rstest]
    fn test_from_raw_non_finite(system: SystemConfig) {
        let err = Forecast::from_raw(vec![raw(0, f64::NAN)], &system).unwrap_err();
        assert!(err.downcast_ref::<DataGapError>().is_some());
    }

    #[rstest]
    #[case::pv_too_large(ForecastRaw { pv: 1.5, ..raw(0, 1.0) })]
    #[case::negative_wind(ForecastRaw { wind: -0.1, ..raw(0, 1.0) })]
    #[case::negative_load(raw(0, -1.0))]
    fn test_from_raw_out_of_range(system: SystemConfig, #[case] row: ForecastRaw) {
        assert!(Forecast::from_raw(vec![row], &system).is_err());
    }

    #[rstest]
    fn test_window(forecast: Forecast) {
        assert_eq!(forecast.window(0, 3).unwrap().len(), 3);
        assert_eq!(forecast.window(1, 3).unwrap()[0].load, Power(1.0));

        // Truncated at the end
        assert_eq!(forecast.window(3, 24).unwrap().len(), 2);
        assert_eq!(forecast.window(4, 24).unwrap().len(), 1);
    }

    #[rstest]
    fn test_window_outside(forecast: Forecast) {
        assert_error!(
            forecast.window(5, 24),
            "Forecast data unavailable: hour 5 is outside the forecast, which covers 5 hours"
        );
    }

    #[rstest]
    fn test_with_peak_load(forecast: Forecast) {
        let scaled = forecast.with_peak_load(Power(8.0));
        let loads: Vec<_> = scaled.records().iter().map(|r| r.load.value()).collect();
        for (load, expected) in loads.iter().zip([0.0, 2.0, 4.0, 6.0, 8.0]) {
            assert_approx_eq!(f64, *load, expected);
        }
        assert_eq!(scaled.records()[0].pv, forecast.records()[0].pv);
    }

    #[rstest]
    fn test_with_peak_load_zero(system: SystemConfig) {
        let forecast = Forecast::from_raw(vec![raw(0, 0.0), raw(1, 0.0)], &system).unwrap();
        assert_eq!(forecast.with_peak_load(Power(10.0)), forecast);
    }

    #[rstest]
    fn test_from_path(system: SystemConfig) {
        let dir = tempdir().unwrap();
        {
            let mut file = File::create(dir.path().join(FORECAST_FILE_NAME)).unwrap();
            writeln!(
                file,
                "hour,pv,wind,load,import_price,export_price\n0,0,1,4,500,50\n1,1,0,5,450,40"
            )
            .unwrap();
        }

        let forecast = Forecast::from_path(dir.path(), &system).unwrap();
        assert_eq!(forecast.len(), 2);
        assert_eq!(forecast.records()[1].pv, system.pv_nominal);
        assert_eq!(forecast.records()[1].import_price, MoneyPerEnergy(450.0));
    }
}
