//! The module responsible for writing output data to disk.
use crate::ledger::ScheduleLedger;
use crate::summary::ScenarioSummary;
use anyhow::{Context, Result, ensure};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

pub mod metadata;
pub use metadata::write_metadata;

/// The root folder in which model-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "h2dispatch_results";

/// The output file name for scenario summaries
const SUMMARY_FILE_NAME: &str = "summary.csv";

/// The output file name for the schedule of the given scenario
fn schedule_file_name(scenario_id: &str) -> String {
    format!("schedule_{scenario_id}.csv")
}

/// Get the model name from the specified directory path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the model name from the dir path. This ends up being convoluted because we need to check
    // for all possible errors. Ugh.
    let model_dir = model_dir
        .canonicalize() // canonicalise in case the user has specified "."
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory for the model.
///
/// An existing, non-empty directory is only replaced if `allow_overwrite` is set.
///
/// # Returns
///
/// Whether an existing directory was overwritten.
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if output_dir.is_dir() {
        let is_empty = fs::read_dir(output_dir)?.next().is_none();
        if is_empty {
            // Nothing to overwrite
            return Ok(false);
        }

        ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. \
            Delete the folder or pass the --overwrite command line option."
        );
        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    // Try to create the directory, with parents
    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// An object for writing scenario results to file
pub struct DataWriter {
    output_path: PathBuf,
    summary_writer: csv::Writer<File>,
}

impl DataWriter {
    /// Open the summary CSV file for writing
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn create(output_path: &Path) -> Result<Self> {
        let summary_writer = csv::Writer::from_path(output_path.join(SUMMARY_FILE_NAME))?;

        Ok(Self {
            output_path: output_path.to_path_buf(),
            summary_writer,
        })
    }

    /// Write a scenario's schedule to its own CSV file
    pub fn write_schedule(&self, scenario_id: &str, ledger: &ScheduleLedger) -> Result<()> {
        let file_path = self.output_path.join(schedule_file_name(scenario_id));
        let mut writer = csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))?;
        for entry in ledger.iter() {
            writer.serialize(entry)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Append a scenario's summary to the summary CSV file
    pub fn write_summary(&mut self, summary: &ScenarioSummary) -> Result<()> {
        self.summary_writer.serialize(summary)?;

        Ok(())
    }

    /// Flush the underlying streams
    pub fn flush(&mut self) -> Result<()> {
        self.summary_writer.flush()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{flat_window, system};
    use crate::forecast::ForecastRecord;
    use crate::ledger::LedgerEntry;
    use crate::model::SystemConfig;
    use crate::scenario::Scenario;
    use crate::units::{Energy, Money, MoneyPerEnergy};
    use crate::window::Decision;
    use itertools::{Itertools, assert_equal};
    use rstest::rstest;
    use tempfile::tempdir;

    fn ledger(window: &[ForecastRecord]) -> ScheduleLedger {
        let mut ledger = ScheduleLedger::default();
        for (hour, record) in window.iter().take(3).enumerate() {
            let decision = Decision {
                import: record.load,
                ..Decision::default()
            };
            ledger.push(LedgerEntry::new(
                hour,
                record,
                &decision,
                Energy(0.0),
                Money(5000.0),
            ));
        }
        ledger
    }

    #[rstest]
    fn test_write_schedule(flat_window: Vec<ForecastRecord>) {
        let ledger = ledger(&flat_window);
        let dir = tempdir().unwrap();

        // Write a schedule
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_schedule("base", &ledger).unwrap();
            writer.flush().unwrap();
        }

        // Read back and compare
        let records: Vec<LedgerEntry> =
            csv::Reader::from_path(dir.path().join("schedule_base.csv"))
                .unwrap()
                .into_deserialize()
                .try_collect()
                .unwrap();
        assert_equal(records, ledger.iter().cloned());
    }

    #[rstest]
    fn test_write_summary(system: SystemConfig, flat_window: Vec<ForecastRecord>) {
        let scenario = Scenario {
            id: "fuel450".into(),
            fuel_cost: MoneyPerEnergy(450.0),
            load_level: None,
        };
        let summary = ScenarioSummary::new(&scenario, &system, &ledger(&flat_window));
        let dir = tempdir().unwrap();

        // Write a summary
        {
            let mut writer = DataWriter::create(dir.path()).unwrap();
            writer.write_summary(&summary).unwrap();
            writer.flush().unwrap();
        }

        // Read back
        let mut reader = csv::Reader::from_path(dir.path().join(SUMMARY_FILE_NAME)).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(&headers[0], "scenario");
        let rows: Vec<csv::StringRecord> = reader.records().try_collect().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][0], "fuel450");
        assert_eq!(&rows[0][3], "3");
    }

    #[test]
    fn test_create_output_directory_new() {
        let dir = tempdir().unwrap();
        let output_dir = dir.path().join("a").join("b");
        assert!(!create_output_directory(&output_dir, false).unwrap());
        assert!(output_dir.is_dir());
    }

    #[test]
    fn test_create_output_directory_empty() {
        let dir = tempdir().unwrap();
        assert!(!create_output_directory(dir.path(), false).unwrap());
    }

    #[test]
    fn test_create_output_directory_overwrite() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("summary.csv");
        fs::write(&file_path, "old").unwrap();

        assert!(create_output_directory(dir.path(), false).is_err());
        assert!(file_path.exists());

        assert!(create_output_directory(dir.path(), true).unwrap());
        assert!(dir.path().is_dir());
        assert!(!file_path.exists());
    }
}
