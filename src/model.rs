//! The model represents the static input data provided by the user.
use crate::forecast::Forecast;
use crate::input::{input_err_msg, read_toml};
use crate::solver::SolverConfig;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub mod parameters;
pub use parameters::{GridExchange, ModelParameters};
mod system;
pub use system::{GatedUnit, SystemConfig};

const MODEL_FILE_NAME: &str = "model.toml";

/// Represents the contents of `model.toml`
#[derive(Debug, Deserialize, PartialEq)]
struct ModelFile {
    system: SystemConfig,
    #[serde(default)]
    parameters: ModelParameters,
    #[serde(default)]
    solver: SolverConfig,
}

/// Model definition
#[derive(Debug)]
pub struct Model {
    /// Path to model folder
    pub model_path: PathBuf,
    /// The energy district
    pub system: SystemConfig,
    /// Controller and sweep parameters
    pub parameters: ModelParameters,
    /// Solver backends and their options
    pub solver: SolverConfig,
    /// The forecast for the whole simulation period
    pub forecast: Forecast,
}

impl Model {
    /// Read a model from the specified directory.
    ///
    /// # Arguments
    ///
    /// * `model_dir` - Folder containing model configuration files
    pub fn from_path<P: AsRef<Path>>(model_dir: P) -> Result<Model> {
        let model_dir = model_dir.as_ref();
        let file_path = model_dir.join(MODEL_FILE_NAME);
        let model_file: ModelFile = read_toml(&file_path)?;
        model_file
            .system
            .validate()
            .and_then(|()| {
                model_file
                    .parameters
                    .validate(model_file.system.storage_capacity)
            })
            .and_then(|()| model_file.solver.validate())
            .with_context(|| input_err_msg(&file_path))?;

        let forecast = Forecast::from_path(model_dir, &model_file.system)?;

        Ok(Model {
            model_path: model_dir.to_path_buf(),
            system: model_file.system,
            parameters: model_file.parameters,
            solver: model_file.solver,
            forecast,
        })
    }
}
