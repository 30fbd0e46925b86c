//! Code related to the example models and the CLI commands for interacting with them.
use super::{RunOpts, handle_run_command};
use crate::settings::Settings;
use anyhow::{Context, Result, bail, ensure};
use clap::Subcommand;
use include_dir::{Dir, DirEntry, include_dir};
use itertools::Itertools;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// The bundled example models, one folder each
static EXAMPLES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/demos");

/// The file in each example folder which describes it
const README_FILE_NAME: &str = "README.txt";

/// The available subcommands for managing example models.
#[derive(Subcommand)]
pub enum ExampleSubcommands {
    /// List available examples.
    List,
    /// Provide information about the specified example.
    Info {
        /// The name of the example.
        name: String,
    },
    /// Extract an example model configuration to a new directory.
    Extract {
        /// The name of the example to extract.
        name: String,
        /// The destination folder for the example.
        new_path: Option<PathBuf>,
    },
    /// Run an example.
    Run {
        /// The name of the example to run.
        name: String,
        /// Other run options
        #[command(flatten)]
        opts: RunOpts,
    },
}

impl ExampleSubcommands {
    /// Execute the supplied example subcommand
    pub fn execute(self) -> Result<()> {
        match self {
            Self::List => {
                for name in example_names() {
                    println!("{name}");
                }
            }
            Self::Info { name } => {
                let readme = example_dir(&name)?
                    .get_file(Path::new(&name).join(README_FILE_NAME))
                    .and_then(|file| file.contents_utf8())
                    .with_context(|| format!("Example {name} has no readable {README_FILE_NAME}"))?;
                println!("{readme}");
            }
            Self::Extract { name, new_path } => {
                let dest = new_path.unwrap_or_else(|| PathBuf::from(&name));
                extract_example(&name, &dest)?;
            }
            Self::Run { name, opts } => handle_example_run_command(&name, &opts, None)?,
        }

        Ok(())
    }
}

/// The names of the bundled examples
pub fn example_names() -> impl Iterator<Item = &'static str> {
    EXAMPLES_DIR
        .dirs()
        .filter_map(|dir| dir.path().file_name()?.to_str())
}

/// The bundled directory for the named example
fn example_dir(name: &str) -> Result<&'static Dir<'static>> {
    EXAMPLES_DIR.get_dir(name).with_context(|| {
        format!(
            "Example {name} not found (available: {})",
            example_names().join(", ")
        )
    })
}

/// Write the files of the named example to a new directory
pub fn extract_example(name: &str, new_path: &Path) -> Result<()> {
    let dir = example_dir(name)?;
    ensure!(
        !new_path.exists(),
        "Destination directory {} already exists",
        new_path.display()
    );

    // A model is a flat folder of files
    fs::create_dir(new_path)?;
    for entry in dir.entries() {
        let DirEntry::File(file) = entry else {
            bail!("Example {name} contains a subdirectory");
        };
        let file_name = file.path().file_name().context("Example file has no name")?;
        fs::write(new_path.join(file_name), file.contents())?;
    }

    Ok(())
}

/// Handle the `example run` command.
pub fn handle_example_run_command(
    name: &str,
    opts: &RunOpts,
    settings: Option<Settings>,
) -> Result<()> {
    let temp_dir = TempDir::new().context("Failed to create temporary directory.")?;
    let model_path = temp_dir.path().join(name);
    extract_example(name, &model_path)?;
    handle_run_command(&model_path, opts, settings)
}
