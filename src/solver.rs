//! Solver backends for window problems and the fallback policy between them.
//!
//! Each backend is an adapter behind the [`Solver`] trait. A [`SolverChain`] holds them in order of
//! preference and tries each in turn until one returns an optimal solution.
use crate::error::{ConfigurationError, SolverAttempt};
use crate::problem::Problem;
use anyhow::{Result, ensure};
use derive_more::Display;
use log::{debug, warn};
use serde::Deserialize;
use serde_string_enum::DeserializeLabeledStringEnum;

mod highs_backend;
mod microlp_backend;
pub use highs_backend::HighsSolver;
pub use microlp_backend::MicrolpSolver;

/// The largest bound or constraint violation accepted in a returned solution.
///
/// Anything derived from an accepted solution (e.g. the committed storage level) is held to the
/// same tolerance.
pub const SOLUTION_TOLERANCE: f64 = 1e-5;

/// Why a solver did not return an optimal solution
#[derive(Debug, Display, Clone, PartialEq)]
pub enum SolverStatus {
    /// The problem has no feasible solution
    #[display("infeasible")]
    Infeasible,
    /// The solver hit its time limit before proving optimality
    #[display("time limit reached")]
    TimedOut,
    /// The solver backend could not be invoked at all
    #[display("unavailable ({_0})")]
    Unavailable(String),
    /// Any other failure reported by the backend
    #[display("failed ({_0})")]
    Failed(String),
}

/// A mixed-integer solver backend
pub trait Solver {
    /// A short name for the backend, used in logs and diagnostics
    fn name(&self) -> &'static str;

    /// Solve the problem to optimality.
    ///
    /// # Returns
    ///
    /// The value of every column, in column order.
    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverStatus>;
}

/// The solver backends which can be named in the model file
#[derive(DeserializeLabeledStringEnum, Debug, Clone, Copy, PartialEq)]
pub enum SolverKind {
    /// The HiGHS solver
    #[string = "highs"]
    Highs,
    /// The pure-Rust microlp solver
    #[string = "microlp"]
    Microlp,
}

/// Options passed to the solver backends
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOptions {
    /// Time limit per window solve, in seconds
    pub time_limit: Option<f64>,
    /// Relative MIP optimality gap at which to stop branch-and-bound
    pub mip_rel_gap: f64,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            time_limit: Some(60.0),
            mip_rel_gap: 1e-6,
        }
    }
}

fn default_order() -> Vec<SolverKind> {
    vec![SolverKind::Highs, SolverKind::Microlp]
}

fn default_time_limit() -> f64 {
    60.0
}

fn default_mip_rel_gap() -> f64 {
    1e-6
}

/// The `[solver]` section of `model.toml`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Backends to try, in order of preference
    #[serde(default = "default_order")]
    pub order: Vec<SolverKind>,
    /// Time limit per window solve, in seconds (not supported by every backend)
    #[serde(default = "default_time_limit")]
    pub time_limit: f64,
    /// Relative MIP optimality gap
    #[serde(default = "default_mip_rel_gap")]
    pub mip_rel_gap: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            order: default_order(),
            time_limit: default_time_limit(),
            mip_rel_gap: default_mip_rel_gap(),
        }
    }
}

impl SolverConfig {
    /// Check the solver settings
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.order.is_empty(),
            ConfigurationError::new("solver order cannot be empty")
        );
        ensure!(
            self.time_limit.is_finite() && self.time_limit > 0.0,
            ConfigurationError::new("solver time_limit must be a finite number > 0")
        );
        ensure!(
            self.mip_rel_gap.is_finite() && self.mip_rel_gap >= 0.0,
            ConfigurationError::new("solver mip_rel_gap must be a finite number >= 0")
        );

        Ok(())
    }

    /// The options to pass to each backend
    pub fn options(&self) -> SolverOptions {
        SolverOptions {
            time_limit: Some(self.time_limit),
            mip_rel_gap: self.mip_rel_gap,
        }
    }

    /// Create the fallback chain described by this configuration
    pub fn chain(&self) -> SolverChain {
        SolverChain::from_kinds(&self.order, &self.options())
    }
}

/// A ranked list of solver backends
pub struct SolverChain {
    solvers: Vec<Box<dyn Solver>>,
}

impl SolverChain {
    /// Create a chain from explicit backends, tried in the given order
    pub fn new(solvers: Vec<Box<dyn Solver>>) -> Self {
        assert!(!solvers.is_empty(), "Solver chain cannot be empty");
        Self { solvers }
    }

    /// Create a chain of the named backends
    pub fn from_kinds(kinds: &[SolverKind], options: &SolverOptions) -> Self {
        let solvers = kinds
            .iter()
            .map(|kind| -> Box<dyn Solver> {
                match kind {
                    SolverKind::Highs => Box::new(HighsSolver::new(options.clone())),
                    SolverKind::Microlp => Box::new(MicrolpSolver),
                }
            })
            .collect();

        Self::new(solvers)
    }

    /// Names of the backends, in order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.solvers.iter().map(|solver| solver.name())
    }

    /// Try each backend in turn until one solves the problem.
    ///
    /// Solutions which violate the problem's constraints beyond numeric tolerance are rejected,
    /// and the next backend is tried.
    ///
    /// # Returns
    ///
    /// The column values from the first successful backend, or the status reported by every
    /// backend if none succeeded.
    pub fn solve(&self, problem: &Problem) -> Result<Vec<f64>, Vec<SolverAttempt>> {
        let mut attempts = Vec::new();
        for solver in &self.solvers {
            let status = match solver.solve(problem) {
                Ok(values) => {
                    let violation = problem.max_violation(&values);
                    if violation <= SOLUTION_TOLERANCE {
                        debug!("Window solved with {}", solver.name());
                        return Ok(values);
                    }

                    SolverStatus::Failed(format!(
                        "solution violates constraints by {violation:e}"
                    ))
                }
                Err(status) => status,
            };

            warn!(
                "Solver {} did not solve the window: {status}",
                solver.name()
            );
            attempts.push(SolverAttempt {
                solver: solver.name(),
                status,
            });
        }

        Err(attempts)
    }
}
