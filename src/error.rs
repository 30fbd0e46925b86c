//! Typed errors raised by the scheduling engine.
//!
//! These travel inside [`anyhow::Error`] like any other error, but callers can downcast to them
//! when they need the structured diagnostics (e.g. the failing hour of a scenario).
use crate::solver::SolverStatus;
use derive_more::{Display, Error};
use itertools::Itertools;

/// The system configuration or run parameters are invalid or inconsistent
#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("Invalid configuration: {message}")]
pub struct ConfigurationError {
    #[error(not(source))]
    message: String,
}

impl ConfigurationError {
    /// Create a new [`ConfigurationError`]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The forecast cannot supply the requested data
#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display("Forecast data unavailable: {message}")]
pub struct DataGapError {
    #[error(not(source))]
    message: String,
}

impl DataGapError {
    /// Create a new [`DataGapError`]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The outcome of one solver's attempt at a window
#[derive(Debug, Clone, PartialEq)]
pub struct SolverAttempt {
    /// Name of the solver backend
    pub solver: &'static str,
    /// The status the solver reported
    pub status: SolverStatus,
}

/// Every solver in the fallback chain failed for a window.
///
/// The scenario run cannot continue past this hour without breaking the storage chain.
#[derive(Debug, Display, Error, Clone, PartialEq)]
#[display(
    "Scenario {scenario}: no solver could schedule hour {hour} ({})",
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.solver, attempt.status))
        .join("; ")
)]
pub struct ScheduleFailure {
    /// The scenario being run
    #[error(not(source))]
    pub scenario: String,
    /// The hour which could not be scheduled
    #[error(not(source))]
    pub hour: usize,
    /// The result of each solver that was tried, in order
    #[error(not(source))]
    pub attempts: Vec<SolverAttempt>,
}

impl ScheduleFailure {
    /// Whether at least one solver positively proved the window infeasible
    pub fn is_infeasible(&self) -> bool {
        self.attempts
            .iter()
            .any(|attempt| attempt.status == SolverStatus::Infeasible)
    }
}
