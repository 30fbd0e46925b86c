//! Receding-horizon dispatch scheduling for energy districts with hydrogen storage.
//!
//! For every hour of the simulation period a mixed-integer model of the next few hours is built and
//! solved, and only the first hour's decision is committed. The hydrogen storage level is carried
//! from each committed hour into the next window.
#![warn(missing_docs)]
pub mod cli;
pub mod controller;
pub mod error;
pub mod forecast;
pub mod input;
pub mod ledger;
pub mod log;
pub mod model;
pub mod output;
pub mod problem;
pub mod scenario;
pub mod settings;
pub mod solver;
pub mod summary;
pub mod units;
pub mod window;

#[cfg(test)]
mod fixture;
