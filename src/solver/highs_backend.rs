//! The HiGHS solver backend.
use super::{Solver, SolverOptions, SolverStatus};
use crate::problem::Problem;
use highs::{HighsModelStatus, RowProblem, Sense};

/// Solves window problems with the HiGHS MIP solver
pub struct HighsSolver {
    options: SolverOptions,
}

impl HighsSolver {
    /// Create a new [`HighsSolver`]
    pub fn new(options: SolverOptions) -> Self {
        Self { options }
    }
}

impl Solver for HighsSolver {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverStatus> {
        let mut highs_problem = RowProblem::default();

        // Columns are added in the same order, so HiGHS column indices match ours
        let cols: Vec<_> = problem
            .columns()
            .iter()
            .map(|col| {
                if col.integer {
                    highs_problem.add_integer_column(col.cost, col.lower..=col.upper)
                } else {
                    highs_problem.add_column(col.cost, col.lower..=col.upper)
                }
            })
            .collect();
        for row in problem.rows() {
            highs_problem.add_row(
                row.lower..=row.upper,
                row.terms
                    .iter()
                    .map(|&(col, coeff)| (cols[col.index()], coeff)),
            );
        }

        let mut model = highs_problem.optimise(Sense::Minimise);

        // HiGHS writes to stdout by default, bypassing our logger
        model.set_option("output_flag", false);
        model.set_option("mip_rel_gap", self.options.mip_rel_gap);
        if let Some(time_limit) = self.options.time_limit {
            model.set_option("time_limit", time_limit);
        }

        let solved = model
            .try_solve()
            .map_err(|status| SolverStatus::Failed(format!("{status:?}")))?;
        match solved.status() {
            HighsModelStatus::Optimal => Ok(solved.get_solution().columns().to_vec()),
            // No window objective is unbounded below, so this can only mean infeasible
            HighsModelStatus::Infeasible | HighsModelStatus::UnboundedOrInfeasible => {
                Err(SolverStatus::Infeasible)
            }
            HighsModelStatus::ReachedTimeLimit => Err(SolverStatus::TimedOut),
            status => Err(SolverStatus::Failed(format!("{status:?}"))),
        }
    }
}
