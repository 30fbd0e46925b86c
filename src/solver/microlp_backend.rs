//! The pure-Rust microlp backend, driven through `good_lp`.
use super::{Solver, SolverStatus};
use crate::problem::Problem;

/// Solves window problems with microlp's branch-and-bound.
///
/// This backend has no time limit. If the crate is built without the `microlp` feature, it
/// reports itself as unavailable.
pub struct MicrolpSolver;

impl Solver for MicrolpSolver {
    fn name(&self) -> &'static str {
        "microlp"
    }

    #[cfg(feature = "microlp")]
    fn solve(&self, problem: &Problem) -> Result<Vec<f64>, SolverStatus> {
        use good_lp::{
            Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable,
            constraint, variable,
        };

        let mut vars = ProblemVariables::new();
        let columns: Vec<Variable> = problem
            .columns()
            .iter()
            .map(|col| {
                let mut definition = variable();
                if col.integer {
                    definition = definition.integer();
                }
                if col.lower.is_finite() {
                    definition = definition.min(col.lower);
                }
                if col.upper.is_finite() {
                    definition = definition.max(col.upper);
                }
                vars.add(definition)
            })
            .collect();

        let objective: Expression = problem
            .columns()
            .iter()
            .zip(&columns)
            .map(|(col, &var)| col.cost * var)
            .sum();
        let mut model = vars.minimise(objective).using(good_lp::microlp);

        for row in problem.rows() {
            let lhs: Expression = row
                .terms
                .iter()
                .map(|&(col, coeff)| coeff * columns[col.index()])
                .sum();
            if row.is_equality() {
                model = model.with(constraint::eq(lhs, row.lower));
                continue;
            }
            if row.lower.is_finite() {
                model = model.with(constraint::geq(lhs.clone(), row.lower));
            }
            if row.upper.is_finite() {
                model = model.with(constraint::leq(lhs, row.upper));
            }
        }

        let solution = model.solve().map_err(|err| match err {
            ResolutionError::Infeasible => SolverStatus::Infeasible,
            err => SolverStatus::Failed(err.to_string()),
        })?;

        Ok(columns.iter().map(|&var| solution.value(var)).collect())
    }

    #[cfg(not(feature = "microlp"))]
    fn solve(&self, _problem: &Problem) -> Result<Vec<f64>, SolverStatus> {
        Err(SolverStatus::Unavailable(
            "built without the `microlp` feature".into(),
        ))
    }
}
