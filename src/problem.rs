//! A solver-neutral description of a mixed-integer linear problem.
//!
//! The window model is built into a [`Problem`] once and can then be handed to any solver backend
//! in the fallback chain (see [`crate::solver`]). The problem is always a minimisation.
use std::ops::RangeInclusive;

/// Refers to a particular column (decision variable) of a [`Problem`].
///
/// Note that this type does **not** include the value of the variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Col(usize);

impl Col {
    /// The position of this column in the problem and in any solution vector
    pub fn index(self) -> usize {
        self.0
    }
}

/// The definition of a decision variable.
///
/// The cost is the variable's coefficient in the objective, i.e. the Cs in:
///
/// f = c1*x1 + c2*x2 + ...
///
/// with x1, x2... taking values between `lower` and `upper`.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// The coefficient of the variable in the objective
    pub cost: f64,
    /// The variable's minimum value (may be `-inf`)
    pub lower: f64,
    /// The variable's maximum value (may be `inf`)
    pub upper: f64,
    /// Whether the variable must take an integer value
    pub integer: bool,
}

/// A linear constraint of the form:
///
/// lower <= a1*x1 + a2*x2 + ... <= upper
///
/// Often, constraints will impose only a lower or an upper value, with the other set to infinity or
/// minus infinity.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The minimum value for the constraint
    pub lower: f64,
    /// The maximum value for the constraint
    pub upper: f64,
    /// The non-zero coefficients of the constraint
    pub terms: Vec<(Col, f64)>,
}

impl Row {
    /// Whether this row is an equality constraint
    pub fn is_equality(&self) -> bool {
        self.lower == self.upper
    }

    /// Evaluate the left-hand side of the constraint for the given column values
    pub fn activity(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|(col, coeff)| coeff * values[col.index()])
            .sum()
    }
}

/// A mixed-integer linear minimisation problem
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    columns: Vec<Column>,
    rows: Vec<Row>,
}

impl Problem {
    /// Add a continuous column with the given objective cost and bounds
    pub fn add_column(&mut self, cost: f64, bounds: RangeInclusive<f64>) -> Col {
        self.push_column(cost, bounds, false)
    }

    /// Add a binary (0/1) column with the given objective cost
    pub fn add_binary_column(&mut self, cost: f64) -> Col {
        self.push_column(cost, 0.0..=1.0, true)
    }

    fn push_column(&mut self, cost: f64, bounds: RangeInclusive<f64>, integer: bool) -> Col {
        let (lower, upper) = bounds.into_inner();
        assert!(lower <= upper, "Column lower bound exceeds upper bound");

        self.columns.push(Column {
            cost,
            lower,
            upper,
            integer,
        });
        Col(self.columns.len() - 1)
    }

    /// Add a constraint row
    pub fn add_row<I>(&mut self, bounds: RangeInclusive<f64>, terms: I)
    where
        I: IntoIterator<Item = (Col, f64)>,
    {
        let (lower, upper) = bounds.into_inner();
        let terms: Vec<_> = terms.into_iter().collect();
        assert!(
            terms.iter().all(|(col, _)| col.index() < self.columns.len()),
            "Row refers to a column which is not in the problem"
        );

        self.rows.push(Row {
            lower,
            upper,
            terms,
        });
    }

    /// The problem's columns, in order of addition
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// The problem's rows, in order of addition
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// The number of columns
    pub fn num_cols(&self) -> usize {
        self.columns.len()
    }

    /// The number of rows
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// The number of integer columns
    pub fn num_integer_cols(&self) -> usize {
        self.columns.iter().filter(|col| col.integer).count()
    }

    /// Evaluate the objective function for the given column values
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        assert_eq!(values.len(), self.columns.len(), "Wrong number of values");
        self.columns
            .iter()
            .zip(values)
            .map(|(col, value)| col.cost * value)
            .sum()
    }

    /// The largest violation of any bound or constraint for the given column values.
    ///
    /// Integrality is checked as a distance from the nearest integer.
    pub fn max_violation(&self, values: &[f64]) -> f64 {
        assert_eq!(values.len(), self.columns.len(), "Wrong number of values");
        let col_violations = self.columns.iter().zip(values).map(|(col, &value)| {
            let bound = (col.lower - value).max(value - col.upper).max(0.0);
            if col.integer {
                bound.max((value - value.round()).abs())
            } else {
                bound
            }
        });
        let row_violations = self.rows.iter().map(|row| {
            let activity = row.activity(values);
            (row.lower - activity).max(activity - row.upper).max(0.0)
        });

        col_violations.chain(row_violations).fold(0.0, f64::max)
    }
}
