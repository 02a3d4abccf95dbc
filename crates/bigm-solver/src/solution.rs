/// Terminal state of a simplex run
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolutionStatus {
    /// No column can improve the objective any further
    Found,
    /// The entering column has no positive entry in a row with a positive value
    Unbounded,
    /// The iteration cap was hit (or the run was cancelled) before optimality
    NotYetFound,
}

/// Final numeric state of a solve, plus the values derived from it
///
/// Reports only come out of a solve:
///
/// ```compile_fail
/// use bigm_solver::{SolutionReport, SolutionStatus};
/// let report = SolutionReport::new(SolutionStatus::Found, vec![0.0], vec![7], vec![1.0], 0, 1);
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SolutionReport {
    /// Solution status
    pub status: SolutionStatus,
    /// Optimal objective value of the minimization problem
    pub objective_value: f64,
    /// Value of each original variable, zero when non-basic
    pub values: Vec<f64>,
    /// Number of pivots performed
    pub iterations: usize,
    /// Negated objective coefficients padded with zeros for slack/artificial columns
    pub objective_row: Vec<f64>,
    /// Basic column for each constraint row
    pub basis: Vec<usize>,
    /// Value of the basic variable in each row
    pub basic_values: Vec<f64>,
    /// Number of original variables
    pub num_variables: usize,
}

impl SolutionReport {
    /// `basis` must hold valid indices into `objective_row`
    pub(crate) fn new(
        status: SolutionStatus,
        objective_row: Vec<f64>,
        basis: Vec<usize>,
        basic_values: Vec<f64>,
        iterations: usize,
        num_variables: usize,
    ) -> Self {
        let objective_value = objective_value(&objective_row, &basis, &basic_values);
        let values = variable_values(&basis, &basic_values, num_variables);
        Self {
            status,
            objective_value,
            values,
            iterations,
            objective_row,
            basis,
            basic_values,
            num_variables,
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status == SolutionStatus::Found
    }

    /// Sum of the artificial variables still in the basis.
    ///
    /// A positive residual on a `Found` report means the artificial variables
    /// could not be driven to zero, so the constraint set has no feasible point.
    pub fn artificial_residual(&self) -> f64 {
        let artificial_start = self.num_variables + self.basis.len();
        self.basis
            .iter()
            .zip(&self.basic_values)
            .filter(|&(&col, _)| col >= artificial_start)
            .map(|(_, &value)| value)
            .sum()
    }
}

fn objective_value(objective_row: &[f64], basis: &[usize], basic_values: &[f64]) -> f64 {
    basis
        .iter()
        .zip(basic_values)
        .map(|(&col, &value)| -objective_row[col] * value)
        .sum()
}

fn variable_values(basis: &[usize], basic_values: &[f64], num_variables: usize) -> Vec<f64> {
    let mut values = vec![0.0; num_variables];
    for (&col, &value) in basis.iter().zip(basic_values) {
        // Slack and artificial columns have no entry in the solution vector
        if col < num_variables {
            values[col] = value;
        }
    }
    values
}
