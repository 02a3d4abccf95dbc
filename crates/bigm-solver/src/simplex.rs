use crate::problem::{self, Constraint, LpProblem, ObjectiveFunction, ProblemError};
use crate::solution::{SolutionReport, SolutionStatus};

/// Iteration cap used when none is configured
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Simplex solver for linear programming problems
pub struct Solver {
    /// Maximum pivots before giving up
    max_iterations: usize,
    /// Tolerance for sign tests; zero means strict comparisons
    tolerance: f64,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: 0.0,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    /// Solve the LP problem using the Big-M simplex method
    pub fn solve(&self, problem: &LpProblem) -> Result<SolutionReport, ProblemError> {
        self.solve_until(problem, |_| false)
    }

    /// Like [`solve`](Self::solve), but `should_stop` is asked with the
    /// iteration count before every pivot; see [`SimplexEngine::calc_result_until`]
    pub fn solve_until<F>(&self, problem: &LpProblem, should_stop: F) -> Result<SolutionReport, ProblemError>
    where
        F: FnMut(usize) -> bool,
    {
        let engine = SimplexEngine::new(&problem.objective, &problem.constraints)?
            .with_max_iterations(self.max_iterations)
            .with_tolerance(self.tolerance)?;
        Ok(engine.calc_result_until(should_stop))
    }
}

/// Outcome of one optimality check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Optimality {
    /// Pivot on column `enter`, replacing the basic variable of row `leave`
    Continue { enter: usize, leave: usize },
    Optimal,
    Unbounded,
}

/// Big-M tableau for a minimization problem with `>=` constraints.
///
/// The tableau is stored column-major: `tableau[column][row]`. Columns are the
/// original variables, then one slack per constraint, then one artificial per
/// constraint. Artificial variables are never chosen to enter; their penalty
/// is carried by `zj` instead of an explicit large constant.
///
/// An engine is built for one solve: [`SimplexEngine::calc_result`] consumes it.
#[derive(Debug, Clone)]
pub struct SimplexEngine {
    tableau: Vec<Vec<f64>>,
    basis: Vec<usize>,
    basic_values: Vec<f64>,
    artificial: Vec<bool>,
    objective_row: Vec<f64>,
    zj: Vec<f64>,
    cj: Vec<f64>,
    n_vars: usize,
    iterations: usize,
    max_iterations: usize,
    tolerance: f64,
}

impl SimplexEngine {
    pub fn new(objective: &ObjectiveFunction, constraints: &[Constraint]) -> Result<Self, ProblemError> {
        problem::validate(objective, constraints)?;

        let n_vars = objective.len();
        let n_constraints = constraints.len();
        let n_cols = n_vars + 2 * n_constraints;
        let artificial_start = n_vars + n_constraints;

        let mut tableau = Vec::with_capacity(n_cols);
        for j in 0..n_vars {
            tableau.push(constraints.iter().map(|c| c.coefficients[j]).collect());
        }
        for k in 0..n_constraints {
            tableau.push(unit_column(n_constraints, k, -1.0)); // surplus
        }
        for k in 0..n_constraints {
            tableau.push(unit_column(n_constraints, k, 1.0)); // artificial
        }

        // Simplex maximizes, so the minimization objective is negated
        let mut objective_row: Vec<f64> = objective.coefficients.iter().map(|c| -c).collect();
        objective_row.resize(n_cols, 0.0);

        let mut engine = Self {
            tableau,
            basis: (artificial_start..n_cols).collect(),
            basic_values: constraints.iter().map(|c| c.rhs).collect(),
            artificial: (0..n_cols).map(|j| j >= artificial_start).collect(),
            objective_row,
            zj: vec![0.0; n_cols],
            cj: vec![0.0; n_cols],
            n_vars,
            iterations: 0,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: 0.0,
        };
        engine.update_reduced_costs();

        log::debug!(
            "built tableau with {} variables, {} constraints, {} columns",
            n_vars,
            n_constraints,
            n_cols
        );

        Ok(engine)
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Fails unless `tol` is finite and non-negative
    pub fn with_tolerance(mut self, tol: f64) -> Result<Self, ProblemError> {
        problem::validate_tolerance(tol)?;
        self.tolerance = tol;
        Ok(self)
    }

    pub fn num_variables(&self) -> usize {
        self.n_vars
    }

    pub fn num_constraints(&self) -> usize {
        self.basis.len()
    }

    pub fn num_columns(&self) -> usize {
        self.tableau.len()
    }

    pub fn basis(&self) -> &[usize] {
        &self.basis
    }

    pub fn basic_values(&self) -> &[f64] {
        &self.basic_values
    }

    pub fn zj(&self) -> &[f64] {
        &self.zj
    }

    pub fn cj(&self) -> &[f64] {
        &self.cj
    }

    pub fn is_artificial(&self, column: usize) -> bool {
        self.artificial[column]
    }

    /// Run the simplex iterations until a terminal status is reached
    pub fn calc_result(self) -> SolutionReport {
        self.calc_result_until(|_| false)
    }

    /// Like [`calc_result`](Self::calc_result), but asks `should_stop` with the
    /// current iteration count before every pivot. Stopping early reports
    /// [`SolutionStatus::NotYetFound`].
    pub fn calc_result_until<F>(mut self, mut should_stop: F) -> SolutionReport
    where
        F: FnMut(usize) -> bool,
    {
        let status = loop {
            match self.evaluate() {
                Optimality::Optimal => break SolutionStatus::Found,
                Optimality::Unbounded => break SolutionStatus::Unbounded,
                Optimality::Continue { enter, leave } => {
                    if self.iterations >= self.max_iterations {
                        log::warn!("iteration cap of {} reached", self.max_iterations);
                        break SolutionStatus::NotYetFound;
                    }
                    if should_stop(self.iterations) {
                        log::warn!("solve cancelled after {} iterations", self.iterations);
                        break SolutionStatus::NotYetFound;
                    }
                    self.pivot(enter, leave);
                }
            }
        };

        log::info!("simplex finished: {:?} after {} iterations", status, self.iterations);

        SolutionReport::new(
            status,
            self.objective_row,
            self.basis,
            self.basic_values,
            self.iterations,
            self.n_vars,
        )
    }

    /// Optimality test: pick the entering column from `zj`, then `cj`, and
    /// the leaving row by the minimum ratio test
    pub fn evaluate(&self) -> Optimality {
        let Some(enter) = self
            .most_negative(&self.zj)
            .or_else(|| self.most_negative(&self.cj))
        else {
            return Optimality::Optimal;
        };

        match self.min_ratio_row(enter) {
            Some(leave) => Optimality::Continue { enter, leave },
            None => Optimality::Unbounded,
        }
    }

    fn most_negative(&self, values: &[f64]) -> Option<usize> {
        let mut min_val = -self.tolerance;
        let mut min_col = None;

        for (j, &val) in values.iter().enumerate() {
            if !self.artificial[j] && val < min_val {
                min_val = val;
                min_col = Some(j);
            }
        }

        min_col
    }

    /// Minimum ratio test, first row wins ties. Rows whose basic value is
    /// zero are never chosen, so degenerate problems can end up `Unbounded`.
    fn min_ratio_row(&self, col: usize) -> Option<usize> {
        let column = &self.tableau[col];

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, (&entry, &value)) in column.iter().zip(&self.basic_values).enumerate() {
            if entry > self.tolerance && value > self.tolerance {
                let ratio = value / entry;
                if ratio < min_ratio {
                    min_ratio = ratio;
                    min_row = Some(i);
                }
            }
        }

        min_row
    }

    /// Gauss-Jordan step turning column `enter` into a unit vector at row `leave`
    fn pivot(&mut self, enter: usize, leave: usize) {
        // All row updates read the pre-pivot entering column
        let entering = self.tableau[enter].clone();
        let pivot_val = entering[leave];

        log::debug!(
            "pivot {}: column {} enters, row {} leaves (pivot element {})",
            self.iterations + 1,
            enter,
            leave,
            pivot_val
        );

        for column in self.tableau.iter_mut() {
            let normalized = column[leave] / pivot_val;
            for (row, value) in column.iter_mut().enumerate() {
                if row == leave {
                    *value = normalized;
                } else {
                    *value -= normalized * entering[row];
                }
            }
        }

        let leaving_value = self.basic_values[leave] / pivot_val;
        for (row, value) in self.basic_values.iter_mut().enumerate() {
            if row == leave {
                *value = leaving_value;
            } else {
                *value -= leaving_value * entering[row];
            }
        }

        self.basis[leave] = enter;
        self.iterations += 1;
        self.update_reduced_costs();
    }

    fn update_reduced_costs(&mut self) {
        for (j, column) in self.tableau.iter().enumerate() {
            let mut penalty = 0.0;
            let mut contribution = 0.0;
            for (&basic, &entry) in self.basis.iter().zip(column) {
                if self.artificial[basic] {
                    penalty -= entry;
                } else {
                    contribution += self.objective_row[basic] * entry;
                }
            }
            self.zj[j] = if self.artificial[j] { 1.0 } else { penalty };
            self.cj[j] = contribution - self.objective_row[j];
        }

        log::trace!("Zj = {:?}", self.zj);
        log::trace!("Cj = {:?}", self.cj);
    }
}

fn unit_column(len: usize, at: usize, value: f64) -> Vec<f64> {
    let mut column = vec![0.0; len];
    column[at] = value;
    column
}
