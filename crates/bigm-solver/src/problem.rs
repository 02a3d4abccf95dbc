use thiserror::Error;

/// Errors raised when a problem cannot be turned into a simplex tableau
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    #[error("Problem has no constraints")]
    NoConstraints,
    #[error("Objective function has no coefficients")]
    EmptyObjective,
    #[error("Constraint {constraint} has {found} coefficients, expected {expected}")]
    DimensionMismatch {
        constraint: String,
        expected: usize,
        found: usize,
    },
    #[error("Non-finite value in {0}")]
    NonFinite(String),
    #[error("Tolerance must be finite and non-negative, got {0}")]
    InvalidTolerance(f64),
}

/// A linear minimization problem: `min c·x` subject to `A·x >= b`, `x >= 0`
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct LpProblem {
    /// Variable names
    pub variables: Vec<String>,
    /// Objective function coefficients (costs)
    pub objective: ObjectiveFunction,
    /// Constraints
    pub constraints: Vec<Constraint>,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveFunction {
    /// Coefficients for each variable, minimized
    pub coefficients: Vec<f64>,
}

/// A single `sum(a_i * x_i) >= rhs` row
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Right-hand side value
    pub rhs: f64,
}

impl ObjectiveFunction {
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }
}

impl Constraint {
    pub fn new(name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) -> Self {
        Self {
            name: name.into(),
            coefficients,
            rhs,
        }
    }
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.name)?;
        for (i, coef) in self.coefficients.iter().enumerate() {
            if i > 0 {
                write!(f, " +")?;
            }
            write!(f, " {}*x{}", coef, i)?;
        }
        write!(f, " >= {}", self.rhs)
    }
}

impl LpProblem {
    pub fn new(variables: Vec<String>) -> Self {
        let n = variables.len();
        Self {
            variables,
            objective: ObjectiveFunction::new(vec![0.0; n]),
            constraints: Vec::new(),
        }
    }

    /// Build a problem from bare vectors, naming variables `x0, x1, ...`
    pub fn from_parts(objective: ObjectiveFunction, constraints: Vec<Constraint>) -> Self {
        let variables = (0..objective.len()).map(|i| format!("x{}", i)).collect();
        Self {
            variables,
            objective,
            constraints,
        }
    }

    pub fn set_objective(&mut self, coefficients: Vec<f64>) {
        self.objective = ObjectiveFunction::new(coefficients);
    }

    pub fn add_constraint(&mut self, name: impl Into<String>, coefficients: Vec<f64>, rhs: f64) {
        self.constraints.push(Constraint::new(name, coefficients, rhs));
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn validate(&self) -> Result<(), ProblemError> {
        validate(&self.objective, &self.constraints)
    }
}

/// Check the preconditions the tableau construction relies on
pub(crate) fn validate(objective: &ObjectiveFunction, constraints: &[Constraint]) -> Result<(), ProblemError> {
    if objective.is_empty() {
        return Err(ProblemError::EmptyObjective);
    }
    if constraints.is_empty() {
        return Err(ProblemError::NoConstraints);
    }
    if objective.coefficients.iter().any(|c| !c.is_finite()) {
        return Err(ProblemError::NonFinite("objective".to_string()));
    }

    let n_vars = objective.len();
    for c in constraints {
        if c.coefficients.len() != n_vars {
            return Err(ProblemError::DimensionMismatch {
                constraint: c.name.clone(),
                expected: n_vars,
                found: c.coefficients.len(),
            });
        }
        if !c.rhs.is_finite() || c.coefficients.iter().any(|a| !a.is_finite()) {
            return Err(ProblemError::NonFinite(format!("constraint {}", c.name)));
        }
    }

    Ok(())
}

pub(crate) fn validate_tolerance(tol: f64) -> Result<(), ProblemError> {
    if tol.is_finite() && tol >= 0.0 {
        Ok(())
    } else {
        Err(ProblemError::InvalidTolerance(tol))
    }
}
