use std::collections::HashMap;
use std::path::Path;

use bigm_solver::LpProblem;
use thiserror::Error;

use crate::ast::*;
use crate::lexer::Span;
use crate::{ParseError, Parser};

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("No objective function (expected a `min:` line)")]
    MissingObjective,
    #[error("Second objective function at position {0:?}")]
    MultipleObjectives(Span),
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("IO error: {0}")]
    IoError(String),
}

/// Benchmark compiled into solver input
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone)]
pub struct CompiledModel {
    /// Variable names in column order
    pub variables: Vec<String>,
    /// Constraint names in row order
    pub constraint_names: Vec<String>,
    pub lp_problem: LpProblem,
}

/// Compiler for converting a parsed benchmark to an LP problem
#[derive(Debug, Default)]
pub struct Compiler {
    /// Column index of every variable seen so far
    columns: HashMap<String, usize>,
    variables: Vec<String>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and compile benchmark source text
    pub fn compile_source(source: &str) -> Result<CompiledModel, CompileError> {
        let program = Parser::parse(source)?;
        Compiler::new().compile(&program)
    }

    /// Read, parse and compile a benchmark file
    pub fn compile_file(path: impl AsRef<Path>) -> Result<CompiledModel, CompileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| CompileError::IoError(format!("{}: {}", path.display(), e)))?;
        Self::compile_source(&source)
    }

    /// Assign columns in order of first appearance (objective first) and
    /// build dense coefficient rows. Repeated terms are summed.
    pub fn compile(mut self, program: &Program) -> Result<CompiledModel, CompileError> {
        let mut objectives = program.objectives();
        let objective = objectives.next().ok_or(CompileError::MissingObjective)?;
        if let Some(extra) = objectives.next() {
            return Err(CompileError::MultipleObjectives(extra.span));
        }

        for term in &objective.terms {
            self.column(&term.variable);
        }
        for inequality in program.inequalities() {
            for term in &inequality.terms {
                self.column(&term.variable);
            }
        }

        log::debug!("variable columns: {:?}", self.variables);

        let mut lp_problem = LpProblem::new(self.variables.clone());
        lp_problem.set_objective(self.dense(&objective.terms));

        let mut constraint_names = Vec::new();
        for (i, inequality) in program.inequalities().enumerate() {
            let name = inequality
                .label
                .clone()
                .unwrap_or_else(|| format!("c{}", i + 1));
            lp_problem.add_constraint(name.clone(), self.dense(&inequality.terms), inequality.rhs);
            constraint_names.push(name);
        }

        Ok(CompiledModel {
            variables: self.variables,
            constraint_names,
            lp_problem,
        })
    }

    fn column(&mut self, name: &str) -> usize {
        if let Some(&index) = self.columns.get(name) {
            return index;
        }
        let index = self.variables.len();
        self.columns.insert(name.to_string(), index);
        self.variables.push(name.to_string());
        index
    }

    fn dense(&self, terms: &[Term]) -> Vec<f64> {
        let mut row = vec![0.0; self.variables.len()];
        for term in terms {
            if let Some(&index) = self.columns.get(&term.variable) {
                row[index] += term.coefficient;
            }
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigm_solver::{SolutionStatus, Solver};

    #[test]
    fn test_compile_columns() {
        let source = r#"
            min: 2*y + 1*x;
            R1: 1*x + 1*y + 1*z >= 3;
            R2: 4*z >= 1;
        "#;
        let compiled = Compiler::compile_source(source).unwrap();

        assert_eq!(compiled.variables, vec!["y", "x", "z"]);
        assert_eq!(compiled.constraint_names, vec!["R1", "R2"]);

        let problem = &compiled.lp_problem;
        assert_eq!(problem.objective.coefficients, vec![2.0, 1.0, 0.0]);
        assert_eq!(problem.constraints[0].coefficients, vec![1.0, 1.0, 1.0]);
        assert_eq!(problem.constraints[1].coefficients, vec![0.0, 0.0, 4.0]);
        assert_eq!(problem.constraints[1].rhs, 1.0);
    }

    #[test]
    fn test_repeated_terms_are_summed() {
        let compiled = Compiler::compile_source("min: x + 2*x - y; x + y >= 1;").unwrap();
        assert_eq!(compiled.lp_problem.objective.coefficients, vec![3.0, -1.0]);
        assert_eq!(compiled.constraint_names, vec!["c1"]);
    }

    #[test]
    fn test_missing_objective() {
        let err = Compiler::compile_source("R1: x >= 1;").unwrap_err();
        assert!(matches!(err, CompileError::MissingObjective));
    }

    #[test]
    fn test_multiple_objectives() {
        let err = Compiler::compile_source("min: x;\nmin: y;\nR1: x + y >= 1;").unwrap_err();
        assert!(matches!(err, CompileError::MultipleObjectives(_)));
    }

    #[test]
    fn test_parse_error_is_wrapped() {
        let err = Compiler::compile_source("min: x;\nR1: x = 1;").unwrap_err();
        assert!(matches!(err, CompileError::Parse(ParseError::UnsupportedRelation { .. })));
    }

    #[test]
    fn test_compile_and_solve() {
        let source = r#"
            // minimize x0 + x1
            min: 1*x0 + 1*x1;
            R1: 1*x0 + 2*x1 >= 4;
            R2: 3*x0 + 1*x1 >= 6;
        "#;
        let compiled = Compiler::compile_source(source).unwrap();
        let solution = Solver::new().solve(&compiled.lp_problem).unwrap();

        assert_eq!(solution.status, SolutionStatus::Found);
        assert!((solution.objective_value - 2.8).abs() < 1e-9);
        assert!((solution.values[0] - 1.6).abs() < 1e-9);
        assert!((solution.values[1] - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_compile_benchmark_files() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../benchmarks");

        let diet = Compiler::compile_file(dir.join("diet.txt")).unwrap();
        assert_eq!(diet.variables, vec!["x0", "x1"]);
        assert_eq!(diet.lp_problem.num_constraints(), 3);
        let solution = Solver::new().solve(&diet.lp_problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Found);
        assert!((solution.objective_value - 2.25).abs() < 1e-9);

        let unbounded = Compiler::compile_file(dir.join("unbounded.txt")).unwrap();
        let solution = Solver::new().solve(&unbounded.lp_problem).unwrap();
        assert_eq!(solution.status, SolutionStatus::Unbounded);

        let missing = Compiler::compile_file(dir.join("does_not_exist.txt")).unwrap_err();
        assert!(matches!(missing, CompileError::IoError(_)));
    }
}
