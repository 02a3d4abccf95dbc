use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use bigm_lang::{CompiledModel, Compiler, Item, Parser as BenchmarkParser};
use bigm_solver::{DEFAULT_MAX_ITERATIONS, LpProblem, SolutionReport, SolutionStatus, Solver};
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};

/// Residual above which a Found report is flagged as infeasible
const RESIDUAL_TOLERANCE: f64 = 1e-9;

#[derive(Parser)]
#[command(name = "bigm")]
#[command(about = "Solve minimization problems with the Big-M simplex method", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    verbose: Verbosity<WarnLevel>,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a benchmark file and print the optimal solution
    Solve {
        /// The benchmark file
        file: PathBuf,
        #[command(flatten)]
        options: SolveOptions,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Parse a benchmark file and output the AST
    Parse {
        /// The file to parse
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Check a benchmark file for errors
    Check {
        /// The file to check
        file: PathBuf,
    },
    /// Solve every .txt benchmark below a directory
    Bench {
        /// Directory searched recursively for benchmarks
        dir: PathBuf,
        #[command(flatten)]
        options: SolveOptions,
    },
}

#[derive(Args)]
struct SolveOptions {
    /// Maximum number of pivots before giving up
    #[arg(long, default_value_t = DEFAULT_MAX_ITERATIONS)]
    max_iterations: usize,
    /// Tolerance for sign tests (0 means strict comparisons)
    #[arg(long, default_value_t = 0.0, value_parser = parse_tolerance)]
    tolerance: f64,
    /// Stop iterating after this many seconds
    #[arg(long)]
    timeout: Option<f64>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    #[value(alias = "pretty")]
    Text,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .init();

    match cli.command {
        Commands::Solve { file, options, format } => {
            let compiled = compile(&file)?;
            let report = solve(&compiled.lp_problem, &options)?;

            match format {
                Format::Json => {
                    let output = serde_json::json!({
                        "variables": compiled.variables,
                        "report": report,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                Format::Text => present(&compiled, &report),
            }

            if !report.is_optimal() {
                std::process::exit(1);
            }
        }
        Commands::Parse { file, format } => {
            let source = read(&file)?;
            let program = BenchmarkParser::parse(&source)
                .with_context(|| format!("parsing {}", file.display()))?;

            match format {
                Format::Json => println!("{}", serde_json::to_string_pretty(&program)?),
                Format::Text => println!("{:#?}", program),
            }
        }
        Commands::Check { file } => {
            let source = read(&file)?;
            let program = match BenchmarkParser::parse(&source) {
                Ok(p) => p,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };

            let mut objectives = 0;
            let mut constraints = 0;
            for item in &program.items {
                match item {
                    Item::Objective(_) => objectives += 1,
                    Item::Inequality(_) => constraints += 1,
                }
            }

            let compiled = match Compiler::new().compile(&program) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("✗ {} has errors:", file.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            };
            if let Err(e) = compiled.lp_problem.validate() {
                eprintln!("✗ {} cannot be solved:", file.display());
                eprintln!("  {}", e);
                std::process::exit(1);
            }

            println!("✓ {} is valid", file.display());
            println!("  {} objective", objectives);
            println!("  {} constraints", constraints);
            println!("  {} variables", compiled.variables.len());
        }
        Commands::Bench { dir, options } => {
            let mut files = Vec::new();
            collect_benchmarks(&dir, &mut files)
                .with_context(|| format!("reading {}", dir.display()))?;
            files.sort();

            log::info!("{} benchmark files found in {}", files.len(), dir.display());

            for file in &files {
                let outcome = compile(file).and_then(|c| solve(&c.lp_problem, &options));
                match outcome {
                    Ok(report) => println!(
                        "{:40} {:12} {:>6} iterations  {}",
                        file.display(),
                        format!("{:?}", report.status),
                        report.iterations,
                        report.objective_value
                    ),
                    Err(e) => println!("{:40} error: {:#}", file.display(), e),
                }
            }
        }
    }

    Ok(())
}

fn read(file: &Path) -> Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))
}

fn compile(file: &Path) -> Result<CompiledModel> {
    let source = read(file)?;
    Compiler::compile_source(&source).with_context(|| format!("compiling {}", file.display()))
}

fn solve(problem: &LpProblem, options: &SolveOptions) -> Result<SolutionReport> {
    let solver = Solver::new()
        .with_max_iterations(options.max_iterations)
        .with_tolerance(options.tolerance);

    let report = match options.timeout {
        Some(secs) => {
            let limit = Duration::try_from_secs_f64(secs)
                .with_context(|| format!("invalid timeout {}", secs))?;
            let deadline = Instant::now() + limit;
            solver.solve_until(problem, |_| Instant::now() >= deadline)?
        }
        None => solver.solve(problem)?,
    };

    Ok(report)
}

fn parse_tolerance(s: &str) -> Result<f64, String> {
    let tol: f64 = s.parse().map_err(|e| format!("{}", e))?;
    if tol.is_finite() && tol >= 0.0 {
        Ok(tol)
    } else {
        Err(format!("tolerance must be finite and non-negative, got {}", s))
    }
}

fn present(compiled: &CompiledModel, report: &SolutionReport) {
    match report.status {
        SolutionStatus::Found => {
            println!(
                "The optimal solution for this minimization problem has been found: {} after {} iterations.",
                report.objective_value, report.iterations
            );
            println!();
            println!("All variable values:");
            println!();
            for (name, value) in compiled.variables.iter().zip(&report.values) {
                println!("  {}: {}", name, value);
            }

            let residual = report.artificial_residual();
            if residual > RESIDUAL_TOLERANCE {
                eprintln!();
                eprintln!(
                    "Warning: artificial variables remain in the basis with total value {}; the constraints cannot all be satisfied.",
                    residual
                );
            }
        }
        SolutionStatus::Unbounded => {
            println!("Status: UNBOUNDED");
            println!("The domain of admissible solutions is unbounded.");
        }
        SolutionStatus::NotYetFound => {
            println!("Status: NOT FOUND");
            println!(
                "Could not find an optimal solution within {} iterations.",
                report.iterations
            );
        }
    }
}

fn collect_benchmarks(dir: &Path, files: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_benchmarks(&path, files)?;
        } else if path.extension().is_some_and(|ext| ext == "txt") {
            files.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_pretty_is_text() {
        let cli = Cli::try_parse_from(["bigm", "parse", "model.txt", "--format", "pretty"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse { format: Format::Text, .. }));

        let cli = Cli::try_parse_from(["bigm", "parse", "model.txt", "--format", "json"]).unwrap();
        assert!(matches!(cli.command, Commands::Parse { format: Format::Json, .. }));
    }

    #[test]
    fn test_tolerance_is_validated() {
        for bad in ["-1", "NaN", "inf", "abc"] {
            let parsed = Cli::try_parse_from(["bigm", "solve", "model.txt", "--tolerance", bad]);
            assert!(parsed.is_err(), "accepted tolerance {}", bad);
        }

        let cli = Cli::try_parse_from(["bigm", "solve", "model.txt", "--tolerance", "1e-9"]).unwrap();
        match cli.command {
            Commands::Solve { options, .. } => assert_eq!(options.tolerance, 1e-9),
            _ => panic!("expected solve"),
        }
    }

    #[test]
    fn test_solve_with_timeout() {
        let compiled = Compiler::compile_source("min: x0 + x1;\nR1: x0 + 2*x1 >= 4;\nR2: 3*x0 + x1 >= 6;").unwrap();
        let options = SolveOptions {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: 0.0,
            timeout: Some(60.0),
        };
        let report = solve(&compiled.lp_problem, &options).unwrap();
        assert_eq!(report.status, SolutionStatus::Found);
        assert!((report.objective_value - 2.8).abs() < 1e-9);

        let options = SolveOptions { timeout: Some(-1.0), ..options };
        assert!(solve(&compiled.lp_problem, &options).is_err());
    }
}
