use anyhow::{Context, Result};
use binpack_core::{interpret, Packer, PackingRequest, PackingResult, SolverBackend};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Absolute slack allowed when re-checking a backend's assignment
const VERIFY_TOLERANCE: f64 = 1e-5;

#[derive(Parser)]
#[command(name = "binpack")]
#[command(about = "2D bin packing - choose the cheapest set of bins that holds all items", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a packing request
    Solve {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file for result (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// MILP backend (microlp or highs)
        #[arg(long)]
        backend: Option<SolverBackend>,

        /// Time limit in seconds
        #[arg(long)]
        time_limit: Option<f64>,

        /// Relative MIP gap
        #[arg(long)]
        mip_gap: Option<f64>,

        /// Check the backend's assignment against every model constraint
        #[arg(long)]
        verify: bool,
    },

    /// Export the MILP model in CPLEX LP format
    Model {
        /// Input file (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output LP file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            input,
            output,
            backend,
            time_limit,
            mip_gap,
            verify,
        } => {
            let mut request = load_request(&input)?;
            if let Some(backend) = backend {
                request.solver.backend = backend;
            }
            if let Some(time_limit) = time_limit {
                request.solver.time_limit = time_limit;
            }
            if let Some(mip_gap) = mip_gap {
                request.solver.mip_gap = mip_gap;
            }
            solve_command(request, output, verify)?;
        }
        Commands::Model { input, output } => {
            model_command(&input, &output)?;
        }
    }

    Ok(())
}

fn load_request(input: &Path) -> Result<PackingRequest> {
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let extension = input.extension().and_then(|s| s.to_str());
    let request = if matches!(extension, Some("yaml") | Some("yml")) {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };
    Ok(request)
}

fn solve_command(request: PackingRequest, output: Option<PathBuf>, verify: bool) -> Result<()> {
    eprintln!("{}", "Loading input...".bright_blue());
    eprintln!(
        "  {} items to pack",
        request
            .items
            .iter()
            .map(|i| i.quantity)
            .sum::<u32>()
            .to_string()
            .bright_white()
            .bold()
    );
    eprintln!(
        "  {} bin types available",
        request.bin_types.len().to_string().bright_white().bold()
    );
    eprintln!();

    eprintln!(
        "{} ({})",
        "Solving...".bright_blue(),
        request.solver.backend
    );

    let packer = Packer::new(request)?;
    let result = if verify {
        solve_verified(&packer)?
    } else {
        packer.pack()?
    };

    eprintln!();
    if result.may_be_suboptimal() {
        eprintln!(
            "{}",
            "Packing found, optimality not proven".bright_yellow().bold()
        );
    } else {
        eprintln!("{}", "Optimal packing found!".bright_green().bold());
    }
    eprintln!();

    eprintln!("{}", "Results:".bright_yellow().bold());
    eprintln!("  Bins required:");
    for (bin_type_id, count) in &result.bins_required {
        eprintln!("    - {}: {} bins", bin_type_id.bright_white(), count);
    }
    eprintln!(
        "  Total cost: {}",
        format!("{:.2}", result.total_cost).bright_white().bold()
    );
    eprintln!("  Objective: {:.4}", result.objective);
    for (n, bin) in result.bins.iter().enumerate() {
        eprintln!(
            "  Bin {} ({}x{}, type {}):",
            n + 1,
            bin.width,
            bin.height,
            bin.bin_type_id.bright_white()
        );
        for item in &bin.items {
            let label = if item.rotated {
                format!("{} (R)", item.item_id)
            } else {
                item.item_id.clone()
            };
            eprintln!(
                "    - {} at ({}, {}) size {}x{}",
                label.bright_cyan(),
                item.x,
                item.y,
                item.width,
                item.height
            );
        }
    }
    eprintln!();

    let json = serde_json::to_string_pretty(&result)?;
    if let Some(output_path) = output {
        std::fs::write(&output_path, json)?;
        eprintln!(
            "Saved result to {}",
            output_path.display().to_string().bright_white()
        );
    } else {
        println!("{}", json);
    }

    Ok(())
}

/// Runs the backend by hand so its raw assignment can be checked against the
/// model before decoding.
fn solve_verified(packer: &Packer) -> Result<PackingResult> {
    let problem = packer.problem();
    if problem.items.is_empty() || problem.unplaceable_item().is_some() {
        // Nothing reaches the backend in these cases
        return Ok(packer.pack()?);
    }

    let model = packer.build_model();
    let backend = packer.solver_config().backend.instance()?;
    let output = backend.solve(&model, packer.solver_config());

    if let Some(values) = &output.values {
        let violations = model.violations(values, VERIFY_TOLERANCE);
        if violations.is_empty() {
            info!(
                constraints = model.constraints().len(),
                "Assignment satisfies every constraint"
            );
            eprintln!("{}", "Verified: no constraint violated".bright_green());
        } else {
            for violation in &violations {
                warn!(name = %violation.name, amount = violation.amount, "Constraint violated");
            }
            anyhow::bail!(
                "backend assignment violates {} constraints or bounds",
                violations.len()
            );
        }
    }

    Ok(interpret(&model, output)?)
}

fn model_command(input: &Path, output: &Path) -> Result<()> {
    let packer = Packer::new(load_request(input)?)?;
    let model = packer.build_model();

    let mut lp = String::new();
    model.write_lp(&mut lp)?;
    std::fs::write(output, lp).with_context(|| format!("writing {}", output.display()))?;

    eprintln!(
        "Wrote model with {} variables ({} binary) and {} constraints to {}",
        model.num_variables().to_string().bright_white(),
        model.num_binaries(),
        model.constraints().len().to_string().bright_white(),
        output.display().to_string().bright_white()
    );

    Ok(())
}
