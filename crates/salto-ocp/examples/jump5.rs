//! Five-Phase Jump Optimization
//!
//! Assembles the jumper problem, solves it, persists the result,
//! reloads it, and prints the optimized phase durations.
//!
//! Run with `--features ipopt` to invoke the external solver; without
//! it the solve step returns the initial guess so the pipeline can
//! still be exercised end to end.

use std::error::Error;
use std::time::Instant;

use salto_ocp::archive;
use salto_ocp::report;
use salto_ocp::scenario::JumperScenario;
use salto_ocp::solver::{self, HessianApproximation, SolveOptions};

const SOLUTION_PATH: &str = "results/jumper5phases.sol";

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt::init();

    let started = Instant::now();

    let scenario = JumperScenario::new("models");
    let ocp = scenario.build()?;
    println!(
        "Assembled {} phases over {} reduced coordinates",
        ocp.nb_phases(),
        ocp.q_mapping(0).nb_reduced()
    );

    let options = SolveOptions {
        hessian_approximation: HessianApproximation::Exact,
        max_iter: 1000,
        tolerance: 1e-6,
        show_online_optim: false,
    };
    let solution = solver::solve(&ocp, &options)?;
    if !solution.converged {
        println!("Solver not available; reporting the initial guess.");
    }

    archive::save(&ocp, &solution, SOLUTION_PATH)?;
    let (ocp, solution) = archive::load(SOLUTION_PATH)?;

    println!("{}", report::format_phase_durations(&solution));

    // Vertical mass-center trace of the push-off phase.
    let heights = report::com_height_series(
        &ocp.phase(1).model,
        ocp.q_mapping(1),
        &solution.states[1],
    )?;
    let peak = heights.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if peak.is_finite() {
        println!("Push-off mass-center peak: {peak:.3} m");
    }

    println!("Time to solve: {:.3}s", started.elapsed().as_secs_f64());
    Ok(())
}
