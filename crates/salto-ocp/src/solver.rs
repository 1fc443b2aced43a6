//! External NLP solver interface.
//!
//! The descriptor is transcribed into a flat NLP variable/constraint
//! layout and handed to Ipopt together with the generated
//! model-function library (behind the `ipopt` feature; see `build.rs`).
//! Without the feature, [`solve`] falls back to a non-converged
//! placeholder built from the initial guess, which is enough for
//! descriptor-level tests and tooling.
//!
//! Solving is a single, synchronous, potentially long-running call;
//! iteration limits and tolerances are solver-side options.

use std::time::Instant;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::constraint::ConstraintKind;
use crate::ocp::JumpOcp;

/// Hessian strategy handed to Ipopt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HessianApproximation {
    Exact,
    LimitedMemory,
}

impl HessianApproximation {
    /// Value of Ipopt's `hessian_approximation` option.
    pub fn as_option_str(&self) -> &'static str {
        match self {
            HessianApproximation::Exact => "exact",
            HessianApproximation::LimitedMemory => "limited-memory",
        }
    }
}

/// Options for a solve call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveOptions {
    pub hessian_approximation: HessianApproximation,
    pub max_iter: usize,
    pub tolerance: f64,
    /// Stream per-iteration output while solving (side channel of the
    /// external solver, not used by this crate).
    pub show_online_optim: bool,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            hessian_approximation: HessianApproximation::Exact,
            max_iter: 1000,
            tolerance: 1e-6,
            show_online_optim: false,
        }
    }
}

/// Solver outcome codes (Ipopt's `ApplicationReturnStatus`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Succeeded,
    SolvedToAcceptableLevel,
    InfeasibleProblemDetected,
    SearchDirectionTooSmall,
    DivergingIterates,
    UserRequestedStop,
    MaximumIterationsExceeded,
    RestorationFailed,
    MaximumCpuTimeExceeded,
    InvalidProblemDefinition,
    InvalidOption,
    InvalidNumberDetected,
    Unknown(i32),
}

impl From<i32> for SolverStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => SolverStatus::Succeeded,
            1 => SolverStatus::SolvedToAcceptableLevel,
            2 => SolverStatus::InfeasibleProblemDetected,
            3 => SolverStatus::SearchDirectionTooSmall,
            4 => SolverStatus::DivergingIterates,
            5 => SolverStatus::UserRequestedStop,
            -1 => SolverStatus::MaximumIterationsExceeded,
            -2 => SolverStatus::RestorationFailed,
            -4 => SolverStatus::MaximumCpuTimeExceeded,
            -11 => SolverStatus::InvalidProblemDefinition,
            -12 => SolverStatus::InvalidOption,
            -13 => SolverStatus::InvalidNumberDetected,
            other => SolverStatus::Unknown(other),
        }
    }
}

/// Solve errors.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("solver initialization failed")]
    InitializationFailed,
    #[error("problem detected infeasible")]
    Infeasible,
    #[error("maximum iterations reached without convergence")]
    MaxIterationsReached,
    #[error("solver failed with status {0}")]
    SolveFailed(i32),
}

/// Solution of a solved (or fallback-initialized) problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Optimized duration of each phase [s]
    pub phase_times: Vec<f64>,
    /// Per phase, per node: reduced state vector (q then qdot)
    pub states: Vec<Vec<Vec<f64>>>,
    /// Per phase, per interval: reduced control vector
    pub controls: Vec<Vec<Vec<f64>>>,
    /// Final objective value
    pub objective: f64,
    /// Whether the solver reported convergence
    pub converged: bool,
    /// Iterations spent
    pub iterations: usize,
    /// Wall-clock solve time [ms]
    pub solve_time_ms: f64,
}

/// Flat NLP variable/constraint layout of a descriptor.
///
/// Variable order: per phase, node-major states then controls; the
/// per-phase duration parameters sit together at the end. Duration
/// bounds are plain variable bounds on those parameters, so they add
/// no constraint rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NlpLayout {
    /// Offset of each phase's first state variable
    pub state_offsets: Vec<usize>,
    /// Offset of each phase's first control variable
    pub control_offsets: Vec<usize>,
    /// Offset of the duration parameters
    pub time_offset: usize,
    /// Total decision-variable count
    pub nb_variables: usize,
    /// Total constraint-row count (dynamics defects, inter-phase links,
    /// path constraints)
    pub nb_constraint_rows: usize,
}

impl NlpLayout {
    pub fn of(ocp: &JumpOcp) -> Self {
        let mut state_offsets = Vec::with_capacity(ocp.nb_phases());
        let mut control_offsets = Vec::with_capacity(ocp.nb_phases());
        let mut offset = 0;
        let mut rows = 0;

        for phase in ocp.phases() {
            let n = phase.nb_shooting_nodes;
            let nx = phase.nb_states();
            let nu = phase.nb_controls();

            state_offsets.push(offset);
            offset += (n + 1) * nx;
            control_offsets.push(offset);
            offset += n * nu;

            // Dynamics defects: one per state per interval.
            rows += n * nx;
            // Path constraints; duration bounds become variable bounds.
            for entry in &phase.constraints {
                if matches!(entry.kind, ConstraintKind::Time { .. }) {
                    continue;
                }
                rows += entry.nb_rows() * entry.instant.nb_applied_nodes(n);
            }
        }

        // Inter-phase boundary links (continuous or impact-mapped).
        for i in 0..ocp.nb_phases().saturating_sub(1) {
            rows += ocp.phase(i + 1).nb_states();
        }

        let time_offset = offset;
        let nb_variables = offset + ocp.nb_phases();

        Self {
            state_offsets,
            control_offsets,
            time_offset,
            nb_variables,
            nb_constraint_rows: rows,
        }
    }

    /// Split a flat solution vector back into per-phase trajectories
    /// and durations.
    pub fn unpack(&self, ocp: &JumpOcp, x: &[f64]) -> (Vec<f64>, Vec<Vec<Vec<f64>>>, Vec<Vec<Vec<f64>>>) {
        let mut states = Vec::with_capacity(ocp.nb_phases());
        let mut controls = Vec::with_capacity(ocp.nb_phases());

        for (i, phase) in ocp.phases().iter().enumerate() {
            let n = phase.nb_shooting_nodes;
            let nx = phase.nb_states();
            let nu = phase.nb_controls();

            let s = self.state_offsets[i];
            states.push(
                (0..=n)
                    .map(|k| x[s + k * nx..s + (k + 1) * nx].to_vec())
                    .collect(),
            );
            let c = self.control_offsets[i];
            controls.push(
                (0..n)
                    .map(|k| x[c + k * nu..c + (k + 1) * nu].to_vec())
                    .collect(),
            );
        }

        let phase_times = x[self.time_offset..self.time_offset + ocp.nb_phases()].to_vec();
        (phase_times, states, controls)
    }
}

/// Solve the assembled problem.
///
/// With the `ipopt` feature the call blocks on the external solver;
/// otherwise it returns the initial guess as a non-converged placeholder.
pub fn solve(ocp: &JumpOcp, options: &SolveOptions) -> Result<Solution, SolveError> {
    let started = Instant::now();

    #[cfg(feature = "ipopt")]
    {
        solve_ipopt(ocp, options, started)
    }

    #[cfg(not(feature = "ipopt"))]
    {
        let _ = options;
        Ok(solve_fallback(ocp, started))
    }
}

/// Initial-guess placeholder used when no NLP backend is compiled in.
#[cfg(not(feature = "ipopt"))]
fn solve_fallback(ocp: &JumpOcp, started: Instant) -> Solution {
    tracing::warn!("no NLP backend compiled in (ipopt feature disabled); returning the initial guess");

    let mut phase_times = Vec::with_capacity(ocp.nb_phases());
    let mut states = Vec::with_capacity(ocp.nb_phases());
    let mut controls = Vec::with_capacity(ocp.nb_phases());

    for phase in ocp.phases() {
        let n = phase.nb_shooting_nodes;
        phase_times.push(phase.time.initial);
        states.push(
            (0..=n)
                .map(|k| phase.x_init.at_node(k).to_vec())
                .collect::<Vec<_>>(),
        );
        controls.push(
            (0..n)
                .map(|k| phase.u_init.at_node(k).to_vec())
                .collect::<Vec<_>>(),
        );
    }

    debug!(
        nb_phases = ocp.nb_phases(),
        "fallback solution assembled from initial guess"
    );

    Solution {
        phase_times,
        states,
        controls,
        objective: 0.0,
        converged: false,
        iterations: 0,
        solve_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    }
}

#[cfg(feature = "ipopt")]
fn solve_ipopt(
    ocp: &JumpOcp,
    options: &SolveOptions,
    started: Instant,
) -> Result<Solution, SolveError> {
    use crate::constraint::{Direction, TransitionCondition};
    use crate::ipopt_ffi::IpoptHandle;

    let layout = NlpLayout::of(ocp);
    debug!(
        nb_variables = layout.nb_variables,
        nb_constraint_rows = layout.nb_constraint_rows,
        "transcribed problem"
    );

    // Variable bounds and initial point.
    let mut x_l = vec![f64::NEG_INFINITY; layout.nb_variables];
    let mut x_u = vec![f64::INFINITY; layout.nb_variables];
    let mut x0 = vec![0.0; layout.nb_variables];

    for (i, phase) in ocp.phases().iter().enumerate() {
        let n = phase.nb_shooting_nodes;
        let nx = phase.nb_states();
        let nu = phase.nb_controls();

        let s = layout.state_offsets[i];
        for k in 0..=n {
            for row in 0..nx {
                x_l[s + k * nx + row] = phase.x_bounds.min_at(row, k, n);
                x_u[s + k * nx + row] = phase.x_bounds.max_at(row, k, n);
                x0[s + k * nx + row] = phase.x_init.at_node(k)[row];
            }
        }
        let c = layout.control_offsets[i];
        for k in 0..n {
            for row in 0..nu {
                x_l[c + k * nu + row] = phase.u_bounds.min_at(row, k, n);
                x_u[c + k * nu + row] = phase.u_bounds.max_at(row, k, n);
                x0[c + k * nu + row] = phase.u_init.at_node(k)[row];
            }
        }

        // Duration bounds come from the phase's time constraint.
        let (t_min, t_max) = phase
            .time_constraint()
            .unwrap_or((phase.time.minimum, phase.time.maximum));
        x_l[layout.time_offset + i] = t_min;
        x_u[layout.time_offset + i] = t_max;
        x0[layout.time_offset + i] = phase.time.initial;
    }

    // Constraint-row bounds, in the layout's row order: per phase the
    // defects then the path entries, then the boundary links.
    let mut g_l = Vec::with_capacity(layout.nb_constraint_rows);
    let mut g_u = Vec::with_capacity(layout.nb_constraint_rows);
    for phase in ocp.phases() {
        let n = phase.nb_shooting_nodes;
        for _ in 0..n * phase.nb_states() {
            g_l.push(0.0);
            g_u.push(0.0);
        }
        for entry in &phase.constraints {
            let (lo, hi) = match &entry.kind {
                ConstraintKind::Time { .. } => continue,
                ConstraintKind::ContactForce {
                    direction,
                    boundary,
                    ..
                } => match direction {
                    Direction::GreaterThan => (*boundary, f64::INFINITY),
                    Direction::LesserThan => (f64::NEG_INFINITY, *boundary),
                },
                ConstraintKind::NonSlipping { .. } => (0.0, f64::INFINITY),
                ConstraintKind::ProportionalState { .. } => (0.0, 0.0),
                ConstraintKind::Transition(condition) => match condition {
                    TransitionCondition::ContactForcesVanish { .. } => (0.0, 0.0),
                    TransitionCondition::MarkerHeightReference { .. } => (0.0, 0.0),
                },
            };
            for _ in 0..entry.nb_rows() * entry.instant.nb_applied_nodes(n) {
                g_l.push(lo);
                g_u.push(hi);
            }
        }
    }
    for i in 0..ocp.nb_phases().saturating_sub(1) {
        for _ in 0..ocp.phase(i + 1).nb_states() {
            g_l.push(0.0);
            g_u.push(0.0);
        }
    }

    let mut handle = IpoptHandle::create(&x_l, &x_u, &g_l, &g_u)
        .ok_or(SolveError::InitializationFailed)?;

    handle.set_str_option(
        "hessian_approximation",
        options.hessian_approximation.as_option_str(),
    );
    handle.set_int_option("max_iter", options.max_iter as i32);
    handle.set_num_option("tol", options.tolerance);
    handle.set_int_option("print_level", if options.show_online_optim { 5 } else { 0 });

    let outcome = handle.solve(&mut x0);

    match SolverStatus::from(outcome.status) {
        SolverStatus::Succeeded | SolverStatus::SolvedToAcceptableLevel => {}
        SolverStatus::InfeasibleProblemDetected => return Err(SolveError::Infeasible),
        SolverStatus::MaximumIterationsExceeded => return Err(SolveError::MaxIterationsReached),
        _ => return Err(SolveError::SolveFailed(outcome.status)),
    }

    let (phase_times, states, controls) = layout.unpack(ocp, &x0);

    Ok(Solution {
        phase_times,
        states,
        controls,
        objective: outcome.objective,
        converged: true,
        iterations: outcome.iterations,
        solve_time_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounds::{Bounds, InitialGuess};
    use crate::constraint::Constraint;
    use crate::mapping::BidirectionalMapping;
    use crate::ocp::JumpOcp;
    use crate::phase::{DynamicsMode, PhaseConfig, PhaseTime};
    use salto_model::description::{Coordinate, Dof, DofKind, ModelDescription, Segment};
    use salto_model::Model;

    fn point_model() -> Model {
        Model::from_description(ModelDescription {
            name: "point".into(),
            coordinates: vec![Coordinate {
                name: "tz".into(),
                range: [-1.0, 1.0],
            }],
            segments: vec![Segment {
                name: "p".into(),
                parent: None,
                offset: [0.0; 3],
                dofs: vec![Dof {
                    coordinate: 0,
                    kind: DofKind::TranslationZ,
                }],
                mass: 1.0,
                com: [0.0; 3],
            }],
            markers: Vec::new(),
            contact_points: Vec::new(),
        })
        .unwrap()
    }

    fn two_phase_problem() -> JumpOcp {
        let phase = |initial: f64| PhaseConfig {
            model: point_model(),
            dynamics: DynamicsMode::TorqueActivationsDriven,
            objectives: Vec::new(),
            constraints: vec![Constraint::time(0.1, 0.4)],
            x_bounds: Bounds::uniform(vec![-1.0, -5.0], vec![1.0, 5.0]),
            u_bounds: Bounds::uniform(vec![-1.0], vec![1.0]),
            x_init: InitialGuess::constant(vec![0.5, 0.0]),
            u_init: InitialGuess::constant(vec![0.0]),
            nb_shooting_nodes: 4,
            time: PhaseTime {
                initial,
                minimum: 0.1,
                maximum: 0.4,
            },
        };
        JumpOcp::builder()
            .add_phase(phase(0.2))
            .add_phase(phase(0.3))
            .q_mappings(vec![BidirectionalMapping::identity(1); 2])
            .qdot_mappings(vec![BidirectionalMapping::identity(1); 2])
            .tau_mappings(vec![BidirectionalMapping::identity(1); 2])
            .build()
            .unwrap()
    }

    #[test]
    fn layout_counts_variables_and_rows() {
        let ocp = two_phase_problem();
        let layout = NlpLayout::of(&ocp);

        // Per phase: 5 nodes × 2 states + 4 × 1 control = 14; plus the
        // 2 duration parameters.
        assert_eq!(layout.nb_variables, 2 * 14 + 2);
        assert_eq!(layout.state_offsets, vec![0, 14]);
        assert_eq!(layout.control_offsets, vec![10, 24]);
        assert_eq!(layout.time_offset, 28);

        // Rows: per phase 4 × 2 defects (time bound is a variable
        // bound), plus one 2-row boundary link.
        assert_eq!(layout.nb_constraint_rows, 2 * 8 + 2);
    }

    #[test]
    fn unpack_recovers_node_trajectories() {
        let ocp = two_phase_problem();
        let layout = NlpLayout::of(&ocp);
        let x: Vec<f64> = (0..layout.nb_variables).map(|i| i as f64).collect();

        let (times, states, controls) = layout.unpack(&ocp, &x);
        assert_eq!(times, vec![28.0, 29.0]);
        assert_eq!(states[0].len(), 5);
        assert_eq!(states[0][0], vec![0.0, 1.0]);
        assert_eq!(states[0][4], vec![8.0, 9.0]);
        assert_eq!(controls[0], vec![vec![10.0], vec![11.0], vec![12.0], vec![13.0]]);
        assert_eq!(states[1][0], vec![14.0, 15.0]);
    }

    #[cfg(not(feature = "ipopt"))]
    #[test]
    fn fallback_returns_initial_guess_unconverged() {
        let ocp = two_phase_problem();
        let solution = solve(&ocp, &SolveOptions::default()).unwrap();

        assert!(!solution.converged);
        assert_eq!(solution.phase_times, vec![0.2, 0.3]);
        assert_eq!(solution.states.len(), 2);
        assert_eq!(solution.states[0].len(), 5);
        assert_eq!(solution.states[0][3], vec![0.5, 0.0]);
        assert_eq!(solution.controls[1].len(), 4);
        assert_eq!(solution.iterations, 0);
    }

    #[test]
    fn status_codes_map() {
        assert_eq!(SolverStatus::from(0), SolverStatus::Succeeded);
        assert_eq!(SolverStatus::from(2), SolverStatus::InfeasibleProblemDetected);
        assert_eq!(SolverStatus::from(-1), SolverStatus::MaximumIterationsExceeded);
        assert_eq!(SolverStatus::from(99), SolverStatus::Unknown(99));
    }

    #[test]
    fn default_options_match_solver_defaults() {
        let options = SolveOptions::default();
        assert_eq!(options.hessian_approximation, HessianApproximation::Exact);
        assert_eq!(options.max_iter, 1000);
        assert!(!options.show_online_optim);
        assert_eq!(
            HessianApproximation::LimitedMemory.as_option_str(),
            "limited-memory"
        );
    }
}
