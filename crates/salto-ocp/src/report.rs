//! Post-solve extraction.
//!
//! Pure functions over a returned [`Solution`]: optimized phase
//! durations for display, and vertical mass-center position/velocity
//! series recomputed by expanding the reduced states back to full
//! model coordinates. Nothing here feeds back into solving.

use salto_model::{Model, ModelError};

use crate::mapping::BidirectionalMapping;
use crate::solver::Solution;

/// Optimized duration of each phase [s].
pub fn phase_durations(solution: &Solution) -> &[f64] {
    &solution.phase_times
}

/// Human-readable summary of the optimized durations.
pub fn format_phase_durations(solution: &Solution) -> String {
    let times: Vec<String> = solution
        .phase_times
        .iter()
        .map(|t| format!("{t:.4}s"))
        .collect();
    format!("The optimized phase times are: {}.", times.join(", "))
}

/// Vertical mass-center position at every node of one phase.
///
/// Each node's reduced coordinates are expanded through `mapping` and
/// evaluated with the phase model's mass-center kinematics.
pub fn com_height_series(
    model: &Model,
    mapping: &BidirectionalMapping,
    phase_states: &[Vec<f64>],
) -> Result<Vec<f64>, ModelError> {
    let nb_q = mapping.nb_reduced();
    phase_states
        .iter()
        .map(|state| {
            let q = mapping.expand.apply(&state[..nb_q]);
            Ok(model.com(&q)?[2])
        })
        .collect()
}

/// Vertical mass-center velocity at every node of one phase.
pub fn com_velocity_series(
    model: &Model,
    mapping: &BidirectionalMapping,
    phase_states: &[Vec<f64>],
) -> Result<Vec<f64>, ModelError> {
    let nb_q = mapping.nb_reduced();
    phase_states
        .iter()
        .map(|state| {
            let q = mapping.expand.apply(&state[..nb_q]);
            let qdot = mapping.expand.apply(&state[nb_q..2 * nb_q]);
            Ok(model.com_velocity(&q, &qdot)?[2])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use salto_model::description::{Coordinate, Dof, DofKind, ModelDescription, Segment};

    fn vertical_model() -> Model {
        Model::from_description(ModelDescription {
            name: "slider".into(),
            coordinates: vec![Coordinate {
                name: "tz".into(),
                range: [-1.0, 2.0],
            }],
            segments: vec![Segment {
                name: "body".into(),
                parent: None,
                offset: [0.0; 3],
                dofs: vec![Dof {
                    coordinate: 0,
                    kind: DofKind::TranslationZ,
                }],
                mass: 5.0,
                com: [0.0, 0.0, 0.3],
            }],
            markers: Vec::new(),
            contact_points: Vec::new(),
        })
        .unwrap()
    }

    #[test]
    fn height_series_tracks_vertical_coordinate() {
        let model = vertical_model();
        let mapping = BidirectionalMapping::identity(1);
        // States are [q, qdot] per node.
        let states = vec![vec![0.0, 0.0], vec![0.5, 1.0], vec![1.0, 0.0]];

        let heights = com_height_series(&model, &mapping, &states).unwrap();
        assert_eq!(heights.len(), 3);
        assert_relative_eq!(heights[0], 0.3, epsilon = 1e-12);
        assert_relative_eq!(heights[1], 0.8, epsilon = 1e-12);
        assert_relative_eq!(heights[2], 1.3, epsilon = 1e-12);
    }

    #[test]
    fn velocity_series_tracks_vertical_rate() {
        let model = vertical_model();
        let mapping = BidirectionalMapping::identity(1);
        let states = vec![vec![0.0, 2.0], vec![0.5, -1.0]];

        let velocities = com_velocity_series(&model, &mapping, &states).unwrap();
        assert_relative_eq!(velocities[0], 2.0, epsilon = 1e-6);
        assert_relative_eq!(velocities[1], -1.0, epsilon = 1e-6);
    }

    #[test]
    fn duration_formatting() {
        let solution = Solution {
            phase_times: vec![0.2, 0.4],
            states: Vec::new(),
            controls: Vec::new(),
            objective: 0.0,
            converged: true,
            iterations: 12,
            solve_time_ms: 3.5,
        };
        assert_eq!(phase_durations(&solution), &[0.2, 0.4]);
        assert_eq!(
            format_phase_durations(&solution),
            "The optimized phase times are: 0.2000s, 0.4000s."
        );
    }
}
