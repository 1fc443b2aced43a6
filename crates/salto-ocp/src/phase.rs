//! Single-phase configuration.

use serde::{Deserialize, Serialize};

use salto_model::Model;

use crate::bounds::{Bounds, InitialGuess};
use crate::constraint::{self, Constraint};
use crate::objective::Objective;

/// Dynamics formulation of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DynamicsMode {
    /// Joint torques driven by normalized activations, no ground
    /// contact (flight).
    TorqueActivationsDriven,
    /// Joint torques driven by normalized activations, with the
    /// model's contact points constrained to the ground.
    TorqueActivationsDrivenWithContact,
}

impl DynamicsMode {
    pub fn with_contact(&self) -> bool {
        matches!(self, DynamicsMode::TorqueActivationsDrivenWithContact)
    }
}

/// Duration parameters of a phase [s].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseTime {
    /// Initial guess
    pub initial: f64,
    /// Lower bound
    pub minimum: f64,
    /// Upper bound
    pub maximum: f64,
}

/// Complete configuration of one phase.
///
/// Built once at problem-assembly time and immutable afterwards; the
/// solver consumes it read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// The phase's biomechanical model
    pub model: Model,
    pub dynamics: DynamicsMode,
    pub objectives: Vec<Objective>,
    pub constraints: Vec<Constraint>,
    /// State bounds (reduced q then qdot rows)
    pub x_bounds: Bounds,
    /// Control bounds (reduced torque-activation rows)
    pub u_bounds: Bounds,
    pub x_init: InitialGuess,
    pub u_init: InitialGuess,
    /// Number of shooting intervals (`nb_shooting_nodes + 1` node
    /// points carry states)
    pub nb_shooting_nodes: usize,
    pub time: PhaseTime,
}

impl PhaseConfig {
    /// State dimension at each node.
    pub fn nb_states(&self) -> usize {
        self.x_bounds.nb_rows()
    }

    /// Control dimension at each node.
    pub fn nb_controls(&self) -> usize {
        self.u_bounds.nb_rows()
    }

    /// The phase's unique duration bound, if exactly one is declared.
    pub fn time_constraint(&self) -> Option<(f64, f64)> {
        constraint::time_bounds(&self.constraints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use salto_model::description::{Coordinate, Dof, DofKind, ModelDescription, Segment};

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

    #[test]
    fn dimensions_come_from_bounds() {
        let phase = PhaseConfig {
            model: point_model(),
            dynamics: DynamicsMode::TorqueActivationsDriven,
            objectives: Vec::new(),
            constraints: vec![Constraint::time(0.1, 0.4)],
            x_bounds: Bounds::uniform(vec![-1.0, -5.0], vec![1.0, 5.0]),
            u_bounds: Bounds::uniform(vec![-1.0], vec![1.0]),
            x_init: InitialGuess::constant(vec![0.0, 0.0]),
            u_init: InitialGuess::constant(vec![0.0]),
            nb_shooting_nodes: 20,
            time: PhaseTime {
                initial: 0.2,
                minimum: 0.1,
                maximum: 0.4,
            },
        };
        assert_eq!(phase.nb_states(), 2);
        assert_eq!(phase.nb_controls(), 1);
        assert_eq!(phase.time_constraint(), Some((0.1, 0.4)));
        assert!(!phase.dynamics.with_contact());
    }
}
