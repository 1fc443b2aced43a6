//! Weighted objective terms.

use serde::{Deserialize, Serialize};

/// Cost components supported by the jump problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Mayer term: predicted ballistic peak height of the mass center
    /// at the phase's terminal node. A negative weight turns the
    /// minimization into height maximization.
    MinimizePredictedComHeight,
    /// Lagrange term: integrated squared joint torque.
    MinimizeTorque,
}

impl ObjectiveKind {
    /// Whether the term is evaluated at the terminal node only (Mayer)
    /// rather than integrated along the phase (Lagrange).
    pub fn is_mayer(&self) -> bool {
        matches!(self, ObjectiveKind::MinimizePredictedComHeight)
    }
}

/// One weighted cost component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub kind: ObjectiveKind,
    pub weight: f64,
}

/// Which objective terms the problem carries, per phase.
///
/// The variants enumerate the configurations of interest explicitly
/// instead of keeping alternative term lists around in comments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectiveSet {
    /// No cost: pure feasibility problem.
    None,
    /// Maximize the predicted mass-center peak during push-off
    /// (phase index 1) only.
    ComHeight,
    /// [`ObjectiveSet::ComHeight`] plus a small torque regularization
    /// on every actuated phase after the initial stance.
    ComHeightWithTorqueRegularization,
}

/// Weight of the push-off height term.
pub const COM_HEIGHT_WEIGHT: f64 = -1.0;

/// Weight of the optional torque regularization term.
pub const TORQUE_REGULARIZATION_WEIGHT: f64 = -1.0 / 100.0;

impl ObjectiveSet {
    /// Objective terms carried by phase `phase` (0-based).
    pub fn phase_objectives(&self, phase: usize) -> Vec<Objective> {
        let mut terms = Vec::new();
        match self {
            ObjectiveSet::None => {}
            ObjectiveSet::ComHeight => {
                if phase == 1 {
                    terms.push(Objective {
                        kind: ObjectiveKind::MinimizePredictedComHeight,
                        weight: COM_HEIGHT_WEIGHT,
                    });
                }
            }
            ObjectiveSet::ComHeightWithTorqueRegularization => {
                if phase == 1 {
                    terms.push(Objective {
                        kind: ObjectiveKind::MinimizePredictedComHeight,
                        weight: COM_HEIGHT_WEIGHT,
                    });
                }
                if phase >= 1 {
                    terms.push(Objective {
                        kind: ObjectiveKind::MinimizeTorque,
                        weight: TORQUE_REGULARIZATION_WEIGHT,
                    });
                }
            }
        }
        terms
    }
}
