//! The five-phase jumper definition.
//!
//! A maximal vertical jump split by contact state:
//!
//! | phase | contact                  | dynamics     |
//! |-------|--------------------------|--------------|
//! | 0     | heel + toe (crouch)      | with contact |
//! | 1     | toe only (push-off)      | with contact |
//! | 2     | flight                   | no contact   |
//! | 3     | toe only (touch-down)    | with contact |
//! | 4     | heel + toe (landing)     | with contact |
//!
//! Contact is lost discontinuously at the end of push-off, so an
//! impact state transition links phases 2 and 3. All numeric subsets
//! below (force component indices, marker indices, height offsets) are
//! calibration data for the jumper models shipped under `models/`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use salto_model::Model;

use crate::bounds::{self, Bounds, InitialGuess};
use crate::constraint::{Constraint, TransitionCondition};
use crate::mapping::{BidirectionalMapping, IndexMapping};
use crate::objective::ObjectiveSet;
use crate::ocp::{JumpOcp, OcpError, StateTransition};
use crate::phase::{DynamicsMode, PhaseConfig, PhaseTime};

/// Number of phases of the jump.
pub const NB_PHASES: usize = 5;

/// Static friction coefficient of the ground contact.
pub const STATIC_FRICTION_COEFFICIENT: f64 = 0.5;

/// Measured toe-marker height below the origin at the reference pose
/// [m]. Calibration constant tied to that pose.
pub const TOE_MARKER_HEIGHT_OFFSET: f64 = 0.77865438;

/// Measured talus-marker height below the origin at the reference pose
/// [m]. Calibration constant tied to that pose.
pub const TALUS_MARKER_HEIGHT_OFFSET: f64 = 0.77865829;

/// Normalized torque-activation bounds and initial guess.
pub const TORQUE_ACTIVATION_MIN: f64 = -1.0;
pub const TORQUE_ACTIVATION_MAX: f64 = 1.0;
pub const TORQUE_ACTIVATION_INIT: f64 = 0.0;

/// Marker indices in the jumper models.
const TOE_MARKER: usize = 2;
const TALUS_MARKER: usize = 3;

/// Contact-force components bound positive, per contact configuration
/// (indices into the model's contact-force declaration order).
const DOUBLE_CONTACT_POSITIVITY: [usize; 4] = [1, 2, 4, 5];
const SINGLE_CONTACT_POSITIVITY: [usize; 2] = [1, 3];

/// Normal/tangential component split for the non-slipping cone.
/// One foot suffices: slipping cannot occur on a single foot while the
/// other holds.
const DOUBLE_CONTACT_NORMAL: [usize; 2] = [1, 2];
const SINGLE_CONTACT_NORMAL: [usize; 1] = [1];
const CONTACT_TANGENTIAL: usize = 0;

/// Vertical components of the departing heel contact, which must
/// vanish when the heel leaves the ground.
const HEEL_VERTICAL_COMPONENTS: [usize; 2] = [2, 5];

/// Crouched reference pose in reduced coordinates
/// (tx, tz, pelvis, hip, knee, ankle, mtp).
pub fn reference_pose_reduced() -> Vec<f64> {
    vec![0.0, 0.0, -0.5336, 1.4, 0.8, -0.9, 0.47]
}

/// Crouched reference pose over all 13 model coordinates.
pub fn reference_pose_full() -> Vec<f64> {
    vec![
        0.0, 0.0, -0.5336, 0.0, 1.4, 0.0, 1.4, 0.8, -0.9, 0.47, 0.8, -0.9, 0.47,
    ]
}

/// Symmetric coordinate mapping: 13 model coordinates onto 7
/// independent ones. Left-side limb coordinates duplicate the right
/// side; the shoulders are held at zero (the left one through a sign
/// flip, matching the mirrored joint convention).
pub fn symmetric_q_mapping() -> BidirectionalMapping {
    BidirectionalMapping::new(
        IndexMapping::with_opposed(
            vec![
                Some(0),
                Some(1),
                Some(2),
                None,
                Some(3),
                None,
                Some(3),
                Some(4),
                Some(5),
                Some(6),
                Some(4),
                Some(5),
                Some(6),
            ],
            vec![5],
        ),
        IndexMapping::new(vec![
            Some(0),
            Some(1),
            Some(2),
            Some(4),
            Some(7),
            Some(8),
            Some(9),
        ]),
    )
}

/// Symmetric torque mapping: only hip, knee, ankle, and toe joints are
/// actuated, shared between sides.
pub fn symmetric_tau_mapping() -> BidirectionalMapping {
    BidirectionalMapping::new(
        IndexMapping::with_opposed(
            vec![
                None,
                None,
                None,
                None,
                Some(0),
                None,
                Some(0),
                Some(1),
                Some(2),
                Some(3),
                Some(1),
                Some(2),
                Some(3),
            ],
            vec![5],
        ),
        IndexMapping::new(vec![Some(4), Some(7), Some(8), Some(9)]),
    )
}

/// Scenario parameters: model files, discretization, time bounds, and
/// the configuration switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumperScenario {
    /// Model description file per phase
    pub model_paths: Vec<PathBuf>,
    /// Shooting intervals per phase
    pub nb_shooting_nodes: Vec<usize>,
    /// Duration guess and bounds per phase
    pub phase_times: Vec<PhaseTime>,
    /// Exploit bilateral symmetry (reduced coordinates) instead of
    /// coupling left/right joints by constraint
    pub use_symmetry: bool,
    /// Which cost terms the problem carries
    pub objective_set: ObjectiveSet,
}

impl JumperScenario {
    /// The standard five-phase jump over the models in `model_dir`.
    pub fn new(model_dir: impl AsRef<Path>) -> Self {
        let dir = model_dir.as_ref();
        let double = dir.join("jumper_two_contacts.json");
        let single = dir.join("jumper_one_contact.json");

        Self {
            model_paths: vec![
                double.clone(),
                single.clone(),
                single.clone(),
                single,
                double,
            ],
            nb_shooting_nodes: vec![20; NB_PHASES],
            phase_times: vec![
                PhaseTime {
                    initial: 0.2,
                    minimum: 0.1,
                    maximum: 0.4,
                },
                PhaseTime {
                    initial: 0.4,
                    minimum: 0.3,
                    maximum: 0.6,
                },
                PhaseTime {
                    initial: 1.0,
                    minimum: 0.2,
                    maximum: 2.0,
                },
                PhaseTime {
                    initial: 0.3,
                    minimum: 0.1,
                    maximum: 0.4,
                },
                PhaseTime {
                    initial: 0.3,
                    minimum: 0.1,
                    maximum: 0.4,
                },
            ],
            use_symmetry: true,
            objective_set: ObjectiveSet::ComHeight,
        }
    }

    /// Load the models and assemble the problem descriptor.
    pub fn build(&self) -> Result<JumpOcp, OcpError> {
        let nb_phases = NB_PHASES;
        for (what, got) in [
            ("model-path", self.model_paths.len()),
            ("shooting-node", self.nb_shooting_nodes.len()),
            ("time-bound", self.phase_times.len()),
        ] {
            if got != nb_phases {
                return Err(OcpError::PhaseArrayMismatch {
                    what,
                    expected: nb_phases,
                    got,
                });
            }
        }

        let models: Vec<Model> = self
            .model_paths
            .iter()
            .map(Model::load)
            .collect::<Result<_, _>>()?;

        let nb_q_full = models[0].nb_q();
        let (q_mapping, tau_mapping) = if self.use_symmetry {
            (symmetric_q_mapping(), symmetric_tau_mapping())
        } else {
            (
                BidirectionalMapping::identity(nb_q_full),
                BidirectionalMapping::identity(nb_q_full),
            )
        };

        let pose = if self.use_symmetry {
            reference_pose_reduced()
        } else {
            reference_pose_full()
        };
        let nb_q = q_mapping.nb_reduced();
        // Fixed pose with zero velocity, also the flat initial guess.
        let pose_at_rest: Vec<f64> = pose
            .iter()
            .copied()
            .chain(std::iter::repeat(0.0).take(nb_q))
            .collect();

        let dynamics = [
            DynamicsMode::TorqueActivationsDrivenWithContact,
            DynamicsMode::TorqueActivationsDrivenWithContact,
            DynamicsMode::TorqueActivationsDriven,
            DynamicsMode::TorqueActivationsDrivenWithContact,
            DynamicsMode::TorqueActivationsDrivenWithContact,
        ];

        let nb_controls = tau_mapping.nb_reduced();
        let mut builder = JumpOcp::builder();

        for (i, model) in models.iter().enumerate() {
            let mut x_bounds = bounds::q_qdot_bounds(model, &q_mapping);
            // The jump starts and ends at the reference pose, at rest.
            if i == 0 {
                x_bounds.pin_first_node(&pose_at_rest);
            }
            if i == nb_phases - 1 {
                x_bounds.pin_last_node(&pose_at_rest);
            }

            let constraints = self.phase_constraints(i);
            debug!(
                phase = i,
                model = model.name(),
                nb_constraints = constraints.len(),
                "assembled phase"
            );

            builder = builder.add_phase(PhaseConfig {
                model: model.clone(),
                dynamics: dynamics[i],
                objectives: self.objective_set.phase_objectives(i),
                constraints,
                x_bounds,
                u_bounds: Bounds::uniform(
                    vec![TORQUE_ACTIVATION_MIN; nb_controls],
                    vec![TORQUE_ACTIVATION_MAX; nb_controls],
                ),
                x_init: InitialGuess::constant(pose_at_rest.clone()),
                u_init: InitialGuess::constant(vec![TORQUE_ACTIVATION_INIT; nb_controls]),
                nb_shooting_nodes: self.nb_shooting_nodes[i],
                time: self.phase_times[i],
            });
        }

        builder
            .q_mappings(vec![q_mapping.clone(); nb_phases])
            .qdot_mappings(vec![q_mapping; nb_phases])
            .tau_mappings(vec![tau_mapping; nb_phases])
            // Contact loss at the end of push-off.
            .state_transition(StateTransition::Impact { phase_pre_idx: 2 })
            .build()
    }

    /// Constraint list of one phase.
    pub fn phase_constraints(&self, phase: usize) -> Vec<Constraint> {
        let mut list = Vec::new();

        // Positivity of the reaction-force components.
        match phase {
            0 | 4 => {
                for &idx in &DOUBLE_CONTACT_POSITIVITY {
                    list.push(Constraint::contact_force_positivity(idx));
                }
            }
            1 | 3 => {
                for &idx in &SINGLE_CONTACT_POSITIVITY {
                    list.push(Constraint::contact_force_positivity(idx));
                }
            }
            _ => {}
        }

        // Non-slipping friction cone.
        match phase {
            0 | 4 => list.push(Constraint::non_slipping(
                DOUBLE_CONTACT_NORMAL.to_vec(),
                CONTACT_TANGENTIAL,
                STATIC_FRICTION_COEFFICIENT,
            )),
            1 | 3 => list.push(Constraint::non_slipping(
                SINGLE_CONTACT_NORMAL.to_vec(),
                CONTACT_TANGENTIAL,
                STATIC_FRICTION_COEFFICIENT,
            )),
            _ => {}
        }

        // Contact-state transition condition at the phase's first node.
        match phase {
            1 => list.push(Constraint::transition(
                TransitionCondition::ContactForcesVanish {
                    phase: 0,
                    force_idx: HEEL_VERTICAL_COMPONENTS.to_vec(),
                },
            )),
            2 => list.push(Constraint::transition(
                TransitionCondition::ContactForcesVanish {
                    phase: 1,
                    force_idx: (0..4).collect(),
                },
            )),
            3 => list.push(Constraint::transition(
                TransitionCondition::MarkerHeightReference {
                    marker: TOE_MARKER,
                    height_offset: TOE_MARKER_HEIGHT_OFFSET,
                },
            )),
            4 => list.push(Constraint::transition(
                TransitionCondition::MarkerHeightReference {
                    marker: TALUS_MARKER,
                    height_offset: TALUS_MARKER_HEIGHT_OFFSET,
                },
            )),
            _ => {}
        }

        // Without the symmetric mapping, tie the mirrored joint pairs
        // together explicitly.
        if !self.use_symmetry {
            let first_dof = [3, 4, 7, 8, 9];
            let second_dof = [5, 6, 10, 11, 12];
            let coef = [-1.0, 1.0, 1.0, 1.0, 1.0];
            for j in 0..first_dof.len() {
                list.push(Constraint::proportional_state(
                    first_dof[j],
                    second_dof[j],
                    coef[j],
                ));
            }
        }

        let time = self.phase_times[phase];
        list.push(Constraint::time(time.minimum, time.maximum));

        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{self, ConstraintKind, Instant};

    fn scenario() -> JumperScenario {
        JumperScenario::new("models")
    }

    #[test]
    fn default_discretization_and_times() {
        let s = scenario();
        assert_eq!(s.model_paths.len(), NB_PHASES);
        assert_eq!(s.nb_shooting_nodes, vec![20; 5]);
        assert_eq!(s.phase_times[2].maximum, 2.0);
        assert!(s.use_symmetry);
    }

    #[test]
    fn symmetric_mappings_have_expected_dimensions() {
        let q = symmetric_q_mapping();
        assert_eq!(q.nb_full(), 13);
        assert_eq!(q.nb_reduced(), 7);

        let tau = symmetric_tau_mapping();
        assert_eq!(tau.nb_full(), 13);
        assert_eq!(tau.nb_reduced(), 4);
    }

    #[test]
    fn expanding_the_reference_pose_mirrors_the_legs() {
        let q = symmetric_q_mapping();
        let full = q.expand.apply(&reference_pose_reduced());
        assert_eq!(full, reference_pose_full());
    }

    #[test]
    fn every_phase_has_one_time_bound() {
        let s = scenario();
        for phase in 0..NB_PHASES {
            let constraints = s.phase_constraints(phase);
            let (minimum, maximum) = constraint::time_bounds(&constraints)
                .expect("exactly one time constraint");
            assert!(minimum >= 0.0);
            assert!(minimum <= maximum);
        }
    }

    #[test]
    fn contact_positivity_absent_in_flight() {
        let s = scenario();
        for phase in [0, 1, 3, 4] {
            assert!(constraint::has_contact_force_bound(&s.phase_constraints(phase)));
        }
        assert!(!constraint::has_contact_force_bound(&s.phase_constraints(2)));
    }

    #[test]
    fn transitions_read_the_preceding_phase() {
        let s = scenario();

        let push_off = s.phase_constraints(1);
        let heel_off = push_off
            .iter()
            .find_map(|c| match &c.kind {
                ConstraintKind::Transition(TransitionCondition::ContactForcesVanish {
                    phase,
                    force_idx,
                }) => Some((*phase, force_idx.clone(), c.instant)),
                _ => None,
            })
            .expect("heel-off condition");
        assert_eq!(heel_off.0, 0);
        assert_eq!(heel_off.1, vec![2, 5]);
        assert_eq!(heel_off.2, Instant::Start);

        let flight = s.phase_constraints(2);
        let take_off = flight
            .iter()
            .find_map(|c| match &c.kind {
                ConstraintKind::Transition(TransitionCondition::ContactForcesVanish {
                    phase,
                    force_idx,
                }) => Some((*phase, force_idx.len())),
                _ => None,
            })
            .expect("take-off condition");
        assert_eq!(take_off, (1, 4));
    }

    #[test]
    fn touch_down_uses_marker_calibration() {
        let s = scenario();
        let touch_down = s.phase_constraints(3);
        let found = touch_down.iter().any(|c| {
            matches!(
                &c.kind,
                ConstraintKind::Transition(TransitionCondition::MarkerHeightReference {
                    marker: 2,
                    height_offset,
                }) if *height_offset == TOE_MARKER_HEIGHT_OFFSET
            )
        });
        assert!(found);

        let landing = s.phase_constraints(4);
        let found = landing.iter().any(|c| {
            matches!(
                &c.kind,
                ConstraintKind::Transition(TransitionCondition::MarkerHeightReference {
                    marker: 3,
                    height_offset,
                }) if *height_offset == TALUS_MARKER_HEIGHT_OFFSET
            )
        });
        assert!(found);
    }

    #[test]
    fn asymmetric_configuration_couples_joint_pairs() {
        let mut s = scenario();
        s.use_symmetry = false;

        for phase in 0..NB_PHASES {
            let constraints = s.phase_constraints(phase);
            let couplings: Vec<_> = constraints
                .iter()
                .filter_map(|c| match c.kind {
                    ConstraintKind::ProportionalState {
                        first_dof,
                        second_dof,
                        coef,
                    } => Some((first_dof, second_dof, coef)),
                    _ => None,
                })
                .collect();
            assert_eq!(couplings.len(), 5);
            assert_eq!(couplings[0], (3, 5, -1.0));
            assert_eq!(couplings[1], (4, 6, 1.0));
            assert_eq!(couplings[4], (9, 12, 1.0));
        }
    }
}
