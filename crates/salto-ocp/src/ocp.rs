//! Whole-problem descriptor and validation.
//!
//! [`JumpOcp`] aggregates the ordered phase configurations, the
//! inter-phase state transitions, and the shared coordinate/control
//! mappings into the unit handed to the external solver. The builder
//! checks every cross-reference once, so downstream code (solver
//! packing, reporting) can index without further validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constraint::{ConstraintKind, TransitionCondition};
use crate::mapping::BidirectionalMapping;
use crate::phase::PhaseConfig;

/// Rule linking one phase's terminal state to the next phase's initial
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateTransition {
    /// States are equal across the boundary.
    Continuous { phase_pre_idx: usize },
    /// An impact map is applied: generalized velocities change
    /// discontinuously as the contact configuration changes.
    Impact { phase_pre_idx: usize },
}

impl StateTransition {
    /// Index of the phase ending at this boundary.
    pub fn phase_pre_idx(&self) -> usize {
        match self {
            StateTransition::Continuous { phase_pre_idx }
            | StateTransition::Impact { phase_pre_idx } => *phase_pre_idx,
        }
    }
}

/// Descriptor-assembly errors.
#[derive(Debug, Error)]
pub enum OcpError {
    #[error("problem has no phases")]
    NoPhases,

    #[error("{kind} mapping count mismatch: expected {expected}, got {got}")]
    MappingCountMismatch {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("per-phase {what} count mismatch: expected {expected}, got {got}")]
    PhaseArrayMismatch {
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("phase {phase} has no time constraint")]
    MissingTimeConstraint { phase: usize },

    #[error("phase {phase} has more than one time constraint")]
    DuplicateTimeConstraint { phase: usize },

    #[error("phase {phase} has invalid time bounds [{minimum}, {maximum}]")]
    InvalidTimeBounds {
        phase: usize,
        minimum: f64,
        maximum: f64,
    },

    #[error("transition at boundary {phase_pre_idx} out of range for {nb_phases} phases")]
    TransitionOutOfRange {
        phase_pre_idx: usize,
        nb_phases: usize,
    },

    #[error("phase {phase} references contact force {force_idx}, model has {available}")]
    ContactForceOutOfRange {
        phase: usize,
        force_idx: usize,
        available: usize,
    },

    #[error("phase {phase} declares contact constraints but its dynamics carry no contact")]
    ContactConstraintWithoutContact { phase: usize },

    #[error("phase {phase} transition must reference an earlier phase, got {reference}")]
    TransitionReferenceInvalid { phase: usize, reference: usize },

    #[error("phase {phase} references marker {marker}, model has {available}")]
    MarkerOutOfRange {
        phase: usize,
        marker: usize,
        available: usize,
    },

    #[error("phase {phase} coupling references coordinate {dof}, model has {available}")]
    CoupledDofOutOfRange {
        phase: usize,
        dof: usize,
        available: usize,
    },

    #[error("phase {phase} {what} dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch {
        phase: usize,
        what: &'static str,
        expected: usize,
        got: usize,
    },

    #[error(transparent)]
    Model(#[from] salto_model::ModelError),
}

/// The assembled optimization problem.
///
/// Immutable after construction; consumed read-only by the solver and
/// the reporting helpers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JumpOcp {
    phases: Vec<PhaseConfig>,
    transitions: Vec<StateTransition>,
    q_mapping: Vec<BidirectionalMapping>,
    qdot_mapping: Vec<BidirectionalMapping>,
    tau_mapping: Vec<BidirectionalMapping>,
}

impl JumpOcp {
    pub fn builder() -> JumpOcpBuilder {
        JumpOcpBuilder::default()
    }

    pub fn nb_phases(&self) -> usize {
        self.phases.len()
    }

    pub fn phases(&self) -> &[PhaseConfig] {
        &self.phases
    }

    pub fn phase(&self, i: usize) -> &PhaseConfig {
        &self.phases[i]
    }

    pub fn transitions(&self) -> &[StateTransition] {
        &self.transitions
    }

    pub fn q_mapping(&self, phase: usize) -> &BidirectionalMapping {
        &self.q_mapping[phase]
    }

    pub fn qdot_mapping(&self, phase: usize) -> &BidirectionalMapping {
        &self.qdot_mapping[phase]
    }

    pub fn tau_mapping(&self, phase: usize) -> &BidirectionalMapping {
        &self.tau_mapping[phase]
    }

    /// Duration bounds of every phase, in order.
    pub fn phase_time_bounds(&self) -> Vec<(f64, f64)> {
        self.phases
            .iter()
            .map(|p| p.time_constraint().unwrap_or((p.time.minimum, p.time.maximum)))
            .collect()
    }
}

/// Builder validating the descriptor's cross-references.
#[derive(Debug, Default)]
pub struct JumpOcpBuilder {
    phases: Vec<PhaseConfig>,
    transitions: Vec<StateTransition>,
    q_mapping: Vec<BidirectionalMapping>,
    qdot_mapping: Vec<BidirectionalMapping>,
    tau_mapping: Vec<BidirectionalMapping>,
}

impl JumpOcpBuilder {
    pub fn add_phase(mut self, phase: PhaseConfig) -> Self {
        self.phases.push(phase);
        self
    }

    pub fn q_mappings(mut self, mappings: Vec<BidirectionalMapping>) -> Self {
        self.q_mapping = mappings;
        self
    }

    pub fn qdot_mappings(mut self, mappings: Vec<BidirectionalMapping>) -> Self {
        self.qdot_mapping = mappings;
        self
    }

    pub fn tau_mappings(mut self, mappings: Vec<BidirectionalMapping>) -> Self {
        self.tau_mapping = mappings;
        self
    }

    pub fn state_transition(mut self, transition: StateTransition) -> Self {
        self.transitions.push(transition);
        self
    }

    pub fn build(self) -> Result<JumpOcp, OcpError> {
        let nb_phases = self.phases.len();
        if nb_phases == 0 {
            return Err(OcpError::NoPhases);
        }

        for (kind, mappings) in [
            ("q", &self.q_mapping),
            ("qdot", &self.qdot_mapping),
            ("tau", &self.tau_mapping),
        ] {
            if mappings.len() != nb_phases {
                return Err(OcpError::MappingCountMismatch {
                    kind,
                    expected: nb_phases,
                    got: mappings.len(),
                });
            }
        }

        for transition in &self.transitions {
            let pre = transition.phase_pre_idx();
            if pre + 1 >= nb_phases {
                return Err(OcpError::TransitionOutOfRange {
                    phase_pre_idx: pre,
                    nb_phases,
                });
            }
        }

        for (i, phase) in self.phases.iter().enumerate() {
            self.validate_phase_time(i, phase)?;
            self.validate_phase_constraints(i, phase)?;
            self.validate_phase_dimensions(i, phase)?;
        }

        Ok(JumpOcp {
            phases: self.phases,
            transitions: self.transitions,
            q_mapping: self.q_mapping,
            qdot_mapping: self.qdot_mapping,
            tau_mapping: self.tau_mapping,
        })
    }

    fn validate_phase_time(&self, i: usize, phase: &PhaseConfig) -> Result<(), OcpError> {
        let mut bounds = None;
        for entry in &phase.constraints {
            if let ConstraintKind::Time { minimum, maximum } = entry.kind {
                if bounds.is_some() {
                    return Err(OcpError::DuplicateTimeConstraint { phase: i });
                }
                bounds = Some((minimum, maximum));
            }
        }
        let (minimum, maximum) = bounds.ok_or(OcpError::MissingTimeConstraint { phase: i })?;
        if minimum < 0.0 || minimum > maximum {
            return Err(OcpError::InvalidTimeBounds {
                phase: i,
                minimum,
                maximum,
            });
        }
        Ok(())
    }

    fn validate_phase_constraints(&self, i: usize, phase: &PhaseConfig) -> Result<(), OcpError> {
        let nb_forces = phase.model.nb_contact_forces();
        let nb_q = phase.model.nb_q();

        for entry in &phase.constraints {
            match &entry.kind {
                ConstraintKind::ContactForce { force_idx, .. } => {
                    if !phase.dynamics.with_contact() {
                        return Err(OcpError::ContactConstraintWithoutContact { phase: i });
                    }
                    if *force_idx >= nb_forces {
                        return Err(OcpError::ContactForceOutOfRange {
                            phase: i,
                            force_idx: *force_idx,
                            available: nb_forces,
                        });
                    }
                }
                ConstraintKind::NonSlipping {
                    normal_idx,
                    tangential_idx,
                    ..
                } => {
                    if !phase.dynamics.with_contact() {
                        return Err(OcpError::ContactConstraintWithoutContact { phase: i });
                    }
                    for idx in normal_idx.iter().chain(std::iter::once(tangential_idx)) {
                        if *idx >= nb_forces {
                            return Err(OcpError::ContactForceOutOfRange {
                                phase: i,
                                force_idx: *idx,
                                available: nb_forces,
                            });
                        }
                    }
                }
                ConstraintKind::ProportionalState {
                    first_dof,
                    second_dof,
                    ..
                } => {
                    for dof in [*first_dof, *second_dof] {
                        if dof >= nb_q {
                            return Err(OcpError::CoupledDofOutOfRange {
                                phase: i,
                                dof,
                                available: nb_q,
                            });
                        }
                    }
                }
                ConstraintKind::Time { .. } => {}
                ConstraintKind::Transition(condition) => {
                    self.validate_transition_condition(i, phase, condition)?;
                }
            }
        }
        Ok(())
    }

    /// Transition conditions may read the contact-force function of an
    /// adjacent, earlier phase: the reference is resolved against this
    /// builder's phase list.
    fn validate_transition_condition(
        &self,
        i: usize,
        phase: &PhaseConfig,
        condition: &TransitionCondition,
    ) -> Result<(), OcpError> {
        match condition {
            TransitionCondition::ContactForcesVanish {
                phase: reference,
                force_idx,
            } => {
                if *reference >= i {
                    return Err(OcpError::TransitionReferenceInvalid {
                        phase: i,
                        reference: *reference,
                    });
                }
                let referenced = &self.phases[*reference];
                let available = referenced.model.nb_contact_forces();
                for idx in force_idx {
                    if *idx >= available {
                        return Err(OcpError::ContactForceOutOfRange {
                            phase: *reference,
                            force_idx: *idx,
                            available,
                        });
                    }
                }
            }
            TransitionCondition::MarkerHeightReference { marker, .. } => {
                let available = phase.model.nb_markers();
                if *marker >= available {
                    return Err(OcpError::MarkerOutOfRange {
                        phase: i,
                        marker: *marker,
                        available,
                    });
                }
            }
        }
        Ok(())
    }

    fn validate_phase_dimensions(&self, i: usize, phase: &PhaseConfig) -> Result<(), OcpError> {
        let nb_states = 2 * self.q_mapping[i].nb_reduced();
        if phase.x_bounds.nb_rows() != nb_states {
            return Err(OcpError::DimensionMismatch {
                phase: i,
                what: "state bounds",
                expected: nb_states,
                got: phase.x_bounds.nb_rows(),
            });
        }
        if phase.x_init.nb_rows() != nb_states {
            return Err(OcpError::DimensionMismatch {
                phase: i,
                what: "state initial guess",
                expected: nb_states,
                got: phase.x_init.nb_rows(),
            });
        }
        let nb_controls = self.tau_mapping[i].nb_reduced();
        if phase.u_bounds.nb_rows() != nb_controls {
            return Err(OcpError::DimensionMismatch {
                phase: i,
                what: "control bounds",
                expected: nb_controls,
                got: phase.u_bounds.nb_rows(),
            });
        }
        if phase.u_init.nb_rows() != nb_controls {
            return Err(OcpError::DimensionMismatch {
                phase: i,
                what: "control initial guess",
                expected: nb_controls,
                got: phase.u_init.nb_rows(),
            });
        }
        Ok(())
    }
}
