//! Per-phase constraint entries.
//!
//! Constraints are declarative: each entry names the quantity it binds,
//! the instant(s) it applies to, and its numeric parameters. Evaluation
//! of force- and dynamics-dependent entries happens inside the external
//! solver; this crate only assembles and validates the list.

use serde::{Deserialize, Serialize};

/// The discretization instant(s) a constraint applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instant {
    /// First shooting node of the phase
    Start,
    /// Last shooting node of the phase
    End,
    /// Every shooting node
    All,
    /// A specific node index
    Node(usize),
}

impl Instant {
    /// Number of nodes the constraint spans for a phase with
    /// `nb_nodes` shooting intervals (`nb_nodes + 1` node points).
    pub fn nb_applied_nodes(&self, nb_nodes: usize) -> usize {
        match self {
            Instant::All => nb_nodes + 1,
            _ => 1,
        }
    }
}

/// Inequality direction for scalar bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    GreaterThan,
    LesserThan,
}

/// A contact-state transition condition, applied at a phase's first
/// node.
///
/// Conditions referencing contact forces read the force evaluation of
/// an *adjacent* phase; the reference is stored as an explicit phase
/// index resolved against the problem-wide phase list when the
/// descriptor is built, never as a closure over shared state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TransitionCondition {
    /// The listed contact-force components of the referenced phase must
    /// vanish at its terminal node.
    ContactForcesVanish {
        /// Index of the phase whose force function is read
        phase: usize,
        /// Contact-force component indices in that phase's model
        force_idx: Vec<usize>,
    },
    /// A marker's height must equal the declared measured offset
    /// (marker z + offset = 0).
    MarkerHeightReference {
        /// Marker index in this phase's model
        marker: usize,
        /// Calibrated height offset [m]
        height_offset: f64,
    },
}

/// The constraint variants used by the jump problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// Bound on one contact-force component.
    ContactForce {
        force_idx: usize,
        direction: Direction,
        boundary: f64,
    },
    /// Friction-cone limit on tangential vs. normal contact force.
    NonSlipping {
        normal_idx: Vec<usize>,
        tangential_idx: usize,
        static_friction_coefficient: f64,
    },
    /// Linear coupling between two coordinates:
    /// q[first_dof] = coef · q[second_dof].
    ProportionalState {
        first_dof: usize,
        second_dof: usize,
        coef: f64,
    },
    /// Bound on the phase duration.
    Time { minimum: f64, maximum: f64 },
    /// Contact-state transition condition.
    Transition(TransitionCondition),
}

/// A constraint entry: what to bind, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Constraint {
    pub kind: ConstraintKind,
    pub instant: Instant,
}

impl Constraint {
    /// Positivity of one contact-force component, at every node.
    pub fn contact_force_positivity(force_idx: usize) -> Self {
        Self {
            kind: ConstraintKind::ContactForce {
                force_idx,
                direction: Direction::GreaterThan,
                boundary: 0.0,
            },
            instant: Instant::All,
        }
    }

    /// Non-slipping friction cone, at every node.
    pub fn non_slipping(
        normal_idx: Vec<usize>,
        tangential_idx: usize,
        static_friction_coefficient: f64,
    ) -> Self {
        Self {
            kind: ConstraintKind::NonSlipping {
                normal_idx,
                tangential_idx,
                static_friction_coefficient,
            },
            instant: Instant::All,
        }
    }

    /// Proportional coupling of two coordinates, at every node.
    pub fn proportional_state(first_dof: usize, second_dof: usize, coef: f64) -> Self {
        Self {
            kind: ConstraintKind::ProportionalState {
                first_dof,
                second_dof,
                coef,
            },
            instant: Instant::All,
        }
    }

    /// Phase-duration bound.
    pub fn time(minimum: f64, maximum: f64) -> Self {
        Self {
            kind: ConstraintKind::Time { minimum, maximum },
            instant: Instant::All,
        }
    }

    /// Transition condition at the phase's first node.
    pub fn transition(condition: TransitionCondition) -> Self {
        Self {
            kind: ConstraintKind::Transition(condition),
            instant: Instant::Start,
        }
    }

    /// Number of scalar rows this entry contributes per applied node.
    pub fn nb_rows(&self) -> usize {
        match &self.kind {
            ConstraintKind::ContactForce { .. } => 1,
            // One cone inequality per tangential direction sign.
            ConstraintKind::NonSlipping { .. } => 2,
            ConstraintKind::ProportionalState { .. } => 1,
            ConstraintKind::Time { .. } => 1,
            ConstraintKind::Transition(condition) => match condition {
                TransitionCondition::ContactForcesVanish { force_idx, .. } => force_idx.len(),
                TransitionCondition::MarkerHeightReference { .. } => 1,
            },
        }
    }
}

/// The unique time bound of a constraint list, if exactly one exists.
pub fn time_bounds(constraints: &[Constraint]) -> Option<(f64, f64)> {
    let mut found = None;
    for constraint in constraints {
        if let ConstraintKind::Time { minimum, maximum } = constraint.kind {
            if found.is_some() {
                return None;
            }
            found = Some((minimum, maximum));
        }
    }
    found
}

/// Whether any entry is a contact-force positivity bound.
pub fn has_contact_force_bound(constraints: &[Constraint]) -> bool {
    constraints
        .iter()
        .any(|c| matches!(c.kind, ConstraintKind::ContactForce { .. }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positivity_constructor() {
        let c = Constraint::contact_force_positivity(4);
        assert_eq!(c.instant, Instant::All);
        assert!(matches!(
            c.kind,
            ConstraintKind::ContactForce {
                force_idx: 4,
                direction: Direction::GreaterThan,
                boundary,
            } if boundary == 0.0
        ));
    }

    #[test]
    fn transition_applies_at_start() {
        let c = Constraint::transition(TransitionCondition::ContactForcesVanish {
            phase: 0,
            force_idx: vec![2, 5],
        });
        assert_eq!(c.instant, Instant::Start);
        assert_eq!(c.nb_rows(), 2);
    }

    #[test]
    fn instant_node_counts() {
        assert_eq!(Instant::All.nb_applied_nodes(20), 21);
        assert_eq!(Instant::Start.nb_applied_nodes(20), 1);
        assert_eq!(Instant::End.nb_applied_nodes(20), 1);
        assert_eq!(Instant::Node(7).nb_applied_nodes(20), 1);
    }

    #[test]
    fn unique_time_bound_lookup() {
        let list = vec![
            Constraint::contact_force_positivity(1),
            Constraint::time(0.1, 0.4),
        ];
        assert_eq!(time_bounds(&list), Some((0.1, 0.4)));

        let none: Vec<Constraint> = vec![Constraint::contact_force_positivity(1)];
        assert_eq!(time_bounds(&none), None);

        let duplicated = vec![Constraint::time(0.1, 0.4), Constraint::time(0.2, 0.5)];
        assert_eq!(time_bounds(&duplicated), None);
    }

    #[test]
    fn contact_bound_detection() {
        let with = vec![Constraint::contact_force_positivity(0)];
        let without = vec![
            Constraint::time(0.2, 2.0),
            Constraint::transition(TransitionCondition::MarkerHeightReference {
                marker: 2,
                height_offset: 0.5,
            }),
        ];
        assert!(has_contact_force_bound(&with));
        assert!(!has_contact_force_bound(&without));
    }
}
