//! State/control bounds and initial guesses.
//!
//! Bounds distinguish three node intervals, so a phase can pin its
//! first or last node to a fixed value while interior nodes keep the
//! joint range: column 0 applies to the first node, column 1 to every
//! interior node, column 2 to the last node.

use serde::{Deserialize, Serialize};

use salto_model::Model;

use crate::mapping::BidirectionalMapping;

/// Velocity bound applied to every generalized coordinate [rad/s or
/// m/s]. The joint ranges bound positions; velocities share one wide
/// symmetric limit.
pub const MAX_GENERALIZED_VELOCITY: f64 = 10.0 * std::f64::consts::PI;

/// Per-row, per-interval bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    /// Minimum per row: [first node, interior nodes, last node]
    pub min: Vec<[f64; 3]>,
    /// Maximum per row: [first node, interior nodes, last node]
    pub max: Vec<[f64; 3]>,
}

impl Bounds {
    /// Same bounds at every node.
    pub fn uniform(min: Vec<f64>, max: Vec<f64>) -> Self {
        debug_assert_eq!(min.len(), max.len());
        Self {
            min: min.into_iter().map(|v| [v; 3]).collect(),
            max: max.into_iter().map(|v| [v; 3]).collect(),
        }
    }

    /// Number of bounded rows.
    pub fn nb_rows(&self) -> usize {
        self.min.len()
    }

    /// Pin the first node to `values` exactly (min = max).
    pub fn pin_first_node(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.nb_rows());
        for (row, value) in values.iter().enumerate() {
            self.min[row][0] = *value;
            self.max[row][0] = *value;
        }
    }

    /// Pin the last node to `values` exactly (min = max).
    pub fn pin_last_node(&mut self, values: &[f64]) {
        debug_assert_eq!(values.len(), self.nb_rows());
        for (row, value) in values.iter().enumerate() {
            self.min[row][2] = *value;
            self.max[row][2] = *value;
        }
    }

    fn interval(node: usize, nb_nodes: usize) -> usize {
        if node == 0 {
            0
        } else if node == nb_nodes {
            2
        } else {
            1
        }
    }

    /// Minimum of `row` at shooting node `node` of `nb_nodes` intervals.
    pub fn min_at(&self, row: usize, node: usize, nb_nodes: usize) -> f64 {
        self.min[row][Self::interval(node, nb_nodes)]
    }

    /// Maximum of `row` at shooting node `node` of `nb_nodes` intervals.
    pub fn max_at(&self, row: usize, node: usize, nb_nodes: usize) -> f64 {
        self.max[row][Self::interval(node, nb_nodes)]
    }
}

/// State bounds derived from the model's joint ranges, reduced through
/// a coordinate mapping: position rows take the mapped joint range
/// (swapped when the mapping flips the sign), velocity rows take
/// ±[`MAX_GENERALIZED_VELOCITY`].
pub fn q_qdot_bounds(model: &Model, mapping: &BidirectionalMapping) -> Bounds {
    let (range_min, range_max) = model.q_ranges();
    let nb_reduced = mapping.nb_reduced();

    let mut min = Vec::with_capacity(2 * nb_reduced);
    let mut max = Vec::with_capacity(2 * nb_reduced);

    for i in 0..nb_reduced {
        match mapping.reduce.target(i) {
            Some(full) if mapping.reduce.is_opposed(i) => {
                min.push(-range_max[full]);
                max.push(-range_min[full]);
            }
            Some(full) => {
                min.push(range_min[full]);
                max.push(range_max[full]);
            }
            None => {
                min.push(0.0);
                max.push(0.0);
            }
        }
    }
    for _ in 0..nb_reduced {
        min.push(-MAX_GENERALIZED_VELOCITY);
        max.push(MAX_GENERALIZED_VELOCITY);
    }

    Bounds::uniform(min, max)
}

/// A constant initial guess replicated across all shooting nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialGuess {
    values: Vec<f64>,
}

impl InitialGuess {
    pub fn constant(values: Vec<f64>) -> Self {
        Self { values }
    }

    pub fn nb_rows(&self) -> usize {
        self.values.len()
    }

    /// Guess at any shooting node.
    pub fn at_node(&self, _node: usize) -> &[f64] {
        &self.values
    }
}
