//! Reduce/expand coordinate mappings.
//!
//! Bilateral symmetry lets the optimization work on a reduced set of
//! independent generalized coordinates. A [`BidirectionalMapping`]
//! pairs the two directions: `reduce` picks the independent coordinates
//! out of the full vector, `expand` rebuilds the full vector by
//! duplicating mirrored coordinates (with declared sign flips) and
//! zero-filling coordinates absent from the reduced set.

use serde::{Deserialize, Serialize};

/// A one-way index mapping between coordinate vectors.
///
/// Output element `i` takes the input element `targets[i]`, negated
/// when `i` is listed in `oppose`; a `None` target zero-fills the
/// output element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMapping {
    targets: Vec<Option<usize>>,
    oppose: Vec<usize>,
}

impl IndexMapping {
    /// Mapping without sign flips.
    pub fn new(targets: Vec<Option<usize>>) -> Self {
        Self {
            targets,
            oppose: Vec::new(),
        }
    }

    /// Mapping with the output indices in `oppose` sign-flipped.
    pub fn with_opposed(targets: Vec<Option<usize>>, oppose: Vec<usize>) -> Self {
        Self { targets, oppose }
    }

    /// Output dimension.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Input index feeding output element `i`.
    pub fn target(&self, i: usize) -> Option<usize> {
        self.targets[i]
    }

    /// Whether output element `i` is sign-flipped.
    pub fn is_opposed(&self, i: usize) -> bool {
        self.oppose.contains(&i)
    }

    /// Largest input index referenced, if any.
    pub fn max_target(&self) -> Option<usize> {
        self.targets.iter().flatten().copied().max()
    }

    /// Map an input vector to the output dimension.
    ///
    /// The caller is responsible for `input` covering every referenced
    /// index; the problem builder validates this once at assembly time.
    pub fn apply(&self, input: &[f64]) -> Vec<f64> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, target)| match target {
                Some(j) => {
                    let sign = if self.is_opposed(i) { -1.0 } else { 1.0 };
                    sign * input[*j]
                }
                None => 0.0,
            })
            .collect()
    }
}

/// Paired reduce/expand mappings between the full model coordinates
/// and the reduced independent set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidirectionalMapping {
    /// Reduced → full
    pub expand: IndexMapping,
    /// Full → reduced
    pub reduce: IndexMapping,
}

impl BidirectionalMapping {
    pub fn new(expand: IndexMapping, reduce: IndexMapping) -> Self {
        Self { expand, reduce }
    }

    /// Identity mapping over `n` coordinates (symmetry disabled).
    pub fn identity(n: usize) -> Self {
        let targets: Vec<Option<usize>> = (0..n).map(Some).collect();
        Self {
            expand: IndexMapping::new(targets.clone()),
            reduce: IndexMapping::new(targets),
        }
    }

    /// Dimension of the reduced coordinate vector.
    pub fn nb_reduced(&self) -> usize {
        self.reduce.len()
    }

    /// Dimension of the full coordinate vector.
    pub fn nb_full(&self) -> usize {
        self.expand.len()
    }
}
