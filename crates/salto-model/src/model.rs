//! Validated model, ready for kinematic evaluation.

use std::fs;
use std::path::Path;

use crate::description::ModelDescription;
use crate::error::ModelError;
use crate::kinematics;
use crate::Vec3;

/// A validated biomechanical model.
///
/// Construction checks all cross-references in the description so that
/// kinematic evaluation can index without further checks. Models are
/// immutable once built.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Model {
    description: ModelDescription,
    nb_contact_forces: usize,
}

impl Model {
    /// Load and validate a model from a JSON description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| ModelError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let description =
            serde_json::from_str(&content).map_err(|e| ModelError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;
        Self::from_description(description)
    }

    /// Validate an in-memory description.
    pub fn from_description(description: ModelDescription) -> Result<Self, ModelError> {
        if description.coordinates.is_empty() {
            return Err(ModelError::NoCoordinates(description.name.clone()));
        }
        for coordinate in &description.coordinates {
            if coordinate.range[0] > coordinate.range[1] {
                return Err(ModelError::InvertedRange(coordinate.name.clone()));
            }
        }
        let nb_q = description.coordinates.len();
        let nb_segments = description.segments.len();

        for (i, segment) in description.segments.iter().enumerate() {
            match segment.parent {
                // Parents must precede children: guarantees the chain is
                // a forest and allows single-pass forward kinematics.
                Some(p) if p >= i => {
                    return Err(ModelError::ParentOrder(segment.name.clone()));
                }
                _ => {}
            }
            for dof in &segment.dofs {
                if dof.coordinate >= nb_q {
                    return Err(ModelError::UnknownCoordinate {
                        segment: segment.name.clone(),
                        coordinate: dof.coordinate,
                    });
                }
            }
        }
        for marker in &description.markers {
            if marker.segment >= nb_segments {
                return Err(ModelError::UnknownSegment {
                    referrer: marker.name.clone(),
                    segment: marker.segment,
                });
            }
        }
        for contact in &description.contact_points {
            if contact.segment >= nb_segments {
                return Err(ModelError::UnknownSegment {
                    referrer: contact.name.clone(),
                    segment: contact.segment,
                });
            }
        }

        let nb_contact_forces = description
            .contact_points
            .iter()
            .map(|c| c.axes.len())
            .sum();

        Ok(Self {
            description,
            nb_contact_forces,
        })
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.description.name
    }

    /// Number of generalized coordinates.
    pub fn nb_q(&self) -> usize {
        self.description.coordinates.len()
    }

    /// Number of generalized velocities (equal to [`Self::nb_q`] for
    /// this planar formulation).
    pub fn nb_qdot(&self) -> usize {
        self.nb_q()
    }

    /// Number of markers.
    pub fn nb_markers(&self) -> usize {
        self.description.markers.len()
    }

    /// Total number of contact-force components across all contact
    /// points, in declaration order.
    pub fn nb_contact_forces(&self) -> usize {
        self.nb_contact_forces
    }

    /// Total model mass [kg].
    pub fn total_mass(&self) -> f64 {
        self.description.segments.iter().map(|s| s.mass).sum()
    }

    /// Joint range of every coordinate as (minimums, maximums).
    pub fn q_ranges(&self) -> (Vec<f64>, Vec<f64>) {
        let min = self
            .description
            .coordinates
            .iter()
            .map(|c| c.range[0])
            .collect();
        let max = self
            .description
            .coordinates
            .iter()
            .map(|c| c.range[1])
            .collect();
        (min, max)
    }

    /// Underlying description.
    pub fn description(&self) -> &ModelDescription {
        &self.description
    }

    /// World position of a marker for a full coordinate vector.
    pub fn marker_position(&self, q: &[f64], marker: usize) -> Result<Vec3, ModelError> {
        self.check_dim(q)?;
        let m = self
            .description
            .markers
            .get(marker)
            .ok_or(ModelError::UnknownMarker(marker))?;
        let frames = kinematics::segment_frames(&self.description, q);
        Ok(frames[m.segment].transform_point(&m.position))
    }

    /// Whole-body mass center for a full coordinate vector.
    pub fn com(&self, q: &[f64]) -> Result<Vec3, ModelError> {
        self.check_dim(q)?;
        Ok(kinematics::mass_center(&self.description, q))
    }

    /// Mass-center velocity for full coordinate/velocity vectors.
    pub fn com_velocity(&self, q: &[f64], qdot: &[f64]) -> Result<Vec3, ModelError> {
        self.check_dim(q)?;
        self.check_dim(qdot)?;
        Ok(kinematics::com_velocity(&self.description, q, qdot))
    }

    fn check_dim(&self, q: &[f64]) -> Result<(), ModelError> {
        if q.len() != self.nb_q() {
            return Err(ModelError::InvalidDimension {
                expected: self.nb_q(),
                got: q.len(),
            });
        }
        Ok(())
    }
}
