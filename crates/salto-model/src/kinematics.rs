//! Planar forward kinematics over the segment chain.
//!
//! Motion is restricted to the sagittal plane: frames carry an (x, z)
//! position and a rotation angle about the y axis. The y component of
//! local points passes through unchanged so that world positions are
//! full 3D vectors with the vertical component at index 2.

use crate::description::{DofKind, ModelDescription};
use crate::Vec3;

/// Step size for the directional finite difference in
/// [`com_velocity`]. The kinematics are smooth polynomials of sines
/// and cosines, so a central difference at this step is accurate to
/// well below solver tolerances.
const FD_STEP: f64 = 1e-6;

/// A planar frame: position of the origin and heading about +y.
#[derive(Debug, Clone, Copy)]
pub struct PlanarFrame {
    pub x: f64,
    pub z: f64,
    pub theta: f64,
}

impl PlanarFrame {
    /// World frame.
    pub fn identity() -> Self {
        Self {
            x: 0.0,
            z: 0.0,
            theta: 0.0,
        }
    }

    /// Translate by (dx, dz) expressed in this frame.
    fn translate(&mut self, dx: f64, dz: f64) {
        let (s, c) = self.theta.sin_cos();
        self.x += dx * c + dz * s;
        self.z += -dx * s + dz * c;
    }

    /// Rotate about the frame's y axis.
    fn rotate(&mut self, angle: f64) {
        self.theta += angle;
    }

    /// Map a point from this frame to world coordinates.
    pub fn transform_point(&self, local: &[f64; 3]) -> Vec3 {
        let (s, c) = self.theta.sin_cos();
        Vec3::new(
            self.x + local[0] * c + local[2] * s,
            local[1],
            self.z - local[0] * s + local[2] * c,
        )
    }
}

/// Compute the world frame of every segment for a full coordinate
/// vector `q`. Segments are stored parents-first, so a single pass
/// suffices.
///
/// The caller must have validated `q.len()` against the coordinate
/// count; indices out of range would panic here.
pub fn segment_frames(desc: &ModelDescription, q: &[f64]) -> Vec<PlanarFrame> {
    let mut frames: Vec<PlanarFrame> = Vec::with_capacity(desc.segments.len());

    for segment in &desc.segments {
        let mut frame = match segment.parent {
            Some(p) => frames[p],
            None => PlanarFrame::identity(),
        };
        frame.translate(segment.offset[0], segment.offset[2]);
        for dof in &segment.dofs {
            let value = q[dof.coordinate];
            match dof.kind {
                DofKind::TranslationX => frame.translate(value, 0.0),
                DofKind::TranslationZ => frame.translate(0.0, value),
                DofKind::RotationY => frame.rotate(value),
            }
        }
        frames.push(frame);
    }

    frames
}

/// Whole-body mass center for a full coordinate vector.
pub fn mass_center(desc: &ModelDescription, q: &[f64]) -> Vec3 {
    let frames = segment_frames(desc, q);
    let mut weighted = Vec3::zeros();
    let mut total_mass = 0.0;
    for (segment, frame) in desc.segments.iter().zip(&frames) {
        weighted += segment.mass * frame.transform_point(&segment.com);
        total_mass += segment.mass;
    }
    weighted / total_mass
}

/// Mass-center velocity as the Jacobian–velocity product J(q)·qdot,
/// evaluated by a central directional finite difference along `qdot`.
pub fn com_velocity(desc: &ModelDescription, q: &[f64], qdot: &[f64]) -> Vec3 {
    let forward: Vec<f64> = q
        .iter()
        .zip(qdot)
        .map(|(qi, vi)| qi + FD_STEP * vi)
        .collect();
    let backward: Vec<f64> = q
        .iter()
        .zip(qdot)
        .map(|(qi, vi)| qi - FD_STEP * vi)
        .collect();
    (mass_center(desc, &forward) - mass_center(desc, &backward)) / (2.0 * FD_STEP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::{Coordinate, Dof, Segment};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn pendulum() -> ModelDescription {
        ModelDescription {
            name: "pendulum".into(),
            coordinates: vec![
                Coordinate {
                    name: "tz".into(),
                    range: [-1.0, 1.0],
                },
                Coordinate {
                    name: "hinge".into(),
                    range: [-3.2, 3.2],
                },
            ],
            segments: vec![
                Segment {
                    name: "base".into(),
                    parent: None,
                    offset: [0.0; 3],
                    dofs: vec![Dof {
                        coordinate: 0,
                        kind: DofKind::TranslationZ,
                    }],
                    mass: 1.0,
                    com: [0.0; 3],
                },
                Segment {
                    name: "rod".into(),
                    parent: Some(0),
                    offset: [0.0; 3],
                    dofs: vec![Dof {
                        coordinate: 1,
                        kind: DofKind::RotationY,
                    }],
                    mass: 1.0,
                    com: [0.0, 0.0, -0.5],
                },
            ],
            markers: Vec::new(),
            contact_points: Vec::new(),
        }
    }

    #[test]
    fn translation_moves_all_frames() {
        let desc = pendulum();
        let frames = segment_frames(&desc, &[0.3, 0.0]);
        assert_relative_eq!(frames[0].z, 0.3, epsilon = 1e-12);
        assert_relative_eq!(frames[1].z, 0.3, epsilon = 1e-12);
        assert_relative_eq!(frames[1].x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_swings_child_com() {
        let desc = pendulum();

        // Hanging straight down: CoM midway between base (z=0) and rod
        // CoM (z=-0.5).
        let com = mass_center(&desc, &[0.0, 0.0]);
        assert_relative_eq!(com[2], -0.25, epsilon = 1e-12);

        // Rotated 90° about +y: the rod CoM swings into -x.
        let com = mass_center(&desc, &[0.0, FRAC_PI_2]);
        assert_relative_eq!(com[0], -0.25, epsilon = 1e-12);
        assert_relative_eq!(com[2], 0.0, epsilon = 1e-12);
    }

    #[test]
    fn vertical_motion_gives_vertical_com_velocity() {
        let desc = pendulum();
        let v = com_velocity(&desc, &[0.1, 0.4], &[2.0, 0.0]);
        assert_relative_eq!(v[0], 0.0, epsilon = 1e-6);
        assert_relative_eq!(v[2], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn hinge_velocity_matches_analytic_jacobian() {
        let desc = pendulum();
        // d(com)/d(hinge) at angle 0: rod CoM at (0, -0.5) swings with
        // velocity (-0.5, 0) per rad/s; averaged over both masses.
        let v = com_velocity(&desc, &[0.0, 0.0], &[0.0, 1.0]);
        assert_relative_eq!(v[0], -0.25, epsilon = 1e-6);
        assert_relative_eq!(v[2], 0.0, epsilon = 1e-6);
    }

    #[test]
    fn transform_point_passes_y_through() {
        let frame = PlanarFrame {
            x: 1.0,
            z: 2.0,
            theta: 0.0,
        };
        let p = frame.transform_point(&[0.0, 0.7, 0.0]);
        assert_relative_eq!(p[1], 0.7, epsilon = 1e-12);
    }
}
