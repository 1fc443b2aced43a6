//! On-disk model description.
//!
//! The JSON format carries exactly what the optimization reads from a
//! model: generalized coordinates with joint ranges, a planar segment
//! chain with masses and local mass centers, anatomical markers, and
//! ground-contact points with their reaction-force axes.

use serde::{Deserialize, Serialize};

/// Complete model description as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelDescription {
    /// Model name
    pub name: String,
    /// Generalized coordinates, in state-vector order
    pub coordinates: Vec<Coordinate>,
    /// Segments, parents before children
    pub segments: Vec<Segment>,
    /// Anatomical markers
    #[serde(default)]
    pub markers: Vec<Marker>,
    /// Ground-contact points
    #[serde(default)]
    pub contact_points: Vec<ContactPoint>,
}

/// One generalized coordinate and its joint range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coordinate {
    pub name: String,
    /// [minimum, maximum] joint value
    pub range: [f64; 2],
}

/// A massive segment of the kinematic chain.
///
/// Each segment is attached to its parent frame by a fixed translation
/// (`offset`, expressed in the parent frame) followed by its degrees of
/// freedom, applied in declaration order. The root segment has no
/// parent; its frame starts at the world origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub name: String,
    /// Index of the parent segment; `None` for the root
    pub parent: Option<usize>,
    /// Fixed translation from the parent frame [m]
    #[serde(default)]
    pub offset: [f64; 3],
    /// Degrees of freedom binding this segment to coordinates
    #[serde(default)]
    pub dofs: Vec<Dof>,
    /// Segment mass [kg]
    pub mass: f64,
    /// Mass center in the segment frame [m]
    #[serde(default)]
    pub com: [f64; 3],
}

/// A degree of freedom: which coordinate drives it and how.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Dof {
    /// Index into [`ModelDescription::coordinates`]
    pub coordinate: usize,
    pub kind: DofKind,
}

/// Planar joint kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DofKind {
    /// Translation along the frame's x axis
    TranslationX,
    /// Translation along the frame's z axis
    TranslationZ,
    /// Rotation about the frame's y axis
    RotationY,
}

/// An anatomical marker attached to a segment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Marker {
    pub name: String,
    /// Index of the carrying segment
    pub segment: usize,
    /// Position in the segment frame [m]
    pub position: [f64; 3],
}

/// A ground-contact point and its reaction-force axes.
///
/// The concatenation of all contact points' axes, in declaration
/// order, defines the model's contact-force component indexing used by
/// the optimization's force constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactPoint {
    pub name: String,
    /// Index of the carrying segment
    pub segment: usize,
    /// Position in the segment frame [m]
    pub position: [f64; 3],
    /// Reaction-force components reported for this point
    pub axes: Vec<ContactAxis>,
}

/// A single reaction-force axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactAxis {
    X,
    Y,
    Z,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "name": "hopper",
        "coordinates": [
            {"name": "tz", "range": [-1.0, 1.0]},
            {"name": "hip", "range": [-0.5, 2.0]}
        ],
        "segments": [
            {
                "name": "body",
                "parent": null,
                "dofs": [{"coordinate": 0, "kind": "translation_z"}],
                "mass": 10.0,
                "com": [0.0, 0.0, 0.1]
            },
            {
                "name": "leg",
                "parent": 0,
                "offset": [0.0, 0.0, -0.1],
                "dofs": [{"coordinate": 1, "kind": "rotation_y"}],
                "mass": 2.0,
                "com": [0.0, 0.0, -0.2]
            }
        ],
        "markers": [
            {"name": "tip", "segment": 1, "position": [0.0, 0.0, -0.4]}
        ],
        "contact_points": [
            {"name": "tip", "segment": 1, "position": [0.0, 0.0, -0.4], "axes": ["x", "z"]}
        ]
    }"#;

    #[test]
    fn deserializes_minimal_model() {
        let desc: ModelDescription = serde_json::from_str(MINIMAL).unwrap();
        assert_eq!(desc.name, "hopper");
        assert_eq!(desc.coordinates.len(), 2);
        assert_eq!(desc.segments.len(), 2);
        assert_eq!(desc.segments[0].parent, None);
        assert_eq!(desc.segments[1].parent, Some(0));
        assert_eq!(desc.segments[0].dofs[0].kind, DofKind::TranslationZ);
        assert_eq!(desc.contact_points[0].axes, vec![ContactAxis::X, ContactAxis::Z]);
    }

    #[test]
    fn roundtrips_through_json() {
        let desc: ModelDescription = serde_json::from_str(MINIMAL).unwrap();
        let text = serde_json::to_string(&desc).unwrap();
        let back: ModelDescription = serde_json::from_str(&text).unwrap();
        assert_eq!(back.name, desc.name);
        assert_eq!(back.segments.len(), desc.segments.len());
        assert_eq!(back.markers[0].name, desc.markers[0].name);
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"{
            "name": "point",
            "coordinates": [{"name": "tx", "range": [0.0, 1.0]}],
            "segments": [
                {"name": "p", "parent": null,
                 "dofs": [{"coordinate": 0, "kind": "translation_x"}],
                 "mass": 1.0}
            ]
        }"#;
        let desc: ModelDescription = serde_json::from_str(text).unwrap();
        assert!(desc.markers.is_empty());
        assert!(desc.contact_points.is_empty());
        assert_eq!(desc.segments[0].offset, [0.0; 3]);
        assert_eq!(desc.segments[0].com, [0.0; 3]);
    }
}
