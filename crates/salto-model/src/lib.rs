//! # salto-model
//!
//! Planar biomechanical model support for the salto jump optimization.
//!
//! A model is described by a JSON file listing generalized coordinates
//! (with joint ranges), a chain of massive segments in the sagittal
//! plane, anatomical markers, and ground-contact points. The crate
//! loads and validates that description and evaluates the forward
//! kinematics needed by the optimization layer: marker positions and
//! whole-body mass-center position/velocity.
//!
//! ## Modules
//!
//! - [`description`]: serde data model for the on-disk format
//! - [`model`]: validated, ready-to-evaluate [`Model`]
//! - [`kinematics`]: planar forward kinematics over the segment chain
//! - [`error`]: error types

pub mod description;
pub mod error;
pub mod kinematics;
pub mod model;

pub use description::ModelDescription;
pub use error::ModelError;
pub use model::Model;

/// 3D vector type. Motion is planar (sagittal x–z) but positions are
/// reported as full 3D points so that the vertical component is always
/// index 2, matching the marker/CoM conventions of the optimization.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Gravity constant [m/s²]
pub const GRAVITY: f64 = 9.81;
