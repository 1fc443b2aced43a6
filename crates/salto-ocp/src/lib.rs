//! Salto Jump Optimization
//!
//! Configuration layer for a five-phase trajectory optimization of a
//! planar jumping motion. The jump is split into contiguous phases with
//! fixed contact configuration:
//!
//! ```text
//! double contact → single contact → flight → single contact → double contact
//! ```
//!
//! Each phase carries its own dynamics mode, objective terms,
//! constraint list, state/control bounds, and initial guess; phases are
//! linked by an impact state transition at the push-off boundary. The
//! assembled problem descriptor is handed to the external Ipopt NLP
//! solver (behind the `ipopt` feature); this crate never derives
//! dynamics or solves the NLP itself.
//!
//! # Components
//!
//! - [`mapping`]: reduce/expand coordinate mappings (bilateral symmetry)
//! - [`constraint`]: per-phase constraint entries
//! - [`objective`]: weighted cost terms
//! - [`bounds`]: state/control bounds and initial guesses
//! - [`phase`]: single-phase configuration
//! - [`ocp`]: whole-problem descriptor and validation
//! - [`solver`]: external solver interface and fallback
//! - [`archive`]: persisted problem + solution artifact
//! - [`report`]: post-solve extraction (durations, mass-center series)
//! - [`scenario`]: the five-phase jumper definition

pub mod archive;
pub mod bounds;
pub mod constraint;
pub mod mapping;
pub mod objective;
pub mod ocp;
pub mod phase;
pub mod report;
pub mod scenario;
pub mod solver;

// Ipopt FFI bindings (only when the feature is enabled)
#[cfg(feature = "ipopt")]
pub mod ipopt_ffi;

// Re-exports
pub use mapping::BidirectionalMapping;
pub use ocp::JumpOcp;
pub use scenario::JumperScenario;
pub use solver::{SolveOptions, Solution};
