//! Keyframe model animation runtime for the Bear engine.
//!
//! A model is a set of named actions. Each action is a timed sequence of
//! snapshots (keyframes) placing a set of marks; marks optionally carry a
//! sprite animation. The runtime interpolates mark placements between
//! snapshots with per-channel easing and plays actions over time.
//!
//! Rendering and audio are left to the host: the players expose the current
//! sprite and placement of each mark and report snapshot functions and sounds
//! through listeners.

#![forbid(unsafe_code)]

mod animation;
mod authoring;
mod easing;
mod error;
mod model;
mod runtime;
mod version;

#[cfg(feature = "json")]
pub mod json;

#[cfg(feature = "binary")]
pub mod binary;

pub use animation::*;
pub use authoring::*;
pub use easing::*;
pub use error::*;
pub use model::*;
pub use runtime::*;
pub use version::*;

#[cfg(test)]
mod easing_tests;





#[cfg(all(test, feature = "binary"))]
mod binary_tests;
