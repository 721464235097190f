//! Core types for marker-anchored AR viewing.
//!
//! This crate knows nothing about cameras or rendering. It defines the small
//! [`Scene`] interface the anchoring logic drives, an in-memory
//! [`SceneGraph`] implementing it, and the fixed catalogue of structures a
//! marker can identify.

mod graph;
mod logger;
mod scene;
mod structure;
mod transform;

pub use graph::SceneGraph;
pub use scene::{NodeId, Scene, SceneError};
pub use structure::{DisplayMode, Structure, StructureInfo, StructureNodeNames, UnknownStructure};
pub use transform::LocalTransform;

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
