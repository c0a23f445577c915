//! Quadtree level-of-detail selection
//!
//! Each [`Face`] owns an arena of [`QuadNode`]s rooted at one (flat terrain)
//! or four (cube-sphere face) root nodes. Every frame the [`LodSelector`]
//! walks the roots, splitting nodes that are under-detailed for the camera,
//! merging stale subtrees, rejecting nodes below the horizon, and leaves each
//! face with the list of nodes to draw.
//!
//! # Level convention
//!
//! Level 0 = root (coarsest), increasing with depth. A node at
//! `max_level` is never split.
//!
//! ```text
//! width(level) = root_width / 2^level
//! ```

pub mod config;
pub mod metric;
pub mod horizon;
pub mod node;
pub mod face;
pub mod selector;

pub use config::{compute_max_level, LodConfig, MergePolicy, DEGENERATE_EPSILON, MAX_SUPPORTED_LEVEL};
pub use face::{CubeFace, Face, FaceShape};
pub use horizon::{Horizon, HorizonConfig};
pub use metric::ErrorMetric;
pub use node::{NodeId, NodePool, QuadNode, Quadrant};
pub use selector::{LodSelector, PatchKey, SelectionOutput, SelectionStats};
