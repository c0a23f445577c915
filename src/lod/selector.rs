//! Per-frame node selection
//!
//! Recursion per node:
//! 1. At `max_level`: accept.
//! 2. Whole patch below the horizon: reject it, merging any children.
//! 3. Too coarse for the camera: split if needed and recurse into children.
//! 4. Otherwise accept, merging any stale children first.
//!
//! Selection only mutates trees. Resource work for nodes created or released
//! here is reported in [`SelectionOutput`] and done by the caller.

use super::config::{LodConfig, MergePolicy};
use super::face::{Face, FaceShape};
use super::horizon::Horizon;
use super::node::NodeId;
use crate::core::types::Result;
use crate::core::Camera;

/// A node addressed across all faces of a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchKey {
    pub face: usize,
    pub node: NodeId,
}

impl PatchKey {
    pub fn new(face: usize, node: NodeId) -> Self {
        Self { face, node }
    }
}

/// Counters from one selection pass
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionStats {
    /// Accepted nodes per face, in face order
    pub visible_per_face: Vec<usize>,
    /// Accepted nodes across all faces
    pub visible: usize,
    /// Deepest level reached by the recursion this frame
    pub deepest_level: u32,
    /// Nodes rejected by the horizon test
    pub culled: usize,
    pub splits: usize,
    pub merges: usize,
}

/// Everything a selection pass changed
#[derive(Clone, Debug, Default)]
pub struct SelectionOutput {
    /// Nodes created by splits this frame
    pub created: Vec<PatchKey>,
    /// Nodes released by merges this frame.
    ///
    /// Released ids may be reused by later splits in the same pass, so
    /// callers must process `released` before `created`.
    pub released: Vec<PatchKey>,
    pub stats: SelectionStats,
}

/// Walks face quadtrees and decides which nodes to draw.
#[derive(Clone, Debug)]
pub struct LodSelector {
    config: LodConfig,
}

struct FrameContext<'a> {
    camera: &'a Camera,
    horizon: Horizon,
}

impl LodSelector {
    pub fn new(config: LodConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &LodConfig {
        &self.config
    }

    /// Refine every face for `camera`, rebuilding their visible lists.
    pub fn select(&self, faces: &mut [Face], camera: &Camera) -> SelectionOutput {
        let mut output = SelectionOutput {
            stats: SelectionStats {
                visible_per_face: vec![0; faces.len()],
                ..Default::default()
            },
            ..Default::default()
        };

        for (index, face) in faces.iter_mut().enumerate() {
            let horizon = match face.shape() {
                FaceShape::Cube { radius, .. } => Horizon::new(&self.config.horizon, camera.position, radius),
                FaceShape::Flat => Horizon::Inactive,
            };
            let ctx = FrameContext { camera, horizon };

            face.clear_visible();
            let roots = face.roots().to_vec();
            for root in roots {
                self.select_node(face, index, root, &ctx, &mut output);
            }

            let count = face.visible().len();
            output.stats.visible_per_face[index] = count;
            output.stats.visible += count;
        }

        output
    }

    fn select_node(&self, face: &mut Face, index: usize, id: NodeId, ctx: &FrameContext, out: &mut SelectionOutput) {
        let Some(node) = face.node(id).copied() else {
            return;
        };
        out.stats.deepest_level = out.stats.deepest_level.max(node.level);

        if node.level >= self.config.max_level {
            face.push_visible(id);
            return;
        }

        if ctx.horizon.is_patch_hidden(node.world_centre, &node.corners) {
            out.stats.culled += 1;
            if !node.is_leaf() && self.config.merge_policy == MergePolicy::Merge {
                self.merge_children(face, index, id, out);
            }
            return;
        }

        let (_, distance) = node.nearest_corner(ctx.camera.position);

        let split = self
            .config
            .error_metric
            .needs_split(distance, node.width, self.config.grid_size, ctx.camera);

        if split {
            let children = match node.children {
                Some(children) => Some(children),
                None => {
                    let created = face.split(id, self.config.max_level);
                    if let Some(children) = created {
                        log::trace!("split face {} node {:?} at level {}", index, id, node.level);
                        out.stats.splits += 1;
                        out.created.extend(children.iter().map(|&child| PatchKey::new(index, child)));
                    }
                    created
                }
            };

            if let Some(children) = children {
                for child in children {
                    self.select_node(face, index, child, ctx, out);
                }
                return;
            }
        } else if !node.is_leaf() && self.config.merge_policy == MergePolicy::Merge {
            self.merge_children(face, index, id, out);
        }

        face.push_visible(id);
    }

    fn merge_children(&self, face: &mut Face, index: usize, id: NodeId, out: &mut SelectionOutput) {
        let released = face.merge(id);
        log::trace!("merge face {} node {:?}: released {}", index, id, released.len());
        out.stats.merges += 1;
        out.released.extend(released.into_iter().map(|child| PatchKey::new(index, child)));
    }
}
