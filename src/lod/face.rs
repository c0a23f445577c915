//! Surface faces: one per cube side on a planet, one for flat terrain
//!
//! A face owns its node arena and root ids, and carries the orientation
//! that takes its face-local grid (XZ plane, +Y out of the surface) into
//! world space.

use super::node::{NodeId, NodePool, QuadNode, Quadrant};
use crate::core::types::{DMat4, DVec3};

/// The six sides of the cube that is projected onto the sphere.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CubeFace {
    PosX,
    NegX,
    PosY,
    NegY,
    PosZ,
    NegZ,
}

impl CubeFace {
    pub const ALL: [CubeFace; 6] = [
        CubeFace::PosX,
        CubeFace::NegX,
        CubeFace::PosY,
        CubeFace::NegY,
        CubeFace::PosZ,
        CubeFace::NegZ,
    ];

    /// `(right, up)` for this side. Forward is `right x up`.
    pub fn basis(self) -> (DVec3, DVec3) {
        match self {
            CubeFace::PosX => (DVec3::NEG_Z, DVec3::X),
            CubeFace::NegX => (DVec3::Z, DVec3::NEG_X),
            CubeFace::PosY => (DVec3::X, DVec3::Y),
            CubeFace::NegY => (DVec3::X, DVec3::NEG_Y),
            CubeFace::PosZ => (DVec3::X, DVec3::Z),
            CubeFace::NegZ => (DVec3::NEG_X, DVec3::NEG_Z),
        }
    }
}

/// How face-local points land on the final surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FaceShape {
    /// Planar terrain; world space is face-local space.
    Flat,
    /// One side of a cube of half-extent `radius`, projected onto the sphere.
    Cube { face: CubeFace, radius: f64 },
}

#[derive(Clone, Debug)]
pub struct Face {
    shape: FaceShape,
    orientation: DMat4,
    right: DVec3,
    up: DVec3,
    forward: DVec3,
    nodes: NodePool,
    roots: Vec<NodeId>,
    visible: Vec<NodeId>,
}

impl Face {
    fn with_basis(shape: FaceShape, right: DVec3, up: DVec3) -> Self {
        let forward = right.cross(up);
        Self {
            shape,
            orientation: DMat4::from_cols(
                right.extend(0.0),
                up.extend(0.0),
                forward.extend(0.0),
                glam::DVec4::W,
            ),
            right,
            up,
            forward,
            nodes: NodePool::new(),
            roots: Vec::new(),
            visible: Vec::new(),
        }
    }

    /// Node with corners and centre placed on the final surface.
    fn make_node(&self, level: u32, width: f64, centre: DVec3, parent: Option<NodeId>) -> QuadNode {
        QuadNode::new(level, width, centre, &self.orientation, parent).project(|p| self.surface_point(p))
    }

    fn add_root(&mut self, width: f64, centre: DVec3) -> NodeId {
        let node = self.make_node(0, width, centre, None);
        let id = self.nodes.insert(node);
        self.roots.push(id);
        id
    }

    /// One cube side with four roots, each `radius` wide, tiling the
    /// `2 * radius` square at local height `radius`.
    pub fn cube(face: CubeFace, radius: f64) -> Self {
        let (right, up) = face.basis();
        let mut result = Self::with_basis(FaceShape::Cube { face, radius }, right, up);

        let half = radius * 0.5;
        for q in Quadrant::ALL {
            let (sx, sz) = q.sign();
            result.add_root(radius, DVec3::new(sx * half, radius, sz * half));
        }
        result
    }

    /// Planar terrain: a single root `width` wide centred on the origin.
    pub fn flat(width: f64) -> Self {
        let mut result = Self::with_basis(FaceShape::Flat, DVec3::X, DVec3::Y);
        result.add_root(width, DVec3::ZERO);
        result
    }

    /// All six sides of a cube-sphere planet.
    pub fn cube_faces(radius: f64) -> Vec<Face> {
        CubeFace::ALL.iter().map(|&face| Face::cube(face, radius)).collect()
    }

    pub fn shape(&self) -> FaceShape {
        self.shape
    }

    /// Face-local to world rotation
    pub fn orientation(&self) -> &DMat4 {
        &self.orientation
    }

    pub fn right(&self) -> DVec3 {
        self.right
    }

    pub fn up(&self) -> DVec3 {
        self.up
    }

    pub fn forward(&self) -> DVec3 {
        self.forward
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn nodes(&self) -> &NodePool {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> Option<&QuadNode> {
        self.nodes.get(id)
    }

    /// Nodes accepted for drawing by the last selection pass.
    pub fn visible(&self) -> &[NodeId] {
        &self.visible
    }

    pub(crate) fn clear_visible(&mut self) {
        self.visible.clear();
    }

    pub(crate) fn push_visible(&mut self, id: NodeId) {
        self.visible.push(id);
    }

    /// Number of leaves in the tree
    pub fn leaf_count(&self) -> usize {
        self.nodes.iter().filter(|(_, node)| node.is_leaf()).count()
    }

    /// Deepest level present in the tree
    pub fn depth(&self) -> u32 {
        self.nodes.iter().map(|(_, node)| node.level).max().unwrap_or(0)
    }

    /// Unit grid to world
    pub fn world_matrix(&self, id: NodeId) -> Option<DMat4> {
        self.nodes.get(id).map(|node| self.orientation * node.transform)
    }

    /// Project a world-space grid point onto the final surface.
    pub fn surface_point(&self, point: DVec3) -> DVec3 {
        match self.shape {
            FaceShape::Flat => point,
            FaceShape::Cube { radius, .. } => point.try_normalize().map_or(point, |dir| dir * radius),
        }
    }

    /// Surface positions of every vertex of the unit grid, placed on node `id`.
    pub fn grid_points(&self, id: NodeId, unit_grid: &[DVec3]) -> Option<Vec<DVec3>> {
        let world = self.world_matrix(id)?;
        Some(
            unit_grid
                .iter()
                .map(|p| self.surface_point(world.transform_point3(*p)))
                .collect(),
        )
    }

    /// Create the four children of a leaf.
    ///
    /// Returns `None` (and changes nothing) if the node is missing, already
    /// split, or at `max_level`.
    pub fn split(&mut self, id: NodeId, max_level: u32) -> Option<[NodeId; 4]> {
        let parent = *self.nodes.get(id)?;
        if !parent.is_leaf() || parent.level >= max_level {
            return None;
        }

        let width = parent.width * 0.5;
        let nodes = Quadrant::ALL.map(|q| self.make_node(parent.level + 1, width, parent.child_centre(q), Some(id)));
        let children = nodes.map(|child| self.nodes.insert(child));

        if let Some(node) = self.nodes.get_mut(id) {
            node.children = Some(children);
        }
        Some(children)
    }

    /// Release every descendant of `id`, deepest first, leaving `id` a leaf.
    ///
    /// Returns the released ids. Merging a leaf (or a missing node) releases
    /// nothing.
    pub fn merge(&mut self, id: NodeId) -> Vec<NodeId> {
        let mut released = Vec::new();
        self.merge_into(id, &mut released);
        released
    }

    fn merge_into(&mut self, id: NodeId, released: &mut Vec<NodeId>) {
        let Some(children) = self.nodes.get_mut(id).and_then(|node| node.children.take()) else {
            return;
        };
        for child in children {
            self.merge_into(child, released);
            if self.nodes.remove(child).is_some() {
                released.push(child);
            }
        }
    }
}
