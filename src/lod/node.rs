//! Quadtree nodes and the per-face node arena
//!
//! Nodes reference each other by [`NodeId`] into a [`NodePool`] rather than
//! by pointer. Parent links are plain ids, so dropping a subtree never
//! touches ownership cycles.

use crate::core::types::{DMat4, DVec3};

/// Index of a node in its face's [`NodePool`].
///
/// Ids are reused after a node is released, so an id is only meaningful
/// for the frame it was handed out in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Child position within a split node.
///
/// In face-local space +X is right and +Z is forward, so "top" is +Z.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quadrant {
    TopLeft = 0,
    TopRight = 1,
    BottomLeft = 2,
    BottomRight = 3,
}

impl Quadrant {
    /// Children in storage order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Unit offset (right, forward) from the parent centre.
    pub fn sign(self) -> (f64, f64) {
        match self {
            Quadrant::TopLeft => (-1.0, 1.0),
            Quadrant::TopRight => (1.0, 1.0),
            Quadrant::BottomLeft => (-1.0, -1.0),
            Quadrant::BottomRight => (1.0, -1.0),
        }
    }
}

/// One square patch of the surface.
#[derive(Clone, Copy, Debug)]
pub struct QuadNode {
    /// Depth, root = 0
    pub level: u32,
    /// Edge length in face-local units
    pub width: f64,
    /// Centre in face-local space (before the face orientation)
    pub centre: DVec3,
    /// Centre on the final surface in world space
    pub world_centre: DVec3,
    /// Corners on the final surface in world space, in [`Quadrant::ALL`] order
    pub corners: [DVec3; 4],
    /// Maps the unit grid mesh onto this patch in face-local space
    pub transform: DMat4,
    pub parent: Option<NodeId>,
    pub children: Option<[NodeId; 4]>,
}

impl QuadNode {
    /// Build a node centred at `centre` (face-local), placing its corners in
    /// world space with `orientation`.
    pub fn new(level: u32, width: f64, centre: DVec3, orientation: &DMat4, parent: Option<NodeId>) -> Self {
        let half = width * 0.5;
        let corners = Quadrant::ALL.map(|q| {
            let (sx, sz) = q.sign();
            orientation.transform_point3(centre + DVec3::new(sx * half, 0.0, sz * half))
        });

        Self {
            level,
            width,
            centre,
            world_centre: orientation.transform_point3(centre),
            corners,
            transform: DMat4::from_translation(centre) * DMat4::from_scale(DVec3::new(width, 1.0, width)),
            parent,
            children: None,
        }
    }

    /// Move the world-space centre and corners onto the final surface.
    pub fn project(mut self, to_surface: impl Fn(DVec3) -> DVec3) -> Self {
        self.world_centre = to_surface(self.world_centre);
        self.corners = self.corners.map(&to_surface);
        self
    }

    /// Centre (face-local) of the child in quadrant `q`.
    pub fn child_centre(&self, q: Quadrant) -> DVec3 {
        let quarter = self.width * 0.25;
        let (sx, sz) = q.sign();
        self.centre + DVec3::new(sx * quarter, 0.0, sz * quarter)
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Corner closest to `point`, and its distance.
    pub fn nearest_corner(&self, point: DVec3) -> (DVec3, f64) {
        let mut best = (self.corners[0], self.corners[0].distance(point));
        for corner in &self.corners[1..] {
            let distance = corner.distance(point);
            if distance < best.1 {
                best = (*corner, distance);
            }
        }
        best
    }
}

/// Arena of nodes with slot reuse.
#[derive(Clone, Debug, Default)]
pub struct NodePool {
    slots: Vec<Option<QuadNode>>,
    free: Vec<u32>,
    live: usize,
}

impl NodePool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node, reusing a freed slot when one exists.
    pub fn insert(&mut self, node: QuadNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            self.slots[index as usize] = Some(node);
            return NodeId(index);
        }
        self.slots.push(Some(node));
        NodeId((self.slots.len() - 1) as u32)
    }

    /// Drop a node and free its slot. Children are not touched.
    pub fn remove(&mut self, id: NodeId) -> Option<QuadNode> {
        let node = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(node)
    }

    pub fn get(&self, id: NodeId) -> Option<&QuadNode> {
        self.slots.get(id.index())?.as_ref()
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut QuadNode> {
        self.slots.get_mut(id.index())?.as_mut()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Live node count
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Live nodes with their ids, in slot order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &QuadNode)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|node| (NodeId(i as u32), node)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> QuadNode {
        QuadNode::new(0, 8.0, DVec3::ZERO, &DMat4::IDENTITY, None)
    }

    #[test]
    fn test_corners_identity() {
        let node = root();
        assert_eq!(node.corners[Quadrant::TopLeft as usize], DVec3::new(-4.0, 0.0, 4.0));
        assert_eq!(node.corners[Quadrant::TopRight as usize], DVec3::new(4.0, 0.0, 4.0));
        assert_eq!(node.corners[Quadrant::BottomLeft as usize], DVec3::new(-4.0, 0.0, -4.0));
        assert_eq!(node.corners[Quadrant::BottomRight as usize], DVec3::new(4.0, 0.0, -4.0));
    }

    #[test]
    fn test_corners_follow_orientation() {
        let orientation = DMat4::from_translation(DVec3::new(0.0, 10.0, 0.0));
        let node = QuadNode::new(0, 2.0, DVec3::ZERO, &orientation, None);
        for corner in node.corners {
            assert_eq!(corner.y, 10.0);
        }
    }

    #[test]
    fn test_project_moves_corners_and_centre() {
        let orientation = DMat4::from_translation(DVec3::new(0.0, 10.0, 0.0));
        let node = QuadNode::new(0, 2.0, DVec3::ZERO, &orientation, None).project(|p| p * 2.0);
        assert_eq!(node.world_centre, DVec3::new(0.0, 20.0, 0.0));
        assert_eq!(node.corners[Quadrant::TopRight as usize], DVec3::new(2.0, 20.0, 2.0));
        // Face-local placement is untouched
        assert_eq!(node.centre, DVec3::ZERO);
    }

    #[test]
    fn test_transform_maps_unit_grid() {
        let node = QuadNode::new(1, 4.0, DVec3::new(2.0, 5.0, -2.0), &DMat4::IDENTITY, None);
        let far = node.transform.transform_point3(DVec3::new(0.5, 0.0, 0.5));
        assert_eq!(far, DVec3::new(4.0, 5.0, 0.0));
        let near = node.transform.transform_point3(DVec3::new(-0.5, 0.0, -0.5));
        assert_eq!(near, DVec3::new(0.0, 5.0, -4.0));
    }

    #[test]
    fn test_child_centres_tile_parent() {
        let node = root();
        assert_eq!(node.child_centre(Quadrant::TopLeft), DVec3::new(-2.0, 0.0, 2.0));
        assert_eq!(node.child_centre(Quadrant::BottomRight), DVec3::new(2.0, 0.0, -2.0));

        // Every child corner lies inside or on the parent square
        for q in Quadrant::ALL {
            let child = QuadNode::new(1, 4.0, node.child_centre(q), &DMat4::IDENTITY, None);
            for c in child.corners {
                assert!(c.x.abs() <= 4.0 && c.z.abs() <= 4.0);
            }
        }
    }

    #[test]
    fn test_nearest_corner() {
        let node = root();
        let (corner, distance) = node.nearest_corner(DVec3::new(10.0, 0.0, 10.0));
        assert_eq!(corner, DVec3::new(4.0, 0.0, 4.0));
        assert!((distance - (72.0_f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_pool_reuses_slots() {
        let mut pool = NodePool::new();
        let a = pool.insert(root());
        let b = pool.insert(root());
        assert_eq!(pool.len(), 2);

        assert!(pool.remove(a).is_some());
        assert!(pool.remove(a).is_none());
        assert!(!pool.contains(a));
        assert_eq!(pool.len(), 1);

        let c = pool.insert(root());
        assert_eq!(c, a);
        assert!(pool.contains(b));
        assert_eq!(pool.iter().count(), 2);
    }

    #[test]
    fn test_pool_out_of_range() {
        let mut pool = NodePool::new();
        assert!(pool.get(NodeId(7)).is_none());
        assert!(pool.remove(NodeId(7)).is_none());
        assert!(pool.is_empty());
    }
}
