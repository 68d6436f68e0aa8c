//! Frustum culling over a bounding-volume hierarchy.
//!
//! The scheduler builds one [`Bvh`] over the cullable renderables during
//! warm-up and queries it per camera each frame. Cameras with culling
//! disabled bypass the query and draw everything.

use glam::{Mat4, Vec3, Vec4, Vec4Swizzles};

/// Renderables per leaf before the median split stops recursing.
const LEAF_THRESHOLD: usize = 4;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Create a box from its corners.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// The smallest box enclosing both.
    pub fn merge(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Edge lengths.
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

/// View frustum as six inward-facing planes.
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    planes: [Vec4; 6],
}

impl Frustum {
    /// Extract the six planes from a view-projection matrix
    /// (Gribb-Hartmann).
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let r0 = view_projection.row(0);
        let r1 = view_projection.row(1);
        let r2 = view_projection.row(2);
        let r3 = view_projection.row(3);
        let mut planes = [
            r3 + r0, // left
            r3 - r0, // right
            r3 + r1, // bottom
            r3 - r1, // top
            r3 + r2, // near
            r3 - r2, // far
        ];
        for plane in &mut planes {
            let length = plane.xyz().length();
            if length > f32::EPSILON {
                *plane /= length;
            }
        }
        Self { planes }
    }

    /// Check whether a box touches the frustum (p-vertex test; conservative
    /// on plane corners).
    pub fn intersects(&self, aabb: &Aabb) -> bool {
        for plane in &self.planes {
            // The box corner furthest along the plane normal.
            let p = Vec3::new(
                if plane.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if plane.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if plane.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            if plane.xyz().dot(p) + plane.w < 0.0 {
                return false;
            }
        }
        true
    }
}

#[derive(Debug)]
enum BvhNodeKind {
    /// Child node indices.
    Inner { left: u32, right: u32 },
    /// Item ids and their bounds stored directly.
    Leaf { items: Vec<(u32, Aabb)> },
}

#[derive(Debug)]
struct BvhNode {
    bounds: Aabb,
    kind: BvhNodeKind,
}

/// Bounding-volume hierarchy built by median split over bound-sorted order.
#[derive(Debug, Default)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    root: Option<u32>,
}

impl Bvh {
    /// Build a hierarchy over `(id, bounds)` pairs.
    pub fn build(items: &[(u32, Aabb)]) -> Self {
        let mut bvh = Self::default();
        if items.is_empty() {
            return bvh;
        }
        let mut order: Vec<usize> = (0..items.len()).collect();
        let root = bvh.build_node(items, &mut order);
        bvh.root = Some(root);
        bvh
    }

    fn build_node(&mut self, items: &[(u32, Aabb)], order: &mut [usize]) -> u32 {
        let bounds = order
            .iter()
            .map(|&index| items[index].1)
            .reduce(|a, b| a.merge(&b))
            .unwrap_or(Aabb::new(Vec3::ZERO, Vec3::ZERO));

        if order.len() <= LEAF_THRESHOLD {
            let index = self.nodes.len() as u32;
            self.nodes.push(BvhNode {
                bounds,
                kind: BvhNodeKind::Leaf {
                    items: order.iter().map(|&index| items[index]).collect(),
                },
            });
            return index;
        }

        // Split at the median along the longest axis of the node bounds.
        let size = bounds.size();
        let axis = if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        };
        order.sort_by(|&a, &b| {
            let ca = items[a].1.center()[axis];
            let cb = items[b].1.center()[axis];
            ca.partial_cmp(&cb).unwrap_or(std::cmp::Ordering::Equal)
        });
        let mid = order.len() / 2;
        let (left_order, right_order) = order.split_at_mut(mid);
        let left = self.build_node(items, left_order);
        let right = self.build_node(items, right_order);

        let index = self.nodes.len() as u32;
        self.nodes.push(BvhNode {
            bounds,
            kind: BvhNodeKind::Inner { left, right },
        });
        index
    }

    /// Collect the ids of items whose bounds touch the frustum.
    ///
    /// Failing inner nodes prune their whole subtree; surviving leaves test
    /// each item individually.
    pub fn query(&self, frustum: &Frustum, out: &mut Vec<u32>) {
        if let Some(root) = self.root {
            self.query_node(root, frustum, out);
        }
    }

    fn query_node(&self, node: u32, frustum: &Frustum, out: &mut Vec<u32>) {
        let node = &self.nodes[node as usize];
        if !frustum.intersects(&node.bounds) {
            return;
        }
        match &node.kind {
            BvhNodeKind::Inner { left, right } => {
                self.query_node(*left, frustum, out);
                self.query_node(*right, frustum, out);
            }
            BvhNodeKind::Leaf { items } => {
                for (id, bounds) in items {
                    if frustum.intersects(bounds) {
                        out.push(*id);
                    }
                }
            }
        }
    }

    /// Check if the hierarchy holds no items.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box_at(x: f32) -> Aabb {
        Aabb::new(Vec3::new(x, 0.0, 0.0), Vec3::new(x + 1.0, 1.0, 1.0))
    }

    fn ortho_frustum(left: f32, right: f32) -> Frustum {
        let view_projection = Mat4::orthographic_rh(left, right, -10.0, 10.0, -10.0, 10.0);
        Frustum::from_view_projection(&view_projection)
    }

    #[test]
    fn test_aabb_merge_and_center() {
        let a = unit_box_at(0.0);
        let b = unit_box_at(4.0);
        let merged = a.merge(&b);
        assert_eq!(merged.min, Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(merged.max, Vec3::new(5.0, 1.0, 1.0));
        assert_eq!(merged.center(), Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_frustum_selects_single_item() {
        // Ten pairwise-disjoint boxes along the x axis.
        let items: Vec<(u32, Aabb)> = (0..10).map(|i| (i, unit_box_at(i as f32 * 3.0))).collect();
        let bvh = Bvh::build(&items);

        // A frustum covering only item 4's box: its leaf survives the
        // node test but only one stored item passes the per-item test.
        let frustum = ortho_frustum(11.5, 13.5);
        let mut visible = Vec::new();
        bvh.query(&frustum, &mut visible);
        assert_eq!(visible, vec![4]);
    }

    #[test]
    fn test_frustum_excluding_everything() {
        let items: Vec<(u32, Aabb)> = (0..10).map(|i| (i, unit_box_at(i as f32 * 3.0))).collect();
        let bvh = Bvh::build(&items);

        let frustum = ortho_frustum(100.0, 200.0);
        let mut visible = Vec::new();
        bvh.query(&frustum, &mut visible);
        assert!(visible.is_empty());
    }

    #[test]
    fn test_frustum_containing_everything() {
        let items: Vec<(u32, Aabb)> = (0..10).map(|i| (i, unit_box_at(i as f32 * 3.0))).collect();
        let bvh = Bvh::build(&items);

        let frustum = ortho_frustum(-100.0, 100.0);
        let mut visible = Vec::new();
        bvh.query(&frustum, &mut visible);
        visible.sort_unstable();
        assert_eq!(visible, (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_empty_bvh() {
        let bvh = Bvh::build(&[]);
        assert!(bvh.is_empty());
        let mut visible = Vec::new();
        bvh.query(&ortho_frustum(-1.0, 1.0), &mut visible);
        assert!(visible.is_empty());
    }
}
