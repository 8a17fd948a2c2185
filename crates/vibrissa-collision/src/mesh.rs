//! Triangle meshes with a bounding volume hierarchy.

use tracing::debug;
use vibrissa_math::{is_finite_vec3, Vec3};

use crate::{Aabb, CollisionGeometryLoadError, Result};

const LEAF_SIZE: usize = 4;

/// Triangles with zero area (relative to the mesh size) are dropped.
const DEGENERATE_AREA: f64 = 1e-14;

#[derive(Debug, Clone)]
enum Node {
    Leaf { start: usize, end: usize },
    Inner { left: usize, right: usize },
}

/// A resolved triangle mesh, ready for proximity queries.
#[derive(Debug, Clone)]
pub struct TriMesh {
    vertices: Vec<Vec3>,
    faces: Vec<[usize; 3]>,
    bounds: Aabb,
    nodes: Vec<(Aabb, Node)>,
    /// Face indices in BVH leaf order.
    order: Vec<usize>,
}

impl TriMesh {
    /// Validate the mesh and build its hierarchy.
    pub fn new(vertices: Vec<Vec3>, faces: Vec<[usize; 3]>) -> Result<Self> {
        if faces.is_empty() {
            return Err(CollisionGeometryLoadError::EmptyMesh);
        }
        if let Some(i) = vertices.iter().position(|v| !is_finite_vec3(v)) {
            return Err(CollisionGeometryLoadError::NonFiniteVertex(i));
        }
        for (face, tri) in faces.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&i| i >= vertices.len()) {
                return Err(CollisionGeometryLoadError::FaceIndexOutOfRange {
                    face,
                    index,
                    vertices: vertices.len(),
                });
            }
        }

        let bounds = Aabb::from_points(&vertices).ok_or(CollisionGeometryLoadError::EmptyMesh)?;
        let scale = (bounds.max - bounds.min).norm_squared();
        let total = faces.len();
        let faces: Vec<[usize; 3]> = faces
            .into_iter()
            .filter(|&[a, b, c]| {
                let area2 = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a])).norm();
                area2 > DEGENERATE_AREA * scale
            })
            .collect();
        if faces.is_empty() {
            return Err(CollisionGeometryLoadError::DegenerateMesh);
        }
        if faces.len() < total {
            debug!(dropped = total - faces.len(), "dropped zero-area triangles");
        }

        let mut mesh = Self {
            vertices,
            faces,
            bounds,
            nodes: Vec::new(),
            order: Vec::new(),
        };
        mesh.build_hierarchy();
        Ok(mesh)
    }

    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    pub fn faces(&self) -> &[[usize; 3]] {
        &self.faces
    }

    pub fn num_triangles(&self) -> usize {
        self.faces.len()
    }

    pub fn bounds(&self) -> Aabb {
        self.bounds
    }

    /// Corner positions of triangle `i`.
    pub fn triangle(&self, i: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[i];
        [self.vertices[a], self.vertices[b], self.vertices[c]]
    }

    fn triangle_aabb(&self, i: usize) -> Aabb {
        let tri = self.triangle(i);
        Aabb::new(tri[0].inf(&tri[1]).inf(&tri[2]), tri[0].sup(&tri[1]).sup(&tri[2]))
    }

    fn build_hierarchy(&mut self) {
        let mut order: Vec<usize> = (0..self.faces.len()).collect();
        let centroids: Vec<Vec3> = (0..self.faces.len())
            .map(|i| {
                let [a, b, c] = self.triangle(i);
                (a + b + c) / 3.0
            })
            .collect();
        let mut nodes = Vec::new();
        self.build_node(&mut nodes, &mut order, 0, &centroids);
        self.nodes = nodes;
        self.order = order;
    }

    fn build_node(
        &self,
        nodes: &mut Vec<(Aabb, Node)>,
        order: &mut [usize],
        offset: usize,
        centroids: &[Vec3],
    ) -> usize {
        let aabb = order
            .iter()
            .map(|&i| self.triangle_aabb(i))
            .reduce(|a, b| a.merged(&b))
            .unwrap_or(self.bounds);
        let index = nodes.len();

        if order.len() <= LEAF_SIZE {
            nodes.push((
                aabb,
                Node::Leaf {
                    start: offset,
                    end: offset + order.len(),
                },
            ));
            return index;
        }

        // Median split along the longest axis of the centroid bounds.
        let spread = Aabb::from_points(order.iter().map(|&i| &centroids[i]))
            .map(|b| b.max - b.min)
            .unwrap_or_else(Vec3::zeros);
        let axis = spread.imax();
        let mid = order.len() / 2;
        order.select_nth_unstable_by(mid, |&a, &b| {
            centroids[a][axis].total_cmp(&centroids[b][axis])
        });

        nodes.push((aabb, Node::Leaf { start: 0, end: 0 }));
        let (lo, hi) = order.split_at_mut(mid);
        let left = self.build_node(nodes, lo, offset, centroids);
        let right = self.build_node(nodes, hi, offset + mid, centroids);
        nodes[index].1 = Node::Inner { left, right };
        index
    }

    /// Call `f` with every triangle whose bounds overlap `region`.
    pub fn for_each_candidate(&self, region: &Aabb, mut f: impl FnMut(usize)) {
        let mut stack = vec![0usize];
        while let Some(n) = stack.pop() {
            let Some((aabb, node)) = self.nodes.get(n) else {
                continue;
            };
            if !aabb.overlaps(region) {
                continue;
            }
            match *node {
                Node::Leaf { start, end } => {
                    for &tri in &self.order[start..end] {
                        if self.triangle_aabb(tri).overlaps(region) {
                            f(tri);
                        }
                    }
                }
                Node::Inner { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit grid of `n × n` quads in the z = 0 plane.
    fn grid(n: usize) -> TriMesh {
        let mut vertices = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Vec3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        let w = n + 1;
        for j in 0..n {
            for i in 0..n {
                let v = j * w + i;
                faces.push([v, v + 1, v + w + 1]);
                faces.push([v, v + w + 1, v + w]);
            }
        }
        TriMesh::new(vertices, faces).unwrap()
    }

    #[test]
    fn test_candidates_match_brute_force() {
        let mesh = grid(12);
        let region = Aabb::new(Vec3::new(2.5, 3.5, -0.1), Vec3::new(4.2, 5.1, 0.1));
        let mut found = Vec::new();
        mesh.for_each_candidate(&region, |t| found.push(t));
        found.sort_unstable();

        let expected: Vec<usize> = (0..mesh.num_triangles())
            .filter(|&t| mesh.triangle_aabb(t).overlaps(&region))
            .collect();
        assert_eq!(found, expected);
        assert!(!found.is_empty());
    }

    #[test]
    fn test_rejects_bad_meshes() {
        assert!(matches!(
            TriMesh::new(vec![Vec3::zeros()], vec![]),
            Err(CollisionGeometryLoadError::EmptyMesh)
        ));
        assert!(matches!(
            TriMesh::new(vec![Vec3::zeros(), Vec3::x()], vec![[0, 1, 2]]),
            Err(CollisionGeometryLoadError::FaceIndexOutOfRange { face: 0, index: 2, .. })
        ));
        assert!(matches!(
            TriMesh::new(vec![Vec3::zeros(), Vec3::x(), Vec3::x() * 2.0], vec![[0, 1, 2]]),
            Err(CollisionGeometryLoadError::DegenerateMesh)
        ));
        assert!(matches!(
            TriMesh::new(
                vec![Vec3::zeros(), Vec3::x(), Vec3::new(f64::NAN, 0.0, 0.0)],
                vec![[0, 1, 2]]
            ),
            Err(CollisionGeometryLoadError::NonFiniteVertex(2))
        ));
    }

    #[test]
    fn test_degenerate_faces_dropped() {
        let vertices = vec![Vec3::zeros(), Vec3::x(), Vec3::y(), Vec3::x() * 2.0];
        let mesh = TriMesh::new(vertices, vec![[0, 1, 2], [0, 1, 3]]).unwrap();
        assert_eq!(mesh.num_triangles(), 1);
    }
}
