//! Thin wrapper around the 3D geometry kernel's mesh type, scoped to what
//! BooleanEngine and ToolBuilder need.

use csgrs::mesh::polygon::Polygon as MeshPolygon;
use csgrs::mesh::Mesh;
use csgrs::sketch::Sketch;
use csgrs::traits::CSG;
use geo::{Geometry, GeometryCollection};

use stk_contour::CrossSection;

use crate::error::SolidError;

/// A closed 3D solid. Every `Manifold` produced by this crate was built
/// from a 2D cross-section extrusion, a boolean combination of other
/// manifolds, or an empty solid — never hand-authored triangles.
#[derive(Clone)]
pub struct Manifold(pub Mesh<()>);

impl Manifold {
    pub fn empty() -> Self {
        Manifold(Mesh::new())
    }

    /// Extrude `cross_section` (already positioned in absolute 2D
    /// coordinates) from `z_bottom` to `z_top`.
    pub fn from_cross_section(cross_section: &CrossSection, z_bottom: f64, z_top: f64) -> Self {
        let height = z_top - z_bottom;
        if height <= 0.0 || cross_section.is_empty() {
            return Manifold::empty();
        }
        let sketch: Sketch<()> =
            Sketch::from_geo(GeometryCollection(vec![Geometry::MultiPolygon(cross_section.0.clone())]), None);
        let mesh = sketch.extrude(height).translate(0.0, 0.0, z_bottom);
        Manifold(mesh)
    }

    /// Assembles a manifold directly from already-oriented triangle
    /// polygons, used by the robust tiler to stitch a tool-profile body
    /// from its own side-wall triangles plus flat top/bottom caps.
    pub fn from_polygons(polygons: Vec<MeshPolygon<()>>) -> Self {
        if polygons.is_empty() {
            return Manifold::empty();
        }
        Manifold(Mesh::from_polygons(&polygons, None))
    }

    /// A flat cap at `z`, ear-clipped from `cross_section`. Reuses the extrusion kernel's own capping pass rather
    /// than re-implementing ear-clipping: a hairline-thin prism has two
    /// flat faces, and the one at the requested orientation is kept.
    pub fn flat_cap(cross_section: &CrossSection, z: f64, face_up: bool) -> Vec<MeshPolygon<()>> {
        const EPS: f64 = 1e-4;
        if cross_section.is_empty() {
            return Vec::new();
        }
        let slab = Manifold::from_cross_section(cross_section, 0.0, EPS).0;
        let target_z = if face_up { EPS } else { 0.0 };
        slab.polygons
            .into_iter()
            .filter(|p| p.vertices.iter().all(|v| (v.pos.z - target_z).abs() < 1e-6))
            .map(|p| {
                let verts: Vec<_> = p
                    .vertices
                    .iter()
                    .map(|v| nalgebra::Point3::new(v.pos.x, v.pos.y, z))
                    .collect();
                let normal = if face_up {
                    nalgebra::Vector3::new(0.0, 0.0, 1.0)
                } else {
                    nalgebra::Vector3::new(0.0, 0.0, -1.0)
                };
                MeshPolygon::new(verts.into_iter().map(|p| csgrs::mesh::vertex::Vertex::new(p, normal)).collect(), None)
            })
            .collect()
    }

    pub fn translate(&self, dx: f64, dy: f64, dz: f64) -> Manifold {
        Manifold(self.0.translate(dx, dy, dz))
    }

    /// Mirrors across the z = 0 plane, used to flip a ToolBuilder body
    /// built for a top-carved cut into the orientation needed for
    /// `carveSide = Bottom`.
    pub fn mirror_z(&self) -> Manifold {
        let m = nalgebra::Matrix4::new_nonuniform_scaling(&nalgebra::Vector3::new(1.0, 1.0, -1.0));
        Manifold(self.0.transform(&m))
    }

    pub fn union(&self, other: &Manifold) -> Manifold {
        Manifold(self.0.union(&other.0))
    }

    pub fn difference(&self, other: &Manifold) -> Manifold {
        Manifold(self.0.difference(&other.0))
    }

    pub fn intersection(&self, other: &Manifold) -> Manifold {
        Manifold(self.0.intersection(&other.0))
    }

    pub fn is_empty(&self) -> bool {
        self.0.polygons.is_empty()
    }

    pub fn vertex_count(&self) -> usize {
        self.0.polygons.iter().map(|p| p.vertices.len()).sum()
    }

    /// Signed volume via the divergence theorem, fan-triangulating each
    /// (assumed convex, planar) polygon face.
    pub fn signed_volume(&self) -> f64 {
        let mut total = 0.0;
        for poly in &self.0.polygons {
            let verts = &poly.vertices;
            if verts.len() < 3 {
                continue;
            }
            let v0 = verts[0].pos;
            for i in 1..verts.len() - 1 {
                let v1 = verts[i].pos;
                let v2 = verts[i + 1].pos;
                total += signed_tetra_volume(v0, v1, v2);
            }
        }
        total.abs()
    }

    pub fn require_non_degenerate(&self, context: &str) -> Result<(), SolidError> {
        if self.vertex_count() == 0 {
            return Err(SolidError::GeometryDegenerate(context.to_string()));
        }
        Ok(())
    }

    /// Binary STL bytes (the kernel's `stl_io`-backed
    /// writer already matches the UINT32LE-count-then-50-bytes-per-
    /// triangle layout, so this just forwards and names the error).
    pub fn to_stl_binary(&self, name: &str) -> Result<Vec<u8>, SolidError> {
        self.0.to_stl_binary(name).map_err(|e| SolidError::GeometryDegenerate(e.to_string()))
    }

    /// Splits this mesh into its disjoint connected components, grouping
    /// polygons that share a vertex position (quantized to guard against
    /// floating-point noise at shared edges). Used by SplitEngine to turn
    /// a kerfed layer into its separate parts ("decompose()
    /// yields the disjoint parts").
    pub fn split_components(&self) -> Vec<Manifold> {
        let polys = &self.0.polygons;
        let n = polys.len();
        if n == 0 {
            return Vec::new();
        }

        let mut parent: Vec<usize> = (0..n).collect();
        let mut vertex_owner: std::collections::HashMap<(i64, i64, i64), usize> = std::collections::HashMap::new();
        for (i, poly) in polys.iter().enumerate() {
            for v in &poly.vertices {
                let key = quantize(v.pos);
                match vertex_owner.get(&key) {
                    Some(&owner) => union(&mut parent, i, owner),
                    None => {
                        vertex_owner.insert(key, i);
                    }
                }
            }
        }

        let mut groups: std::collections::HashMap<usize, Vec<MeshPolygon<()>>> = std::collections::HashMap::new();
        for (i, poly) in polys.iter().cloned().enumerate() {
            let root = find(&mut parent, i);
            groups.entry(root).or_default().push(poly);
        }
        groups.into_values().map(Manifold::from_polygons).collect()
    }
}

fn quantize(p: nalgebra::Point3<f64>) -> (i64, i64, i64) {
    const SCALE: f64 = 1e4;
    ((p.x * SCALE).round() as i64, (p.y * SCALE).round() as i64, (p.z * SCALE).round() as i64)
}

fn find(parent: &mut [usize], x: usize) -> usize {
    if parent[x] != x {
        let root = find(parent, parent[x]);
        parent[x] = root;
    }
    parent[x]
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra] = rb;
    }
}

fn signed_tetra_volume(a: nalgebra::Point3<f64>, b: nalgebra::Point3<f64>, c: nalgebra::Point3<f64>) -> f64 {
    a.coords.dot(&b.coords.cross(&c.coords)) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use stk_core::geometry::Point2D;

    #[test]
    fn cuboid_volume_matches_dimensions() {
        let cs = CrossSection::from_points(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ]);
        let solid = Manifold::from_cross_section(&cs, -1.5, 1.5);
        assert!((solid.signed_volume() - 300.0).abs() / 300.0 < 0.01);
    }

    #[test]
    fn empty_manifold_has_zero_vertices() {
        let solid = Manifold::empty();
        assert_eq!(solid.vertex_count(), 0);
        assert!(solid.require_non_degenerate("test").is_err());
    }

    #[test]
    fn two_disjoint_cuboids_split_into_two_components() {
        let a = CrossSection::from_points(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(10.0, 0.0),
            Point2D::new(10.0, 10.0),
            Point2D::new(0.0, 10.0),
        ]);
        let b = CrossSection::from_points(&[
            Point2D::new(100.0, 100.0),
            Point2D::new(110.0, 100.0),
            Point2D::new(110.0, 110.0),
            Point2D::new(100.0, 110.0),
        ]);
        let merged = Manifold::from_cross_section(&a, -1.0, 1.0).union(&Manifold::from_cross_section(&b, -1.0, 1.0));
        let parts = merged.split_components();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert!((part.signed_volume() - 200.0).abs() / 200.0 < 0.01);
        }
    }
}
