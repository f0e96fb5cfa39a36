//! The robust two-polygon tiler: an
//! O(|A|·|B|) dynamic program that stitches two planar ring polygons at
//! adjacent profile Z-levels into a triangulated side wall, searching
//! cyclic rotations of the lower ring for the cheapest seam and
//! rejecting self-crossing triangles in strict mode.

use csgrs::mesh::polygon::Polygon as MeshPolygon;
use csgrs::mesh::vertex::Vertex;
use geo::{Contains, LineString, MultiPolygon, Polygon as GeoPolygon};
use nalgebra::{Point3, Vector3};

use crate::tool_builder::TileMode;

/// Cost weight on triangle area relative to the squared bridging-edge
/// length.
const AREA_WEIGHT: f64 = 4.0;

/// For rings larger than this, the cyclic seam search is limited to a
/// window around the geometric nearest point rather than every rotation.
const LARGE_RING_THRESHOLD: usize = 60;
const SEAM_WINDOW: usize = 20;

/// One ring vertex: its XY position (for seam/boundary search) and Z
/// (fixed per ring — both rings in a single `tile` call share their own Z).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingPoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RingPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        RingPoint { x, y, z }
    }

    fn point3(self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

fn dist2(a: RingPoint, b: RingPoint) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    dx * dx + dy * dy + dz * dz
}

fn triangle_area(a: RingPoint, b: RingPoint, c: RingPoint) -> f64 {
    let ab = Vector3::new(b.x - a.x, b.y - a.y, b.z - a.z);
    let ac = Vector3::new(c.x - a.x, c.y - a.y, c.z - a.z);
    ab.cross(&ac).norm() / 2.0
}

/// Tiles ring `upper` (at the larger Z) onto ring `lower`, returning a
/// closed band of triangles — no caps. `None` means no feasible seam
/// exists under `mode` and the caller should retry in `Permissive` mode
/// or fall back to the stair-step reconstruction.
pub fn tile(upper: &[RingPoint], lower: &[RingPoint], mode: TileMode) -> Option<Vec<MeshPolygon<()>>> {
    if upper.len() < 3 || lower.len() < 3 {
        return None;
    }

    let boundary = match mode {
        TileMode::Strict => Some(boundary_union(upper, lower)),
        TileMode::Permissive => None,
    };
    let axis = ring_centroid_xy(upper, lower);

    let mut best: Option<(f64, usize, Vec<bool>)> = None;
    for offset in seam_offsets(upper, lower) {
        let rotated: Vec<RingPoint> = (0..lower.len()).map(|k| lower[(k + offset) % lower.len()]).collect();
        if let Some((cost, path)) = solve_dp(upper, &rotated, boundary.as_ref()) {
            if best.as_ref().map_or(true, |(c, _, _)| cost < *c) {
                best = Some((cost, offset, path));
            }
        }
    }

    let (_, offset, path) = best?;
    let rotated: Vec<RingPoint> = (0..lower.len()).map(|k| lower[(k + offset) % lower.len()]).collect();
    Some(build_triangles(upper, &rotated, &path, axis))
}

/// Candidate starting rotations of `lower` to align with `upper[0]`.
fn seam_offsets(upper: &[RingPoint], lower: &[RingPoint]) -> Vec<usize> {
    let nb = lower.len();
    if nb <= LARGE_RING_THRESHOLD {
        return (0..nb).collect();
    }
    let anchor = upper[0];
    let nearest = (0..nb)
        .min_by(|&i, &j| dist2(anchor, lower[i]).partial_cmp(&dist2(anchor, lower[j])).unwrap())
        .unwrap_or(0);
    (0..SEAM_WINDOW).map(|k| (nearest + nb - SEAM_WINDOW / 2 + k) % nb).collect()
}

fn boundary_union(upper: &[RingPoint], lower: &[RingPoint]) -> MultiPolygon<f64> {
    let ring_poly = |pts: &[RingPoint]| -> GeoPolygon<f64> {
        let mut coords: Vec<geo::Coord<f64>> = pts.iter().map(|p| geo::Coord { x: p.x, y: p.y }).collect();
        if coords.first() != coords.last() {
            coords.push(coords[0]);
        }
        GeoPolygon::new(LineString::new(coords), vec![])
    };
    use geo::BooleanOps;
    let a = MultiPolygon(vec![ring_poly(upper)]);
    let b = MultiPolygon(vec![ring_poly(lower)]);
    a.union(&b)
}

fn ring_centroid_xy(upper: &[RingPoint], lower: &[RingPoint]) -> (f64, f64) {
    let all: Vec<&RingPoint> = upper.iter().chain(lower.iter()).collect();
    let n = all.len().max(1) as f64;
    let (sx, sy) = all.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
    (sx / n, sy / n)
}

/// Rejects a candidate triangle in strict mode when its XY midpoint falls
/// outside the union of the two boundary loops.
fn strict_ok(tri: (RingPoint, RingPoint, RingPoint), boundary: Option<&MultiPolygon<f64>>) -> bool {
    let Some(boundary) = boundary else { return true };
    let (a, b, c) = tri;
    let mx = (a.x + b.x + c.x) / 3.0;
    let my = (a.y + b.y + c.y) / 3.0;
    boundary.contains(&geo::Point::new(mx, my))
}

/// `dp[i][j]` = minimum cost to tile the first `i` vertices of `upper`
/// against the first `j` vertices of `lower` (both indexed cyclically, so
/// `i == upper.len()` wraps back to vertex 0, closing the loop). Each step
/// advances either ring by one vertex, adding one triangle that uses the
/// newly-advanced vertex plus the two most recently visited vertices of
/// the other ring's edge.
fn solve_dp(upper: &[RingPoint], lower: &[RingPoint], boundary: Option<&MultiPolygon<f64>>) -> Option<(f64, Vec<bool>)> {
    let na = upper.len();
    let nb = lower.len();
    const INF: f64 = f64::INFINITY;
    let mut dp = vec![vec![INF; nb + 1]; na + 1];
    let mut from = vec![vec![None; nb + 1]; na + 1];
    dp[0][0] = 0.0;

    for i in 0..=na {
        for j in 0..=nb {
            if i == 0 && j == 0 {
                continue;
            }
            let mut best = INF;
            let mut choice = None;

            if i > 0 {
                let tri = (upper[(i - 1) % na], upper[i % na], lower[j % nb]);
                if dp[i - 1][j].is_finite() && strict_ok(tri, boundary) {
                    let c = dp[i - 1][j] + bridge_cost(tri);
                    if c < best {
                        best = c;
                        choice = Some(true);
                    }
                }
            }
            if j > 0 {
                let tri = (upper[i % na], lower[(j - 1) % nb], lower[j % nb]);
                if dp[i][j - 1].is_finite() && strict_ok(tri, boundary) {
                    let c = dp[i][j - 1] + bridge_cost(tri);
                    if c < best {
                        best = c;
                        choice = Some(false);
                    }
                }
            }

            dp[i][j] = best;
            from[i][j] = choice;
        }
    }

    if !dp[na][nb].is_finite() {
        return None;
    }

    let mut path = Vec::with_capacity(na + nb);
    let (mut i, mut j) = (na, nb);
    while i > 0 || j > 0 {
        let advance_a = from[i][j]?;
        path.push(advance_a);
        if advance_a {
            i -= 1;
        } else {
            j -= 1;
        }
    }
    path.reverse();
    Some((dp[na][nb], path))
}

/// `cost = squared_edge_distance + AREA_WEIGHT · triangle_area`
///, where the "edge distance" is the pair of bridging
/// edges newly introduced by this triangle — the ring's own edges are
/// shared by every tiling and so don't discriminate between seams.
fn bridge_cost(tri: (RingPoint, RingPoint, RingPoint)) -> f64 {
    let (a, b, c) = tri;
    dist2(a, c) + dist2(b, c) + AREA_WEIGHT * triangle_area(a, b, c)
}

fn build_triangles(upper: &[RingPoint], lower: &[RingPoint], path: &[bool], axis: (f64, f64)) -> Vec<MeshPolygon<()>> {
    let na = upper.len();
    let nb = lower.len();
    let (mut i, mut j) = (0usize, 0usize);
    let mut polys = Vec::with_capacity(path.len());

    for &advance_a in path {
        let tri = if advance_a {
            let t = (upper[i % na], upper[(i + 1) % na], lower[j % nb]);
            i += 1;
            t
        } else {
            let t = (upper[i % na], lower[j % nb], lower[(j + 1) % nb]);
            j += 1;
            t
        };
        polys.push(oriented_triangle(tri.0, tri.1, tri.2, axis));
    }
    polys
}

/// Builds a triangle `Polygon` with a normal guaranteed to point away from
/// the ring pair's shared axis, independent of whichever vertex order the
/// DP produced — this is what makes the tiler "robust" to either ring's
/// input winding.
fn oriented_triangle(p0: RingPoint, p1: RingPoint, p2: RingPoint, axis: (f64, f64)) -> MeshPolygon<()> {
    let (mut p0, mut p1, p2) = (p0, p1, p2);
    let normal = Vector3::new(p1.x - p0.x, p1.y - p0.y, p1.z - p0.z).cross(&Vector3::new(p2.x - p0.x, p2.y - p0.y, p2.z - p0.z));
    let centroid = ((p0.x + p1.x + p2.x) / 3.0 - axis.0, (p0.y + p1.y + p2.y) / 3.0 - axis.1);
    let outward_dot = normal.x * centroid.0 + normal.y * centroid.1;
    if outward_dot < 0.0 {
        std::mem::swap(&mut p0, &mut p1);
    }
    let a = p0.point3();
    let b = p1.point3();
    let c = p2.point3();
    let n = Vector3::new(b.x - a.x, b.y - a.y, b.z - a.z)
        .cross(&Vector3::new(c.x - a.x, c.y - a.y, c.z - a.z))
        .normalize();
    MeshPolygon::new(vec![Vertex::new(a, n), Vertex::new(b, n), Vertex::new(c, n)], None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring(n: usize, r: f64, z: f64) -> Vec<RingPoint> {
        (0..n)
            .map(|i| {
                let theta = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                RingPoint::new(r * theta.cos(), r * theta.sin(), z)
            })
            .collect()
    }

    #[test]
    fn tiles_two_equal_circles_into_a_closed_band() {
        let top = ring(12, 5.0, 1.0);
        let bottom = ring(12, 5.0, 0.0);
        let tris = tile(&top, &bottom, TileMode::Strict).unwrap();
        // One triangle per vertex advance on each side: 12 + 12 total steps.
        assert_eq!(tris.len(), 24);
    }

    #[test]
    fn tiles_different_vertex_counts() {
        let top = ring(8, 5.0, 1.0);
        let bottom = ring(20, 4.0, 0.0);
        let tris = tile(&top, &bottom, TileMode::Permissive).unwrap();
        assert_eq!(tris.len(), 28);
    }

    #[test]
    fn too_few_vertices_yields_no_tiling() {
        let top = vec![RingPoint::new(0.0, 0.0, 1.0), RingPoint::new(1.0, 0.0, 1.0)];
        let bottom = ring(8, 4.0, 0.0);
        assert!(tile(&top, &bottom, TileMode::Permissive).is_none());
    }
}
