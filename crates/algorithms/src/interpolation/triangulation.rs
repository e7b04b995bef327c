//! Piecewise-linear interpolation over a triangulation of scattered points
//!
//! Given source coordinates, their values and a fill value, builds a
//! simplicial mesh once and evaluates the barycentric (linear) interpolant
//! at arbitrary points:
//! - 1-D: sorted segments between consecutive abscissae
//! - 2-D: Delaunay triangulation (incremental Bowyer-Watson with ghost
//!   triangles on the hull)
//!
//! Points outside the convex hull of the sources receive the fill value.

use ndarray::{Array2, ArrayView2};
use scatterfill_core::{CoordinateSet, Error, Result};

use crate::maybe_rayon::*;

/// Negative slack allowed on barycentric coordinates at triangle edges
const EDGE_TOLERANCE: f64 = -1e-10;

/// Vertex at infinity closing the hull edges during triangulation
const GHOST: usize = usize::MAX;

/// A triangle defined by three vertex indices
#[derive(Debug, Clone, Copy)]
struct Triangle {
    v0: usize,
    v1: usize,
    v2: usize,
}

#[derive(Debug)]
enum Mesh {
    /// Source indices ordered by abscissa, duplicates removed
    Segments(Vec<usize>),
    Triangles(Vec<Triangle>),
}

/// Linear interpolant over a fixed set of sources and values.
#[derive(Debug)]
pub struct LinearNd<'a> {
    points: &'a CoordinateSet,
    values: ArrayView2<'a, f64>,
    fill_value: f64,
    mesh: Mesh,
}

impl<'a> LinearNd<'a> {
    /// Triangulate `points` and attach `values` (one row per point).
    ///
    /// # Errors
    /// - `ShapeMismatch` if `values` does not have one row per point
    /// - `UnsupportedDimension` for points with more than two dimensions
    pub fn new(
        points: &'a CoordinateSet,
        values: ArrayView2<'a, f64>,
        fill_value: f64,
    ) -> Result<Self> {
        if values.nrows() != points.len() {
            return Err(Error::ShapeMismatch {
                expected: points.len(),
                actual: values.nrows(),
                context: "linear interpolant",
            });
        }

        let mesh = match points.dim() {
            _ if points.is_empty() => Mesh::Segments(Vec::new()),
            1 => Mesh::Segments(sorted_abscissae(points)),
            2 => Mesh::Triangles(delaunay(points)),
            dim => {
                return Err(Error::UnsupportedDimension {
                    dim,
                    context: "linear interpolation",
                })
            }
        };

        Ok(Self {
            points,
            values,
            fill_value,
            mesh,
        })
    }

    /// Number of triangles (2-D) or segments (1-D) in the mesh
    pub fn num_simplices(&self) -> usize {
        match &self.mesh {
            Mesh::Segments(order) => order.len().saturating_sub(1),
            Mesh::Triangles(tris) => tris.len(),
        }
    }

    /// Evaluate the interpolant at every point of `targets`.
    ///
    /// Returns a (targets × channels) array.
    pub fn evaluate(&self, targets: &CoordinateSet) -> Result<Array2<f64>> {
        self.points.ensure_same_dim(targets)?;
        let channels = self.values.ncols();

        let data: Vec<f64> = (0..targets.len())
            .into_par_iter()
            .flat_map(|t| match self.locate(targets.point(t)) {
                Some(weights) => {
                    let mut acc = vec![0.0; channels];
                    for (ix, w) in weights {
                        for (a, &v) in acc.iter_mut().zip(self.values.row(ix)) {
                            *a += w * v;
                        }
                    }
                    acc
                }
                None => vec![self.fill_value; channels],
            })
            .collect();

        Ok(Array2::from_shape_vec((targets.len(), channels), data)?)
    }

    /// Barycentric weights of the simplex enclosing `q`, if any.
    fn locate(&self, q: &[f64]) -> Option<Vec<(usize, f64)>> {
        match &self.mesh {
            Mesh::Segments(order) => {
                let x = q[0];
                let pos = order.partition_point(|&i| self.points.point(i)[0] < x);
                if pos < order.len() && self.points.point(order[pos])[0] == x {
                    return Some(vec![(order[pos], 1.0)]);
                }
                if pos == 0 || pos == order.len() {
                    return None;
                }
                let (i0, i1) = (order[pos - 1], order[pos]);
                let x0 = self.points.point(i0)[0];
                let x1 = self.points.point(i1)[0];
                let t = (x - x0) / (x1 - x0);
                Some(vec![(i0, 1.0 - t), (i1, t)])
            }
            Mesh::Triangles(tris) => {
                // brute force; fine for moderate triangle counts
                tris.iter().find_map(|tri| {
                    let (u, v, w) = barycentric(
                        xy(self.points, tri.v0),
                        xy(self.points, tri.v1),
                        xy(self.points, tri.v2),
                        (q[0], q[1]),
                    )?;
                    (u >= EDGE_TOLERANCE && v >= EDGE_TOLERANCE && w >= EDGE_TOLERANCE)
                        .then(|| vec![(tri.v0, u), (tri.v1, v), (tri.v2, w)])
                })
            }
        }
    }
}

#[inline]
fn xy(points: &CoordinateSet, i: usize) -> (f64, f64) {
    let p = points.point(i);
    (p[0], p[1])
}

/// Source indices sorted by abscissa; of duplicate abscissae the lowest
/// index is kept.
fn sorted_abscissae(points: &CoordinateSet) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points.point(i)[0].is_finite())
        .collect();
    order.sort_by(|&a, &b| {
        points.point(a)[0]
            .total_cmp(&points.point(b)[0])
            .then(a.cmp(&b))
    });
    order.dedup_by(|b, a| points.point(*a)[0] == points.point(*b)[0]);
    order
}

/// Twice the signed area of (a, b, c); positive when counter-clockwise
#[inline]
fn orient(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

/// Whether `p` lies strictly inside the circumcircle of the
/// counter-clockwise triangle (a, b, c)
fn in_circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> bool {
    let (adx, ady) = (a.0 - p.0, a.1 - p.1);
    let (bdx, bdy) = (b.0 - p.0, b.1 - p.1);
    let (cdx, cdy) = (c.0 - p.0, c.1 - p.1);

    let det = (adx * adx + ady * ady) * (bdx * cdy - cdx * bdy)
        + (bdx * bdx + bdy * bdy) * (cdx * ady - adx * cdy)
        + (cdx * cdx + cdy * cdy) * (adx * bdy - bdx * ady);
    det > 0.0
}

/// Whether `p`, collinear with a and b, lies strictly between them
fn strictly_between(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    let t = (p.0 - a.0) * (b.0 - a.0) + (p.1 - a.1) * (b.1 - a.1);
    let len_sq = (b.0 - a.0).powi(2) + (b.1 - a.1).powi(2);
    t > 0.0 && t < len_sq
}

/// Barycentric coordinates of `p` within triangle (p0, p1, p2).
///
/// Returns (u, v, w) where the interpolated value is u*z0 + v*z1 + w*z2,
/// or `None` for a degenerate triangle.
fn barycentric(
    p0: (f64, f64),
    p1: (f64, f64),
    p2: (f64, f64),
    p: (f64, f64),
) -> Option<(f64, f64, f64)> {
    let v0x = p1.0 - p0.0;
    let v0y = p1.1 - p0.1;
    let v1x = p2.0 - p0.0;
    let v1y = p2.1 - p0.1;
    let v2x = p.0 - p0.0;
    let v2y = p.1 - p0.1;

    let dot00 = v0x * v0x + v0y * v0y;
    let dot01 = v0x * v1x + v0y * v1y;
    let dot02 = v0x * v2x + v0y * v2y;
    let dot11 = v1x * v1x + v1y * v1y;
    let dot12 = v1x * v2x + v1y * v2y;

    let denom = dot00 * dot11 - dot01 * dot01;
    if denom.abs() <= 1e-12 * dot00 * dot11 {
        return None;
    }

    let inv_denom = 1.0 / denom;
    let v = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let w = (dot00 * dot12 - dot01 * dot02) * inv_denom;
    let u = 1.0 - v - w;

    Some((u, v, w))
}

/// Build a Delaunay triangulation using the Bowyer-Watson algorithm.
///
/// Instead of an enclosing super-triangle, every hull edge carries a
/// "ghost" triangle whose third vertex is the point at infinity. A ghost's
/// circumcircle is the open half-plane beyond its edge (plus the open edge
/// itself), so a point outside the current hull removes exactly the ghosts
/// whose edges it can see and the result covers the whole convex hull.
///
/// Triangle vertices index into `points`, counter-clockwise. Duplicate
/// points are triangulated once, using their lowest index. Fewer than
/// three points, or all points collinear, give no triangles.
fn delaunay(points: &CoordinateSet) -> Vec<Triangle> {
    let unique = unique_points(points);
    if unique.len() < 3 {
        return Vec::new();
    }

    // Seed triangle: the first two points and the first one off their line
    let (a, b) = (unique[0], unique[1]);
    let Some(seed) = unique[2..]
        .iter()
        .position(|&c| orient(xy(points, a), xy(points, b), xy(points, c)) != 0.0)
        .map(|pos| pos + 2)
    else {
        return Vec::new();
    };
    let c = unique[seed];
    let (b, c) = if orient(xy(points, a), xy(points, b), xy(points, c)) > 0.0 {
        (b, c)
    } else {
        (c, b)
    };

    let mut triangles = vec![
        Triangle { v0: a, v1: b, v2: c },
        Triangle { v0: b, v1: a, v2: GHOST },
        Triangle { v0: c, v1: b, v2: GHOST },
        Triangle { v0: a, v1: c, v2: GHOST },
    ];

    for (k, &src) in unique.iter().enumerate() {
        if k < 2 || k == seed {
            continue;
        }
        let point = xy(points, src);

        let bad_triangles: Vec<usize> = triangles
            .iter()
            .enumerate()
            .filter(|(_, tri)| cavity_contains(points, tri, point))
            .map(|(ti, _)| ti)
            .collect();

        // Boundary of the cavity: edges not shared by two bad triangles
        let mut boundary: Vec<(usize, usize)> = Vec::new();
        for &bi in &bad_triangles {
            let tri = &triangles[bi];
            for (ea, eb) in [(tri.v0, tri.v1), (tri.v1, tri.v2), (tri.v2, tri.v0)] {
                let shared = bad_triangles.iter().any(|&oi| {
                    if oi == bi {
                        return false;
                    }
                    let other = &triangles[oi];
                    [
                        (other.v0, other.v1),
                        (other.v1, other.v2),
                        (other.v2, other.v0),
                    ]
                    .iter()
                    .any(|&(oa, ob)| (oa == ea && ob == eb) || (oa == eb && ob == ea))
                });

                if !shared {
                    boundary.push((ea, eb));
                }
            }
        }

        // Remove bad triangles (in reverse order to preserve indices)
        for &bi in bad_triangles.iter().rev() {
            triangles.swap_remove(bi);
        }

        // Re-triangulate the cavity as a fan around the new point,
        // keeping the ghost vertex in the last slot
        for (ea, eb) in boundary {
            let tri = if ea == GHOST {
                Triangle { v0: eb, v1: src, v2: GHOST }
            } else if eb == GHOST {
                Triangle { v0: src, v1: ea, v2: GHOST }
            } else {
                Triangle { v0: ea, v1: eb, v2: src }
            };
            triangles.push(tri);
        }
    }

    triangles.retain(|tri| tri.v2 != GHOST);
    triangles
}

/// Whether inserting `p` destroys `tri`.
fn cavity_contains(points: &CoordinateSet, tri: &Triangle, p: (f64, f64)) -> bool {
    let a = xy(points, tri.v0);
    let b = xy(points, tri.v1);
    if tri.v2 == GHOST {
        // outside the hull is to the left of a ghost edge
        let side = orient(a, b, p);
        side > 0.0 || (side == 0.0 && strictly_between(a, b, p))
    } else {
        in_circumcircle(a, b, xy(points, tri.v2), p)
    }
}

/// Indices of the finite, pairwise distinct points (lowest index wins).
fn unique_points(points: &CoordinateSet) -> Vec<usize> {
    let mut order: Vec<usize> = (0..points.len())
        .filter(|&i| points.point(i).iter().all(|c| c.is_finite()))
        .collect();
    order.sort_by(|&a, &b| {
        let (ax, ay) = xy(points, a);
        let (bx, by) = xy(points, b);
        ax.total_cmp(&bx)
            .then(ay.total_cmp(&by))
            .then(a.cmp(&b))
    });
    order.dedup_by(|b, a| xy(points, *a) == xy(points, *b));
    order.sort_unstable();
    order
}
