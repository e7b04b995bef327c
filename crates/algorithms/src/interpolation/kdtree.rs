//! N-dimensional k-d tree for spatial indexing
//!
//! Provides O(log n) nearest-neighbor and k-nearest-neighbor queries
//! over a [`CoordinateSet`] of any dimensionality. Built once per source
//! set and shared by the nearest-neighbor and IDW interpolators.
//!
//! Equal distances are ordered by ascending source index, so every query
//! is deterministic: of two equidistant sources the lower index wins.
//!
//! Reference:
//! Bentley, J.L. (1975). Multidimensional binary search trees used
//! for associative searching. CACM, 18(9).

use std::cmp::Ordering;

use ndarray::Array2;
use scatterfill_core::CoordinateSet;

use crate::maybe_rayon::*;

/// A k-d tree over the points of a [`CoordinateSet`].
#[derive(Debug)]
pub struct KdTree {
    nodes: Vec<KdNode>,
    points: CoordinateSet,
}

#[derive(Debug)]
struct KdNode {
    /// Index into `points`
    point_idx: usize,
    /// Split dimension, cycles through 0..dim with depth
    split_dim: usize,
    /// Left child index (None = leaf)
    left: Option<usize>,
    /// Right child index (None = leaf)
    right: Option<usize>,
}

/// One neighbor found by a query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the source point
    pub index: usize,
    pub distance_sq: f64,
}

impl Neighbor {
    /// Euclidean distance to the query point
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_sq.sqrt()
    }
}

#[inline]
fn is_finite_point(p: &[f64]) -> bool {
    p.iter().all(|c| c.is_finite())
}

/// Ordering by (distance, index), the tie-break used by all queries
#[inline]
fn cmp_key(a: (f64, usize), b: (f64, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Result of a k-nearest query over many targets.
///
/// Row `t` holds the neighbors of target `t` by ascending distance.
/// When fewer than `k` sources exist, the remaining slots hold an
/// infinite distance and the out-of-range index `num_sources`.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    distances: Array2<f64>,
    indices: Array2<usize>,
    num_sources: usize,
}

impl NeighborTable {
    /// Euclidean distances, shape (targets, k)
    pub fn distances(&self) -> &Array2<f64> {
        &self.distances
    }

    /// Source indices, shape (targets, k)
    pub fn indices(&self) -> &Array2<usize> {
        &self.indices
    }

    pub fn num_targets(&self) -> usize {
        self.distances.nrows()
    }

    pub fn k(&self) -> usize {
        self.distances.ncols()
    }

    pub fn num_sources(&self) -> usize {
        self.num_sources
    }

    /// Finite (distance, source index) pairs of target `t`, nearest first.
    pub fn valid(&self, t: usize) -> Vec<(f64, usize)> {
        self.distances
            .row(t)
            .iter()
            .zip(self.indices.row(t))
            .filter(|(d, _)| d.is_finite())
            .map(|(&d, &i)| (d, i))
            .collect()
    }
}

impl KdTree {
    /// Build a k-d tree over a set of points.
    ///
    /// Construction is O(n log² n) using median-of-coordinate splitting.
    /// Points with a non-finite coordinate are not indexed and never
    /// returned by a query; indices still refer to the full set.
    pub fn build(points: &CoordinateSet) -> Self {
        let mut indices: Vec<usize> = (0..points.len())
            .filter(|&i| is_finite_point(points.point(i)))
            .collect();
        if indices.is_empty() {
            return Self {
                nodes: Vec::new(),
                points: points.clone(),
            };
        }

        let mut nodes = Vec::with_capacity(indices.len());
        build_recursive(points, &mut indices, 0, &mut nodes);
        tracing::trace!(
            points = points.len(),
            indexed = nodes.len(),
            dim = points.dim(),
            "built k-d tree"
        );

        Self {
            nodes,
            points: points.clone(),
        }
    }

    /// Number of points in the tree.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Whether the tree is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Dimensionality of the indexed points.
    pub fn dim(&self) -> usize {
        self.points.dim()
    }

    /// Find the single nearest point to `query`.
    ///
    /// Returns `None` if the tree is empty or `query` is not finite.
    /// Complexity: O(log n) average case.
    pub fn nearest(&self, query: &[f64]) -> Option<Neighbor> {
        if self.nodes.is_empty() || !is_finite_point(query) {
            return None;
        }

        let mut best = (f64::INFINITY, usize::MAX);
        self.nearest_recursive(0, query, &mut best);

        Some(Neighbor {
            index: best.1,
            distance_sq: best.0,
        })
    }

    /// Find the k nearest points to `query`.
    ///
    /// Returns up to k results sorted by ascending distance.
    /// Complexity: O(k log n) average case.
    pub fn k_nearest(&self, query: &[f64], k: usize) -> Vec<Neighbor> {
        if self.nodes.is_empty() || k == 0 || !is_finite_point(query) {
            return Vec::new();
        }

        // Sorted descending by key, so heap[0] is the farthest kept neighbor
        let mut heap: Vec<(f64, usize)> = Vec::with_capacity(k + 1);

        self.knn_recursive(0, query, k, &mut heap);

        heap.iter()
            .rev()
            .map(|&(distance_sq, index)| Neighbor { index, distance_sq })
            .collect()
    }

    /// Find all points within `radius` of `query`, nearest first.
    pub fn within_radius(&self, query: &[f64], radius: f64) -> Vec<Neighbor> {
        if self.nodes.is_empty() || radius < 0.0 || !is_finite_point(query) {
            return Vec::new();
        }

        let radius_sq = radius * radius;
        let mut results = Vec::new();

        self.radius_recursive(0, query, radius_sq, &mut results);
        results.sort_by(|a, b| cmp_key((a.distance_sq, a.index), (b.distance_sq, b.index)));

        results
    }

    /// Query the `k` nearest sources of every target point.
    ///
    /// Targets are processed independently (in parallel with the
    /// `parallel` feature).
    pub fn query(&self, targets: &CoordinateSet, k: usize) -> NeighborTable {
        let n = targets.len();
        let num_sources = self.len();

        let rows: Vec<Vec<Neighbor>> = (0..n)
            .into_par_iter()
            .map(|t| self.k_nearest(targets.point(t), k))
            .collect();

        let mut distances = Array2::from_elem((n, k), f64::INFINITY);
        let mut indices = Array2::from_elem((n, k), num_sources);
        for (t, found) in rows.iter().enumerate() {
            for (j, nb) in found.iter().enumerate() {
                distances[(t, j)] = nb.distance();
                indices[(t, j)] = nb.index;
            }
        }

        NeighborTable {
            distances,
            indices,
            num_sources,
        }
    }

    #[inline]
    fn dist_sq(&self, idx: usize, query: &[f64]) -> f64 {
        self.points
            .point(idx)
            .iter()
            .zip(query)
            .map(|(p, q)| (q - p) * (q - p))
            .sum()
    }

    fn nearest_recursive(&self, node_idx: usize, query: &[f64], best: &mut (f64, usize)) {
        let node = &self.nodes[node_idx];

        let dist_sq = self.dist_sq(node.point_idx, query);
        if cmp_key((dist_sq, node.point_idx), *best) == Ordering::Less {
            *best = (dist_sq, node.point_idx);
        }

        // Determine which side to search first
        let diff = query[node.split_dim] - self.points.point(node.point_idx)[node.split_dim];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.nearest_recursive(child, query, best);
        }

        // Equal-distance points behind the plane may still win the index tie-break
        if diff * diff <= best.0 {
            if let Some(child) = second {
                self.nearest_recursive(child, query, best);
            }
        }
    }

    fn knn_recursive(
        &self,
        node_idx: usize,
        query: &[f64],
        k: usize,
        heap: &mut Vec<(f64, usize)>,
    ) {
        let node = &self.nodes[node_idx];
        let key = (self.dist_sq(node.point_idx, query), node.point_idx);

        if heap.len() < k || cmp_key(key, heap[0]) == Ordering::Less {
            if heap.len() >= k {
                // Remove the farthest point
                heap.remove(0);
            }
            let pos = heap
                .binary_search_by(|entry| cmp_key(*entry, key).reverse())
                .unwrap_or_else(|e| e);
            heap.insert(pos, key);
        }

        let diff = query[node.split_dim] - self.points.point(node.point_idx)[node.split_dim];
        let (first, second) = if diff < 0.0 {
            (node.left, node.right)
        } else {
            (node.right, node.left)
        };

        if let Some(child) = first {
            self.knn_recursive(child, query, k, heap);
        }

        let threshold = if heap.len() >= k {
            heap[0].0
        } else {
            f64::INFINITY
        };

        if diff * diff <= threshold {
            if let Some(child) = second {
                self.knn_recursive(child, query, k, heap);
            }
        }
    }

    fn radius_recursive(
        &self,
        node_idx: usize,
        query: &[f64],
        radius_sq: f64,
        results: &mut Vec<Neighbor>,
    ) {
        let node = &self.nodes[node_idx];

        let dist_sq = self.dist_sq(node.point_idx, query);
        if dist_sq <= radius_sq {
            results.push(Neighbor {
                index: node.point_idx,
                distance_sq: dist_sq,
            });
        }

        let diff = query[node.split_dim] - self.points.point(node.point_idx)[node.split_dim];

        if let Some(left) = node.left {
            if diff < 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(left, query, radius_sq, results);
            }
        }

        if let Some(right) = node.right {
            if diff >= 0.0 || diff * diff <= radius_sq {
                self.radius_recursive(right, query, radius_sq, results);
            }
        }
    }
}

/// Recursively build the k-d tree.
fn build_recursive(
    points: &CoordinateSet,
    indices: &mut [usize],
    depth: usize,
    nodes: &mut Vec<KdNode>,
) -> usize {
    let n = indices.len();
    let split_dim = depth % points.dim();

    indices.sort_by(|&a, &b| {
        points.point(a)[split_dim]
            .total_cmp(&points.point(b)[split_dim])
            .then(a.cmp(&b))
    });

    let median = n / 2;
    let point_idx = indices[median];

    let node_idx = nodes.len();
    nodes.push(KdNode {
        point_idx,
        split_dim,
        left: None,
        right: None,
    });

    let (left, rest) = indices.split_at_mut(median);
    let right = &mut rest[1..];

    if !left.is_empty() {
        let left_idx = build_recursive(points, left, depth + 1, nodes);
        nodes[node_idx].left = Some(left_idx);
    }

    if !right.is_empty() {
        let right_idx = build_recursive(points, right, depth + 1, nodes);
        nodes[node_idx].right = Some(right_idx);
    }

    node_idx
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_points() -> CoordinateSet {
        CoordinateSet::from_points(&[
            [2.0, 3.0],
            [5.0, 4.0],
            [9.0, 6.0],
            [4.0, 7.0],
            [8.0, 1.0],
            [7.0, 2.0],
            [1.0, 8.0],
            [6.0, 5.0],
        ])
    }

    fn brute_force(points: &CoordinateSet, q: &[f64]) -> Vec<(f64, usize)> {
        let mut all: Vec<(f64, usize)> = points
            .iter()
            .enumerate()
            .map(|(i, p)| (p.iter().zip(q).map(|(a, b)| (a - b) * (a - b)).sum(), i))
            .collect();
        all.sort_by(|a, b| cmp_key(*a, *b));
        all
    }

    #[test]
    fn test_build_and_size() {
        let tree = KdTree::build(&sample_points());
        assert_eq!(tree.len(), 8);
        assert_eq!(tree.dim(), 2);
        assert!(!tree.is_empty());
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::build(&CoordinateSet::from_points::<2>(&[]));
        assert!(tree.is_empty());
        assert!(tree.nearest(&[0.0, 0.0]).is_none());
        assert!(tree.k_nearest(&[0.0, 0.0], 3).is_empty());

        let table = tree.query(&CoordinateSet::from_points(&[[1.0, 1.0]]), 2);
        assert!(table.distances().iter().all(|d| d.is_infinite()));
        assert!(table.indices().iter().all(|&i| i == 0));
        assert!(table.valid(0).is_empty());
    }

    #[test]
    fn test_non_finite_points_are_skipped() {
        let mut raw: Vec<[f64; 2]> = (0..200)
            .map(|i| [(i * 37 % 101) as f64, (i * 53 % 97) as f64])
            .collect();
        for p in raw.iter_mut().step_by(7) {
            p[0] = f64::NAN;
        }
        raw[3][1] = f64::INFINITY;
        let pts = CoordinateSet::from_points(&raw);
        let tree = KdTree::build(&pts);
        assert_eq!(tree.len(), 200);

        let bad = |i: usize| i % 7 == 0 || i == 3;
        for q in [[0.0, 0.0], [50.0, 50.0], [100.0, 10.0]] {
            let found = tree.k_nearest(&q, 10);
            assert_eq!(found.len(), 10);
            assert!(found.iter().all(|n| !bad(n.index) && n.distance_sq.is_finite()));

            let expected: Vec<(f64, usize)> = brute_force(&pts, &q)
                .into_iter()
                .filter(|&(_, i)| !bad(i))
                .take(10)
                .collect();
            let got: Vec<(f64, usize)> = found.iter().map(|n| (n.distance_sq, n.index)).collect();
            assert_eq!(got, expected);
        }
        assert!(tree
            .within_radius(&[0.0, 0.0], 1e9)
            .iter()
            .all(|n| !bad(n.index)));
    }

    #[test]
    fn test_non_finite_query_has_no_neighbors() {
        let tree = KdTree::build(&sample_points());
        assert!(tree.nearest(&[f64::NAN, 1.0]).is_none());
        assert!(tree.k_nearest(&[1.0, f64::INFINITY], 3).is_empty());
        assert!(tree.within_radius(&[f64::NAN, f64::NAN], 100.0).is_empty());
    }

    #[test]
    fn test_all_non_finite_points() {
        let pts = CoordinateSet::from_points(&[[f64::NAN, 0.0], [1.0, f64::NAN]]);
        let tree = KdTree::build(&pts);
        assert!(tree.nearest(&[0.0, 0.0]).is_none());
        let table = tree.query(&CoordinateSet::from_points(&[[0.0, 0.0]]), 1);
        assert_eq!(table.indices()[(0, 0)], 2);
    }

    #[test]
    fn test_nearest_exact() {
        let tree = KdTree::build(&sample_points());
        let result = tree.nearest(&[5.0, 4.0]).unwrap();
        assert!(result.distance_sq < 1e-10);
        assert_eq!(result.index, 1);
    }

    #[test]
    fn test_nearest_matches_brute_force() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);

        for qx in 0..10 {
            for qy in 0..10 {
                let q = [qx as f64 + 0.5, qy as f64 + 0.5];
                let found = tree.nearest(&q).unwrap();
                let bf = brute_force(&pts, &q)[0];
                assert_eq!(
                    (found.distance_sq, found.index),
                    bf,
                    "Mismatch at ({}, {})",
                    q[0],
                    q[1]
                );
            }
        }
    }

    #[test]
    fn test_tie_break_lowest_index() {
        let pts = CoordinateSet::from_points(&[[10.0], [0.0], [20.0]]);
        let tree = KdTree::build(&pts);

        // 5.0 is equidistant from index 0 (x=10) and index 1 (x=0)
        let result = tree.nearest(&[5.0]).unwrap();
        assert_eq!(result.index, 0);

        let knn = tree.k_nearest(&[15.0], 2);
        assert_eq!(knn[0].index, 0);
        assert_eq!(knn[1].index, 2);
    }

    #[test]
    fn test_k_nearest_matches_brute_force() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);

        let results = tree.k_nearest(&[5.0, 5.0], 3);
        assert_eq!(results.len(), 3);

        let bf = brute_force(&pts, &[5.0, 5.0]);
        for (i, r) in results.iter().enumerate() {
            assert_eq!((r.distance_sq, r.index), bf[i], "k={}", i);
        }
    }

    #[test]
    fn test_k_nearest_more_than_points() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);
        assert_eq!(tree.k_nearest(&[5.0, 5.0], 100).len(), pts.len());
    }

    #[test]
    fn test_query_pads_missing_neighbors() {
        let pts = CoordinateSet::from_points(&[[0.0, 0.0], [3.0, 4.0]]);
        let tree = KdTree::build(&pts);
        let table = tree.query(&CoordinateSet::from_points(&[[0.0, 0.0]]), 4);

        assert_eq!(table.k(), 4);
        assert_eq!(table.distances()[(0, 0)], 0.0);
        assert_eq!(table.distances()[(0, 1)], 5.0);
        assert!(table.distances()[(0, 2)].is_infinite());
        assert_eq!(table.indices()[(0, 3)], 2);

        assert_eq!(table.valid(0), vec![(0.0, 0), (5.0, 1)]);
    }

    #[test]
    fn test_within_radius() {
        let pts = sample_points();
        let tree = KdTree::build(&pts);

        let results = tree.within_radius(&[5.0, 5.0], 2.0);
        for r in &results {
            assert!(r.distance_sq <= 4.0 + 1e-10);
        }
        let bf_count = brute_force(&pts, &[5.0, 5.0])
            .iter()
            .filter(|(d, _)| *d <= 4.0)
            .count();
        assert_eq!(results.len(), bf_count);
    }

    #[test]
    fn test_three_dimensional_points() {
        let pts: Vec<[f64; 3]> = (0..200)
            .map(|i| {
                [
                    ((i * 7 + 13) % 31) as f64,
                    ((i * 11 + 37) % 29) as f64,
                    ((i * 5 + 3) % 23) as f64,
                ]
            })
            .collect();
        let set = CoordinateSet::from_points(&pts);
        let tree = KdTree::build(&set);

        for q in [[10.2, 4.9, 7.7], [0.0, 0.0, 0.0], [30.0, 28.0, 22.0]] {
            let knn = tree.k_nearest(&q, 5);
            let bf = brute_force(&set, &q);
            for (i, r) in knn.iter().enumerate() {
                assert_eq!((r.distance_sq, r.index), bf[i]);
            }
        }
    }

    #[test]
    fn test_duplicate_points() {
        let pts = CoordinateSet::from_points(&[[1.0, 1.0], [1.0, 1.0], [1.0, 1.0]]);
        let tree = KdTree::build(&pts);
        let knn = tree.k_nearest(&[1.0, 1.0], 3);
        let order: Vec<usize> = knn.iter().map(|n| n.index).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
