//! Boundary tracing for sets of grid cells
//!
//! A month occupies a set of unit squares in (week, weekday) space. Its
//! outline is the set of square edges that belong to exactly one square,
//! each directed so its square lies on the left, walked into closed loops.
//! Outer boundaries therefore come out counter-clockwise and the boundaries
//! of holes clockwise. When two regions touch only at a corner the walk
//! prefers the left turn, and any walk that still passes a vertex twice is
//! split there, so every loop is a simple polygon.

use std::collections::{BTreeSet, HashMap};

use super::grid::GridCell;

const EPSILON: f64 = 1e-9;

/// A 2D point in grid or pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

type Vertex = (i64, i64);
type Edge = (Vertex, Vertex);

/// Trace the outlines of a set of cells.
///
/// Each returned polygon is closed implicitly (last point connects to the
/// first), simple, and free of colinear points. Cells are unit squares at
/// `(week, weekday)`. Outer boundaries have positive signed area and holes
/// negative, so the areas sum to the number of cells.
pub fn trace_outlines(cells: &[GridCell]) -> Vec<Vec<Point>> {
    let cells: BTreeSet<Vertex> = cells
        .iter()
        .map(|c| (i64::from(c.week), i64::from(c.weekday)))
        .collect();

    let edges = boundary_edges(&cells);

    let mut outgoing: HashMap<Vertex, Vec<usize>> = HashMap::new();
    for (idx, (from, _)) in edges.iter().enumerate() {
        outgoing.entry(*from).or_default().push(idx);
    }

    let mut used = vec![false; edges.len()];
    let mut polygons = Vec::new();

    for first in 0..edges.len() {
        if used[first] {
            continue;
        }

        let start = edges[first].0;
        let mut walk = vec![start];
        let mut current = first;

        loop {
            used[current] = true;
            let (from, to) = edges[current];
            if to == start {
                break;
            }
            walk.push(to);

            let incoming = direction((from, to));
            let next = outgoing
                .get(&to)
                .into_iter()
                .flatten()
                .copied()
                .filter(|&idx| !used[idx])
                .max_by_key(|&idx| turn_rank(incoming, direction(edges[idx])));

            match next {
                Some(idx) => current = idx,
                None => break,
            }
        }

        for vertices in split_at_repeats(walk) {
            let polygon: Vec<Point> = vertices
                .into_iter()
                .map(|(x, y)| Point::new(x as f64, y as f64))
                .collect();

            let polygon = reduce_colinear(&polygon);
            if polygon.len() >= 3 {
                polygons.push(polygon);
            }
        }
    }

    polygons
}

/// Break a closed walk into loops that visit each vertex once. Every
/// sub-loop keeps the direction of the walk.
fn split_at_repeats(walk: Vec<Vertex>) -> Vec<Vec<Vertex>> {
    let mut loops = Vec::new();
    let mut path: Vec<Vertex> = Vec::with_capacity(walk.len());
    let mut seen: HashMap<Vertex, usize> = HashMap::new();

    for vertex in walk {
        match seen.get(&vertex) {
            Some(&at) => {
                let tail: Vec<Vertex> = path.drain(at + 1..).collect();
                for v in &tail {
                    seen.remove(v);
                }
                let mut closed = Vec::with_capacity(tail.len() + 1);
                closed.push(vertex);
                closed.extend(tail);
                loops.push(closed);
            }
            None => {
                seen.insert(vertex, path.len());
                path.push(vertex);
            }
        }
    }

    loops.push(path);
    loops
}

/// Edges of the cells that are not shared with another cell in the set,
/// each directed so the owning cell lies on its left.
fn boundary_edges(cells: &BTreeSet<Vertex>) -> Vec<Edge> {
    let mut all: Vec<Edge> = Vec::with_capacity(cells.len() * 4);
    let mut counts: HashMap<Edge, u32> = HashMap::new();

    for &(x, y) in cells {
        let corners = [(x, y), (x + 1, y), (x + 1, y + 1), (x, y + 1)];
        for i in 0..4 {
            let edge = (corners[i], corners[(i + 1) % 4]);
            *counts.entry(undirected(edge)).or_insert(0) += 1;
            all.push(edge);
        }
    }

    all.into_iter()
        .filter(|edge| counts.get(&undirected(*edge)) == Some(&1))
        .collect()
}

fn undirected((a, b): Edge) -> Edge {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn direction(((x0, y0), (x1, y1)): Edge) -> Vertex {
    (x1 - x0, y1 - y0)
}

/// Left turn ranks highest, then straight on, then right
fn turn_rank(incoming: Vertex, outgoing: Vertex) -> i64 {
    let cross = incoming.0 * outgoing.1 - incoming.1 * outgoing.0;
    let dot = incoming.0 * outgoing.0 + incoming.1 * outgoing.1;
    match (cross.signum(), dot.signum()) {
        (1, _) => 3,
        (0, 1) => 2,
        (-1, _) => 1,
        _ => 0,
    }
}

/// Shoelace area; positive when the vertices turn from +x towards +y
pub fn signed_area(polygon: &[Point]) -> f64 {
    if polygon.len() < 3 {
        return 0.0;
    }
    let twice: f64 = polygon
        .iter()
        .zip(polygon.iter().cycle().skip(1))
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum();
    twice / 2.0
}

/// Reverse the polygon if its signed area is negative
pub fn orient_ccw(mut polygon: Vec<Point>) -> Vec<Point> {
    if signed_area(&polygon) < 0.0 {
        polygon.reverse();
    }
    polygon
}

/// Drop vertices that lie on the straight line between their neighbours,
/// along with consecutive duplicates.
pub fn reduce_colinear(polygon: &[Point]) -> Vec<Point> {
    let mut points: Vec<Point> = Vec::with_capacity(polygon.len());
    for &p in polygon {
        if points.last().map_or(true, |last| !same_point(*last, p)) {
            points.push(p);
        }
    }
    while points.len() > 1 && same_point(points[0], points[points.len() - 1]) {
        points.pop();
    }

    // Removing one vertex can make its neighbour colinear, so repeat until stable
    while points.len() >= 3 {
        let n = points.len();
        let colinear = (0..n).find(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            let cross = (cur.x - prev.x) * (next.y - cur.y) - (cur.y - prev.y) * (next.x - cur.x);
            cross.abs() <= EPSILON
        });
        match colinear {
            Some(i) => {
                points.remove(i);
            }
            None => break,
        }
    }
    points
}

fn same_point(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() <= EPSILON && (a.y - b.y).abs() <= EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn cells(list: &[(u32, u32)]) -> Vec<GridCell> {
        list.iter().map(|&(w, d)| GridCell::new(w, d)).collect()
    }

    fn contains(polygon: &[Point], x: f64, y: f64) -> bool {
        polygon.iter().any(|p| same_point(*p, Point::new(x, y)))
    }

    fn has_unique_vertices(polygon: &[Point]) -> bool {
        polygon
            .iter()
            .enumerate()
            .all(|(i, a)| polygon[i + 1..].iter().all(|b| !same_point(*a, *b)))
    }

    /// Closed axis-aligned segments meet exactly when their boxes overlap
    fn segments_meet(a: (Point, Point), b: (Point, Point)) -> bool {
        let span = |p: Point, q: Point| (p.x.min(q.x), p.x.max(q.x), p.y.min(q.y), p.y.max(q.y));
        let (ax0, ax1, ay0, ay1) = span(a.0, a.1);
        let (bx0, bx1, by0, by1) = span(b.0, b.1);
        ax0 <= bx1 + EPSILON && bx0 <= ax1 + EPSILON && ay0 <= by1 + EPSILON && by0 <= ay1 + EPSILON
    }

    fn is_simple(polygon: &[Point]) -> bool {
        let n = polygon.len();
        let edge = |i: usize| (polygon[i], polygon[(i + 1) % n]);
        (0..n).all(|i| {
            (i + 2..n)
                .filter(|&j| (j + 1) % n != i)
                .all(|j| !segments_meet(edge(i), edge(j)))
        })
    }

    /// Nonzero winding number of `polygon` around `(x, y)`
    fn winding(polygon: &[Point], x: f64, y: f64) -> i32 {
        let n = polygon.len();
        let mut wn = 0;
        for i in 0..n {
            let a = polygon[i];
            let b = polygon[(i + 1) % n];
            let side = (b.x - a.x) * (y - a.y) - (x - a.x) * (b.y - a.y);
            if a.y <= y && b.y > y && side > 0.0 {
                wn += 1;
            } else if b.y <= y && a.y > y && side < 0.0 {
                wn -= 1;
            }
        }
        wn
    }

    #[test]
    fn test_single_cell() {
        let polys = trace_outlines(&cells(&[(0, 0)]));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 4);
        assert!((signed_area(&polys[0]) - 1.0).abs() < EPSILON);
    }

    #[test]
    fn test_full_rectangle_has_four_corners() {
        let mut list = Vec::new();
        for w in 0..5 {
            for d in 0..7 {
                list.push((w, d));
            }
        }
        let polys = trace_outlines(&cells(&list));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 4);
        assert!((signed_area(&polys[0]) - 35.0).abs() < EPSILON);
        for (x, y) in [(0.0, 0.0), (5.0, 0.0), (5.0, 7.0), (0.0, 7.0)] {
            assert!(contains(&polys[0], x, y));
        }
    }

    #[test]
    fn test_typical_month_shape() {
        // A month starting on Wednesday (weekday 3) and ending on Friday
        // of its fifth week
        let mut list = Vec::new();
        for d in 3..7 {
            list.push((0, d));
        }
        for w in 1..4 {
            for d in 0..7 {
                list.push((w, d));
            }
        }
        for d in 0..6 {
            list.push((4, d));
        }
        let polys = trace_outlines(&cells(&list));
        assert_eq!(polys.len(), 1);
        assert_eq!(polys[0].len(), 8);
        assert!((signed_area(&polys[0]) - list.len() as f64).abs() < EPSILON);
    }

    #[test]
    fn test_corner_touching_regions_split() {
        // (0, 6) and (1, 5) share only the point (1, 6)
        let polys = trace_outlines(&cells(&[(0, 6), (1, 5)]));
        assert_eq!(polys.len(), 2);
        for poly in &polys {
            assert_eq!(poly.len(), 4);
            assert!(signed_area(poly) > 0.0);
        }
    }

    #[test]
    fn test_ring_keeps_its_hole() {
        let mut list = Vec::new();
        for w in 1..4 {
            for d in 1..4 {
                if (w, d) != (2, 2) {
                    list.push((w, d));
                }
            }
        }
        let polys = trace_outlines(&cells(&list));
        assert_eq!(polys.len(), 2);

        let mut areas: Vec<f64> = polys.iter().map(|p| signed_area(p)).collect();
        areas.sort_by(f64::total_cmp);
        assert!((areas[0] + 1.0).abs() < EPSILON);
        assert!((areas[1] - 9.0).abs() < EPSILON);
    }

    #[test]
    fn test_hole_touching_outline_at_corner() {
        // The hole at (1, 1) meets the outside at the point (2, 2), where
        // (1, 2) and (2, 1) touch diagonally
        let list = [(0, 0), (1, 0), (2, 0), (0, 1), (2, 1), (0, 2), (1, 2)];
        let polys = trace_outlines(&cells(&list));

        let total: f64 = polys.iter().map(|p| signed_area(p)).sum();
        assert!((total - list.len() as f64).abs() < EPSILON);
        assert!(polys.iter().any(|p| signed_area(p) < 0.0));
        for poly in &polys {
            assert!(has_unique_vertices(poly));
        }
    }

    #[test]
    fn test_disconnected_cells() {
        let polys = trace_outlines(&cells(&[(0, 0), (3, 3)]));
        assert_eq!(polys.len(), 2);
    }

    #[test]
    fn test_empty() {
        assert!(trace_outlines(&[]).is_empty());
    }

    #[test]
    fn test_orient_ccw_reverses_clockwise() {
        let cw = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 1.0),
            Point::new(1.0, 1.0),
            Point::new(1.0, 0.0),
        ];
        assert!(signed_area(&cw) < 0.0);
        let ccw = orient_ccw(cw);
        assert!(signed_area(&ccw) > 0.0);
    }

    #[test]
    fn test_reduce_colinear() {
        let poly = vec![
            Point::new(0.0, 0.0),
            Point::new(1.0, 0.0),
            Point::new(2.0, 0.0),
            Point::new(3.0, 0.0),
            Point::new(3.0, 2.0),
            Point::new(3.0, 2.0),
            Point::new(0.0, 2.0),
            Point::new(0.0, 1.0),
        ];
        let reduced = reduce_colinear(&poly);
        assert_eq!(reduced.len(), 4);
        assert!((signed_area(&reduced) - 6.0).abs() < EPSILON);
    }

    proptest! {
        #[test]
        fn prop_month_runs_trace_to_their_area(offset in 0u32..7, len in 1u32..=31) {
            // A month is a run of consecutive days in column-major order
            let list: Vec<(u32, u32)> = (offset..offset + len).map(|i| (i / 7, i % 7)).collect();
            let polys = trace_outlines(&cells(&list));

            prop_assert!(!polys.is_empty());
            let total: f64 = polys.iter().map(|p| signed_area(p)).sum();
            prop_assert!((total - f64::from(len)).abs() < EPSILON);

            for poly in &polys {
                prop_assert!(poly.len() >= 4);
                prop_assert!(signed_area(poly) > 0.0);
            }
        }

        #[test]
        fn prop_random_sets_enclose_exactly_their_cells(
            raw in proptest::collection::btree_set((0u32..8, 0u32..7), 1..40)
        ) {
            let list: Vec<(u32, u32)> = raw.iter().copied().collect();
            let polys = trace_outlines(&cells(&list));

            let total: f64 = polys.iter().map(|p| signed_area(p)).sum();
            prop_assert!((total - list.len() as f64).abs() < EPSILON);

            for poly in &polys {
                prop_assert!(poly.len() >= 4);
                prop_assert!(has_unique_vertices(poly));
                prop_assert!(is_simple(poly));
            }

            for w in 0..9u32 {
                for d in 0..8u32 {
                    let (x, y) = (f64::from(w) + 0.5, f64::from(d) + 0.5);
                    let wn: i32 = polys.iter().map(|p| winding(p, x, y)).sum();
                    let expected = i32::from(raw.contains(&(w, d)));
                    prop_assert_eq!(wn, expected, "cell ({}, {})", w, d);
                }
            }
        }

        #[test]
        fn prop_orient_ccw_is_positive(
            pts in proptest::collection::vec((-50i32..50, -50i32..50), 3..12)
        ) {
            let poly: Vec<Point> = pts.iter().map(|&(x, y)| Point::new(x as f64, y as f64)).collect();
            let area = signed_area(&poly);
            let oriented = orient_ccw(poly);
            prop_assert!(signed_area(&oriented) >= 0.0);
            prop_assert!((signed_area(&oriented).abs() - area.abs()).abs() < 1e-6);
        }
    }
}
