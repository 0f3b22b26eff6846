//! Rounded, padded SVG paths around rectilinear polygons

use std::fmt::Write;

use super::outline::{reduce_colinear, Point};

/// Build an SVG path for `polygon`, moving every edge outward by `padding`
/// (inward when negative) and rounding every corner with `radius`.
///
/// The region is taken to lie left of each edge: a counter-clockwise
/// polygon is an outer boundary and grows with positive padding, a
/// clockwise one is a hole and shrinks. The winding is kept in the output,
/// so holes are subtracted under the nonzero fill rule.
///
/// The radius at a corner never exceeds half of either adjacent edge.
/// Left turns sweep one way and right turns the other. Fewer than three
/// distinct corners yields an empty string.
pub fn blob_path(polygon: &[Point], padding: f64, radius: f64) -> String {
    let polygon = reduce_colinear(polygon);
    let n = polygon.len();
    if n < 3 {
        return String::new();
    }

    struct Corner {
        at: Point,
        d_in: Point,
        d_out: Point,
        convex: bool,
    }

    let corners: Vec<Corner> = (0..n)
        .map(|i| {
            let prev = polygon[(i + n - 1) % n];
            let cur = polygon[i];
            let next = polygon[(i + 1) % n];

            let d_in = unit(cur.x - prev.x, cur.y - prev.y);
            let d_out = unit(next.x - cur.x, next.y - cur.y);

            // Right-hand normals point away from the region
            let n_in = Point::new(d_in.y, -d_in.x);
            let n_out = Point::new(d_out.y, -d_out.x);

            Corner {
                at: Point::new(
                    cur.x + (n_in.x + n_out.x) * padding,
                    cur.y + (n_in.y + n_out.y) * padding,
                ),
                d_in,
                d_out,
                convex: cross(d_in, d_out) > 0.0,
            }
        })
        .collect();

    let radii: Vec<f64> = (0..n)
        .map(|i| {
            let prev = &corners[(i + n - 1) % n];
            let cur = &corners[i];
            let next = &corners[(i + 1) % n];
            let half_in = distance(prev.at, cur.at) / 2.0;
            let half_out = distance(cur.at, next.at) / 2.0;
            radius.max(0.0).min(half_in).min(half_out)
        })
        .collect();

    let mut path = String::new();
    let first = &corners[0];
    let _ = write!(
        path,
        "M{} {}",
        fmt_num(first.at.x + first.d_out.x * radii[0]),
        fmt_num(first.at.y + first.d_out.y * radii[0])
    );

    for k in 1..=n {
        let i = k % n;
        let corner = &corners[i];
        let r = radii[i];

        let _ = write!(
            path,
            " L{} {}",
            fmt_num(corner.at.x - corner.d_in.x * r),
            fmt_num(corner.at.y - corner.d_in.y * r)
        );

        if r > 0.0 {
            let _ = write!(
                path,
                " A{r} {r} 0 0 {sweep} {x} {y}",
                r = fmt_num(r),
                sweep = u8::from(corner.convex),
                x = fmt_num(corner.at.x + corner.d_out.x * r),
                y = fmt_num(corner.at.y + corner.d_out.y * r)
            );
        }
    }

    path.push_str(" Z");
    path
}

fn unit(dx: f64, dy: f64) -> Point {
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        Point::new(0.0, 0.0)
    } else {
        Point::new(dx / len, dy / len)
    }
}

fn cross(a: Point, b: Point) -> f64 {
    a.x * b.y - a.y * b.x
}

fn distance(a: Point, b: Point) -> f64 {
    ((b.x - a.x).powi(2) + (b.y - a.y).powi(2)).sqrt()
}

/// At most two decimals, no trailing zeros, no negative zero
pub(crate) fn fmt_num(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        return "0".to_string();
    }
    let text = format!("{rounded:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
