// UTILS

use bevy::prelude::*;
use crate::systems::mesh::Polygon;

/// Intersects two infinite lines given as origin + direction
///
/// # Returns
/// `(t, s)` such that `o1 + d1 * t == o2 + d2 * s`, `None` for parallel lines
pub fn intersect_lines(o1: Vec2, d1: Vec2, o2: Vec2, d2: Vec2) -> Option<(f32, f32)> {
    let denom = d1.perp_dot(d2); // determinant of 2x2 matrix

    // parallel lines
    if denom.abs() < 1e-9 {
        return None;
    }

    let w = o2 - o1;
    let t = w.perp_dot(d2) / denom;
    let s = w.perp_dot(d1) / denom;
    Some((t, s))
}

/// Signed distance from `point` to the infinite line through `origin` along `dir`,
/// positive on the left side of the direction
pub fn distance_to_line(origin: Vec2, dir: Vec2, point: Vec2) -> f32 {
    let len = dir.length();
    if len < f32::EPSILON {
        return origin.distance(point);
    }
    dir.perp_dot(point - origin) / len
}

/// Computes the signed area of a polygon
/// # Returns the polygon's area as an `f32`, positive for counter-clockwise winding.
/// Returns 0.0 for polygons with fewer than 3 vertices.
pub fn polygon_area(polygon: &[Vec2]) -> f32 {
    if polygon.len() < 3 {
        return 0.0;
    }

    let n = polygon.len();
    let mut area = 0.0;

    for i in 0..n {
        let j = (i + 1) % n;
        area += polygon[i].x * polygon[j].y - polygon[j].x * polygon[i].y;
    }

    area / 2.0
}

pub fn polygon_perimeter(polygon: &[Vec2]) -> f32 {
    let n = polygon.len();
    if n < 2 {
        return 0.0;
    }
    (0..n).map(|i| polygon[i].distance(polygon[(i + 1) % n])).sum()
}

/// Calculates the area-weighted centroid of a polygon
/// Returns the vertex average for degenerate polygons.
pub fn polygon_centroid(polygon: &[Vec2], area: f32) -> Vec2 {
    if polygon.len() < 3 || area == 0.0 {
        return polygon_center(polygon);
    }

    let n = polygon.len();
    let mut cx = 0.0_f64;
    let mut cy = 0.0_f64;

    for i in 0..n {
        let j = (i + 1) % n;
        let p = polygon[i].x as f64 * polygon[j].y as f64 - polygon[j].x as f64 * polygon[i].y as f64;
        cx += (polygon[i].x + polygon[j].x) as f64 * p;
        cy += (polygon[i].y + polygon[j].y) as f64 * p;
    }

    let area_6 = 6.0 * area as f64;
    Vec2::new((cx / area_6) as f32, (cy / area_6) as f32)
}

/// Plain average of the vertices
pub fn polygon_center(polygon: &[Vec2]) -> Vec2 {
    if polygon.is_empty() {
        return Vec2::ZERO;
    }
    polygon.iter().fold(Vec2::ZERO, |acc, p| acc + *p) / polygon.len() as f32
}

/// Isoperimetric ratio, 1.0 for a circle and smaller for anything less round
pub fn polygon_compactness(polygon: &[Vec2]) -> f32 {
    let perimeter = polygon_perimeter(polygon);
    if perimeter <= 0.0 {
        return 0.0;
    }
    4.0 * std::f32::consts::PI * polygon_area(polygon) / (perimeter * perimeter)
}

/// A vertex is convex when its incident edges turn left (ccw polygons)
pub fn is_convex_vertex(polygon: &[Vec2], i: usize) -> bool {
    let n = polygon.len();
    let v0 = polygon[(i + n - 1) % n];
    let v1 = polygon[i];
    let v2 = polygon[(i + 1) % n];
    (v1 - v0).perp_dot(v2 - v1) > 0.0
}

pub fn is_convex(polygon: &[Vec2]) -> bool {
    (0..polygon.len()).all(|i| is_convex_vertex(polygon, i))
}

/// Inverse-distance weights of every vertex relative to `p`, summing to 1
pub fn interpolate(polygon: &[Vec2], p: Vec2) -> Vec<f32> {
    let inverse: Vec<f32> = polygon
        .iter()
        .map(|v| 1.0 / v.distance(p).max(f32::EPSILON))
        .collect();
    let sum: f32 = inverse.iter().sum();
    inverse.into_iter().map(|d| d / sum).collect()
}

/// Calculates the circumcenter of a triangle given by three points.
/// # Returns the circumcenter, computed in f64.
/// Falls back to the triangle centroid if points are collinear.
pub fn calculate_circumcenter(p1: Vec2, p2: Vec2, p3: Vec2) -> Vec2 {
    let (ax, ay) = (p1.x as f64, p1.y as f64);
    let (bx, by) = (p2.x as f64, p2.y as f64);
    let (cx, cy) = (p3.x as f64, p3.y as f64);

    // denominator in Cramer's rule solution
    // d = 2 * det | 1 x1 y1 |
    //             | 1 x2 y2 |
    //             | 1 x3 y3 |
    let d = 2.0 * (ax * (by - cy) + bx * (cy - ay) + cx * (ay - by));

    if d.abs() < f64::EPSILON {
        // fallback to centroid in event that points are collinear
        return (p1 + p2 + p3) / 3.0;
    }

    // solving the linearized bisector equations
    // (X - x1)^2 + (Y - y1)^2 = (X - x2)^2 + (Y - y2)^2
    // (X - x2)^2 + (Y - y2)^2 = (X - x3)^2 + (Y - y3)^2
    let ux = ((ax * ax + ay * ay) * (by - cy)
                 + (bx * bx + by * by) * (cy - ay)
                 + (cx * cx + cy * cy) * (ay - by)) / d;

    let uy = ((ax * ax + ay * ay) * (cx - bx)
                 + (bx * bx + by * by) * (ax - cx)
                 + (cx * cx + cy * cy) * (bx - ax)) / d;

    Vec2::new(ux as f32, uy as f32)
}

// shape builders, all centered on the origin

pub fn rect(width: f32, height: f32) -> Polygon {
    let (w, h) = (width / 2.0, height / 2.0);
    vec![
        Vec2::new(-w, -h),
        Vec2::new(w, -h),
        Vec2::new(w, h),
        Vec2::new(-w, h),
    ]
}

pub fn regular(sides: usize, radius: f32) -> Polygon {
    (0..sides)
        .map(|i| {
            let angle = i as f32 / sides as f32 * std::f32::consts::TAU;
            Vec2::new(angle.cos(), angle.sin()) * radius
        })
        .collect()
}

pub fn circle(radius: f32) -> Polygon {
    regular(16, radius)
}

pub fn rotate(polygon: &mut Polygon, angle: f32) {
    let rotation = Vec2::new(angle.cos(), angle.sin());
    for v in polygon.iter_mut() {
        *v = rotation.rotate(*v);
    }
}

pub fn translate(polygon: &mut Polygon, offset: Vec2) {
    for v in polygon.iter_mut() {
        *v += offset;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(size: f32) -> Polygon {
        vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(size, 0.0),
            Vec2::new(size, size),
            Vec2::new(0.0, size),
        ]
    }

    #[test]
    fn area_is_signed_by_winding() {
        let mut poly = square(10.0);
        assert!((polygon_area(&poly) - 100.0).abs() < 1e-4);
        poly.reverse();
        assert!((polygon_area(&poly) + 100.0).abs() < 1e-4);
    }

    #[test]
    fn centroid_of_square() {
        let poly = square(4.0);
        let c = polygon_centroid(&poly, polygon_area(&poly));
        assert!(c.distance(Vec2::new(2.0, 2.0)) < 1e-5);
    }

    #[test]
    fn compactness_prefers_round_shapes() {
        let round = circle(10.0);
        let sliver = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(40.0, 0.0),
            Vec2::new(40.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert!(polygon_compactness(&round) > 0.95);
        assert!(polygon_compactness(&sliver) < 0.2);
        assert!(polygon_compactness(&square(1.0)) > polygon_compactness(&sliver));
    }

    #[test]
    fn convexity_detects_reflex_vertex() {
        assert!(is_convex(&square(3.0)));
        let arrow = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(4.0, 0.0),
            Vec2::new(2.0, 1.0),
            Vec2::new(4.0, 4.0),
            Vec2::new(0.0, 4.0),
        ];
        assert!(!is_convex(&arrow));
        assert!(!is_convex_vertex(&arrow, 2));
    }

    #[test]
    fn circumcenter_is_equidistant() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(6.0, 0.0);
        let c = Vec2::new(1.0, 5.0);
        let center = calculate_circumcenter(a, b, c);
        let r = center.distance(a);
        assert!((center.distance(b) - r).abs() < 1e-4);
        assert!((center.distance(c) - r).abs() < 1e-4);
    }

    #[test]
    fn interpolation_weights_sum_to_one() {
        let poly = square(2.0);
        let weights = interpolate(&poly, Vec2::new(0.5, 0.5));
        let sum: f32 = weights.iter().sum();
        assert!((sum - 1.0).abs() < 1e-5);
        assert!(weights[0] > weights[2]);
    }

    #[test]
    fn distance_to_line_is_signed() {
        let d = distance_to_line(Vec2::ZERO, Vec2::X, Vec2::new(3.0, 2.0));
        assert!((d - 2.0).abs() < 1e-6);
        let d = distance_to_line(Vec2::ZERO, Vec2::X, Vec2::new(3.0, -2.0));
        assert!((d + 2.0).abs() < 1e-6);
    }
}
