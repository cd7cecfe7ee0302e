use crate::geo::Point;
use crate::map::polygon::Polygon;

/// Simplification tolerance (degrees) for a zoom level.
///
/// Coarse at world view, finer as the map zooms in. Zooms outside the table
/// (exactly 12, 17 and up, negative, fractional zooms between 7 and 9) map to 0,
/// which turns simplification into a no-op.
pub fn tolerance_for_zoom(zoom: f64) -> f64 {
    if (0.0..3.0).contains(&zoom) {
        0.5
    } else if (3.0..5.0).contains(&zoom) {
        0.1
    } else if (5.0..7.0).contains(&zoom) {
        0.05
    } else if zoom == 7.0 {
        0.01
    } else if zoom == 8.0 {
        0.005
    } else if (9.0..12.0).contains(&zoom) {
        0.001
    } else if zoom > 12.0 && zoom < 17.0 {
        0.0001
    } else {
        0.0
    }
}

/// Reduce a polyline to fewer points within `tolerance` (degrees).
///
/// Runs a radial-distance pass (skipped when `high_quality`) followed by
/// Douglas-Peucker. The first and last points are always kept and inputs of two
/// points or fewer are returned as-is.
pub fn reduce(points: &[Point], tolerance: f64, high_quality: bool) -> Vec<Point> {
    if points.len() <= 2 {
        return points.to_vec();
    }

    let sq_tolerance = tolerance * tolerance;

    if high_quality {
        douglas_peucker(points, sq_tolerance)
    } else {
        douglas_peucker(&radial_distance(points, sq_tolerance), sq_tolerance)
    }
}

/// Simplify the outer ring and every hole with the same parameters
pub fn reduce_polygon(polygon: &Polygon, tolerance: f64, high_quality: bool) -> (Vec<Point>, Vec<Vec<Point>>) {
    let outer = reduce(polygon.points(), tolerance, high_quality);
    let holes = polygon
        .holes()
        .iter()
        .map(|hole| reduce(hole, tolerance, high_quality))
        .collect();
    (outer, holes)
}

/// Drop points closer than the tolerance to the previously kept point
fn radial_distance(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    let Some((&first, rest)) = points.split_first() else {
        return Vec::new();
    };

    let mut prev = first;
    let mut kept = vec![first];

    for &point in rest {
        if point.sq_dist(prev) > sq_tolerance {
            kept.push(point);
            prev = point;
        }
    }

    // Compare by value so the last point is never duplicated
    if let Some(&last) = rest.last() {
        if prev != last {
            kept.push(last);
        }
    }

    kept
}

/// Douglas-Peucker with an explicit stack so very long rings cannot overflow the
/// call stack.
fn douglas_peucker(points: &[Point], sq_tolerance: f64) -> Vec<Point> {
    let len = points.len();
    if len <= 2 {
        return points.to_vec();
    }

    let mut keep = vec![false; len];
    keep[0] = true;
    keep[len - 1] = true;

    let mut stack = vec![(0, len - 1)];

    while let Some((first, last)) = stack.pop() {
        let mut max_sq_dist = 0.0;
        let mut index = 0;

        for i in first + 1..last {
            let sq_dist = sq_seg_dist(points[i], points[first], points[last]);
            if sq_dist > max_sq_dist {
                index = i;
                max_sq_dist = sq_dist;
            }
        }

        if max_sq_dist > sq_tolerance {
            keep[index] = true;
            stack.push((index, last));
            stack.push((first, index));
        }
    }

    points
        .iter()
        .zip(&keep)
        .filter_map(|(&p, &k)| k.then_some(p))
        .collect()
}

/// Squared distance from `p` to the segment `a`-`b`
#[inline(always)]
fn sq_seg_dist(p: Point, a: Point, b: Point) -> f64 {
    let mut x = a.lon;
    let mut y = a.lat;
    let dx = b.lon - x;
    let dy = b.lat - y;

    if dx != 0.0 || dy != 0.0 {
        let t = ((p.lon - x) * dx + (p.lat - y) * dy) / (dx * dx + dy * dy);
        if t > 1.0 {
            x = b.lon;
            y = b.lat;
        } else if t > 0.0 {
            x += dx * t;
            y += dy * t;
        }
    }

    let dx = p.lon - x;
    let dy = p.lat - y;
    dx * dx + dy * dy
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().copied().map(Point::from).collect()
    }

    fn circle(samples: usize, radius: f64) -> Vec<Point> {
        (0..samples)
            .map(|i| {
                let a = (i as f64).to_radians() * (360.0 / samples as f64);
                Point::new(radius * a.cos(), radius * a.sin())
            })
            .collect()
    }

    #[test]
    fn test_tolerance_table() {
        assert_eq!(tolerance_for_zoom(0.0), 0.5);
        assert_eq!(tolerance_for_zoom(2.9), 0.5);
        assert_eq!(tolerance_for_zoom(3.0), 0.1);
        assert_eq!(tolerance_for_zoom(5.0), 0.05);
        assert_eq!(tolerance_for_zoom(6.5), 0.05);
        assert_eq!(tolerance_for_zoom(7.0), 0.01);
        assert_eq!(tolerance_for_zoom(7.5), 0.0);
        assert_eq!(tolerance_for_zoom(8.0), 0.005);
        assert_eq!(tolerance_for_zoom(8.5), 0.0);
        assert_eq!(tolerance_for_zoom(9.0), 0.001);
        assert_eq!(tolerance_for_zoom(11.9), 0.001);
        assert_eq!(tolerance_for_zoom(12.0), 0.0);
        assert_eq!(tolerance_for_zoom(12.5), 0.0001);
        assert_eq!(tolerance_for_zoom(17.0), 0.0);
        assert_eq!(tolerance_for_zoom(-0.5), 0.0);
        assert_eq!(tolerance_for_zoom(f64::NAN), 0.0);
    }

    #[test]
    fn test_tiny_input_passthrough() {
        for input in [pts(&[]), pts(&[(1.0, 1.0)]), pts(&[(0.0, 0.0), (0.0, 0.0)])] {
            assert_eq!(reduce(&input, 10.0, false), input);
            assert_eq!(reduce(&input, 0.0, true), input);
        }
    }

    #[test]
    fn test_near_collinear_edge_collapses() {
        // Bottom edge of a 10x10 square, zoom 7 tolerance
        let edge = pts(&[(0.0, 0.0), (2.5, 0.001), (5.0, -0.002), (7.5, 0.001), (10.0, 0.0)]);
        let reduced = reduce(&edge, tolerance_for_zoom(7.0), false);
        assert_eq!(reduced, pts(&[(0.0, 0.0), (10.0, 0.0)]));
    }

    #[test]
    fn test_corner_is_kept() {
        let ring = pts(&[(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (10.0, 5.0), (10.0, 10.0)]);
        let reduced = reduce(&ring, 0.01, true);
        assert_eq!(reduced, pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)]));
    }

    #[test]
    fn test_endpoints_preserved() {
        let ring = circle(360, 10.0);
        for tolerance in [0.0, 0.01, 0.5, 5.0, 100.0] {
            for high_quality in [false, true] {
                let reduced = reduce(&ring, tolerance, high_quality);
                assert_eq!(reduced.first(), ring.first());
                assert_eq!(reduced.last(), ring.last());
            }
        }
    }

    #[test]
    fn test_deterministic() {
        let ring = circle(500, 3.0);
        assert_eq!(reduce(&ring, 0.05, false), reduce(&ring, 0.05, false));
        assert_eq!(reduce(&ring, 0.05, true), reduce(&ring, 0.05, true));
    }

    #[test]
    fn test_monotonic_in_tolerance() {
        let ring = circle(360, 10.0);
        for high_quality in [false, true] {
            let lengths: Vec<usize> = [0.001, 0.01, 0.1, 1.0, 5.0]
                .iter()
                .map(|&t| reduce(&ring, t, high_quality).len())
                .collect();
            assert!(lengths.windows(2).all(|w| w[1] <= w[0]), "{lengths:?}");
            assert!(lengths[lengths.len() - 1] < lengths[0]);
        }
    }

    #[test]
    fn test_radial_pass_skips_close_points() {
        let line = pts(&[(0.0, 0.0), (0.01, 0.0), (0.02, 0.0), (1.0, 0.0), (1.0, 0.01)]);
        assert_eq!(radial_distance(&line, 0.1 * 0.1), pts(&[(0.0, 0.0), (1.0, 0.0), (1.0, 0.01)]));
    }

    #[test]
    fn test_radial_pass_no_duplicate_last() {
        let line = pts(&[(0.0, 0.0), (0.01, 0.0), (1.0, 0.0)]);
        assert_eq!(radial_distance(&line, 0.01), pts(&[(0.0, 0.0), (1.0, 0.0)]));
    }

    #[test]
    fn test_identical_points_degrade_gracefully() {
        let same = vec![Point::new(4.0, 4.0); 50];
        assert_eq!(reduce(&same, 0.5, false), vec![Point::new(4.0, 4.0)]);
        assert_eq!(reduce(&same, 0.5, true), vec![Point::new(4.0, 4.0); 2]);
    }

    #[test]
    fn test_zero_tolerance_drops_only_exact_collinear() {
        let line = pts(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.5), (4.0, 0.0)]);
        assert_eq!(reduce(&line, 0.0, false), pts(&[(0.0, 0.0), (2.0, 0.0), (3.0, 0.5), (4.0, 0.0)]));
    }

    #[test]
    fn test_segment_distance_clamps() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert_eq!(sq_seg_dist(Point::new(5.0, 3.0), a, b), 9.0);
        assert_eq!(sq_seg_dist(Point::new(-3.0, 4.0), a, b), 25.0);
        assert_eq!(sq_seg_dist(Point::new(13.0, 4.0), a, b), 25.0);
        assert_eq!(sq_seg_dist(Point::new(1.0, 1.0), a, a), 2.0);
    }

    #[test]
    fn test_reduce_polygon_applies_to_holes() {
        let polygon = Polygon::new(circle(360, 10.0)).with_holes(vec![circle(90, 2.0)]);
        let (outer, holes) = reduce_polygon(&polygon, 0.5, false);
        assert!(outer.len() < 360);
        assert_eq!(holes.len(), 1);
        assert!(holes[0].len() < 90);
    }
}
