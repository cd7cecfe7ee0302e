use glam::DVec2;

use crate::canvas::ScreenRect;

/// Dot centres along an open polyline, `spacing` apart in arc length.
///
/// The distance still owed to the next dot carries over from one segment to the
/// next, so spacing stays even around corners. Only dots inside `area` are
/// produced; stretches outside it advance the phase without placing dots. A
/// final dot always lands on the last point, however close it is to the previous one.
pub fn dot_positions(points: &[DVec2], spacing: f64, area: &ScreenRect) -> Vec<DVec2> {
    let mut dots = Vec::new();
    let Some(&last) = points.last() else {
        return dots;
    };

    if spacing > 0.0 {
        let mut start = 0.0;
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            let length = a.distance(b);

            if length > 0.0 {
                if let Some((t0, t1)) = clip_segment(a, b, area) {
                    let (lo, hi) = (t0 * length, t1 * length);
                    // Jump to the first dot at or after the visible stretch
                    let skipped = ((lo - start) / spacing).ceil().max(0.0);
                    let mut distance = start + skipped * spacing;
                    while distance < length && distance <= hi {
                        dots.push(a.lerp(b, distance / length));
                        distance += spacing;
                    }
                }
            }

            start = if start >= length {
                start - length
            } else {
                (start - length).rem_euclid(spacing)
            };
        }
    }

    dots.push(last);
    dots
}

/// Parameter range `[t0, t1]` of the segment `a`-`b` inside `area` (Liang-Barsky)
fn clip_segment(a: DVec2, b: DVec2, area: &ScreenRect) -> Option<(f64, f64)> {
    let d = b - a;
    let checks = [
        (-d.x, a.x - area.min.x),
        (d.x, area.max.x - a.x),
        (-d.y, a.y - area.min.y),
        (d.y, area.max.y - a.y),
    ];

    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    for (p, q) in checks {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    (t0 <= t1).then_some((t0, t1))
}

/// Ring with its first point appended, so consecutive pairs cover every edge
pub fn closed_ring(points: &[DVec2]) -> Vec<DVec2> {
    let mut ring = Vec::with_capacity(points.len() + 1);
    ring.extend_from_slice(points);
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last {
            ring.push(first);
        }
    }
    ring
}

/// Area-weighted centroid of a ring (shoelace). Falls back to the vertex mean when
/// the ring encloses no area.
pub fn centroid(points: &[DVec2]) -> Option<DVec2> {
    if points.is_empty() {
        return None;
    }

    let mut area = 0.0;
    let mut sum = DVec2::ZERO;
    let n = points.len();
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let cross = a.perp_dot(b);
        area += cross;
        sum += (a + b) * cross;
    }

    if area.abs() < 1e-9 {
        let mean = points.iter().copied().sum::<DVec2>() / n as f64;
        return Some(mean);
    }

    Some(sum / (3.0 * area))
}
