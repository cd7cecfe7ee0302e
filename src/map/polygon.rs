use std::sync::OnceLock;

use crate::canvas::Rgba;
use crate::geo::{BoundingBox, Point};

/// Paint settings for one polygon
#[derive(Clone, Debug, PartialEq)]
pub struct PolygonStyle {
    pub fill: Rgba,
    /// Border width in device pixels; 0 disables the border
    pub border_width: f64,
    pub border_color: Rgba,
    /// Draw the border as a row of dots instead of a line
    pub dotted: bool,
    /// Stroke only the outer ring, never the holes
    pub disable_holes_border: bool,
}

impl Default for PolygonStyle {
    fn default() -> Self {
        Self {
            fill: Rgba::new(0, 150, 170, 160),
            border_width: 1.0,
            border_color: Rgba::rgb(0, 220, 240),
            dotted: false,
            disable_holes_border: false,
        }
    }
}

/// A geographic polygon with optional holes.
///
/// The outer ring is treated as closed; the closing vertex need not be repeated.
/// Holes are expected to lie inside the outer ring, which is not checked.
/// Vertices cannot change after construction, so the bounding box is computed at
/// most once, the first time something asks for it.
#[derive(Clone, Debug)]
pub struct Polygon {
    points: Vec<Point>,
    holes: Vec<Vec<Point>>,
    pub style: PolygonStyle,
    pub label: Option<String>,
    bounds: OnceLock<Option<BoundingBox>>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            holes: Vec::new(),
            style: PolygonStyle::default(),
            label: None,
            bounds: OnceLock::new(),
        }
    }

    pub fn with_holes(mut self, holes: Vec<Vec<Point>>) -> Self {
        self.holes = holes;
        self
    }

    pub fn with_style(mut self, style: PolygonStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Outer ring
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn holes(&self) -> &[Vec<Point>] {
        &self.holes
    }

    /// Bounds of the outer ring (holes never matter for visibility).
    /// `None` for an empty ring.
    pub fn bounds(&self) -> Option<BoundingBox> {
        *self.bounds.get_or_init(|| BoundingBox::from_points(&self.points))
    }

    /// Whether the bounding box has been computed yet
    pub fn has_bounds(&self) -> bool {
        self.bounds.get().is_some()
    }

    /// Vertices over all rings
    pub fn vertex_count(&self) -> usize {
        self.points.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 10.0),
            Point::new(0.0, 10.0),
        ]
    }

    #[test]
    fn test_bounds_are_lazy() {
        let polygon = Polygon::new(square());
        assert!(!polygon.has_bounds());
        assert_eq!(polygon.bounds(), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        assert!(polygon.has_bounds());
    }

    #[test]
    fn test_bounds_ignore_holes() {
        let hole = vec![Point::new(2.0, 2.0), Point::new(30.0, 2.0), Point::new(2.0, 30.0)];
        let polygon = Polygon::new(square()).with_holes(vec![hole]);
        assert_eq!(polygon.bounds(), Some(BoundingBox::new(0.0, 0.0, 10.0, 10.0)));
        assert_eq!(polygon.vertex_count(), 7);
    }

    #[test]
    fn test_empty_ring_has_no_bounds() {
        let polygon = Polygon::new(Vec::new());
        assert_eq!(polygon.bounds(), None);
        assert!(polygon.has_bounds());
    }
}
