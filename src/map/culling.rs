use std::collections::HashMap;

use rayon::prelude::*;

use crate::geo::BoundingBox;
use crate::map::polygon::Polygon;

/// Bounding box of the polygon's outer ring, computed once and cached on the polygon
#[inline]
pub fn precompute_bounds(polygon: &Polygon) -> Option<BoundingBox> {
    polygon.bounds()
}

/// Compute bounds for a whole polygon set up front
pub fn precompute_all(polygons: &[Polygon]) {
    polygons.par_iter().for_each(|polygon| {
        precompute_bounds(polygon);
    });
}

/// A polygon is visible when its box overlaps the viewport on both axes (inclusive)
#[inline(always)]
pub fn is_visible(bbox: &BoundingBox, viewport: &BoundingBox) -> bool {
    bbox.overlaps(viewport)
}

/// Uniform grid over polygon bounding boxes.
///
/// Each polygon is indexed into every cell its box overlaps, so a query never misses
/// a polygon whose box touches the queried area. Boxes spanning more than
/// `MAX_CELLS_PER_POLYGON` cells (e.g. rings in projected metres) are kept on a
/// list returned by every query instead. It can return extra candidates;
/// `is_visible` settles those.
pub struct CullIndex {
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Polygons too large for the grid, candidates for every query
    oversized: Vec<usize>,
    cell_size: f64,
    /// Occupied cell range, used to clamp queries
    min_cell: (i32, i32),
    max_cell: (i32, i32),
}

impl CullIndex {
    /// Cell size in degrees
    pub const DEFAULT_CELL_SIZE: f64 = 10.0;
    /// The whole lon/lat world at the default cell size
    pub const MAX_CELLS_PER_POLYGON: i64 = 36 * 18;

    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            oversized: Vec::new(),
            cell_size,
            min_cell: (i32::MAX, i32::MAX),
            max_cell: (i32::MIN, i32::MIN),
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = (lon / self.cell_size).floor() as i32;
        let y = (lat / self.cell_size).floor() as i32;
        (x, y)
    }

    /// Index every polygon by its bounds. Polygons without bounds (empty rings) are
    /// left out and can never be returned.
    pub fn build(polygons: &[Polygon], cell_size: f64) -> Self {
        let mut index = Self::new(cell_size);

        for (idx, polygon) in polygons.iter().enumerate() {
            let Some(bbox) = precompute_bounds(polygon) else {
                continue;
            };
            let min = index.to_cell(bbox.min_lon, bbox.min_lat);
            let max = index.to_cell(bbox.max_lon, bbox.max_lat);

            let span = (max.0 as i64 - min.0 as i64 + 1) * (max.1 as i64 - min.1 as i64 + 1);
            if span > Self::MAX_CELLS_PER_POLYGON {
                index.oversized.push(idx);
                continue;
            }

            index.min_cell = (index.min_cell.0.min(min.0), index.min_cell.1.min(min.1));
            index.max_cell = (index.max_cell.0.max(max.0), index.max_cell.1.max(max.1));

            for y in min.1..=max.1 {
                for x in min.0..=max.0 {
                    index.cells.entry((x, y)).or_default().push(idx);
                }
            }
        }

        index
    }

    /// Candidate polygon indices for an area, sorted and without duplicates
    pub fn query(&self, area: &BoundingBox, results: &mut Vec<usize>) {
        results.clear();
        results.extend_from_slice(&self.oversized);
        if self.cells.is_empty() {
            return;
        }

        let min = self.to_cell(area.min_lon, area.min_lat);
        let max = self.to_cell(area.max_lon, area.max_lat);

        for y in min.1.max(self.min_cell.1)..=max.1.min(self.max_cell.1) {
            for x in min.0.max(self.min_cell.0)..=max.0.min(self.max_cell.0) {
                if let Some(indices) = self.cells.get(&(x, y)) {
                    results.extend_from_slice(indices);
                }
            }
        }

        results.sort_unstable();
        results.dedup();
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn oversized_count(&self) -> usize {
        self.oversized.len()
    }
}
