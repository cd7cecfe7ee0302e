use std::f64::consts::PI;

use glam::DVec2;

use crate::geo::{BoundingBox, Point};

/// Web Mercator stops being finite at the poles
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_6;
/// Tile size in pixels at zoom 0
pub const TILE_SIZE: f64 = 256.0;
pub const MIN_ZOOM: f64 = 0.0;
pub const MAX_ZOOM: f64 = 19.0;

/// What the polygon pipeline needs from the map view.
///
/// `project` returns world pixel coordinates at the current zoom; the screen offset
/// of a vertex is `project(p) * zoom_scale(zoom, zoom) - pixel_origin`.
pub trait ScreenProjector {
    fn project(&self, point: Point) -> DVec2;

    fn zoom(&self) -> f64;

    /// World pixel of the viewport's top-left corner
    fn pixel_origin(&self) -> DVec2;

    /// Scale factor going from zoom `from` to zoom `to`
    fn zoom_scale(&self, to: f64, from: f64) -> f64;

    /// Geographic area currently on screen
    fn viewport_bounds(&self) -> BoundingBox;

    /// Device-pixel offset of a point for the current view state
    #[inline]
    fn screen_offset(&self, point: Point) -> DVec2 {
        let zoom = self.zoom();
        self.project(point) * self.zoom_scale(zoom, zoom) - self.pixel_origin()
    }
}

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level; world width is `256 * 2^zoom` pixels
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 20.0, 1.0, width, height)
    }

    /// World size in pixels at `zoom`
    #[inline(always)]
    fn scale(zoom: f64) -> f64 {
        TILE_SIZE * zoom.exp2()
    }

    /// Spherical Mercator, normalized to 0..1 on both axes
    #[inline(always)]
    fn mercator(lon: f64, lat: f64) -> DVec2 {
        let lat_rad = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        let x = (lon + 180.0) / 360.0;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        DVec2::new(x, y)
    }

    fn half_size(&self) -> DVec2 {
        DVec2::new(self.width as f64, self.height as f64) / 2.0
    }

    /// Convert a world pixel at the current zoom back to lon/lat
    pub fn unproject_world(&self, world: DVec2) -> Point {
        let n = world / Self::scale(self.zoom);
        let lon = n.x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * n.y)).sinh().atan().to_degrees();
        Point::new(lon, lat)
    }

    /// Unproject screen pixel coordinates back to geographic coordinates
    pub fn unproject(&self, px: i32, py: i32) -> Point {
        self.unproject_world(self.pixel_origin() + DVec2::new(px as f64, py as f64))
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let center = self.project(Point::new(self.center_lon, self.center_lat));
        let moved = self.unproject_world(center + DVec2::new(dx as f64, dy as f64));
        self.center_lon = moved.lon;
        self.center_lat = moved.lat;

        // Wrap longitude
        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        // Clamp latitude
        self.center_lat = self.center_lat.clamp(-85.0, 85.0);
    }

    /// Zoom in by one level
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(MAX_ZOOM);
    }

    /// Zoom out by one level
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    /// Change zoom by `delta` levels keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let anchor = self.unproject(px, py);

        let new_zoom = (self.zoom + delta).clamp(MIN_ZOOM, MAX_ZOOM);
        if new_zoom == self.zoom {
            return;
        }
        self.zoom = new_zoom;

        // Where the anchor lands now, and how far it drifted from the cursor
        let offset = self.screen_offset(anchor);
        let dx = (offset.x - px as f64).round() as i32;
        let dy = (offset.y - py as f64).round() as i32;

        self.pan(dx, dy);
    }
}

impl ScreenProjector for Viewport {
    #[inline]
    fn project(&self, point: Point) -> DVec2 {
        Self::mercator(point.lon, point.lat) * Self::scale(self.zoom)
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn pixel_origin(&self) -> DVec2 {
        (self.project(Point::new(self.center_lon, self.center_lat)) - self.half_size()).round()
    }

    fn zoom_scale(&self, to: f64, from: f64) -> f64 {
        Self::scale(to) / Self::scale(from)
    }

    fn viewport_bounds(&self) -> BoundingBox {
        let origin = self.pixel_origin();
        let top_left = self.unproject_world(origin);
        let bottom_right =
            self.unproject_world(origin + DVec2::new(self.width as f64, self.height as f64));
        BoundingBox::new(top_left.lon, bottom_right.lat, bottom_right.lon, top_left.lat)
    }
}
