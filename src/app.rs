use tui_polymap::config::ViewConfig;
use tui_polymap::map::{PolygonLayer, Viewport};

/// Map pixels per terminal cell: half blocks split each cell vertically
pub const CELL_PIXELS_X: usize = 1;
pub const CELL_PIXELS_Y: usize = 2;

/// Application state
pub struct App {
    pub viewport: Viewport,
    pub layer: PolygonLayer,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Current mouse position for cursor marker
    pub mouse_pos: Option<(u16, u16)>,
    /// View restored by reset
    home: ViewConfig,
}

impl App {
    pub fn new(width: usize, height: usize, layer: PolygonLayer, home: ViewConfig) -> Self {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);

        Self {
            viewport: Viewport::new(home.center_lon, home.center_lat, home.zoom, pixel_width, pixel_height),
            layer,
            should_quit: false,
            last_mouse: None,
            mouse_pos: None,
            home,
        }
    }

    /// Map size in pixels for a terminal size.
    /// Border takes 2 columns and 2 rows, the status bar 1 row.
    fn map_pixels(width: usize, height: usize) -> (usize, usize) {
        let inner_width = width.saturating_sub(2);
        let inner_height = height.saturating_sub(3);
        (inner_width * CELL_PIXELS_X, inner_height * CELL_PIXELS_Y)
    }

    /// Terminal cell to map pixel, accounting for the 1 cell border
    fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
        let px = col.saturating_sub(1) as i32 * CELL_PIXELS_X as i32;
        let py = row.saturating_sub(1) as i32 * CELL_PIXELS_Y as i32;
        (px, py)
    }

    /// Update viewport size when terminal resizes
    pub fn resize(&mut self, width: usize, height: usize) {
        let (pixel_width, pixel_height) = Self::map_pixels(width, height);
        self.viewport.width = pixel_width;
        self.viewport.height = pixel_height;
    }

    /// Pan the map by terminal cells
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport
            .pan(dx * CELL_PIXELS_X as i32, dy * CELL_PIXELS_Y as i32);
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_in_at(px, py);
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16) {
        let (px, py) = Self::cell_to_pixel(col, row);
        self.viewport.zoom_out_at(px, py);
    }

    /// Back to the configured starting view; toggles are left alone
    pub fn reset_view(&mut self) {
        self.viewport = Viewport::new(
            self.home.center_lon,
            self.home.center_lat,
            self.home.zoom,
            self.viewport.width,
            self.viewport.height,
        );
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.2}°{}, {:.2}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }

    /// Drag the map so it follows the cursor
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            self.pan(dx, dy);
        }
        self.last_mouse = Some((x, y));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }
}
