use glam::DVec2;

/// Straight (non-premultiplied) RGBA colour
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Same colour with alpha scaled by `opacity` (clamped to 0..=1)
    pub fn with_opacity(self, opacity: f64) -> Self {
        let a = (self.a as f64 * opacity.clamp(0.0, 1.0)).round() as u8;
        Self { a, ..self }
    }

    /// Parse `#rgb` or `#rrggbb` (leading `#` optional)
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok();
        let byte = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();

        match hex.len() {
            3 => Some(Self::rgb(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 => Some(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            _ => None,
        }
    }
}

/// How a fill combines with what is already on the surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Source painted over destination
    #[default]
    SrcOver,
    /// Source kept only where the destination is transparent; destination discarded
    /// inside the covered area
    SrcOut,
}

/// Axis-aligned rectangle in device pixels
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenRect {
    pub min: DVec2,
    pub max: DVec2,
}

impl ScreenRect {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Rect covering a `width` x `height` surface
    pub fn from_size(width: usize, height: usize) -> Self {
        Self::new(DVec2::ZERO, DVec2::new(width as f64, height as f64))
    }

    pub fn intersect(&self, other: &ScreenRect) -> ScreenRect {
        ScreenRect::new(self.min.max(other.min), self.max.min(other.max))
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x < self.max.x && p.y >= self.min.y && p.y < self.max.y
    }

    pub fn is_empty(&self) -> bool {
        self.max.x <= self.min.x || self.max.y <= self.min.y
    }

    /// Grow by `margin` on every side
    pub fn expand(&self, margin: f64) -> ScreenRect {
        ScreenRect::new(self.min - DVec2::splat(margin), self.max + DVec2::splat(margin))
    }
}

/// A set of closed sub-paths, filled with the non-zero winding rule
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    rings: Vec<Vec<DVec2>>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path made of a single closed ring
    pub fn from_ring(points: &[DVec2]) -> Self {
        let mut path = Self::new();
        path.add_ring(points);
        path
    }

    /// Append a closed sub-path. Rings with fewer than two points enclose nothing and
    /// are dropped.
    pub fn add_ring(&mut self, points: &[DVec2]) {
        if points.len() >= 2 {
            self.rings.push(points.to_vec());
        }
    }

    pub fn rings(&self) -> &[Vec<DVec2>] {
        &self.rings
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }
}

/// 2D drawing surface the polygon renderer paints onto
pub trait Surface {
    /// Surface size in device pixels
    fn size(&self) -> (usize, usize);

    /// Push the current clip
    fn save(&mut self);

    /// Push the current clip and start an isolated layer bounded by `bounds`.
    /// The matching `restore` flattens the layer onto its parent.
    fn save_layer(&mut self, bounds: ScreenRect);

    /// Pop the last `save` / `save_layer`
    fn restore(&mut self);

    /// Intersect the current clip with `rect`
    fn clip_rect(&mut self, rect: ScreenRect);

    fn fill_path(&mut self, path: &Path, color: Rgba, blend: BlendMode);

    /// Stroke connected segments between consecutive points
    fn stroke_polyline(&mut self, points: &[DVec2], width: f64, color: Rgba);

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba);

    fn bounds(&self) -> ScreenRect {
        let (w, h) = self.size();
        ScreenRect::from_size(w, h)
    }
}

/// One recorded surface operation
#[derive(Clone, Debug, PartialEq)]
pub enum DrawCommand {
    Save,
    SaveLayer(ScreenRect),
    Restore,
    ClipRect(ScreenRect),
    FillPath {
        path: Path,
        color: Rgba,
        blend: BlendMode,
    },
    StrokePolyline {
        points: Vec<DVec2>,
        width: f64,
        color: Rgba,
    },
    FillCircle {
        center: DVec2,
        radius: f64,
        color: Rgba,
    },
}

impl DrawCommand {
    /// Replay this command onto a surface
    pub fn apply(&self, surface: &mut dyn Surface) {
        match self {
            DrawCommand::Save => surface.save(),
            DrawCommand::SaveLayer(bounds) => surface.save_layer(*bounds),
            DrawCommand::Restore => surface.restore(),
            DrawCommand::ClipRect(rect) => surface.clip_rect(*rect),
            DrawCommand::FillPath { path, color, blend } => surface.fill_path(path, *color, *blend),
            DrawCommand::StrokePolyline { points, width, color } => {
                surface.stroke_polyline(points, *width, *color)
            }
            DrawCommand::FillCircle { center, radius, color } => {
                surface.fill_circle(*center, *radius, *color)
            }
        }
    }
}

/// Surface that records commands instead of drawing them
#[derive(Clone, Debug)]
pub struct CommandList {
    width: usize,
    height: usize,
    commands: Vec<DrawCommand>,
}

impl CommandList {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    /// Replay every recorded command onto another surface
    pub fn replay(&self, surface: &mut dyn Surface) {
        for command in &self.commands {
            command.apply(surface);
        }
    }
}

impl Surface for CommandList {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn save_layer(&mut self, bounds: ScreenRect) {
        self.commands.push(DrawCommand::SaveLayer(bounds));
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn clip_rect(&mut self, rect: ScreenRect) {
        self.commands.push(DrawCommand::ClipRect(rect));
    }

    fn fill_path(&mut self, path: &Path, color: Rgba, blend: BlendMode) {
        self.commands.push(DrawCommand::FillPath {
            path: path.clone(),
            color,
            blend,
        });
    }

    fn stroke_polyline(&mut self, points: &[DVec2], width: f64, color: Rgba) {
        self.commands.push(DrawCommand::StrokePolyline {
            points: points.to_vec(),
            width,
            color,
        });
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        self.commands.push(DrawCommand::FillCircle { center, radius, color });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_colors() {
        assert_eq!(Rgba::from_hex("#ff8000"), Some(Rgba::rgb(255, 128, 0)));
        assert_eq!(Rgba::from_hex("0f0"), Some(Rgba::rgb(0, 255, 0)));
        assert_eq!(Rgba::from_hex("#12345"), None);
        assert_eq!(Rgba::from_hex("#gg0000"), None);
    }

    #[test]
    fn test_opacity() {
        assert_eq!(Rgba::WHITE.with_opacity(0.5).a, 128);
        assert_eq!(Rgba::WHITE.with_opacity(3.0).a, 255);
    }

    #[test]
    fn test_path_drops_degenerate_rings() {
        let mut path = Path::new();
        path.add_ring(&[DVec2::ZERO]);
        assert!(path.is_empty());
        path.add_ring(&[DVec2::ZERO, DVec2::ONE, DVec2::X]);
        assert_eq!(path.rings().len(), 1);
    }

    #[test]
    fn test_rect_intersection() {
        let a = ScreenRect::from_size(10, 10);
        let b = ScreenRect::new(DVec2::new(5.0, -5.0), DVec2::new(20.0, 5.0));
        let c = a.intersect(&b);
        assert_eq!(c, ScreenRect::new(DVec2::new(5.0, 0.0), DVec2::new(10.0, 5.0)));
        assert!(!c.is_empty());
        assert!(ScreenRect::new(DVec2::ONE, DVec2::ONE).is_empty());
        assert_eq!(
            a.expand(2.0),
            ScreenRect::new(DVec2::splat(-2.0), DVec2::splat(12.0))
        );
    }

    #[test]
    fn test_record_and_replay() {
        let mut list = CommandList::new(4, 4);
        list.save();
        list.fill_circle(DVec2::new(2.0, 2.0), 1.0, Rgba::WHITE);
        list.restore();
        assert_eq!(list.commands().len(), 3);

        let mut copy = CommandList::new(4, 4);
        list.replay(&mut copy);
        assert_eq!(copy.commands(), list.commands());
    }
}
