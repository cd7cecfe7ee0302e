use glam::DVec2;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::canvas::{BlendMode, Path, Rgba, ScreenRect, Surface};
use crate::geo::Point;
use crate::map::culling::{is_visible, precompute_all, CullIndex};
use crate::map::geometry::{centroid, closed_ring, dot_positions};
use crate::map::polygon::{Polygon, PolygonStyle};
use crate::map::projection::ScreenProjector;
use crate::map::simplify::{reduce_polygon, tolerance_for_zoom};

/// Paint used for hole masks inside the fill layer. Must be opaque so the
/// source-out fill leaves nothing behind in the holes.
const HOLE_MASK: Rgba = Rgba::BLACK;

/// Dot spacing as a multiple of the border width
const DOT_SPACING: f64 = 1.5;

/// Per-pass switches for the polygon pipeline
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Skip polygons whose bounding box is off screen
    pub culling: bool,
    /// Reduce vertices with the zoom-dependent tolerance
    pub simplify: bool,
    /// Skip the radial-distance pre-pass when simplifying
    pub high_quality: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            culling: true,
            simplify: true,
            high_quality: false,
        }
    }
}

/// Display settings for map layers
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show_fill: bool,
    pub show_borders: bool,
    pub show_labels: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_fill: true,
            show_borders: true,
            show_labels: true,
        }
    }
}

/// Counters for one render pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub total: usize,
    pub culled: usize,
    /// Visible but left with too few points to draw
    pub skipped: usize,
    pub drawn: usize,
    /// Source vertices of every polygon that passed culling
    pub vertices_in: usize,
    /// Projected vertices actually painted
    pub vertices_drawn: usize,
}

/// Polygon label and where to put it, in device pixels
#[derive(Clone, Debug, PartialEq)]
pub struct LabelAnchor {
    pub position: DVec2,
    pub text: String,
}

/// Output of one pass besides the pixels
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderedFrame {
    pub stats: FrameStats,
    pub labels: Vec<LabelAnchor>,
}

/// One polygon projected to device pixels. Only lives for a single render pass.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScreenPolygon {
    pub outer: Vec<DVec2>,
    pub holes: Vec<Vec<DVec2>>,
}

impl ScreenPolygon {
    pub fn clear(&mut self) {
        self.outer.clear();
        self.holes.clear();
    }

    /// Replace the contents with the projection of `outer` and `holes`
    pub fn project<P: ScreenProjector + ?Sized>(&mut self, outer: &[Point], holes: &[Vec<Point>], projector: &P) {
        self.clear();

        // Hoisted per ring: offset = project(p) * zoom_scale(zoom, zoom) - pixel_origin
        let zoom = projector.zoom();
        let scale = projector.zoom_scale(zoom, zoom);
        let origin = projector.pixel_origin();
        let offset = |p: &Point| projector.project(*p) * scale - origin;

        self.outer.extend(outer.iter().map(offset));
        for hole in holes {
            self.holes.push(hole.iter().map(offset).collect());
        }
    }

    /// An outer ring needs two points before there is anything to draw
    pub fn is_drawable(&self) -> bool {
        self.outer.len() >= 2
    }

    pub fn has_holes(&self) -> bool {
        self.holes.iter().any(|hole| !hole.is_empty())
    }

    pub fn vertex_count(&self) -> usize {
        self.outer.len() + self.holes.iter().map(Vec::len).sum::<usize>()
    }
}

/// Paint one projected polygon: fill (minus holes), then border.
///
/// Holes use an isolated layer: hole masks are painted first, then the outer ring
/// with source-out so the fill survives only where no hole was painted, then the
/// border; `restore` flattens the layer onto the surface.
pub fn paint_polygon(surface: &mut dyn Surface, screen: &ScreenPolygon, style: &PolygonStyle, settings: &DisplaySettings) {
    if !screen.is_drawable() {
        return;
    }

    let bounds = surface.bounds();
    let fill = settings.show_fill && style.fill.a > 0;

    if fill && screen.has_holes() {
        surface.save_layer(bounds);
        for hole in &screen.holes {
            if !hole.is_empty() {
                surface.fill_path(&Path::from_ring(hole), HOLE_MASK, BlendMode::SrcOver);
            }
        }
        surface.fill_path(&Path::from_ring(&screen.outer), style.fill, BlendMode::SrcOut);
        if settings.show_borders {
            paint_border(surface, screen, style);
        }
        surface.restore();
    } else {
        surface.save();
        surface.clip_rect(bounds);
        if fill {
            surface.fill_path(&Path::from_ring(&screen.outer), style.fill, BlendMode::SrcOver);
        }
        if settings.show_borders {
            paint_border(surface, screen, style);
        }
        surface.restore();
    }
}

/// Stroke the outer ring and, unless disabled, every hole ring.
///
/// Dotted rings are walked closed, so the terminal dot lands back on the first
/// vertex and that spot is painted twice. Dots are only placed where a disk of the
/// dot radius can touch the surface.
pub fn paint_border(surface: &mut dyn Surface, screen: &ScreenPolygon, style: &PolygonStyle) {
    if style.border_width <= 0.0 {
        return;
    }

    let holes: &[Vec<DVec2>] = if style.disable_holes_border { &[] } else { &screen.holes };
    let radius = style.border_width / 2.0;
    let dot_area = surface.bounds().expand(radius);

    for ring in std::iter::once(&screen.outer).chain(holes) {
        if ring.len() < 2 {
            continue;
        }
        let closed = closed_ring(ring);

        if style.dotted {
            for dot in dot_positions(&closed, style.border_width * DOT_SPACING, &dot_area) {
                surface.fill_circle(dot, radius, style.border_color);
            }
        } else {
            surface.stroke_polyline(&closed, style.border_width, style.border_color);
            // Round joins
            for &vertex in ring {
                surface.fill_circle(vertex, radius, style.border_color);
            }
        }
    }
}

/// Centroid of the outer ring, if it lands on the surface
pub fn label_anchor(screen: &ScreenPolygon, bounds: &ScreenRect) -> Option<DVec2> {
    centroid(&screen.outer).filter(|c| bounds.contains(*c))
}

/// Polygon set plus everything needed to draw it each frame
pub struct PolygonLayer {
    polygons: Vec<Polygon>,
    options: RenderOptions,
    pub settings: DisplaySettings,
    /// Built the first time culling is on
    index: Option<CullIndex>,
}

impl PolygonLayer {
    pub fn new(polygons: Vec<Polygon>, options: RenderOptions) -> Self {
        let mut layer = Self {
            polygons,
            options,
            settings: DisplaySettings::default(),
            index: None,
        };
        if options.culling {
            layer.build_index();
        }
        layer
    }

    fn build_index(&mut self) {
        precompute_all(&self.polygons);
        let index = CullIndex::build(&self.polygons, CullIndex::DEFAULT_CELL_SIZE);
        debug!(
            polygons = self.polygons.len(),
            cells = index.cell_count(),
            "built culling index"
        );
        self.index = Some(index);
    }

    /// Add polygons; the culling index is rebuilt if culling is on
    pub fn extend(&mut self, polygons: impl IntoIterator<Item = Polygon>) {
        self.polygons.extend(polygons);
        self.index = None;
        if self.options.culling {
            self.build_index();
        }
    }

    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    pub fn options(&self) -> RenderOptions {
        self.options
    }

    /// Turning culling on computes bounding boxes the first time only
    pub fn set_culling(&mut self, enabled: bool) {
        self.options.culling = enabled;
        if enabled && self.index.is_none() {
            self.build_index();
        }
    }

    pub fn toggle_culling(&mut self) {
        self.set_culling(!self.options.culling);
        debug!(culling = self.options.culling, "toggled culling");
    }

    pub fn toggle_simplify(&mut self) {
        self.options.simplify = !self.options.simplify;
        debug!(simplify = self.options.simplify, "toggled simplification");
    }

    pub fn toggle_high_quality(&mut self) {
        self.options.high_quality = !self.options.high_quality;
        debug!(high_quality = self.options.high_quality, "toggled high quality");
    }

    pub fn toggle_fill(&mut self) {
        self.settings.show_fill = !self.settings.show_fill;
    }

    pub fn toggle_borders(&mut self) {
        self.settings.show_borders = !self.settings.show_borders;
    }

    pub fn toggle_labels(&mut self) {
        self.settings.show_labels = !self.settings.show_labels;
    }

    /// Run one pass: cull, simplify, project and paint every polygon in order
    pub fn render<P: ScreenProjector + ?Sized>(&self, surface: &mut dyn Surface, projector: &P) -> RenderedFrame {
        let mut frame = RenderedFrame::default();
        let stats = &mut frame.stats;
        stats.total = self.polygons.len();

        let view = projector.viewport_bounds();
        let surface_bounds = surface.bounds();
        let tolerance = tolerance_for_zoom(projector.zoom());

        let mut candidates = Vec::new();
        match (&self.index, self.options.culling) {
            (Some(index), true) => index.query(&view, &mut candidates),
            _ => candidates.extend(0..self.polygons.len()),
        }
        stats.culled = self.polygons.len() - candidates.len();

        // Owned by this pass, refilled for every polygon
        let mut screen = ScreenPolygon::default();

        for &idx in &candidates {
            let polygon = &self.polygons[idx];

            if self.options.culling {
                match polygon.bounds() {
                    Some(bbox) if is_visible(&bbox, &view) => {}
                    _ => {
                        stats.culled += 1;
                        continue;
                    }
                }
            }

            stats.vertices_in += polygon.vertex_count();

            if self.options.simplify {
                let (outer, holes) = reduce_polygon(polygon, tolerance, self.options.high_quality);
                screen.project(&outer, &holes, projector);
            } else {
                screen.project(polygon.points(), polygon.holes(), projector);
            }

            if !screen.is_drawable() {
                stats.skipped += 1;
                continue;
            }

            stats.drawn += 1;
            stats.vertices_drawn += screen.vertex_count();
            paint_polygon(surface, &screen, &polygon.style, &self.settings);

            if self.settings.show_labels {
                if let Some(text) = &polygon.label {
                    if let Some(position) = label_anchor(&screen, &surface_bounds) {
                        frame.labels.push(LabelAnchor {
                            position,
                            text: text.clone(),
                        });
                    }
                }
            }
        }

        trace!(
            total = frame.stats.total,
            culled = frame.stats.culled,
            drawn = frame.stats.drawn,
            vertices = frame.stats.vertices_drawn,
            tolerance,
            "rendered polygon layer"
        );

        frame
    }
}

impl Default for PolygonLayer {
    fn default() -> Self {
        Self::new(Vec::new(), RenderOptions::default())
    }
}
