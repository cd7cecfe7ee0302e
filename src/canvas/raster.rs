use glam::DVec2;

use super::surface::{BlendMode, Path, Rgba, ScreenRect, Surface};

/// Software RGBA surface.
///
/// Sampling is aliased: a pixel is covered when its centre `(x + 0.5, y + 0.5)` is
/// inside the shape. `save_layer` pushes a transparent buffer that `restore`
/// composites back with source-over.
pub struct RasterCanvas {
    width: usize,
    height: usize,
    /// Layer buffers, base surface at index 0
    layers: Vec<Vec<Rgba>>,
    clip: ScreenRect,
    stack: Vec<SavedState>,
}

struct SavedState {
    clip: ScreenRect,
    layer: bool,
}

impl RasterCanvas {
    /// Create a transparent canvas with the given pixel dimensions.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            layers: vec![vec![Rgba::TRANSPARENT; width * height]],
            clip: ScreenRect::from_size(width, height),
            stack: Vec::new(),
        }
    }

    /// Reset every pixel of the base surface and drop any open layers or clips
    pub fn clear(&mut self, color: Rgba) {
        self.layers.truncate(1);
        self.layers[0].fill(color);
        self.clip = ScreenRect::from_size(self.width, self.height);
        self.stack.clear();
    }

    /// Sample the base surface
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.layers[0][y * self.width + x])
    }

    /// One row of the base surface
    pub fn row(&self, y: usize) -> &[Rgba] {
        if y >= self.height {
            return &[];
        }
        &self.layers[0][y * self.width..(y + 1) * self.width]
    }

    /// Pixel index range whose centres fall in `[lo, hi)`, limited to `0..limit`
    #[inline(always)]
    fn span(lo: f64, hi: f64, limit: usize) -> (usize, usize) {
        let start = (lo - 0.5).ceil().max(0.0);
        let end = (hi - 0.5).ceil().min(limit as f64);
        if end <= start {
            return (0, 0);
        }
        (start as usize, end as usize)
    }

    #[inline(always)]
    fn put(&mut self, x: usize, y: usize, color: Rgba, blend: BlendMode) {
        let idx = y * self.width + x;
        if let Some(top) = self.layers.last_mut() {
            top[idx] = blend_pixel(top[idx], color, blend);
        }
    }

    /// Blend `color` into every pixel whose centre is inside the clip and within
    /// `half_width` of the segment `a`-`b` (butt ends).
    fn stroke_segment(&mut self, a: DVec2, b: DVec2, half_width: f64, color: Rgba) {
        let lo = a.min(b) - DVec2::splat(half_width);
        let hi = a.max(b) + DVec2::splat(half_width);
        let area = self.clip.intersect(&ScreenRect::new(lo, hi));
        let (x0, x1) = Self::span(area.min.x, area.max.x, self.width);
        let (y0, y1) = Self::span(area.min.y, area.max.y, self.height);

        let d = b - a;
        let len2 = d.length_squared();
        let max_d2 = half_width * half_width;

        for y in y0..y1 {
            for x in x0..x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let closest = if len2 == 0.0 {
                    a
                } else {
                    let t = (p - a).dot(d) / len2;
                    if !(0.0..=1.0).contains(&t) {
                        continue;
                    }
                    a + d * t
                };
                if closest.distance_squared(p) <= max_d2 {
                    self.put(x, y, color, BlendMode::SrcOver);
                }
            }
        }
    }
}

/// Composite one pixel, straight alpha in and out
#[inline(always)]
pub fn blend_pixel(dst: Rgba, src: Rgba, mode: BlendMode) -> Rgba {
    let sa = src.a as f64 / 255.0;
    let da = dst.a as f64 / 255.0;

    match mode {
        BlendMode::SrcOver => {
            let oa = sa + da * (1.0 - sa);
            if oa <= 0.0 {
                return Rgba::TRANSPARENT;
            }
            let mix = |s: u8, d: u8| ((s as f64 * sa + d as f64 * da * (1.0 - sa)) / oa).round() as u8;
            Rgba::new(
                mix(src.r, dst.r),
                mix(src.g, dst.g),
                mix(src.b, dst.b),
                (oa * 255.0).round() as u8,
            )
        }
        BlendMode::SrcOut => {
            let oa = sa * (1.0 - da);
            if oa <= 0.0 {
                return Rgba::TRANSPARENT;
            }
            Rgba::new(src.r, src.g, src.b, (oa * 255.0).round() as u8)
        }
    }
}

impl Surface for RasterCanvas {
    fn size(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn save(&mut self) {
        self.stack.push(SavedState {
            clip: self.clip,
            layer: false,
        });
    }

    fn save_layer(&mut self, bounds: ScreenRect) {
        self.stack.push(SavedState {
            clip: self.clip,
            layer: true,
        });
        self.clip = self.clip.intersect(&bounds);
        self.layers.push(vec![Rgba::TRANSPARENT; self.width * self.height]);
    }

    fn restore(&mut self) {
        let Some(state) = self.stack.pop() else {
            return;
        };
        self.clip = state.clip;

        if state.layer && self.layers.len() > 1 {
            let layer = self.layers.pop().unwrap_or_default();
            if let Some(parent) = self.layers.last_mut() {
                for (dst, src) in parent.iter_mut().zip(layer) {
                    if src.a > 0 {
                        *dst = blend_pixel(*dst, src, BlendMode::SrcOver);
                    }
                }
            }
        }
    }

    fn clip_rect(&mut self, rect: ScreenRect) {
        self.clip = self.clip.intersect(&rect);
    }

    fn fill_path(&mut self, path: &Path, color: Rgba, blend: BlendMode) {
        if path.is_empty() || self.clip.is_empty() {
            return;
        }

        let (mut min_y, mut max_y) = (f64::MAX, f64::MIN);
        for p in path.rings().iter().flatten() {
            min_y = min_y.min(p.y);
            max_y = max_y.max(p.y);
        }
        let (y0, y1) = Self::span(min_y.max(self.clip.min.y), max_y.min(self.clip.max.y), self.height);
        let (cx0, cx1) = Self::span(self.clip.min.x, self.clip.max.x, self.width);

        // (x, winding direction) for every edge crossing the scanline
        let mut crossings: Vec<(f64, i32)> = Vec::new();

        for y in y0..y1 {
            let cy = y as f64 + 0.5;
            crossings.clear();

            for ring in path.rings() {
                let n = ring.len();
                for i in 0..n {
                    let a = ring[i];
                    let b = ring[(i + 1) % n];
                    let dir = if a.y <= cy && b.y > cy {
                        1
                    } else if b.y <= cy && a.y > cy {
                        -1
                    } else {
                        continue;
                    };
                    let x = a.x + (cy - a.y) / (b.y - a.y) * (b.x - a.x);
                    crossings.push((x, dir));
                }
            }

            crossings.sort_by(|l, r| l.0.total_cmp(&r.0));

            let mut winding = 0;
            for pair in crossings.windows(2) {
                winding += pair[0].1;
                if winding == 0 {
                    continue;
                }
                let (sx0, sx1) = Self::span(pair[0].0, pair[1].0, self.width);
                for x in sx0.max(cx0)..sx1.min(cx1) {
                    self.put(x, y, color, blend);
                }
            }
        }
    }

    fn stroke_polyline(&mut self, points: &[DVec2], width: f64, color: Rgba) {
        let half_width = width.max(1.0) / 2.0;
        for pair in points.windows(2) {
            self.stroke_segment(pair[0], pair[1], half_width, color);
        }
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Rgba) {
        let r = radius.max(0.5);
        let area = self
            .clip
            .intersect(&ScreenRect::new(center - DVec2::splat(r), center + DVec2::splat(r)));
        let (x0, x1) = Self::span(area.min.x, area.max.x, self.width);
        let (y0, y1) = Self::span(area.min.y, area.max.y, self.height);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                if p.distance_squared(center) <= r * r {
                    self.put(x, y, color, BlendMode::SrcOver);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);
    const BLUE: Rgba = Rgba::rgb(0, 0, 255);

    fn square(min: f64, max: f64) -> Vec<DVec2> {
        vec![
            DVec2::new(min, min),
            DVec2::new(max, min),
            DVec2::new(max, max),
            DVec2::new(min, max),
        ]
    }

    #[test]
    fn test_fill_square() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.fill_path(&Path::from_ring(&square(2.0, 6.0)), RED, BlendMode::SrcOver);

        assert_eq!(canvas.pixel(2, 2), Some(RED));
        assert_eq!(canvas.pixel(5, 5), Some(RED));
        assert_eq!(canvas.pixel(6, 6), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(1, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_nonzero_winding_fills_overlap_once() {
        let mut canvas = RasterCanvas::new(10, 10);
        let mut path = Path::from_ring(&square(0.0, 6.0));
        path.add_ring(&square(3.0, 9.0));
        canvas.fill_path(&path, RED.with_opacity(0.5), BlendMode::SrcOver);

        // Overlap is covered by winding 2 but painted once
        assert_eq!(canvas.pixel(4, 4), canvas.pixel(1, 1));
        assert_eq!(canvas.pixel(8, 8), canvas.pixel(1, 1));
    }

    #[test]
    fn test_clip_limits_fill() {
        let mut canvas = RasterCanvas::new(10, 10);
        canvas.save();
        canvas.clip_rect(ScreenRect::new(DVec2::ZERO, DVec2::new(5.0, 10.0)));
        canvas.fill_path(&Path::from_ring(&square(0.0, 10.0)), RED, BlendMode::SrcOver);
        canvas.restore();

        assert_eq!(canvas.pixel(4, 4), Some(RED));
        assert_eq!(canvas.pixel(5, 4), Some(Rgba::TRANSPARENT));

        // Clip is popped with the save
        canvas.fill_path(&Path::from_ring(&square(0.0, 10.0)), BLUE, BlendMode::SrcOver);
        assert_eq!(canvas.pixel(9, 9), Some(BLUE));
    }

    #[test]
    fn test_src_out_inside_layer_cuts_hole() {
        let mut canvas = RasterCanvas::new(12, 12);
        canvas.clear(BLUE);

        canvas.save_layer(canvas.bounds());
        canvas.fill_path(&Path::from_ring(&square(4.0, 8.0)), Rgba::BLACK, BlendMode::SrcOver);
        canvas.fill_path(&Path::from_ring(&square(1.0, 11.0)), RED, BlendMode::SrcOut);
        canvas.restore();

        assert_eq!(canvas.pixel(6, 6), Some(BLUE));
        assert_eq!(canvas.pixel(2, 2), Some(RED));
        assert_eq!(canvas.pixel(0, 0), Some(BLUE));
    }

    #[test]
    fn test_layer_restore_composites_over_parent() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.clear(Rgba::WHITE);
        canvas.save_layer(canvas.bounds());
        canvas.fill_circle(DVec2::new(2.0, 2.0), 1.0, RED);

        // Nothing reaches the base before the layer is flattened
        assert_eq!(canvas.pixel(1, 1), Some(Rgba::WHITE));
        canvas.restore();
        assert_eq!(canvas.pixel(1, 1), Some(RED));
    }

    #[test]
    fn test_blend_src_over_half_alpha() {
        let out = blend_pixel(Rgba::WHITE, Rgba::BLACK.with_opacity(0.5), BlendMode::SrcOver);
        assert_eq!(out.a, 255);
        assert!((out.r as i32 - 127).abs() <= 1);
    }

    #[test]
    fn test_blend_src_out() {
        assert_eq!(blend_pixel(Rgba::BLACK, RED, BlendMode::SrcOut), Rgba::TRANSPARENT);
        assert_eq!(blend_pixel(Rgba::TRANSPARENT, RED, BlendMode::SrcOut), RED);
    }

    #[test]
    fn test_stroke_horizontal() {
        let mut canvas = RasterCanvas::new(10, 5);
        canvas.stroke_polyline(&[DVec2::new(1.0, 2.5), DVec2::new(8.0, 2.5)], 1.0, RED);

        assert_eq!(canvas.pixel(1, 2), Some(RED));
        assert_eq!(canvas.pixel(7, 2), Some(RED));
        assert_eq!(canvas.pixel(9, 2), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 0), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_circle() {
        let mut canvas = RasterCanvas::new(9, 9);
        canvas.fill_circle(DVec2::new(4.5, 4.5), 2.0, RED);

        assert_eq!(canvas.pixel(4, 4), Some(RED));
        assert_eq!(canvas.pixel(4, 2), Some(RED));
        assert_eq!(canvas.pixel(2, 2), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_out_of_bounds_is_ignored() {
        let mut canvas = RasterCanvas::new(4, 4);
        canvas.fill_circle(DVec2::new(-20.0, 50.0), 3.0, RED);
        canvas.stroke_polyline(&[DVec2::new(-5.0, -5.0), DVec2::new(-1.0, -9.0)], 2.0, RED);
        assert!(canvas.row(0).iter().all(|p| *p == Rgba::TRANSPARENT));
        assert_eq!(canvas.pixel(4, 0), None);
    }
}
