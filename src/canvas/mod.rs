mod raster;
mod surface;

pub use raster::{blend_pixel, RasterCanvas};
pub use surface::{BlendMode, CommandList, DrawCommand, Path, Rgba, ScreenRect, Surface};
