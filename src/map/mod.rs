pub mod culling;
pub mod geometry;
pub mod polygon;
pub mod projection;
pub mod renderer;
pub mod simplify;

pub use polygon::{Polygon, PolygonStyle};
pub use projection::{ScreenProjector, Viewport};
pub use renderer::{DisplaySettings, FrameStats, LabelAnchor, PolygonLayer, RenderOptions, RenderedFrame};
