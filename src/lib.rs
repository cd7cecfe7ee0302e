//! Terminal map viewer for filled geographic polygons.
//!
//! Each redraw runs the polygon pipeline in [`map::PolygonLayer::render`]: cull by
//! bounding box, simplify for the zoom level, project to device pixels, then paint
//! fill and border onto a [`canvas::Surface`].

pub mod canvas;
pub mod config;
pub mod data;
pub mod geo;
pub mod map;
