use std::f64::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use geojson::{GeoJson, Geometry, JsonObject, LineStringType, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::canvas::Rgba;
use crate::geo::Point;
use crate::map::{Polygon, PolygonStyle};

/// simplestyle default when only `fill` is given
const DEFAULT_FILL_OPACITY: f64 = 0.6;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid GeoJSON: {0}")]
    Json(#[from] simd_json::Error),
}

/// Load every `*.geojson` / `*.json` file in `data_dir`, in file name order.
///
/// Files that fail to parse are logged and skipped.
pub fn load_all_geojson(data_dir: &Path) -> Result<Vec<Polygon>, DataError> {
    let entries = fs::read_dir(data_dir).map_err(|source| DataError::Io {
        path: data_dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.is_file()
                && matches!(
                    path.extension().and_then(|ext| ext.to_str()),
                    Some("geojson") | Some("json")
                )
        })
        .collect();
    files.sort();

    let mut polygons = Vec::new();
    for path in &files {
        match load_geojson_file(path) {
            Ok(loaded) => {
                debug!(path = %path.display(), polygons = loaded.len(), "loaded file");
                polygons.extend(loaded);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "failed to load"),
        }
    }

    info!(
        files = files.len(),
        polygons = polygons.len(),
        dir = %data_dir.display(),
        "loaded polygon data"
    );
    Ok(polygons)
}

/// Parse one GeoJSON file into polygons
pub fn load_geojson_file(path: &Path) -> Result<Vec<Polygon>, DataError> {
    let mut bytes = fs::read(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_geojson(&mut bytes)
}

/// Parse GeoJSON bytes (the buffer is used as scratch space by the parser)
pub fn parse_geojson(bytes: &mut [u8]) -> Result<Vec<Polygon>, DataError> {
    let geojson: GeoJson = simd_json::serde::from_slice(bytes)?;
    let mut polygons = Vec::new();

    match &geojson {
        GeoJson::FeatureCollection(fc) => {
            for feature in &fc.features {
                if let Some(ref geometry) = feature.geometry {
                    collect_polygons(geometry, feature.properties.as_ref(), &mut polygons);
                }
            }
        }
        GeoJson::Feature(f) => {
            if let Some(ref geometry) = f.geometry {
                collect_polygons(geometry, f.properties.as_ref(), &mut polygons);
            }
        }
        GeoJson::Geometry(geometry) => collect_polygons(geometry, None, &mut polygons),
    }

    Ok(polygons)
}

fn collect_polygons(geometry: &Geometry, props: Option<&JsonObject>, out: &mut Vec<Polygon>) {
    match &geometry.value {
        Value::Polygon(rings) => out.extend(polygon_from_rings(rings, props)),
        // One record per member polygon, all sharing the feature's style
        Value::MultiPolygon(polygons) => {
            for rings in polygons {
                out.extend(polygon_from_rings(rings, props));
            }
        }
        Value::GeometryCollection(geometries) => {
            for g in geometries {
                collect_polygons(g, props, out);
            }
        }
        _ => {}
    }
}

fn polygon_from_rings(rings: &[LineStringType], props: Option<&JsonObject>) -> Option<Polygon> {
    let (exterior, interiors) = rings.split_first()?;
    let to_points = |ring: &LineStringType| -> Vec<Point> {
        ring.iter()
            .filter(|c| c.len() >= 2)
            .map(|c| Point::new(c[0], c[1]))
            .collect()
    };

    let mut polygon = Polygon::new(to_points(exterior))
        .with_holes(
            interiors
                .iter()
                .map(to_points)
                .filter(|hole| hole.len() >= 3)
                .collect(),
        )
        .with_style(style_from_properties(props));

    if let Some(name) = props.and_then(|p| p.get("name")).and_then(|v| v.as_str()) {
        polygon = polygon.with_label(name);
    }
    Some(polygon)
}

/// Read simplestyle-like properties. Missing or malformed values keep the defaults.
pub fn style_from_properties(props: Option<&JsonObject>) -> PolygonStyle {
    let defaults = PolygonStyle::default();
    let Some(props) = props else {
        return defaults;
    };

    let color = |key: &str| props.get(key).and_then(|v| v.as_str()).and_then(Rgba::from_hex);
    let number = |key: &str| props.get(key).and_then(|v| v.as_f64()).filter(|n| n.is_finite());
    let flag = |key: &str| props.get(key).and_then(|v| v.as_bool()).unwrap_or(false);

    let fill = match (color("fill"), number("fill-opacity")) {
        (Some(c), opacity) => c.with_opacity(opacity.unwrap_or(DEFAULT_FILL_OPACITY)),
        (None, Some(opacity)) => Rgba { a: 255, ..defaults.fill }.with_opacity(opacity),
        (None, None) => defaults.fill,
    };

    let mut border_color = color("stroke").unwrap_or(defaults.border_color);
    if let Some(opacity) = number("stroke-opacity") {
        border_color = border_color.with_opacity(opacity);
    }

    PolygonStyle {
        fill,
        border_width: number("stroke-width").map_or(defaults.border_width, |w| w.max(0.0)),
        border_color,
        dotted: flag("dotted"),
        disable_holes_border: flag("disable-holes-border"),
    }
}

/// Ring of `samples` points around a centre, radius varying with angle
fn ring(center: Point, samples: usize, radius: impl Fn(f64) -> f64) -> Vec<Point> {
    (0..samples)
        .map(|i| {
            let a = i as f64 / samples as f64 * TAU;
            let r = radius(a);
            Point::new(center.lon + r * a.cos(), center.lat + r * a.sin())
        })
        .collect()
}

fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Vec<Point> {
    vec![
        Point::new(min_lon, min_lat),
        Point::new(max_lon, min_lat),
        Point::new(max_lon, max_lat),
        Point::new(min_lon, max_lat),
    ]
}

/// Generated polygons for when no data file is available
pub fn generate_demo_polygons() -> Vec<Polygon> {
    let mut polygons = Vec::new();

    // Dense jagged coastline, heavy enough for simplification to matter
    polygons.push(
        Polygon::new(ring(Point::new(-100.0, 42.0), 4000, |a| {
            18.0 + 2.0 * (7.0 * a).sin() + 0.6 * (53.0 * a).sin() + 0.15 * (311.0 * a).sin()
        }))
        .with_label("Jagged"),
    );

    // Lake district: two holes, both bordered
    polygons.push(
        Polygon::new(rect(5.0, -35.0, 50.0, 5.0))
            .with_holes(vec![
                rect(12.0, -25.0, 25.0, -10.0),
                ring(Point::new(38.0, -15.0), 64, |_| 6.0),
            ])
            .with_style(PolygonStyle {
                fill: Rgba::new(60, 170, 80, 170),
                border_color: Rgba::rgb(140, 230, 120),
                ..PolygonStyle::default()
            })
            .with_label("Lakes"),
    );

    // Dotted border
    polygons.push(
        Polygon::new(ring(Point::new(115.0, 35.0), 6, |_| 14.0))
            .with_style(PolygonStyle {
                fill: Rgba::new(200, 120, 40, 140),
                border_width: 2.0,
                border_color: Rgba::rgb(255, 190, 90),
                dotted: true,
                ..PolygonStyle::default()
            })
            .with_label("Dotted"),
    );

    // Atoll: hole with its border switched off
    polygons.push(
        Polygon::new(ring(Point::new(-60.0, -25.0), 96, |a| 16.0 + (5.0 * a).sin()))
            .with_holes(vec![ring(Point::new(-60.0, -25.0), 48, |_| 9.0)])
            .with_style(PolygonStyle {
                fill: Rgba::new(170, 60, 160, 170),
                border_color: Rgba::rgb(240, 140, 230),
                disable_holes_border: true,
                ..PolygonStyle::default()
            })
            .with_label("Atoll"),
    );

    // Scattered islands so culling has something to skip
    for i in 0..240u32 {
        let lon = -170.0 + ((i * 37) % 340) as f64;
        let lat = -60.0 + ((i * 53) % 125) as f64;
        let size = 0.8 + (i % 4) as f64 * 0.4;
        polygons.push(Polygon::new(ring(Point::new(lon, lat), 24, |a| {
            size * (1.0 + 0.25 * (3.0 * a + i as f64).sin())
        })));
    }

    polygons
}
