//! Geometry repair and the buffer primitive
//!
//! Buffers are built from discs and segment corridors dissolved through the
//! boolean engine: points become circles approximated with `segments`
//! vertices, lines become vertex discs plus per-segment rectangles, polygons
//! grow by their ring corridors. Repair routes polygonal geometry through a
//! self-union, which resolves self-intersections into valid rings.

use geo::{unary_union, Geometry, GeometryCollection, LineString, MultiPolygon, Polygon};
use geo_types::Coord;
use std::f64::consts::PI;

/// Number of segments used to approximate circular arcs
pub const DEFAULT_SEGMENTS: usize = 16;

/// Repair a geometry to a valid equivalent before measurement.
///
/// Polygonal geometry is passed through a self-union; collections are
/// repaired member by member; anything else is returned unchanged.
pub fn repair(geom: &Geometry<f64>) -> Geometry<f64> {
    match geom {
        Geometry::Polygon(p) => collapse(unary_union(std::iter::once(p))),
        Geometry::MultiPolygon(mp) => collapse(unary_union(mp.0.iter())),
        Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
            GeometryCollection::from(gc.0.iter().map(repair).collect::<Vec<_>>()),
        ),
        other => other.clone(),
    }
}

/// Buffer a geometry by `distance` in its own coordinate units.
///
/// The distance magnitude is used; the disc/corridor approximation cannot
/// erode.
pub fn buffer(geom: &Geometry<f64>, distance: f64, segments: usize) -> MultiPolygon<f64> {
    let radius = distance.abs();
    let mut parts = Vec::new();
    collect_buffer_parts(geom, radius, segments.max(4), &mut parts);
    unary_union(parts.iter())
}

/// Collapse a single-polygon multi into a plain polygon geometry
pub fn collapse(mp: MultiPolygon<f64>) -> Geometry<f64> {
    let mut polys = mp.0;
    if polys.len() == 1 {
        Geometry::Polygon(polys.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polys))
    }
}

fn collect_buffer_parts(
    geom: &Geometry<f64>,
    radius: f64,
    segments: usize,
    parts: &mut Vec<Polygon<f64>>,
) {
    match geom {
        Geometry::Point(p) => parts.push(circle(p.0, radius, segments)),
        Geometry::MultiPoint(mp) => {
            for p in &mp.0 {
                parts.push(circle(p.0, radius, segments));
            }
        }
        Geometry::Line(l) => {
            parts.push(circle(l.start, radius, segments));
            parts.push(circle(l.end, radius, segments));
            if let Some(rect) = segment_box(l.start, l.end, radius) {
                parts.push(rect);
            }
        }
        Geometry::LineString(ls) => corridor(ls, radius, segments, parts),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                corridor(ls, radius, segments, parts);
            }
        }
        Geometry::Polygon(p) => {
            parts.push(p.clone());
            corridor(p.exterior(), radius, segments, parts);
            for ring in p.interiors() {
                corridor(ring, radius, segments, parts);
            }
        }
        Geometry::MultiPolygon(mp) => {
            for p in &mp.0 {
                collect_buffer_parts(&Geometry::Polygon(p.clone()), radius, segments, parts);
            }
        }
        Geometry::Rect(r) => {
            collect_buffer_parts(&Geometry::Polygon(r.to_polygon()), radius, segments, parts)
        }
        Geometry::Triangle(t) => {
            collect_buffer_parts(&Geometry::Polygon(t.to_polygon()), radius, segments, parts)
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                collect_buffer_parts(g, radius, segments, parts);
            }
        }
    }
}

/// Disc and rectangle cover of a linestring
fn corridor(ls: &LineString<f64>, radius: f64, segments: usize, parts: &mut Vec<Polygon<f64>>) {
    for coord in &ls.0 {
        parts.push(circle(*coord, radius, segments));
    }
    for pair in ls.0.windows(2) {
        if let Some(rect) = segment_box(pair[0], pair[1], radius) {
            parts.push(rect);
        }
    }
}

/// Circle approximated as a closed polygon with `segments` vertices
fn circle(center: Coord<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let mut coords = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let angle = 2.0 * PI * i as f64 / segments as f64;
        coords.push((center.x + radius * angle.cos(), center.y + radius * angle.sin()));
    }
    coords.push(coords[0]);
    Polygon::new(LineString::from(coords), vec![])
}

/// Rectangle covering a segment offset by `radius` on both sides
fn segment_box(a: Coord<f64>, b: Coord<f64>, radius: f64) -> Option<Polygon<f64>> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let len = (dx * dx + dy * dy).sqrt();
    if len == 0.0 {
        return None;
    }
    // unit normal
    let nx = -dy / len * radius;
    let ny = dx / len * radius;
    Some(Polygon::new(
        LineString::from(vec![
            (a.x + nx, a.y + ny),
            (b.x + nx, b.y + ny),
            (b.x - nx, b.y - ny),
            (a.x - nx, a.y - ny),
            (a.x + nx, a.y + ny),
        ]),
        vec![],
    ))
}
