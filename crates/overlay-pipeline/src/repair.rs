//! Geometry repair strategies.
//!
//! Validity is decided by geo's [`Validation`] (OGC simple feature rules).
//! Repair only ever touches invalid geometries, so repairing a valid
//! geometry returns it unchanged and repair is idempotent.
//!
//! Both strategies start by cutting every polygon ring at the points where
//! it crosses or touches itself, which leaves simple loops covering each
//! lobe of the original ring. They differ in how the loops are put back
//! together:
//! - [`OverlayRepair`] unions the loops through the polygon overlay and
//!   subtracts the holes, so overlapping pieces merge and holes outside
//!   their shell disappear.
//! - [`ZeroBufferRepair`] approximates a zero-distance buffer without an
//!   overlay: each loop becomes its own polygon and holes attach to the
//!   loop containing them. Overlapping pieces stay overlapping.
//!
//! The strategy is chosen once at startup with [`RepairStrategy::select`].

use std::collections::HashMap;

use geo::algorithm::bool_ops::unary_union;
use geo::algorithm::line_intersection::{line_intersection, LineIntersection};
use geo::algorithm::orient::{Direction, Orient};
use geo::{
    Area, BooleanOps, Contains, Coord, Geometry, GeometryCollection, InteriorPoint, Line,
    LineString, MultiLineString, MultiPolygon, Point, Polygon, Validation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// A geometry repair capability.
pub trait GeometryRepair: Send + Sync + std::fmt::Debug {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Rewrite a geometry known to be invalid.
    fn rewrite(&self, geometry: Geometry<f64>) -> Geometry<f64>;

    /// Repair a geometry, leaving valid input untouched.
    fn repair(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        if geometry.is_valid() {
            geometry
        } else {
            self.rewrite(geometry)
        }
    }
}

/// Configured repair strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepairStrategy {
    /// Overlay repair when it works on this build, zero buffer otherwise
    #[default]
    Auto,
    Overlay,
    ZeroBuffer,
}

impl RepairStrategy {
    /// Resolve the strategy into a repair implementation.
    pub fn select(self) -> Box<dyn GeometryRepair> {
        match self {
            RepairStrategy::Overlay => Box::new(OverlayRepair),
            RepairStrategy::ZeroBuffer => Box::new(ZeroBufferRepair),
            RepairStrategy::Auto => {
                if overlay_available() {
                    debug!("Overlay repair available");
                    Box::new(OverlayRepair)
                } else {
                    warn!("Overlay repair unavailable, falling back to zero-buffer repair");
                    Box::new(ZeroBufferRepair)
                }
            }
        }
    }
}

/// Run the overlay engine on a self-intersecting ring and check the result.
///
/// A working overlay turns the unit bowtie into two triangles of total
/// area 0.5 that pass validation.
pub fn overlay_available() -> bool {
    let bowtie = Polygon::new(
        LineString::from(vec![(0.0, 0.0), (1.0, 1.0), (1.0, 0.0), (0.0, 1.0), (0.0, 0.0)]),
        vec![],
    );
    let repaired = OverlayRepair.rewrite(Geometry::Polygon(bowtie));
    repaired.is_valid() && (repaired.unsigned_area() - 0.5).abs() < 1e-9
}

/// Repair through the polygon overlay.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverlayRepair;

impl GeometryRepair for OverlayRepair {
    fn name(&self) -> &'static str {
        "overlay"
    }

    fn rewrite(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match geometry {
            Geometry::Polygon(p) => single_or_multi(split_pinched(overlay_polygon(&p))),
            Geometry::MultiPolygon(mp) => {
                let pieces: Vec<Polygon<f64>> = mp.iter().flat_map(|p| overlay_polygon(p).0).collect();
                Geometry::MultiPolygon(split_pinched(unary_union(pieces.iter())))
            }
            Geometry::LineString(ls) => clean_line(ls),
            Geometry::MultiLineString(mls) => clean_lines(mls),
            Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
                GeometryCollection::from(gc.0.into_iter().map(|g| self.repair(g)).collect::<Vec<_>>()),
            ),
            other => other,
        }
    }
}

/// Approximate repair: the ring cleanup a zero-distance buffer performs,
/// without merging overlapping pieces.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroBufferRepair;

impl GeometryRepair for ZeroBufferRepair {
    fn name(&self) -> &'static str {
        "zero_buffer"
    }

    fn rewrite(&self, geometry: Geometry<f64>) -> Geometry<f64> {
        match geometry {
            Geometry::Polygon(p) => single_or_multi(MultiPolygon::new(buffer_polygon(&p))),
            Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon::new(
                mp.iter().flat_map(buffer_polygon).collect(),
            )),
            Geometry::LineString(ls) => clean_line(ls),
            Geometry::MultiLineString(mls) => clean_lines(mls),
            Geometry::GeometryCollection(gc) => Geometry::GeometryCollection(
                GeometryCollection::from(gc.0.into_iter().map(|g| self.repair(g)).collect::<Vec<_>>()),
            ),
            other => other,
        }
    }
}

fn single_or_multi(mp: MultiPolygon<f64>) -> Geometry<f64> {
    if mp.0.len() == 1 {
        let mut polygons = mp.0;
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(mp)
    }
}

/// Shell loops unioned, hole loops subtracted.
fn overlay_polygon(polygon: &Polygon<f64>) -> MultiPolygon<f64> {
    let shells = unary_union(loop_polygons(polygon.exterior()).iter());
    let holes: Vec<Polygon<f64>> = polygon.interiors().iter().flat_map(loop_polygons).collect();
    if holes.is_empty() {
        shells
    } else {
        shells.difference(&unary_union(holes.iter()))
    }
}

/// Overlay output can keep a ring pinched at one vertex; split those rings
/// into separate loops.
fn split_pinched(mp: MultiPolygon<f64>) -> MultiPolygon<f64> {
    if Geometry::MultiPolygon(mp.clone()).is_valid() {
        return mp;
    }
    MultiPolygon::new(mp.iter().flat_map(buffer_polygon).collect())
}

/// Every shell loop as a polygon, with each hole loop attached to the shell
/// loop around it. Holes outside every shell are dropped.
fn buffer_polygon(polygon: &Polygon<f64>) -> Vec<Polygon<f64>> {
    let mut shells = loop_polygons(polygon.exterior());
    for hole in polygon.interiors().iter().flat_map(simple_loops) {
        let Some(inside) = Polygon::new(hole.clone(), vec![]).interior_point() else {
            continue;
        };
        if let Some(shell) = shells.iter_mut().find(|s| s.contains(&inside)) {
            shell.interiors_push(hole);
        }
    }
    shells
        .into_iter()
        .map(|p| p.orient(Direction::Default))
        .collect()
}

fn loop_polygons(ring: &LineString<f64>) -> Vec<Polygon<f64>> {
    simple_loops(ring)
        .into_iter()
        .map(|r| Polygon::new(r, vec![]).orient(Direction::Default))
        .collect()
}

// ============================================================================
// Ring splitting
// ============================================================================

/// Drop consecutive duplicate coordinates.
fn dedup_coords(coords: impl IntoIterator<Item = Coord<f64>>) -> Vec<Coord<f64>> {
    let mut out: Vec<Coord<f64>> = Vec::new();
    for c in coords {
        if out.last() != Some(&c) {
            out.push(c);
        }
    }
    out
}

/// Hash key of a coordinate; `-0.0` and `0.0` share one.
fn coord_key(c: &Coord<f64>) -> (u64, u64) {
    ((c.x + 0.0).to_bits(), (c.y + 0.0).to_bits())
}

/// Cut a ring into closed loops that neither cross nor touch themselves.
///
/// Loops with no area (spikes, collapsed rings) are dropped. A ring that
/// is already simple comes back as a single loop.
fn simple_loops(ring: &LineString<f64>) -> Vec<LineString<f64>> {
    let mut coords = dedup_coords(ring.0.iter().copied());
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return Vec::new();
    }

    let mut loops = Vec::new();
    let mut path: Vec<Coord<f64>> = Vec::with_capacity(coords.len());
    let mut seen: HashMap<(u64, u64), usize> = HashMap::with_capacity(coords.len());

    for c in dedup_coords(node_ring(&coords)) {
        if let Some(&start) = seen.get(&coord_key(&c)) {
            let mut cycle = path.split_off(start);
            for p in &cycle {
                seen.remove(&coord_key(p));
            }
            cycle.push(c);
            push_loop(&mut loops, cycle);
        }
        seen.insert(coord_key(&c), path.len());
        path.push(c);
    }
    if let Some(&first) = path.first() {
        path.push(first);
        push_loop(&mut loops, path);
    }
    loops
}

fn push_loop(out: &mut Vec<LineString<f64>>, coords: Vec<Coord<f64>>) {
    if coords.len() < 4 {
        return;
    }
    let ring = LineString::new(coords);
    if Polygon::new(ring.clone(), vec![]).unsigned_area() > 0.0 {
        out.push(ring);
    }
}

fn min_x(line: &Line<f64>) -> f64 {
    line.start.x.min(line.end.x)
}

fn boxes_overlap(a: &Line<f64>, b: &Line<f64>) -> bool {
    a.start.x.min(a.end.x) <= b.start.x.max(b.end.x)
        && b.start.x.min(b.end.x) <= a.start.x.max(a.end.x)
        && a.start.y.min(a.end.y) <= b.start.y.max(b.end.y)
        && b.start.y.min(b.end.y) <= a.start.y.max(a.end.y)
}

/// Position of `c` along `edge`, for ordering points on it.
fn along(edge: &Line<f64>, c: &Coord<f64>) -> f64 {
    let d = edge.delta();
    (c.x - edge.start.x) * d.x + (c.y - edge.start.y) * d.y
}

fn add_split(splits: &mut Vec<Coord<f64>>, edge: &Line<f64>, c: Coord<f64>) {
    if c != edge.start && c != edge.end {
        splits.push(c);
    }
}

/// The open ring with every self-intersection inserted as a vertex.
///
/// An intersection point is computed once and inserted into both edges, so
/// the two visits compare equal exactly. Edges are swept in order of their
/// left end, and only pairs with overlapping boxes are tested.
fn node_ring(coords: &[Coord<f64>]) -> Vec<Coord<f64>> {
    let n = coords.len();
    let edges: Vec<Line<f64>> = (0..n)
        .map(|i| Line::new(coords[i], coords[(i + 1) % n]))
        .collect();
    let mut splits: Vec<Vec<Coord<f64>>> = vec![Vec::new(); n];

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| min_x(&edges[a]).total_cmp(&min_x(&edges[b])));

    for (pos, &i) in order.iter().enumerate() {
        let a = edges[i];
        let a_max_x = a.start.x.max(a.end.x);
        for &j in &order[pos + 1..] {
            let b = edges[j];
            if min_x(&b) > a_max_x {
                break;
            }
            let gap = i.abs_diff(j);
            if gap == 1 || gap == n - 1 || !boxes_overlap(&a, &b) {
                continue;
            }
            match line_intersection(a, b) {
                Some(LineIntersection::SinglePoint { intersection, .. }) => {
                    add_split(&mut splits[i], &a, intersection);
                    add_split(&mut splits[j], &b, intersection);
                }
                Some(LineIntersection::Collinear { intersection }) => {
                    for c in [intersection.start, intersection.end] {
                        add_split(&mut splits[i], &a, c);
                        add_split(&mut splits[j], &b, c);
                    }
                }
                None => {}
            }
        }
    }

    let mut noded = Vec::with_capacity(n + splits.iter().map(Vec::len).sum::<usize>());
    for (edge, mut points) in edges.iter().zip(splits) {
        noded.push(edge.start);
        points.sort_by(|p, q| along(edge, p).total_cmp(&along(edge, q)));
        points.dedup();
        noded.extend(points);
    }
    noded
}

// ============================================================================
// Lines
// ============================================================================

fn clean_line(ls: LineString<f64>) -> Geometry<f64> {
    let coords = dedup_coords(ls.0);
    match coords.len() {
        0 => Geometry::LineString(LineString::new(vec![])),
        1 => Geometry::Point(Point(coords[0])),
        _ => Geometry::LineString(LineString::new(coords)),
    }
}

fn clean_lines(mls: MultiLineString<f64>) -> Geometry<f64> {
    let lines = mls
        .0
        .into_iter()
        .map(|ls| LineString::new(dedup_coords(ls.0)))
        .filter(|ls| ls.0.len() >= 2)
        .collect();
    Geometry::MultiLineString(MultiLineString::new(lines))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{point, polygon};
    use test_utils::{bowtie, square};

    fn area(geometry: &Geometry<f64>) -> f64 {
        geometry.unsigned_area()
    }

    /// Shell with a hole lying entirely outside of it.
    fn hole_outside_shell() -> Polygon<f64> {
        polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 2.0, y: 0.0), (x: 2.0, y: 2.0), (x: 0.0, y: 2.0)],
            interiors: [[(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0), (x: 5.0, y: 6.0)]],
        )
    }

    /// Two 2x2 squares sharing a 1x1 corner: union area 7.
    fn overlapping_squares() -> MultiPolygon<f64> {
        MultiPolygon::new(vec![square(0.0, 0.0, 2.0), square(1.0, 1.0, 2.0)])
    }

    #[test]
    fn test_validity_cases() {
        assert!(Geometry::from(square(0.0, 0.0, 1.0)).is_valid());
        assert!(!Geometry::from(bowtie()).is_valid());
        assert!(!Geometry::from(hole_outside_shell()).is_valid());
        assert!(!Geometry::MultiPolygon(overlapping_squares()).is_valid());
    }

    #[test]
    fn test_bowtie_splits_into_two_lobes() {
        let loops = simple_loops(bowtie().exterior());
        assert_eq!(loops.len(), 2);
        for ring in &loops {
            let lobe = Polygon::new(ring.clone(), vec![]);
            assert!((lobe.unsigned_area() - 0.25).abs() < 1e-12);
            assert!(ring.coords().any(|c| (c.x - 0.5).abs() < 1e-12 && (c.y - 0.5).abs() < 1e-12));
        }
    }

    #[test]
    fn test_simple_ring_is_one_loop() {
        let loops = simple_loops(square(2.0, 3.0, 1.0).exterior());
        assert_eq!(loops.len(), 1);
        assert_eq!(loops[0].0.len(), 5);
    }

    #[test]
    fn test_ring_pinched_at_a_vertex_splits() {
        // Two unit squares sharing the vertex (1, 1), walked as one ring
        let ring = LineString::from(vec![
            (0.0, 0.0),
            (1.0, 0.0),
            (1.0, 1.0),
            (2.0, 1.0),
            (2.0, 2.0),
            (1.0, 2.0),
            (1.0, 1.0),
            (0.0, 1.0),
            (0.0, 0.0),
        ]);
        let loops = simple_loops(&ring);
        assert_eq!(loops.len(), 2);
        let total: f64 = loops.iter().map(|r| Polygon::new(r.clone(), vec![]).unsigned_area()).sum();
        assert!((total - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_collapsed_ring_has_no_loops() {
        let flat = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (0.0, 0.0)]);
        assert!(simple_loops(&flat).is_empty());
    }

    #[test]
    fn test_overlay_engine_available() {
        assert!(overlay_available());
    }

    #[test]
    fn test_auto_selects_overlay() {
        assert_eq!(RepairStrategy::Auto.select().name(), "overlay");
    }

    #[test]
    fn test_bowtie_repair_keeps_both_lobes() {
        for strategy in [RepairStrategy::Overlay, RepairStrategy::ZeroBuffer] {
            let repair = strategy.select();
            let repaired = repair.repair(bowtie().into());
            assert!(repaired.is_valid(), "{} left {:?}", repair.name(), repaired);
            assert!((area(&repaired) - 0.5).abs() < 1e-9, "{} area {}", repair.name(), area(&repaired));
        }
    }

    #[test]
    fn test_overlay_drops_hole_outside_shell() {
        let repaired = OverlayRepair.repair(hole_outside_shell().into());
        assert!(repaired.is_valid());
        assert!((area(&repaired) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_buffer_drops_hole_outside_shell() {
        let repaired = ZeroBufferRepair.repair(hole_outside_shell().into());
        assert_eq!(repaired, Geometry::Polygon(square(0.0, 0.0, 2.0).orient(Direction::Default)));
    }

    #[test]
    fn test_zero_buffer_keeps_hole_inside_crossing_shell() {
        // Bowtie scaled by 4 with a hole in its left lobe
        let poly = polygon!(
            exterior: [(x: 0.0, y: 0.0), (x: 4.0, y: 4.0), (x: 4.0, y: 0.0), (x: 0.0, y: 4.0)],
            interiors: [[(x: 0.5, y: 1.5), (x: 1.0, y: 1.5), (x: 1.0, y: 2.5), (x: 0.5, y: 2.5)]],
        );
        let repaired = ZeroBufferRepair.repair(poly.into());
        assert!(repaired.is_valid());
        assert!((area(&repaired) - (8.0 - 0.5)).abs() < 1e-9);
    }

    #[test]
    fn test_overlay_merges_overlapping_members() {
        let repaired = OverlayRepair.repair(Geometry::MultiPolygon(overlapping_squares()));
        assert!(repaired.is_valid());
        assert!((area(&repaired) - 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_repair_leaves_valid_geometry_untouched() {
        let valid: Geometry<f64> = square(2.0, 3.0, 0.5).into();
        assert_eq!(OverlayRepair.repair(valid.clone()), valid);
        assert_eq!(ZeroBufferRepair.repair(valid.clone()), valid);

        let pt: Geometry<f64> = point!(x: 1.0, y: 2.0).into();
        assert_eq!(OverlayRepair.repair(pt.clone()), pt);
    }

    #[test]
    fn test_repair_is_idempotent() {
        for strategy in [RepairStrategy::Overlay, RepairStrategy::ZeroBuffer] {
            let repair = strategy.select();
            let once = repair.repair(bowtie().into());
            let twice = repair.repair(once.clone());
            assert_eq!(once, twice, "{} is not idempotent", repair.name());
        }
    }

    #[test]
    fn test_collapsed_polygon_becomes_empty() {
        let flat = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 2.0, y: 0.0)];
        assert_eq!(
            ZeroBufferRepair.rewrite(flat.into()),
            Geometry::MultiPolygon(MultiPolygon::new(vec![]))
        );
    }

    #[test]
    fn test_degenerate_line_becomes_point() {
        let line = LineString::from(vec![(1.0, 1.0), (1.0, 1.0)]);
        let repaired = OverlayRepair.rewrite(line.into());
        assert_eq!(repaired, Geometry::Point(point!(x: 1.0, y: 1.0)));
    }
}
