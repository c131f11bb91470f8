//! Tests for BoundingBox and Viewport operations.

use atlas_common::bbox::{BoundingBox, Viewport};

// ============================================================================
// BoundingBox tests
// ============================================================================

#[test]
fn test_bbox_new() {
    let bbox = BoundingBox::new(-180.0, -90.0, 180.0, 90.0);
    assert_eq!(bbox.min_x, -180.0);
    assert_eq!(bbox.min_y, -90.0);
    assert_eq!(bbox.max_x, 180.0);
    assert_eq!(bbox.max_y, 90.0);
}

#[test]
fn test_bbox_dimensions() {
    let bbox = BoundingBox::new(-47.2, -23.3, -46.7, -23.0);
    assert!((bbox.width() - 0.5).abs() < 1e-9);
    assert!((bbox.height() - 0.3).abs() < 1e-9);
}

#[test]
fn test_bbox_center() {
    let bbox = BoundingBox::new(0.0, 0.0, 10.0, 4.0);
    assert_eq!(bbox.center(), (5.0, 2.0));
}

#[test]
fn test_union_is_commutative() {
    let a = BoundingBox::new(-1.0, -1.0, 0.5, 0.5);
    let b = BoundingBox::new(0.0, 0.0, 2.0, 3.0);
    assert_eq!(a.union(&b), b.union(&a));
    assert_eq!(a.union(&b), BoundingBox::new(-1.0, -1.0, 2.0, 3.0));
}

#[test]
fn test_union_with_contained_box() {
    let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let inner = BoundingBox::new(2.0, 2.0, 3.0, 3.0);
    assert_eq!(outer.union(&inner), outer);
}

#[test]
fn test_intersects() {
    let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
    let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
    let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
    assert!(a.intersects(&b));
    assert!(!a.intersects(&c));
}

#[test]
fn test_contains_point_on_edge() {
    let bbox = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
    assert!(bbox.contains_point(1.0, 0.5));
    assert!(!bbox.contains_point(1.0001, 0.5));
}

#[test]
fn test_line_is_degenerate() {
    let vertical = BoundingBox::new(3.0, 0.0, 3.0, 1.0);
    assert!(vertical.is_degenerate());
    let padded = vertical.padded_if_degenerate(0.5);
    assert_eq!(padded, BoundingBox::new(2.5, 0.0, 3.5, 1.0));
}

// ============================================================================
// Viewport tests
// ============================================================================

#[test]
fn test_viewport_corner_order() {
    let viewport = Viewport::new(-23.3, -47.2, -23.0, -46.7);
    let corners: [[f64; 2]; 2] = viewport.into();
    assert_eq!(corners, [[-23.3, -47.2], [-23.0, -46.7]]);
}

#[test]
fn test_viewport_center() {
    let viewport = Viewport::new(0.0, 0.0, 2.0, 4.0);
    assert_eq!(viewport.center(), [1.0, 2.0]);
}

#[test]
fn test_viewport_deserialize() {
    let viewport: Viewport = serde_json::from_str("[[-23.3,-47.2],[-23.0,-46.7]]").unwrap();
    assert_eq!(viewport.south_west, [-23.3, -47.2]);
    assert_eq!(viewport.north_east, [-23.0, -46.7]);
}
