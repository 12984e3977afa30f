//! Core geometry types
//!
//! All lens geometry lives in one stable outer coordinate space measured in
//! points (the host window). Pixel conversions always go through an explicit
//! scale so the same rect can be expressed at screen scale or at the reduced
//! capture scale used by the snapshot cache.

use serde::{Deserialize, Serialize};

/// 2D point
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const ZERO: Point = Point { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 2D size
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const ZERO: Size = Size {
        width: 0.0,
        height: 0.0,
    };

    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Insets applied to each edge of a rect.
///
/// Positive values shrink a rect when used with [`Rect::inset_by`] and grow it
/// when used with [`Rect::outset_by`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeInsets {
    #[serde(default)]
    pub top: f32,
    #[serde(default)]
    pub left: f32,
    #[serde(default)]
    pub bottom: f32,
    #[serde(default)]
    pub right: f32,
}

impl EdgeInsets {
    pub const ZERO: EdgeInsets = EdgeInsets {
        top: 0.0,
        left: 0.0,
        bottom: 0.0,
        right: 0.0,
    };

    pub const fn new(top: f32, left: f32, bottom: f32, right: f32) -> Self {
        Self {
            top,
            left,
            bottom,
            right,
        }
    }

    pub const fn uniform(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Same inset on the left/right edges and on the top/bottom edges
    pub const fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self::new(vertical, horizontal, vertical, horizontal)
    }
}

/// 2D rectangle
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub const ZERO: Rect = Rect {
        origin: Point::ZERO,
        size: Size::ZERO,
    };

    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn from_origin_size(origin: Point, size: Size) -> Self {
        Self { origin, size }
    }

    /// Build a rect of the given size centred on a point
    pub fn from_center(center: Point, size: Size) -> Self {
        Rect::new(
            center.x - size.width / 2.0,
            center.y - size.height / 2.0,
            size.width,
            size.height,
        )
    }

    pub fn x(&self) -> f32 {
        self.origin.x
    }

    pub fn y(&self) -> f32 {
        self.origin.y
    }

    pub fn width(&self) -> f32 {
        self.size.width
    }

    pub fn height(&self) -> f32 {
        self.size.height
    }

    pub fn min_x(&self) -> f32 {
        self.origin.x
    }

    pub fn max_x(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn min_y(&self) -> f32 {
        self.origin.y
    }

    pub fn max_y(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn mid_x(&self) -> f32 {
        self.origin.x + self.size.width / 2.0
    }

    pub fn mid_y(&self) -> f32 {
        self.origin.y + self.size.height / 2.0
    }

    pub fn center(&self) -> Point {
        Point::new(self.mid_x(), self.mid_y())
    }

    /// True when either dimension is zero or negative
    pub fn is_empty(&self) -> bool {
        self.size.width <= 0.0 || self.size.height <= 0.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x()
            && point.x <= self.max_x()
            && point.y >= self.min_y()
            && point.y <= self.max_y()
    }

    /// True when `other` lies entirely inside this rect (edges may touch)
    pub fn contains_rect(&self, other: &Rect) -> bool {
        !other.is_empty()
            && other.min_x() >= self.min_x()
            && other.max_x() <= self.max_x()
            && other.min_y() >= self.min_y()
            && other.max_y() <= self.max_y()
    }

    /// Smallest rect containing both rects
    pub fn union(&self, other: &Rect) -> Rect {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Overlapping region of two rects, if they overlap with positive area
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let min_x = self.min_x().max(other.min_x());
        let min_y = self.min_y().max(other.min_y());
        let max_x = self.max_x().min(other.max_x());
        let max_y = self.max_y().min(other.max_y());
        if max_x <= min_x || max_y <= min_y {
            return None;
        }
        Some(Rect::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Offset the rect by a delta
    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: self.size,
        }
    }

    /// Inset the rect by a delta on each axis; negative values grow it
    pub fn inset(&self, dx: f32, dy: f32) -> Self {
        Rect {
            origin: Point::new(self.origin.x + dx, self.origin.y + dy),
            size: Size::new(
                (self.size.width - 2.0 * dx).max(0.0),
                (self.size.height - 2.0 * dy).max(0.0),
            ),
        }
    }

    /// Shrink each edge by the given insets
    pub fn inset_by(&self, insets: EdgeInsets) -> Self {
        Rect::new(
            self.origin.x + insets.left,
            self.origin.y + insets.top,
            self.size.width - insets.left - insets.right,
            self.size.height - insets.top - insets.bottom,
        )
    }

    /// Grow each edge outward by the given insets
    pub fn outset_by(&self, insets: EdgeInsets) -> Self {
        Rect::new(
            self.origin.x - insets.left,
            self.origin.y - insets.top,
            self.size.width + insets.left + insets.right,
            self.size.height + insets.top + insets.bottom,
        )
    }

    /// Same rect with a different origin x
    pub fn with_x(&self, x: f32) -> Self {
        Rect::new(x, self.origin.y, self.size.width, self.size.height)
    }

    /// Scale width and height independently about the rect centre.
    ///
    /// The lens frame is always derived from a slot frame this way so the
    /// visual frame can never drift from its logical target.
    pub fn center_scale(&self, scale_x: f32, scale_y: f32) -> Self {
        Rect::from_center(
            self.center(),
            Size::new(self.size.width * scale_x, self.size.height * scale_y),
        )
    }

    /// Uniform variant of [`Rect::center_scale`]
    pub fn center_scale_uniform(&self, scale: f32) -> Self {
        self.center_scale(scale, scale)
    }

    /// Multiply every component by `scale` (points to pixels)
    pub fn scaled(&self, scale: f32) -> Self {
        Rect::new(
            self.origin.x * scale,
            self.origin.y * scale,
            self.size.width * scale,
            self.size.height * scale,
        )
    }

    /// Smallest integer-aligned rect containing this one
    pub fn integral(&self) -> Self {
        let min_x = self.min_x().floor();
        let min_y = self.min_y().floor();
        let max_x = self.max_x().ceil();
        let max_y = self.max_y().ceil();
        Rect::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Round origin and size to the device pixel grid at `scale` pixels per point
    pub fn snap_to_pixels(&self, scale: f32) -> Self {
        Rect::new(
            snap_to_pixels(self.origin.x, scale),
            snap_to_pixels(self.origin.y, scale),
            snap_to_pixels(self.size.width, scale),
            snap_to_pixels(self.size.height, scale),
        )
    }

    /// Component-wise comparison within `epsilon`
    pub fn approx_eq(&self, other: &Rect, epsilon: f32) -> bool {
        (self.origin.x - other.origin.x).abs() <= epsilon
            && (self.origin.y - other.origin.y).abs() <= epsilon
            && (self.size.width - other.size.width).abs() <= epsilon
            && (self.size.height - other.size.height).abs() <= epsilon
    }
}

/// Round a point value to the nearest device pixel
pub fn snap_to_pixels(value: f32, scale: f32) -> f32 {
    if scale <= 0.0 {
        return value;
    }
    (value * scale).round() / scale
}

/// Floor a point value to a device pixel boundary
pub fn floor_to_pixels(value: f32, scale: f32) -> f32 {
    if scale <= 0.0 {
        return value;
    }
    (value * scale).floor() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_then_outset_matches_prime_example() {
        let a = Rect::new(0.0, 0.0, 100.0, 50.0);
        let b = Rect::new(150.0, 0.0, 100.0, 50.0);
        let covered = a.union(&b).outset_by(EdgeInsets::uniform(8.0));
        assert_eq!(covered, Rect::new(-8.0, -8.0, 266.0, 66.0));
    }

    #[test]
    fn contains_rect_allows_touching_edges() {
        let outer = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(&Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(outer.contains_rect(&Rect::new(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(&Rect::new(90.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(&Rect::new(10.0, 10.0, 0.0, 20.0)));
    }

    #[test]
    fn center_scale_keeps_center() {
        let r = Rect::new(10.0, 20.0, 100.0, 40.0);
        let s = r.center_scale(0.8, 1.2);
        assert!(s.center().distance(r.center()) < 1e-4);
        assert!((s.width() - 80.0).abs() < 1e-4);
        assert!((s.height() - 48.0).abs() < 1e-4);
    }

    #[test]
    fn intersection_requires_positive_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(
            a.intersection(&Rect::new(5.0, -5.0, 10.0, 10.0)),
            Some(Rect::new(5.0, 0.0, 5.0, 5.0))
        );
        assert_eq!(a.intersection(&Rect::new(10.0, 0.0, 5.0, 5.0)), None);
    }

    #[test]
    fn integral_expands_to_pixel_grid() {
        let r = Rect::new(1.2, 2.7, 3.1, 0.2);
        assert_eq!(r.integral(), Rect::new(1.0, 2.0, 4.0, 1.0));
    }

    #[test]
    fn snap_rounds_to_device_pixels() {
        let r = Rect::new(10.26, 0.0, 33.33, 60.0).snap_to_pixels(3.0);
        assert!((r.x() - 31.0 / 3.0).abs() < 1e-4);
        assert!((r.width() - 100.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn inset_by_and_outset_by_are_inverse() {
        let r = Rect::new(5.0, 5.0, 50.0, 30.0);
        let insets = EdgeInsets::new(1.0, 2.0, 3.0, 4.0);
        assert!(r.outset_by(insets).inset_by(insets).approx_eq(&r, 1e-5));
    }
}
