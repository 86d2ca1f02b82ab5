//! Types and functions on geometries in cartesian (projected) coordinates.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Point in projected coordinates of a map projection.
pub type Point2d = Point2<f64>;

/// Axis aligned rectangle.
///
/// Used both for planar extents (metres) and for world extents in degrees, in which case `x` is longitude and
/// `y` is latitude.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Minimum x value.
    pub x_min: f64,
    /// Minimum y value.
    pub y_min: f64,
    /// Maximum x value.
    pub x_max: f64,
    /// Maximum y value.
    pub y_max: f64,
}

impl Rect {
    /// Creates a new rectangle.
    pub const fn new(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    /// Creates a rectangle centered at `center` with the given width and height.
    pub fn from_center(center: Point2d, width: f64, height: f64) -> Self {
        Self {
            x_min: center.x - width / 2.0,
            y_min: center.y - height / 2.0,
            x_max: center.x + width / 2.0,
            y_max: center.y + height / 2.0,
        }
    }

    /// Smallest rectangle containing all the given points. Returns `None` if the iterator is empty.
    pub fn from_points<'a>(mut points: impl Iterator<Item = &'a Point2d>) -> Option<Self> {
        let first = points.next()?;
        let mut rect = Self::new(first.x, first.y, first.x, first.y);
        for p in points {
            rect.x_min = rect.x_min.min(p.x);
            rect.y_min = rect.y_min.min(p.y);
            rect.x_max = rect.x_max.max(p.x);
            rect.y_max = rect.y_max.max(p.y);
        }

        Some(rect)
    }

    /// Width of the rectangle.
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// Height of the rectangle.
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Center point of the rectangle.
    pub fn center(&self) -> Point2d {
        Point2d::new(
            (self.x_min + self.x_max) / 2.0,
            (self.y_min + self.y_max) / 2.0,
        )
    }

    /// Returns true if the point is inside the rectangle or on its border.
    pub fn contains(&self, point: &Point2d) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Returns true if the two rectangles have at least one common point.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x_max >= other.x_min
            && self.x_min <= other.x_max
            && self.y_max >= other.y_min
            && self.y_min <= other.y_max
    }

    /// Intersection of the two rectangles. Returns `None` if they do not intersect.
    pub fn limit(&self, other: &Rect) -> Option<Rect> {
        if !self.intersects(other) {
            return None;
        }

        Some(Self {
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
        })
    }

    /// Rectangle with the same center scaled by `factor`.
    pub fn magnify(&self, factor: f64) -> Self {
        Self::from_center(self.center(), self.width() * factor, self.height() * factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_points_bounds_all_points() {
        let points = [
            Point2d::new(1.0, -2.0),
            Point2d::new(-3.0, 4.0),
            Point2d::new(0.5, 0.5),
        ];
        let rect = Rect::from_points(points.iter()).expect("not empty");
        assert_eq!(rect, Rect::new(-3.0, -2.0, 1.0, 4.0));
        assert!(Rect::from_points([].iter()).is_none());
    }

    #[test]
    fn limit_clips_to_common_area() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, -5.0, 15.0, 5.0);
        assert_eq!(a.limit(&b), Some(Rect::new(5.0, 0.0, 10.0, 5.0)));
        assert_eq!(a.limit(&Rect::new(11.0, 11.0, 12.0, 12.0)), None);
    }

    #[test]
    fn magnify_keeps_center() {
        let rect = Rect::new(-1.0, -2.0, 3.0, 2.0).magnify(2.0);
        assert_eq!(rect.center(), Point2d::new(1.0, 0.0));
        assert_eq!(rect.width(), 8.0);
        assert_eq!(rect.height(), 8.0);
    }
}
