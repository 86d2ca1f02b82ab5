mod stereographic;
mod web_mercator;

pub use stereographic::{Hemisphere, PolarStereographic};
pub use web_mercator::WebMercator;

use crate::cartesian::Point2d;
use crate::geo::GeoPoint2d;

/// Conversion between geographic coordinates and planar coordinates of a map projection.
///
/// Both directions return `None` if the point cannot be represented in the target space (for example, a pole in
/// Mercator projection).
pub trait Projection {
    /// Converts a geographic point into planar coordinates.
    fn project(&self, input: &GeoPoint2d) -> Option<Point2d>;
    /// Converts planar coordinates back into a geographic point.
    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d>;
}

impl<T: Projection + ?Sized> Projection for Box<T> {
    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        (**self).project(input)
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        (**self).unproject(input)
    }
}
