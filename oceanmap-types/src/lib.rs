//! Geometric primitives used by the `oceanmap` engine.
//!
//! Coordinates live in one of two spaces:
//!
//! * geographic space - latitude and longitude in degrees on the WGS84 ellipsoid, see [`geo::GeoPoint2d`];
//! * planar space - projected coordinates in metres of one of the supported map projections, see
//!   [`cartesian::Point2d`].
//!
//! Conversion between the two is done by implementations of the [`geo::Projection`] trait.

pub mod cartesian;
pub mod geo;
mod geometry_type;

pub use geometry_type::GeometryType;
