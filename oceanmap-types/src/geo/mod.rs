//! Geographic coordinates (latitude and longitude) and conversion between them and planar map coordinates
//! (see [`Projection`]).

mod datum;
mod point;
mod projection;

pub use datum::Datum;
pub use point::GeoPoint2d;
pub use projection::{Hemisphere, PolarStereographic, Projection, WebMercator};
