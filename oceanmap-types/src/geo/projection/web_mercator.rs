use crate::cartesian::Point2d;
use crate::geo::datum::Datum;
use crate::geo::{GeoPoint2d, Projection};

/// Spherical Web Mercator projection (EPSG:3857).
#[derive(Debug, Copy, Clone, Default)]
pub struct WebMercator {
    datum: Datum,
}

impl WebMercator {
    /// Creates a projection using semi-major axis of the given datum as the sphere radius.
    pub fn new(datum: Datum) -> Self {
        Self { datum }
    }
}

impl Projection for WebMercator {
    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        if input.lat().abs() >= 90.0 {
            return None;
        }

        let x = self.datum.semimajor() * input.lon_rad();
        let y = self.datum.semimajor()
            * (std::f64::consts::FRAC_PI_4 + input.lat_rad() / 2.0)
                .tan()
                .ln();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        if !input.x.is_finite() || !input.y.is_finite() {
            return None;
        }

        let lat = 2.0 * (input.y / self.datum.semimajor()).exp().atan()
            - std::f64::consts::FRAC_PI_2;
        let lon = input.x / self.datum.semimajor();

        Some(GeoPoint2d::latlon(lat.to_degrees(), lon.to_degrees()))
    }
}
