use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::cartesian::Point2d;
use crate::geo::datum::Datum;
use crate::geo::{GeoPoint2d, Projection};

const MAX_ITERATIONS: usize = 15;
const TOLERANCE: f64 = 1e-12;

/// Pole a polar projection is centered on.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Hemisphere {
    /// North pole.
    North,
    /// South pole.
    South,
}

/// Ellipsoidal polar stereographic projection.
///
/// The scale of the projection is set either by the scale factor at the pole (`k0`) or by the latitude of true
/// scale. Formulas follow Snyder, "Map Projections: A Working Manual", §21.
#[derive(Debug, Copy, Clone)]
pub struct PolarStereographic {
    datum: Datum,
    hemisphere: Hemisphere,
    lat_ts: Option<f64>,
    lon_0: f64,
    k0: f64,
    false_easting: f64,
    false_northing: f64,
}

impl PolarStereographic {
    /// Universal Polar Stereographic North (EPSG:32661).
    pub fn ups_north() -> Self {
        Self {
            datum: Datum::WGS84,
            hemisphere: Hemisphere::North,
            lat_ts: None,
            lon_0: 0.0,
            k0: 0.994,
            false_easting: 2_000_000.0,
            false_northing: 2_000_000.0,
        }
    }

    /// Antarctic Polar Stereographic (EPSG:3031), true scale at 71°S.
    pub fn antarctic() -> Self {
        Self {
            datum: Datum::WGS84,
            hemisphere: Hemisphere::South,
            lat_ts: Some(-71.0),
            lon_0: 0.0,
            k0: 1.0,
            false_easting: 0.0,
            false_northing: 0.0,
        }
    }

    /// Hemisphere the projection is centered on.
    pub fn hemisphere(&self) -> Hemisphere {
        self.hemisphere
    }

    /// Central meridian in degrees.
    pub fn lon_0(&self) -> f64 {
        self.lon_0
    }

    fn sign(&self) -> f64 {
        match self.hemisphere {
            Hemisphere::North => 1.0,
            Hemisphere::South => -1.0,
        }
    }

    fn t(&self, phi: f64) -> f64 {
        let e = self.datum.eccentricity();
        let e_sin = e * phi.sin();
        (FRAC_PI_4 - phi / 2.0).tan() / ((1.0 - e_sin) / (1.0 + e_sin)).powf(e / 2.0)
    }

    /// Ratio `rho / t`, constant for the whole projection.
    fn rho_factor(&self) -> f64 {
        let a = self.datum.semimajor();
        let e = self.datum.eccentricity();

        match self.lat_ts {
            Some(lat_ts) if (lat_ts.abs() - 90.0).abs() > f64::EPSILON => {
                let phi_c = self.sign() * lat_ts.to_radians();
                let m_c = phi_c.cos() / (1.0 - e * e * phi_c.sin().powi(2)).sqrt();
                a * m_c / self.t(phi_c)
            }
            _ => {
                2.0 * a * self.k0
                    / ((1.0 + e).powf(1.0 + e) * (1.0 - e).powf(1.0 - e)).sqrt()
            }
        }
    }
}

impl Projection for PolarStereographic {
    fn project(&self, input: &GeoPoint2d) -> Option<Point2d> {
        let phi = self.sign() * input.lat_rad();
        let d_lambda = (input.lon() - self.lon_0).to_radians();
        let rho = self.rho_factor() * self.t(phi);

        let x = self.false_easting + rho * d_lambda.sin();
        let y = self.false_northing - self.sign() * rho * d_lambda.cos();

        if x.is_finite() && y.is_finite() {
            Some(Point2d::new(x, y))
        } else {
            None
        }
    }

    fn unproject(&self, input: &Point2d) -> Option<GeoPoint2d> {
        let dx = input.x - self.false_easting;
        let dy = input.y - self.false_northing;
        if !dx.is_finite() || !dy.is_finite() {
            return None;
        }

        let rho = dx.hypot(dy);
        let pole = self.sign() * 90.0;
        if rho == 0.0 {
            return Some(GeoPoint2d::latlon(pole, self.lon_0));
        }

        let d_lambda = dx.atan2(-self.sign() * dy);
        let t = rho / self.rho_factor();
        let e = self.datum.eccentricity();

        let mut phi = FRAC_PI_2 - 2.0 * t.atan();
        for _ in 0..MAX_ITERATIONS {
            let e_sin = e * phi.sin();
            let next = FRAC_PI_2 - 2.0 * (t * ((1.0 - e_sin) / (1.0 + e_sin)).powf(e / 2.0)).atan();
            let delta = (next - phi).abs();
            phi = next;
            if delta < TOLERANCE {
                break;
            }
        }

        let lat = self.sign() * phi.to_degrees();
        let lon = self.lon_0 + d_lambda.to_degrees();
        if !lat.is_finite() || !lon.is_finite() {
            return None;
        }

        Some(GeoPoint2d::latlon(lat, lon).normalized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn pole_projects_to_false_origin() {
        let north = PolarStereographic::ups_north();
        let projected = north
            .project(&GeoPoint2d::latlon(90.0, 0.0))
            .expect("projectable");
        assert_abs_diff_eq!(projected, Point2d::new(2_000_000.0, 2_000_000.0), epsilon = 1e-6);

        let south = PolarStereographic::antarctic();
        let projected = south
            .project(&GeoPoint2d::latlon(-90.0, 0.0))
            .expect("projectable");
        assert_abs_diff_eq!(projected, Point2d::new(0.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn greenwich_orientation() {
        // Greenwich points down from the north pole and up from the south pole.
        let north = PolarStereographic::ups_north()
            .project(&GeoPoint2d::latlon(70.0, 0.0))
            .expect("projectable");
        assert_abs_diff_eq!(north.x, 2_000_000.0, epsilon = 1e-6);
        assert!(north.y < 2_000_000.0);

        let south = PolarStereographic::antarctic()
            .project(&GeoPoint2d::latlon(-70.0, 0.0))
            .expect("projectable");
        assert_abs_diff_eq!(south.x, 0.0, epsilon = 1e-6);
        assert!(south.y > 0.0);
    }

    #[test]
    fn round_trip() {
        let cases = [
            (PolarStereographic::ups_north(), [(60.0, 0.0), (75.5, -120.0), (89.9, 45.0), (61.0, 179.5)]),
            (PolarStereographic::antarctic(), [(-60.0, 0.0), (-71.0, 90.0), (-85.25, -33.0), (-65.0, -179.5)]),
        ];

        for (projection, points) in cases {
            for (lat, lon) in points {
                let point = GeoPoint2d::latlon(lat, lon);
                let projected = projection.project(&point).expect("projectable");
                let back = projection.unproject(&projected).expect("unprojectable");
                assert_abs_diff_eq!(back, point, epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn unproject_origin_returns_pole() {
        let south = PolarStereographic::antarctic();
        let pole = south.unproject(&Point2d::new(0.0, 0.0)).expect("unprojectable");
        assert_abs_diff_eq!(pole, GeoPoint2d::latlon(-90.0, 0.0));
    }
}
