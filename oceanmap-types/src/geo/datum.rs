/// Reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Datum {
    semimajor: f64,
    inv_flattening: f64,
}

impl Datum {
    /// WGS84 ellipsoid.
    pub const WGS84: Self = Datum {
        semimajor: 6_378_137.0,
        inv_flattening: 298.257223563,
    };

    /// Semi-major axis in metres.
    pub fn semimajor(&self) -> f64 {
        self.semimajor
    }

    /// Inverse flattening of the ellipsoid.
    pub fn inv_flattening(&self) -> f64 {
        self.inv_flattening
    }

    /// First eccentricity of the ellipsoid.
    pub fn eccentricity(&self) -> f64 {
        let f = 1.0 / self.inv_flattening;
        (2.0 * f - f * f).sqrt()
    }
}

impl Default for Datum {
    fn default() -> Self {
        Self::WGS84
    }
}
