//! Registry of the map projections supported by the engine.
//!
//! Every surface works in exactly one of three projections: spherical Web Mercator (EPSG:3857), Universal Polar
//! Stereographic North (EPSG:32661) and Antarctic Polar Stereographic (EPSG:3031). [`ProjectionId`] is a closed
//! enum, so once a projection code was parsed, any lookup in the registry succeeds.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::geo::{GeoPoint2d, PolarStereographic, Projection, WebMercator};
use oceanmap_types::latlon;
use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;

/// Half of the equator length of the Web Mercator plane.
const MERCATOR_HALF_WIDTH: f64 = 20037508.342789244;

/// Identifier of a supported projection.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ProjectionId {
    /// Spherical Web Mercator.
    #[default]
    Epsg3857,
    /// North polar stereographic (UPS North).
    Epsg32661,
    /// South polar stereographic.
    Epsg3031,
}

impl ProjectionId {
    /// All supported projections.
    pub const ALL: [ProjectionId; 3] = [Self::Epsg3857, Self::Epsg32661, Self::Epsg3031];

    /// Parses a projection code like `EPSG:3031`. Case of the authority prefix is ignored.
    pub fn from_code(code: &str) -> Result<Self, OceanMapError> {
        let normalized = code.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|id| id.code() == normalized)
            .ok_or_else(|| OceanMapError::UnknownProjection(code.to_string()))
    }

    /// Projection code, e.g. `EPSG:3857`.
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Epsg3857 => "EPSG:3857",
            Self::Epsg32661 => "EPSG:32661",
            Self::Epsg3031 => "EPSG:3031",
        }
    }

    /// Returns `true` for the two polar stereographic projections.
    pub fn is_polar(&self) -> bool {
        !matches!(self, Self::Epsg3857)
    }

    /// Registry entry of the projection.
    pub fn info(&self) -> &'static ProjectionInfo {
        get_projection(*self)
    }

    /// Transformation between geographic and planar coordinates.
    pub fn projection(&self) -> Box<dyn Projection> {
        match self {
            Self::Epsg3857 => Box::new(WebMercator::default()),
            Self::Epsg32661 => Box::new(PolarStereographic::ups_north()),
            Self::Epsg3031 => Box::new(PolarStereographic::antarctic()),
        }
    }

    /// Projects a geographic point into planar coordinates of this projection.
    pub fn project(&self, point: &GeoPoint2d) -> Option<Point2d> {
        self.projection().project(point)
    }

    /// Converts planar coordinates of this projection into a geographic point.
    pub fn unproject(&self, point: &Point2d) -> Option<GeoPoint2d> {
        self.projection().unproject(point)
    }
}

impl Display for ProjectionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for ProjectionId {
    type Err = OceanMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

impl TryFrom<String> for ProjectionId {
    type Error = OceanMapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_code(&value)
    }
}

impl From<ProjectionId> for String {
    fn from(value: ProjectionId) -> Self {
        value.code().to_string()
    }
}

/// Static description of a projection: default view and extents.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectionInfo {
    /// Projection this entry describes.
    pub id: ProjectionId,
    /// Default center of the view.
    pub center: GeoPoint2d,
    /// Default zoom level.
    pub zoom: f64,
    /// Minimum allowed zoom level.
    pub min_zoom: f64,
    /// Maximum allowed zoom level.
    pub max_zoom: f64,
    /// Area where the projection is valid, in degrees (`x` is longitude, `y` is latitude).
    pub world_extent: Rect,
    /// Area covered by the tile grid, in projected metres.
    pub planar_extent: Rect,
}

impl ProjectionInfo {
    /// Size of one pixel in projected units at the given zoom level.
    pub fn resolution(&self, zoom: f64, tile_size: u32) -> f64 {
        self.planar_extent.width() / (tile_size as f64 * 2f64.powf(zoom))
    }

    /// Zoom level at which one pixel has the given size.
    pub fn zoom_for_resolution(&self, resolution: f64, tile_size: u32) -> f64 {
        (self.planar_extent.width() / (tile_size as f64 * resolution)).log2()
    }

    /// Clamps the zoom level into the allowed range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min_zoom, self.max_zoom)
    }

    /// Returns `true` if the geographic point lies inside the world extent.
    pub fn covers(&self, point: &GeoPoint2d) -> bool {
        self.world_extent
            .contains(&Point2d::new(point.lon(), point.lat()))
    }
}

static PROJECTIONS: [ProjectionInfo; 3] = [
    ProjectionInfo {
        id: ProjectionId::Epsg3857,
        center: latlon!(53.0, -50.0),
        zoom: 4.0,
        min_zoom: 1.0,
        max_zoom: 12.0,
        world_extent: Rect::new(-180.0, -85.06, 180.0, 85.06),
        planar_extent: Rect::new(
            -MERCATOR_HALF_WIDTH,
            -MERCATOR_HALF_WIDTH,
            MERCATOR_HALF_WIDTH,
            MERCATOR_HALF_WIDTH,
        ),
    },
    ProjectionInfo {
        id: ProjectionId::Epsg32661,
        center: latlon!(90.0, 0.0),
        zoom: 2.0,
        min_zoom: 2.0,
        max_zoom: 10.0,
        world_extent: Rect::new(-180.0, 60.0, 180.0, 90.0),
        planar_extent: Rect::new(
            -1154826.7379766018,
            -1154826.7379766018,
            5154826.737976601,
            5154826.737976601,
        ),
    },
    ProjectionInfo {
        id: ProjectionId::Epsg3031,
        center: latlon!(-90.0, 0.0),
        zoom: 2.0,
        min_zoom: 2.0,
        max_zoom: 10.0,
        world_extent: Rect::new(-180.0, -90.0, 180.0, -60.0),
        planar_extent: Rect::new(
            -3087442.3458218463,
            -3087442.3458218463,
            3087442.3458218463,
            3087442.3458218463,
        ),
    },
];

/// Returns registry entry for the projection.
pub fn get_projection(id: ProjectionId) -> &'static ProjectionInfo {
    match id {
        ProjectionId::Epsg3857 => &PROJECTIONS[0],
        ProjectionId::Epsg32661 => &PROJECTIONS[1],
        ProjectionId::Epsg3031 => &PROJECTIONS[2],
    }
}
