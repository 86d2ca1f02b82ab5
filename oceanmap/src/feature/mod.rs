//! Features drawn by the user or loaded from the data server.
//!
//! Geometry of a feature is stored in planar coordinates of the projection of the store it belongs to. Conversion
//! to and from geographic coordinates happens only at the API boundary, see [`crate::api`].

use std::fmt::{Display, Formatter};

use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::GeometryType;
use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;

mod loader;
mod store;

pub use loader::{
    parse_feature_collection, FeatureKind, FeatureRequest, FeatureSource, LoadTicket,
};
#[cfg(not(target_arch = "wasm32"))]
pub use loader::HttpFeatureSource;
pub use store::{
    FeatureFilter, FeatureStore, RemoveTarget, SharedFeatureStore, UpsertOutcome,
};

/// Stable identifier of a feature.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureId(String);

impl FeatureId {
    /// Creates an id from the given string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a new random id.
    pub fn random() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// String value of the id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FeatureId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FeatureId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for FeatureId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Distinguishes features drawn by the user from read-only observations loaded from the server.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureClass {
    /// Ordinary feature, drawn by the user or loaded from a KML or class4 source.
    #[default]
    Standard,
    /// Observation platform or track.
    Observation,
}

/// Geometry of a feature in planar coordinates.
///
/// Polygon rings are always stored closed: the first vertex is repeated as the last one.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Single point.
    Point(Point2d),
    /// Open polyline.
    LineString(Vec<Point2d>),
    /// Closed ring.
    Polygon(Vec<Point2d>),
}

impl Geometry {
    /// Creates a geometry of the given type. The vertices of a polygon may be given with or without the closing
    /// vertex.
    pub fn new(geometry_type: GeometryType, vertices: Vec<Point2d>) -> Result<Self, OceanMapError> {
        match geometry_type {
            GeometryType::Point => match vertices.as_slice() {
                [point] => Self::point(*point),
                _ => Err(OceanMapError::InvalidGeometry(format!(
                    "point must have exactly one vertex, got {}",
                    vertices.len()
                ))),
            },
            GeometryType::LineString => Self::line_string(vertices),
            GeometryType::Polygon => Self::polygon(vertices),
        }
    }

    /// Creates a point.
    pub fn point(point: Point2d) -> Result<Self, OceanMapError> {
        check_finite(std::slice::from_ref(&point))?;
        Ok(Self::Point(point))
    }

    /// Creates a polyline. At least two distinct vertices are required.
    pub fn line_string(vertices: Vec<Point2d>) -> Result<Self, OceanMapError> {
        check_finite(&vertices)?;
        check_distinct(&vertices, GeometryType::LineString)?;
        Ok(Self::LineString(vertices))
    }

    /// Creates a polygon, closing the ring if necessary. At least three distinct vertices are required.
    pub fn polygon(mut vertices: Vec<Point2d>) -> Result<Self, OceanMapError> {
        check_finite(&vertices)?;
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        check_distinct(&vertices, GeometryType::Polygon)?;

        let first = vertices[0];
        vertices.push(first);
        Ok(Self::Polygon(vertices))
    }

    /// Type of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        match self {
            Self::Point(_) => GeometryType::Point,
            Self::LineString(_) => GeometryType::LineString,
            Self::Polygon(_) => GeometryType::Polygon,
        }
    }

    /// Vertices as stored, including the closing vertex of a polygon.
    pub fn stored_vertices(&self) -> &[Point2d] {
        match self {
            Self::Point(point) => std::slice::from_ref(point),
            Self::LineString(vertices) | Self::Polygon(vertices) => vertices,
        }
    }

    /// Vertices as exposed to callers: polygon rings lose their closing vertex.
    pub fn coordinates(&self) -> &[Point2d] {
        match self {
            Self::Polygon(vertices) => &vertices[..vertices.len().saturating_sub(1)],
            _ => self.stored_vertices(),
        }
    }

    /// Bounding rectangle of the geometry.
    pub fn bounding_rect(&self) -> Option<Rect> {
        Rect::from_points(self.stored_vertices().iter())
    }

    /// Area centroid of a polygon. For other geometries and degenerate polygons, the mean of the vertices.
    pub fn centroid(&self) -> Option<Point2d> {
        let vertices = self.coordinates();
        if vertices.is_empty() {
            return None;
        }

        if let Self::Polygon(ring) = self {
            let mut area = 0.0;
            let mut cx = 0.0;
            let mut cy = 0.0;
            // Relative to the first vertex to keep precision with large planar values.
            let origin = ring[0];
            for pair in ring.windows(2) {
                let (a, b) = (pair[0] - origin, pair[1] - origin);
                let cross = a.x * b.y - b.x * a.y;
                area += cross;
                cx += (a.x + b.x) * cross;
                cy += (a.y + b.y) * cross;
            }

            if area.abs() > f64::EPSILON {
                return Some(Point2d::new(
                    origin.x + cx / (3.0 * area),
                    origin.y + cy / (3.0 * area),
                ));
            }
        }

        let count = vertices.len() as f64;
        let (sx, sy) = vertices
            .iter()
            .fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        Some(Point2d::new(sx / count, sy / count))
    }
}

fn check_finite(vertices: &[Point2d]) -> Result<(), OceanMapError> {
    if vertices.iter().all(|p| p.x.is_finite() && p.y.is_finite()) {
        Ok(())
    } else {
        Err(OceanMapError::InvalidGeometry(
            "coordinates must be finite".into(),
        ))
    }
}

fn check_distinct(vertices: &[Point2d], geometry_type: GeometryType) -> Result<(), OceanMapError> {
    let mut distinct: Vec<&Point2d> = Vec::with_capacity(vertices.len());
    for vertex in vertices {
        if !distinct.contains(&vertex) {
            distinct.push(vertex);
        }
    }

    let required = geometry_type.min_vertices();
    if distinct.len() < required {
        return Err(OceanMapError::InvalidGeometry(format!(
            "{geometry_type} requires at least {required} distinct vertices, got {}",
            distinct.len()
        )));
    }

    Ok(())
}

/// Display properties of a feature.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureProperties {
    /// Human readable name. Loaded features use it to derive their stable id.
    pub name: Option<String>,
    /// Type tag: `point`, `line` or `area` for drawn features, feature kind for loaded ones.
    pub kind: Option<String>,
    /// Identifier of the feature on the data server.
    pub server_id: Option<String>,
    /// Error metric of class4 features.
    pub error: Option<f64>,
    /// Centroid of a polygon.
    pub centroid: Option<Point2d>,
    /// Resolution the geometry was loaded at, in projected units per pixel.
    pub resolution: Option<f64>,
    /// Any other properties.
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Type tag given to drawn features.
pub fn type_tag(geometry_type: GeometryType) -> &'static str {
    match geometry_type {
        GeometryType::Point => "point",
        GeometryType::LineString => "line",
        GeometryType::Polygon => "area",
    }
}

/// A geometry with an id and display properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: FeatureId,
    geometry: Geometry,
    class: FeatureClass,
    properties: FeatureProperties,
}

impl Feature {
    /// Creates a new feature with empty properties.
    pub fn new(id: FeatureId, geometry: Geometry, class: FeatureClass) -> Self {
        Self {
            id,
            geometry,
            class,
            properties: FeatureProperties::default(),
        }
        .with_properties(FeatureProperties::default())
    }

    /// Creates a feature drawn by the user, with a fresh id and a type tag.
    pub fn drawn(geometry: Geometry) -> Self {
        let kind = type_tag(geometry.geometry_type()).to_string();
        Self::new(FeatureId::random(), geometry, FeatureClass::Standard).with_properties(
            FeatureProperties {
                kind: Some(kind),
                ..Default::default()
            },
        )
    }

    /// Replaces the properties of the feature. Centroid of polygons is recomputed.
    pub fn with_properties(mut self, mut properties: FeatureProperties) -> Self {
        properties.centroid = match self.geometry {
            Geometry::Polygon(_) => self.geometry.centroid(),
            _ => None,
        };
        self.properties = properties;
        self
    }

    /// Id of the feature.
    pub fn id(&self) -> &FeatureId {
        &self.id
    }

    /// Geometry of the feature.
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Type of the geometry.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry.geometry_type()
    }

    /// Class of the feature.
    pub fn class(&self) -> FeatureClass {
        self.class
    }

    /// Returns `true` for read-only observation features.
    pub fn is_observation(&self) -> bool {
        self.class == FeatureClass::Observation
    }

    /// Display properties.
    pub fn properties(&self) -> &FeatureProperties {
        &self.properties
    }

    /// Coordinates exposed to callers, without the closing vertex of polygons.
    pub fn coordinates(&self) -> &[Point2d] {
        self.geometry.coordinates()
    }

    /// Resolution the feature was loaded at, if it was loaded from the server.
    pub fn resolution(&self) -> Option<f64> {
        self.properties.resolution
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    fn p(x: f64, y: f64) -> Point2d {
        Point2d::new(x, y)
    }

    #[test]
    fn polygon_is_closed_on_construction() {
        let polygon = Geometry::polygon(vec![p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0)]).expect("valid");
        assert_eq!(polygon.stored_vertices().len(), 4);
        assert_eq!(polygon.stored_vertices().first(), polygon.stored_vertices().last());
        assert_eq!(polygon.coordinates(), &[p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0)]);

        let closed = Geometry::polygon(vec![p(0.0, 0.0), p(4.0, 0.0), p(0.0, 4.0), p(0.0, 0.0)])
            .expect("valid");
        assert_eq!(closed, polygon);
    }

    #[test]
    fn too_few_vertices_are_rejected() {
        assert_matches!(
            Geometry::polygon(vec![p(0.0, 0.0), p(1.0, 1.0), p(0.0, 0.0)]),
            Err(OceanMapError::InvalidGeometry(_))
        );
        assert_matches!(
            Geometry::line_string(vec![p(1.0, 1.0), p(1.0, 1.0)]),
            Err(OceanMapError::InvalidGeometry(_))
        );
        assert_matches!(
            Geometry::new(GeometryType::Point, vec![]),
            Err(OceanMapError::InvalidGeometry(_))
        );
        assert_matches!(
            Geometry::point(p(f64::NAN, 0.0)),
            Err(OceanMapError::InvalidGeometry(_))
        );
    }

    #[test]
    fn polygon_centroid() {
        let square = Geometry::polygon(vec![p(10.0, 10.0), p(12.0, 10.0), p(12.0, 12.0), p(10.0, 12.0)])
            .expect("valid");
        assert_abs_diff_eq!(square.centroid().expect("not empty"), p(11.0, 11.0), epsilon = 1e-9);

        let feature = Feature::drawn(square);
        assert_eq!(feature.properties().kind.as_deref(), Some("area"));
        assert!(feature.properties().centroid.is_some());
    }

    #[test]
    fn drawn_features_get_unique_ids() {
        let a = Feature::drawn(Geometry::point(p(0.0, 0.0)).expect("valid"));
        let b = Feature::drawn(Geometry::point(p(0.0, 0.0)).expect("valid"));
        assert_ne!(a.id(), b.id());
        assert_eq!(a.class(), FeatureClass::Standard);
    }
}
