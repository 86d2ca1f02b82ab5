//! Conversion between planar feature geometry and coordinates exchanged with the host application and the server.
//!
//! Inside the engine, geometry is always planar (`x`, `y` of the active projection). The host and the data server
//! exchange `[lat, lon]` pairs, while GeoJSON positions are `[lon, lat]`. These functions are the only places where
//! coordinates cross that boundary.

use oceanmap_types::cartesian::Point2d;
use oceanmap_types::geo::GeoPoint2d;
use oceanmap_types::GeometryType;
use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;
use crate::feature::{type_tag, Feature, FeatureClass, FeatureId, FeatureProperties, Geometry};
use crate::projection::ProjectionId;

/// Geographic coordinate in API order: `[lat, lon]` in degrees.
pub type ApiCoordinate = [f64; 2];

/// Converts planar points into `[lat, lon]` pairs. Returns `None` if any point cannot be unprojected.
///
/// Longitudes are wrapped into `[-180, 180]`, so points placed past the antimeridian of a Mercator world come out
/// in canonical form.
pub fn to_api(points: &[Point2d], projection: ProjectionId) -> Option<Vec<ApiCoordinate>> {
    let transform = projection.projection();
    points
        .iter()
        .map(|point| {
            transform.unproject(point).map(|geo| {
                let geo = geo.normalized();
                [geo.lat(), geo.lon()]
            })
        })
        .collect()
}

/// Converts `[lat, lon]` pairs into planar points of the projection.
pub fn from_api(
    coordinates: &[ApiCoordinate],
    projection: ProjectionId,
) -> Result<Vec<Point2d>, OceanMapError> {
    let transform = projection.projection();
    coordinates
        .iter()
        .map(|&[lat, lon]| project_checked(transform.as_ref(), GeoPoint2d::latlon(lat, lon), projection))
        .collect()
}

/// Converts a GeoJSON position (`[lon, lat, ...]`) into a planar point.
pub(crate) fn from_lon_lat(position: &[f64], projection: ProjectionId) -> Result<Point2d, OceanMapError> {
    match position {
        [lon, lat, ..] => project_checked(
            projection.projection().as_ref(),
            GeoPoint2d::lonlat(*lon, *lat),
            projection,
        ),
        _ => Err(OceanMapError::InvalidGeometry(format!(
            "position must have at least 2 values, got {}",
            position.len()
        ))),
    }
}

fn project_checked(
    transform: &dyn oceanmap_types::geo::Projection,
    point: GeoPoint2d,
    projection: ProjectionId,
) -> Result<Point2d, OceanMapError> {
    if !(-90.0..=90.0).contains(&point.lat()) {
        return Err(OceanMapError::InvalidGeometry(format!(
            "latitude {} is out of range",
            point.lat()
        )));
    }

    transform.project(&point).ok_or_else(|| {
        OceanMapError::InvalidGeometry(format!(
            "point ({}, {}) cannot be projected into {projection}",
            point.lat(),
            point.lon()
        ))
    })
}

/// Creates a feature from `[lat, lon]` coordinates.
pub fn feature_from_api(
    id: Option<FeatureId>,
    geometry_type: GeometryType,
    coordinates: &[ApiCoordinate],
    class: FeatureClass,
    projection: ProjectionId,
) -> Result<Feature, OceanMapError> {
    let geometry = Geometry::new(geometry_type, from_api(coordinates, projection)?)?;
    let properties = FeatureProperties {
        kind: Some(type_tag(geometry_type).to_string()),
        ..Default::default()
    };

    Ok(Feature::new(id.unwrap_or_else(FeatureId::random), geometry, class).with_properties(properties))
}

/// Description of a feature sent to the host application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDescriptor {
    /// Feature id.
    pub id: FeatureId,
    /// Type of the geometry.
    pub geometry_type: GeometryType,
    /// Coordinates in `[lat, lon]` order, without the closing vertex of polygons.
    pub coordinates: Vec<ApiCoordinate>,
    /// Class of the feature.
    pub class: FeatureClass,
    /// Id of the feature on the data server.
    pub server_id: Option<String>,
    /// Name of the feature.
    pub name: Option<String>,
    /// Type tag of the feature.
    pub kind: Option<String>,
    /// Centroid of a polygon in `[lat, lon]` order.
    pub centroid: Option<ApiCoordinate>,
}

impl FeatureDescriptor {
    /// Describes a feature stored in the given projection.
    pub fn from_feature(feature: &Feature, projection: ProjectionId) -> Option<Self> {
        let properties = feature.properties();
        let centroid = match properties.centroid {
            Some(centroid) => Some(to_api(&[centroid], projection)?[0]),
            None => None,
        };

        Some(Self {
            id: feature.id().clone(),
            geometry_type: feature.geometry_type(),
            coordinates: to_api(feature.coordinates(), projection)?,
            class: feature.class(),
            server_id: properties.server_id.clone(),
            name: properties.name.clone(),
            kind: properties.kind.clone(),
            centroid,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use assert_matches::assert_matches;

    const AREA: [ApiCoordinate; 3] = [[10.0, 10.0], [10.0, 20.0], [20.0, 15.0]];

    #[test]
    fn api_order_is_lat_lon() {
        let planar = from_api(&[[10.0, 20.0]], ProjectionId::Epsg3857).expect("valid");
        let expected = ProjectionId::Epsg3857
            .project(&GeoPoint2d::latlon(10.0, 20.0))
            .expect("projectable");
        assert_abs_diff_eq!(planar[0], expected);
        // Longitude maps to x.
        assert!(planar[0].x > planar[0].y);
    }

    #[test]
    fn longitude_past_antimeridian_is_wrapped() {
        let world = from_api(&[[0.0, 180.0]], ProjectionId::Epsg3857).expect("valid")[0].x;
        let east = from_api(&[[30.0, 170.0]], ProjectionId::Epsg3857).expect("valid")[0];

        let beyond = [Point2d::new(east.x + world / 2.0, east.y), Point2d::new(-world * 1.5, 0.0)];
        let api = to_api(&beyond, ProjectionId::Epsg3857).expect("unprojectable");

        assert_abs_diff_eq!(api[0][0], 30.0, epsilon = 1e-9);
        assert_abs_diff_eq!(api[0][1], -100.0, epsilon = 1e-9);
        assert_abs_diff_eq!(api[1][1], 90.0, epsilon = 1e-9);
    }

    #[test]
    fn round_trip_through_every_projection() {
        let cases = [
            (ProjectionId::Epsg3857, AREA.to_vec()),
            (ProjectionId::Epsg32661, vec![[70.0, 10.0], [75.0, -80.0], [80.0, 170.0]]),
            (ProjectionId::Epsg3031, vec![[-70.0, 10.0], [-75.0, -80.0], [-80.0, 170.0]]),
        ];

        for (projection, coordinates) in cases {
            let planar = from_api(&coordinates, projection).expect("valid");
            let back = to_api(&planar, projection).expect("unprojectable");
            for (a, b) in back.iter().zip(&coordinates) {
                assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-6);
                assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-6);
            }
        }
    }

    #[test]
    fn geojson_order_is_lon_lat() {
        let from_geojson = from_lon_lat(&[20.0, 10.0], ProjectionId::Epsg3857).expect("valid");
        let from_host = from_api(&[[10.0, 20.0]], ProjectionId::Epsg3857).expect("valid");
        assert_abs_diff_eq!(from_geojson, from_host[0]);
        assert_matches!(
            from_lon_lat(&[20.0], ProjectionId::Epsg3857),
            Err(OceanMapError::InvalidGeometry(_))
        );
    }

    #[test]
    fn unprojectable_points_are_rejected() {
        assert_matches!(
            from_api(&[[90.0, 0.0]], ProjectionId::Epsg3857),
            Err(OceanMapError::InvalidGeometry(_))
        );
        assert_matches!(
            from_api(&[[95.0, 0.0]], ProjectionId::Epsg32661),
            Err(OceanMapError::InvalidGeometry(_))
        );
    }

    #[test]
    fn descriptor_strips_closing_vertex() {
        let feature = feature_from_api(
            Some("area".into()),
            GeometryType::Polygon,
            &AREA,
            FeatureClass::Standard,
            ProjectionId::Epsg3857,
        )
        .expect("valid");
        assert_eq!(feature.geometry().stored_vertices().len(), 4);

        let descriptor = FeatureDescriptor::from_feature(&feature, ProjectionId::Epsg3857).expect("valid");
        assert_eq!(descriptor.id.as_str(), "area");
        assert_eq!(descriptor.kind.as_deref(), Some("area"));
        assert_eq!(descriptor.coordinates.len(), 3);
        for (a, b) in descriptor.coordinates.iter().zip(&AREA) {
            assert_abs_diff_eq!(a[0], b[0], epsilon = 1e-9);
            assert_abs_diff_eq!(a[1], b[1], epsilon = 1e-9);
        }
        assert!(descriptor.centroid.is_some());
    }
}
