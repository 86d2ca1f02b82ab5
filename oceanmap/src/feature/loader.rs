use std::sync::Weak;

use async_trait::async_trait;
use geojson::GeoJson;
use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::GeometryType;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::api::from_lon_lat;
use crate::error::OceanMapError;
use crate::feature::store::LoadGuard;
use crate::feature::{
    Feature, FeatureClass, FeatureId, FeatureProperties, FeatureStore, Geometry,
    SharedFeatureStore,
};
use crate::projection::ProjectionId;
use crate::tile_source::expand;

const FEATURE_TEMPLATE: &str = "{base}/{path}/{projection}/{resolution}/{extent}/{id}.json";

/// Type of a server feature set. Determines the endpoint it is loaded from and the class of loaded features.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Observation platforms.
    ObservationPoint,
    /// Observation platform tracks.
    ObservationTrack,
    /// Class4 verification points.
    Class4,
    /// Points from a KML file.
    KmlPoint,
    /// Lines from a KML file.
    KmlLine,
    /// Areas from a KML file.
    KmlArea,
}

impl FeatureKind {
    /// Path of the endpoint relative to the API base.
    pub fn path(&self) -> &'static str {
        match self {
            Self::ObservationPoint => "observation/point",
            Self::ObservationTrack => "observation/track",
            Self::Class4 => "class4",
            Self::KmlPoint => "kml/point",
            Self::KmlLine => "kml/line",
            Self::KmlArea => "kml/area",
        }
    }

    /// Short name used as a prefix of stable feature ids.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ObservationPoint => "observation_point",
            Self::ObservationTrack => "observation_track",
            Self::Class4 => "class4",
            Self::KmlPoint => "kml_point",
            Self::KmlLine => "kml_line",
            Self::KmlArea => "kml_area",
        }
    }

    /// Class of features of this kind.
    pub fn class(&self) -> FeatureClass {
        match self {
            Self::ObservationPoint | Self::ObservationTrack => FeatureClass::Observation,
            _ => FeatureClass::Standard,
        }
    }
}

/// Parameters of one server feature load.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRequest {
    /// Feature set type.
    pub kind: FeatureKind,
    /// Feature set id.
    pub id: String,
    /// Projection geometries are stored in.
    pub projection: ProjectionId,
    /// Size of a pixel in projected units at the current view.
    pub resolution: f64,
    /// Visible area in projected units.
    pub extent: Rect,
}

impl FeatureRequest {
    /// URL of the request for the given API base.
    pub fn url(&self, base_url: &str) -> Result<String, OceanMapError> {
        let extent = format!(
            "{:.0},{:.0},{:.0},{:.0}",
            self.extent.x_min, self.extent.y_min, self.extent.x_max, self.extent.y_max
        );
        expand(
            FEATURE_TEMPLATE,
            [
                ("base", base_url.to_string()),
                ("path", self.kind.path().to_string()),
                ("projection", self.projection.code().to_string()),
                ("resolution", format!("{:.0}", self.resolution.round())),
                ("extent", extent),
                ("id", self.id.clone()),
            ],
        )
    }
}

/// Provider of server feature sets.
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
pub trait FeatureSource {
    /// Loads GeoJSON for the request.
    async fn load(&self, request: &FeatureRequest) -> Result<GeoJson, OceanMapError>;
}

/// Loads feature sets from the data server over HTTP.
#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Clone)]
pub struct HttpFeatureSource {
    client: reqwest::Client,
    base_url: String,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpFeatureSource {
    /// Creates a source for the API at the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self, OceanMapError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("oceanmap/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[async_trait]
impl FeatureSource for HttpFeatureSource {
    async fn load(&self, request: &FeatureRequest) -> Result<GeoJson, OceanMapError> {
        let url = request.url(&self.base_url)?;
        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            log::warn!("Failed to load features from {url}: {}", response.status());
            return Err(OceanMapError::IO);
        }

        let text = response.text().await?;
        Ok(text.parse::<GeoJson>()?)
    }
}

/// Handle of a server feature load issued by a surface.
///
/// The ticket remembers the surface generation and the store it was issued for. Its result is applied by
/// [`crate::surface::MapSurface::finish_feature_load`] only if both still match; responses arriving after the
/// surface was reset are discarded. While a ticket is alive, the store reports a pending reload.
#[derive(Debug)]
pub struct LoadTicket {
    generation: u64,
    store: Weak<RwLock<FeatureStore>>,
    request: FeatureRequest,
    _guard: LoadGuard,
}

impl LoadTicket {
    pub(crate) fn new(generation: u64, store: &SharedFeatureStore, request: FeatureRequest) -> Self {
        let guard = store.read().start_load();
        Self {
            generation,
            store: store.downgrade(),
            request,
            _guard: guard,
        }
    }

    /// Generation of the surface the ticket was issued by.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Request parameters.
    pub fn request(&self) -> &FeatureRequest {
        &self.request
    }

    /// Returns `true` if the ticket was issued for the given store and the store is still alive.
    pub fn targets(&self, store: &SharedFeatureStore) -> bool {
        self.store.strong_count() > 0 && store.is_same(&self.store)
    }

    /// Loads and parses the features of the request from the source.
    pub async fn fetch(&self, source: &dyn FeatureSource) -> Result<Vec<Feature>, OceanMapError> {
        let geojson = source.load(&self.request).await?;
        parse_feature_collection(&geojson, &self.request)
    }
}

/// Converts server GeoJSON into features stored in the request projection.
///
/// Features with a `name` (or, failing that, a GeoJSON id) get the stable id `{kind}:{name}`, so that reloading
/// the same feature at another resolution updates it instead of duplicating it. Unsupported geometry types are
/// skipped. Any invalid geometry fails the whole collection.
pub fn parse_feature_collection(
    geojson: &GeoJson,
    request: &FeatureRequest,
) -> Result<Vec<Feature>, OceanMapError> {
    let features: Vec<&geojson::Feature> = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features.iter().collect(),
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => {
            return Err(OceanMapError::Decoding(
                "expected a feature collection".into(),
            ))
        }
    };

    let mut result = Vec::with_capacity(features.len());
    for feature in features {
        if let Some(parsed) = parse_feature(feature, request)? {
            result.push(parsed);
        }
    }

    Ok(result)
}

fn parse_feature(
    feature: &geojson::Feature,
    request: &FeatureRequest,
) -> Result<Option<Feature>, OceanMapError> {
    let Some(geometry) = &feature.geometry else {
        log::debug!("Skipping {} feature without geometry", request.kind.tag());
        return Ok(None);
    };

    let to_planar = |position: &Vec<f64>| from_lon_lat(position, request.projection);
    let geometry = match &geometry.value {
        geojson::Value::Point(position) => Geometry::new(GeometryType::Point, vec![to_planar(position)?])?,
        geojson::Value::LineString(positions) => Geometry::line_string(
            positions.iter().map(to_planar).collect::<Result<Vec<Point2d>, _>>()?,
        )?,
        geojson::Value::Polygon(rings) => {
            let exterior = rings
                .first()
                .ok_or_else(|| OceanMapError::InvalidGeometry("polygon without rings".into()))?;
            Geometry::polygon(exterior.iter().map(to_planar).collect::<Result<Vec<Point2d>, _>>()?)?
        }
        _ => {
            log::debug!("Skipping {} feature with unsupported geometry", request.kind.tag());
            return Ok(None);
        }
    };

    let mut extra = feature.properties.clone().unwrap_or_default();
    let name = take_string(&mut extra, "name");
    let kind = take_string(&mut extra, "type").or_else(|| Some(request.kind.tag().to_string()));
    let error = extra.remove("error").and_then(|v| v.as_f64());
    let server_id = feature
        .id
        .as_ref()
        .map(|id| match id {
            geojson::feature::Id::String(s) => s.clone(),
            geojson::feature::Id::Number(n) => n.to_string(),
        })
        .or_else(|| take_string(&mut extra, "id"));

    let id = match name.as_ref().or(server_id.as_ref()) {
        Some(stable) => FeatureId::new(format!("{}:{stable}", request.kind.tag())),
        None => FeatureId::random(),
    };

    let properties = FeatureProperties {
        name,
        kind,
        server_id,
        error,
        centroid: None,
        resolution: Some(request.resolution),
        extra,
    };

    Ok(Some(
        Feature::new(id, geometry, request.kind.class()).with_properties(properties),
    ))
}

fn take_string(properties: &mut geojson::JsonObject, key: &str) -> Option<String> {
    match properties.remove(key)? {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
