//! Construction of tile source configurations from dataset descriptors and map settings.
//!
//! All functions in this module are pure: the same inputs always produce the same templates, so the resulting
//! URLs are cacheable. Installing a source into a live layer is the job of [`crate::surface::MapSurface`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;
use crate::projection::ProjectionId;

mod basemap;
mod data;

pub use basemap::{build_basemap_layer, BasemapLayer, BASEMAP_Z_INDEX, CHART_Z_INDEX};
pub use data::{
    build_bathymetry_boundary_source, build_bathymetry_source, build_data_tile_source,
    build_land_source, build_quiver_source, QuiverSource,
};

/// Index of a tile in the tile grid of a projection.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Hash, Serialize, Deserialize)]
pub struct TileIndex {
    /// X index.
    pub x: i32,
    /// Y index.
    pub y: i32,
    /// Z index.
    pub z: u32,
}

impl TileIndex {
    /// Create a new index instance.
    pub fn new(x: i32, y: i32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Returns `true` if the index is inside the tile grid of its zoom level.
    pub fn is_valid(&self) -> bool {
        let count = 1i64 << self.z.min(31);
        (0..count).contains(&(self.x as i64)) && (0..count).contains(&(self.y as i64))
    }
}

/// Encoding of tiles returned by an endpoint.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileFormat {
    /// Raster image.
    Raster,
    /// Mapbox vector tile.
    Mvt,
    /// GeoJSON feature collection per tile.
    GeoJson,
}

/// Credit shown for a tile source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribution {
    text: String,
    url: Option<String>,
}

impl Attribution {
    /// Creates a new attribution.
    pub fn new(text: impl Into<String>, url: Option<String>) -> Self {
        Self {
            text: text.into(),
            url,
        }
    }

    /// Attribution text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Link to the source, if any.
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

/// Templated tile endpoint.
///
/// The template keeps `{z}`, `{x}` and `{y}` placeholders, which are expanded by [`TileSource::tile_url`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileSource {
    template: String,
    projection: ProjectionId,
    source_projection: ProjectionId,
    format: TileFormat,
    attribution: Option<Attribution>,
}

impl TileSource {
    /// Creates a source whose tiles are served in the projection of the surface.
    pub fn new(template: impl Into<String>, projection: ProjectionId, format: TileFormat) -> Self {
        Self {
            template: template.into(),
            projection,
            source_projection: projection,
            format,
            attribution: None,
        }
    }

    /// Sets the projection tiles are served in, if it differs from the surface projection.
    pub fn with_source_projection(mut self, source_projection: ProjectionId) -> Self {
        self.source_projection = source_projection;
        self
    }

    /// Sets the attribution.
    pub fn with_attribution(mut self, attribution: Option<Attribution>) -> Self {
        self.attribution = attribution;
        self
    }

    /// URL template with `{z}/{x}/{y}` placeholders.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Projection of the surface the source is built for.
    pub fn projection(&self) -> ProjectionId {
        self.projection
    }

    /// Projection the server renders tiles in.
    pub fn source_projection(&self) -> ProjectionId {
        self.source_projection
    }

    /// Returns `true` if tiles must be reprojected on the client.
    pub fn needs_reprojection(&self) -> bool {
        self.projection != self.source_projection
    }

    /// Tile encoding.
    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Attribution of the source.
    pub fn attribution(&self) -> Option<&Attribution> {
        self.attribution.as_ref()
    }

    /// URL of the tile with the given index.
    pub fn tile_url(&self, index: TileIndex) -> Result<String, OceanMapError> {
        expand(
            &self.template,
            [
                ("z", index.z.to_string()),
                ("x", index.x.to_string()),
                ("y", index.y.to_string()),
            ],
        )
    }
}

/// Fills named placeholders of the template.
pub(crate) fn expand<'a>(
    template: &str,
    params: impl IntoIterator<Item = (&'a str, String)>,
) -> Result<String, OceanMapError> {
    let vars: HashMap<String, String> = params
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect();
    Ok(strfmt::strfmt(template, &vars)?)
}

/// Parameters that leave tile grid placeholders in place when a source template is built.
pub(crate) fn tile_placeholders() -> [(&'static str, String); 3] {
    [
        ("z", "{z}".to_string()),
        ("x", "{x}".to_string()),
        ("y", "{y}".to_string()),
    ]
}
