use crate::error::OceanMapError;
use crate::projection::ProjectionId;
use crate::settings::{ContourLayer, DatasetView, MapSettings};
use crate::tile_source::{expand, tile_placeholders, TileFormat, TileSource};

const DATA_TEMPLATE: &str = "{base}/tiles/{interp}/{radius}/{neighbours}/{projection}/{dataset}/{variable}/{time}/{depth}/{scale}/{mask}/{display},{colormap}/{z}/{x}/{y}.png";
const QUIVER_TEMPLATE: &str = "{base}/tiles/quiver/{dataset}/{variable}/{time}/{depth}/{density}/{projection}/{z}/{x}/{y}.geojson";
const LAND_TEMPLATE: &str = "{base}/mbt/{projection}/lands/{z}/{x}/{y}";
const BATHYMETRY_BOUNDARY_TEMPLATE: &str = "{base}/mbt/{projection}/{layer}/{z}/{x}/{y}";
const BATHYMETRY_TEMPLATE: &str = "{base}/tiles/bath/{projection}/{z}/{x}/{y}.png";

/// Vector field tiles with the parameters arrows are styled by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuiverSource {
    /// Tile endpoint.
    pub source: TileSource,
    /// Variable of the vector field.
    pub variable: String,
    /// Arrow density.
    pub density: i32,
}

/// Builds the source of the data layer.
pub fn build_data_tile_source(
    base_url: &str,
    dataset: &DatasetView,
    settings: &MapSettings,
) -> Result<TileSource, OceanMapError> {
    dataset.validate()?;

    let interpolation = &settings.interpolation;
    let params = [
        ("base", base_url.to_string()),
        ("interp", interpolation.method.as_str().to_string()),
        ("radius", interpolation.radius.to_string()),
        ("neighbours", interpolation.neighbours.to_string()),
        ("projection", settings.projection.code().to_string()),
        ("dataset", dataset.dataset.clone()),
        ("variable", dataset.variable.clone()),
        ("time", dataset.time.to_string()),
        ("depth", dataset.depth.to_string()),
        ("scale", dataset.scale.to_url_segment()),
        ("mask", u8::from(dataset.mask).to_string()),
        ("display", dataset.display.as_str().to_string()),
        ("colormap", dataset.colormap.clone()),
    ];

    let template = expand(DATA_TEMPLATE, params.into_iter().chain(tile_placeholders()))?;
    Ok(TileSource::new(template, settings.projection, TileFormat::Raster))
}

/// Builds the source of the quiver layer. Returns `None` if the dataset has no vector field selected.
pub fn build_quiver_source(
    base_url: &str,
    dataset: &DatasetView,
    settings: &MapSettings,
) -> Result<Option<QuiverSource>, OceanMapError> {
    if !dataset.quiver.is_enabled() {
        return Ok(None);
    }
    dataset.validate()?;

    let params = [
        ("base", base_url.to_string()),
        ("dataset", dataset.dataset.clone()),
        ("variable", dataset.quiver.variable.clone()),
        ("time", dataset.time.to_string()),
        ("depth", dataset.depth.to_string()),
        ("density", dataset.quiver.density.to_string()),
        ("projection", settings.projection.code().to_string()),
    ];

    let template = expand(QUIVER_TEMPLATE, params.into_iter().chain(tile_placeholders()))?;
    Ok(Some(QuiverSource {
        source: TileSource::new(template, settings.projection, TileFormat::GeoJson),
        variable: dataset.quiver.variable.clone(),
        density: dataset.quiver.density,
    }))
}

/// Builds the source of land boundaries.
pub fn build_land_source(base_url: &str, projection: ProjectionId) -> Result<TileSource, OceanMapError> {
    let params = [
        ("base", base_url.to_string()),
        ("projection", projection.code().to_string()),
    ];
    let template = expand(LAND_TEMPLATE, params.into_iter().chain(tile_placeholders()))?;
    Ok(TileSource::new(template, projection, TileFormat::Mvt))
}

/// Builds the source of bathymetry contours or depth bands.
pub fn build_bathymetry_boundary_source(
    base_url: &str,
    projection: ProjectionId,
    layer: ContourLayer,
) -> Result<TileSource, OceanMapError> {
    let params = [
        ("base", base_url.to_string()),
        ("projection", projection.code().to_string()),
        ("layer", layer.path().to_string()),
    ];
    let template = expand(
        BATHYMETRY_BOUNDARY_TEMPLATE,
        params.into_iter().chain(tile_placeholders()),
    )?;
    Ok(TileSource::new(template, projection, TileFormat::Mvt))
}

/// Builds the source of the bathymetry raster.
pub fn build_bathymetry_source(
    base_url: &str,
    projection: ProjectionId,
) -> Result<TileSource, OceanMapError> {
    let params = [
        ("base", base_url.to_string()),
        ("projection", projection.code().to_string()),
    ];
    let template = expand(BATHYMETRY_TEMPLATE, params.into_iter().chain(tile_placeholders()))?;
    Ok(TileSource::new(template, projection, TileFormat::Raster))
}
