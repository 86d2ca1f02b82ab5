use crate::error::OceanMapError;
use crate::projection::ProjectionId;
use crate::settings::BasemapChoice;
use crate::tile_source::{expand, tile_placeholders, Attribution, TileFormat, TileSource};

/// Z-index of the base map, below the data layer.
pub const BASEMAP_Z_INDEX: i32 = 0;
/// Z-index of the nautical chart base map, above the data layer.
pub const CHART_Z_INDEX: i32 = 2;

const TOPO_TEMPLATE: &str = "{base}/tiles/topo/{projection}/{z}/{x}/{y}.png?shaded_relief={shaded_relief}";
const OCEAN_TEMPLATE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/Ocean/World_Ocean_Base/MapServer/tile/{z}/{y}/{x}";
const WORLD_TEMPLATE: &str =
    "https://server.arcgisonline.com/ArcGIS/rest/services/World_Imagery/MapServer/tile/{z}/{y}/{x}";
const CHART_TEMPLATE: &str = "https://tileservice.charts.noaa.gov/tiles/50000_1/{z}/{x}/{y}.png";

/// Base map layer configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasemapLayer {
    /// Tile endpoint.
    pub source: TileSource,
    /// Position in the layer stack.
    pub z_index: i32,
    /// Whether land and bathymetry boundary overlays should be shown together with this base map.
    pub overlays_enabled: bool,
}

/// Builds the base map for the given style and projection.
///
/// Third-party base maps are served in Web Mercator only; on polar surfaces their source carries EPSG:3857 as
/// the source projection so tiles get reprojected. The nautical chart is drawn above the data layer and disables
/// land and bathymetry overlays.
pub fn build_basemap_layer(
    base_url: &str,
    choice: BasemapChoice,
    projection: ProjectionId,
    attribution: Option<Attribution>,
    shaded_relief: bool,
) -> Result<BasemapLayer, OceanMapError> {
    let layer = match choice {
        BasemapChoice::Topo => {
            let params = [
                ("base", base_url.to_string()),
                ("projection", projection.code().to_string()),
                ("shaded_relief", shaded_relief.to_string()),
            ];
            let template = expand(TOPO_TEMPLATE, params.into_iter().chain(tile_placeholders()))?;
            BasemapLayer {
                source: TileSource::new(template, projection, TileFormat::Raster)
                    .with_attribution(attribution),
                z_index: BASEMAP_Z_INDEX,
                overlays_enabled: true,
            }
        }
        BasemapChoice::Ocean => BasemapLayer {
            source: mercator_source(OCEAN_TEMPLATE, projection).with_attribution(Some(
                attribution.unwrap_or_else(|| esri_attribution("Esri, GEBCO, NOAA, National Geographic")),
            )),
            z_index: BASEMAP_Z_INDEX,
            overlays_enabled: true,
        },
        BasemapChoice::World => BasemapLayer {
            source: mercator_source(WORLD_TEMPLATE, projection).with_attribution(Some(
                attribution.unwrap_or_else(|| esri_attribution("Esri, Maxar, Earthstar Geographics")),
            )),
            z_index: BASEMAP_Z_INDEX,
            overlays_enabled: true,
        },
        BasemapChoice::Chart => BasemapLayer {
            source: mercator_source(CHART_TEMPLATE, projection).with_attribution(Some(
                attribution.unwrap_or_else(|| {
                    Attribution::new(
                        "NOAA Office of Coast Survey",
                        Some("https://nauticalcharts.noaa.gov".to_string()),
                    )
                }),
            )),
            z_index: CHART_Z_INDEX,
            overlays_enabled: false,
        },
    };

    Ok(layer)
}

fn mercator_source(template: &str, projection: ProjectionId) -> TileSource {
    TileSource::new(template, projection, TileFormat::Raster)
        .with_source_projection(ProjectionId::Epsg3857)
}

fn esri_attribution(providers: &str) -> Attribution {
    Attribution::new(
        format!("Tiles © Esri. Sources: {providers}"),
        Some("https://www.arcgis.com".to_string()),
    )
}
