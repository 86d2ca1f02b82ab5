//! Map-wide settings and per-surface dataset descriptors.
//!
//! [`MapSettings`] are shared by both surfaces and owned by the host application. [`DatasetView`] describes what
//! a single surface displays and is replaced as a whole whenever the user picks another dataset, variable, time or
//! depth.

use oceanmap_types::geo::GeoPoint2d;
use serde::{Deserialize, Serialize};

use crate::error::OceanMapError;
use crate::projection::ProjectionId;

/// Sentinel value of a quiver variable that disables arrow rendering.
pub const NO_QUIVER: &str = "none";

/// Base map style.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BasemapChoice {
    /// Terrain and bathymetry rendered by the data server, optionally with shaded relief.
    #[default]
    Topo,
    /// Satellite ocean base map.
    Ocean,
    /// World imagery.
    World,
    /// Nautical chart. Land and bathymetry overlays are not shown with this base map.
    Chart,
}

/// Method used by the server to interpolate data onto tile pixels.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationMethod {
    /// Gaussian weighting.
    #[default]
    Gaussian,
    /// Bilinear interpolation.
    Bilinear,
    /// Inverse distance weighting.
    Inverse,
    /// Nearest neighbour.
    Nearest,
}

impl InterpolationMethod {
    /// Name of the method as used in tile URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gaussian => "gaussian",
            Self::Bilinear => "bilinear",
            Self::Inverse => "inverse",
            Self::Nearest => "nearest",
        }
    }
}

/// Interpolation parameters of data tiles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpolationSettings {
    /// Interpolation method.
    pub method: InterpolationMethod,
    /// Search radius in kilometres.
    pub radius: u32,
    /// Number of neighbours taken into account.
    pub neighbours: u32,
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self {
            method: InterpolationMethod::Gaussian,
            radius: 25,
            neighbours: 10,
        }
    }
}

/// Which bathymetry boundary tiles are shown on top of the data.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContourLayer {
    /// Isobath lines.
    #[default]
    Contours,
    /// Filled depth bands.
    Shapes,
}

impl ContourLayer {
    /// Path segment of the boundary tile endpoint.
    pub fn path(&self) -> &'static str {
        match self {
            Self::Contours => "bath",
            Self::Shapes => "bathshapes",
        }
    }
}

/// Display settings of the bathymetry layers.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BathymetrySettings {
    /// Whether bathymetry layers are visible.
    pub visible: bool,
    opacity: f64,
    /// Boundary layer variant.
    pub contour_layer: ContourLayer,
}

impl BathymetrySettings {
    /// Opacity of the bathymetry raster, in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity.clamp(0.0, 1.0)
    }

    /// Sets opacity, clamping it into `[0, 1]`.
    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = if opacity.is_nan() {
            1.0
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    /// Returns a copy with the given opacity.
    pub fn with_opacity(mut self, opacity: f64) -> Self {
        self.set_opacity(opacity);
        self
    }
}

impl Default for BathymetrySettings {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 0.75,
            contour_layer: ContourLayer::Contours,
        }
    }
}

/// Settings shared by every surface of the map.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapSettings {
    /// Active projection.
    pub projection: ProjectionId,
    /// Base map style.
    pub basemap: BasemapChoice,
    /// Interpolation of data tiles.
    pub interpolation: InterpolationSettings,
    /// Bathymetry layers.
    pub bathymetry: BathymetrySettings,
    /// Shaded relief on the topo base map.
    pub shaded_relief: bool,
}

/// Range of values mapped onto the colormap.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScale {
    /// Value mapped to the first color.
    pub min: f64,
    /// Value mapped to the last color.
    pub max: f64,
}

impl ColorScale {
    /// Creates a new scale.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Scale as it is encoded in tile URLs: `min,max`.
    pub fn to_url_segment(&self) -> String {
        format!("{},{}", self.min, self.max)
    }

    fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min < self.max
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self { min: -5.0, max: 30.0 }
    }
}

/// How data values are rendered.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayType {
    /// Continuous colormap.
    #[default]
    Colormap,
    /// Filled contours.
    Contours,
}

impl DisplayType {
    /// Name used in tile URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Colormap => "colormap",
            Self::Contours => "contours",
        }
    }
}

/// Vector field (arrows) rendered over the data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuiverSettings {
    /// Variable of the vector field, or `none`.
    pub variable: String,
    /// Arrow density, `0` is the server default.
    pub density: i32,
}

impl QuiverSettings {
    /// Returns `false` if the variable is the `none` sentinel (in any case) or empty.
    pub fn is_enabled(&self) -> bool {
        let variable = self.variable.trim();
        !variable.is_empty() && !variable.eq_ignore_ascii_case(NO_QUIVER)
    }
}

impl Default for QuiverSettings {
    fn default() -> Self {
        Self {
            variable: NO_QUIVER.to_string(),
            density: 0,
        }
    }
}

/// View a dataset would like to be displayed with when it is first selected.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultLocation {
    /// Center of the view.
    pub center: GeoPoint2d,
    /// Zoom level.
    pub zoom: f64,
}

/// What a single surface displays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetView {
    /// Dataset identifier.
    pub dataset: String,
    /// Variable identifier.
    pub variable: String,
    /// Time index.
    pub time: i64,
    /// Depth index.
    pub depth: u32,
    /// Color scale.
    pub scale: ColorScale,
    /// Rendering of values.
    pub display: DisplayType,
    /// Colormap name.
    pub colormap: String,
    /// Whether land is masked out of data tiles.
    pub mask: bool,
    /// Vector field overlay.
    pub quiver: QuiverSettings,
    /// Default view of the dataset.
    pub default_location: Option<DefaultLocation>,
}

impl DatasetView {
    /// Creates a descriptor with the given dataset and variable and default parameters.
    pub fn new(dataset: impl Into<String>, variable: impl Into<String>) -> Self {
        Self {
            dataset: dataset.into(),
            variable: variable.into(),
            ..Default::default()
        }
    }

    /// Checks that the descriptor can be used to build tile URLs.
    pub fn validate(&self) -> Result<(), OceanMapError> {
        if self.dataset.trim().is_empty() {
            return Err(OceanMapError::InvalidDataset("dataset id is empty".into()));
        }
        if self.variable.trim().is_empty() {
            return Err(OceanMapError::InvalidDataset("variable is empty".into()));
        }
        if !self.scale.is_valid() {
            return Err(OceanMapError::InvalidDataset(format!(
                "invalid color scale {}",
                self.scale.to_url_segment()
            )));
        }

        check_path_segment("dataset id", &self.dataset)?;
        check_path_segment("variable", &self.variable)?;
        check_path_segment("colormap", &self.colormap)?;
        check_path_segment("quiver variable", &self.quiver.variable)?;

        Ok(())
    }
}

/// Values are placed into tile URLs as single path segments and must not change the template.
fn check_path_segment(name: &str, value: &str) -> Result<(), OceanMapError> {
    match value.chars().find(|c| matches!(c, '/' | '?' | '#' | '{' | '}')) {
        Some(c) => Err(OceanMapError::InvalidDataset(format!(
            "{name} '{value}' contains '{c}'"
        ))),
        None => Ok(()),
    }
}

impl Default for DatasetView {
    fn default() -> Self {
        Self {
            dataset: String::new(),
            variable: String::new(),
            time: 0,
            depth: 0,
            scale: ColorScale::default(),
            display: DisplayType::default(),
            colormap: "default".to_string(),
            mask: true,
            quiver: QuiverSettings::default(),
            default_location: None,
        }
    }
}
