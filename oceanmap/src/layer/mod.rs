//! Layers of a map surface.
//!
//! A surface has a fixed set of layers, one per [`LayerKind`]. Layers are never recreated while the surface lives:
//! when parameters change, only their sources are replaced, so the host can keep its rendering resources bound to
//! a [`LayerId`].

use oceanmap_types::cartesian::Point2d;

use crate::feature::{Feature, SharedFeatureStore};
use crate::tile_source::{QuiverSource, TileSource};

mod collection;

pub use collection::LayerCollection;

/// Role of a layer in the layer stack. Variants are listed in bottom to top order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LayerKind {
    /// Base map.
    Basemap,
    /// Dataset tiles.
    Data,
    /// Land boundaries.
    Land,
    /// Bathymetry raster.
    Bathymetry,
    /// Bathymetry contours or depth bands.
    BathymetryBoundary,
    /// Annotations placed by the host.
    Annotation,
    /// Features of the feature store.
    Features,
    /// Geometry being drawn.
    ObservationDraw,
    /// Vector field arrows.
    Quiver,
}

impl LayerKind {
    /// All kinds in bottom to top order.
    pub const ALL: [LayerKind; 9] = [
        Self::Basemap,
        Self::Data,
        Self::Land,
        Self::Bathymetry,
        Self::BathymetryBoundary,
        Self::Annotation,
        Self::Features,
        Self::ObservationDraw,
        Self::Quiver,
    ];

    /// Z-index of the layer kind. The base map may be moved above the data layer, see
    /// [`crate::tile_source::build_basemap_layer`].
    pub const fn default_z_index(&self) -> i32 {
        match self {
            Self::Basemap => 0,
            Self::Data => 1,
            Self::Land => 3,
            Self::Bathymetry => 4,
            Self::BathymetryBoundary => 5,
            Self::Annotation => 6,
            Self::Features => 7,
            Self::ObservationDraw => 8,
            Self::Quiver => 9,
        }
    }
}

/// Stable identifier of a layer within its collection.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(u64);

/// Data rendered by a layer.
#[derive(Debug, Clone)]
pub enum LayerSource {
    /// Nothing to render.
    Empty,
    /// Raster tiles.
    Raster(TileSource),
    /// Vector tiles.
    Vector(TileSource),
    /// Vector field tiles.
    Quiver(QuiverSource),
    /// Features of a store.
    Features(SharedFeatureStore),
    /// Features owned by the layer.
    Annotations(Vec<Feature>),
    /// Vertices of the geometry being drawn.
    Sketch(Vec<Point2d>),
}

impl PartialEq for LayerSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Empty, Self::Empty) => true,
            (Self::Raster(a), Self::Raster(b)) | (Self::Vector(a), Self::Vector(b)) => a == b,
            (Self::Quiver(a), Self::Quiver(b)) => a == b,
            (Self::Features(a), Self::Features(b)) => a.ptr_eq(b),
            (Self::Annotations(a), Self::Annotations(b)) => a == b,
            (Self::Sketch(a), Self::Sketch(b)) => a == b,
            _ => false,
        }
    }
}

impl LayerSource {
    /// Tile source of raster and vector tile layers.
    pub fn tile_source(&self) -> Option<&TileSource> {
        match self {
            Self::Raster(source) | Self::Vector(source) => Some(source),
            Self::Quiver(quiver) => Some(&quiver.source),
            _ => None,
        }
    }

    /// Returns `true` if there is nothing to render.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Annotations(features) => features.is_empty(),
            Self::Sketch(vertices) => vertices.is_empty(),
            _ => false,
        }
    }
}

/// A layer of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    id: LayerId,
    kind: LayerKind,
    z_index: i32,
    source: LayerSource,
    visible: bool,
    opacity: f64,
    revision: u64,
}

impl Layer {
    /// Id of the layer.
    pub fn id(&self) -> LayerId {
        self.id
    }

    /// Kind of the layer.
    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    /// Position in the stack.
    pub fn z_index(&self) -> i32 {
        self.z_index
    }

    /// Current source.
    pub fn source(&self) -> &LayerSource {
        &self.source
    }

    /// Whether the layer is rendered.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Opacity in `[0, 1]`.
    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    /// Counter incremented every time the source is replaced.
    pub fn revision(&self) -> u64 {
        self.revision
    }
}
