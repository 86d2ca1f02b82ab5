use std::ops::Index;

use crate::layer::{Layer, LayerId, LayerKind, LayerSource};

/// Layers of a surface with their metadata, kept in render order.
///
/// Each [`LayerKind`] has at most one layer. Layers are ordered by z-index and, for equal z-indices, by their kind.
/// When a map is rendered, visible layers are drawn in the order of [`LayerCollection::iter`].
///
/// Replacing a source with [`LayerCollection::replace_source`] keeps the layer (and its [`LayerId`]) and increments
/// its revision, so renderers can tell which layers need new tiles.
///
/// ```
/// use oceanmap::layer::{LayerCollection, LayerKind, LayerSource};
///
/// let mut collection = LayerCollection::default();
/// let data = collection.insert(LayerKind::Data, LayerSource::Empty);
/// collection.insert(LayerKind::Basemap, LayerSource::Empty);
///
/// assert_eq!(collection[0].kind(), LayerKind::Basemap);
/// assert_eq!(collection.get(LayerKind::Data).map(|l| l.id()), Some(data));
/// ```
#[derive(Debug, Default, Clone)]
pub struct LayerCollection {
    layers: Vec<Layer>,
    next_id: u64,
}

impl LayerCollection {
    /// Adds a layer of the given kind with its default z-index and returns its id. If a layer of this kind already
    /// exists, its source is replaced instead.
    pub fn insert(&mut self, kind: LayerKind, source: LayerSource) -> LayerId {
        if let Some(layer) = self.get(kind) {
            let id = layer.id();
            self.replace_source(kind, source);
            return id;
        }

        let id = LayerId(self.next_id);
        self.next_id += 1;
        self.layers.push(Layer {
            id,
            kind,
            z_index: kind.default_z_index(),
            source,
            visible: true,
            opacity: 1.0,
            revision: 0,
        });
        self.sort();

        id
    }

    /// Replaces the source of the layer. Returns `false` if there is no such layer or the source is unchanged.
    pub fn replace_source(&mut self, kind: LayerKind, source: LayerSource) -> bool {
        let Some(layer) = self.get_mut(kind) else {
            return false;
        };

        if layer.source == source {
            return false;
        }

        layer.source = source;
        layer.revision += 1;
        true
    }

    /// Moves the layer to another z-index. Returns `true` if the position changed.
    pub fn set_z_index(&mut self, kind: LayerKind, z_index: i32) -> bool {
        let Some(layer) = self.get_mut(kind) else {
            return false;
        };

        if layer.z_index == z_index {
            return false;
        }

        layer.z_index = z_index;
        self.sort();
        true
    }

    /// Shows or hides the layer. Hidden layers keep their place and source but are not rendered. Returns `true`
    /// if visibility changed.
    pub fn set_visible(&mut self, kind: LayerKind, visible: bool) -> bool {
        match self.get_mut(kind) {
            Some(layer) if layer.visible != visible => {
                layer.visible = visible;
                true
            }
            _ => false,
        }
    }

    /// Sets opacity of the layer, clamped into `[0, 1]`. Returns `true` if opacity changed.
    pub fn set_opacity(&mut self, kind: LayerKind, opacity: f64) -> bool {
        let opacity = opacity.clamp(0.0, 1.0);
        match self.get_mut(kind) {
            Some(layer) if layer.opacity != opacity => {
                layer.opacity = opacity;
                true
            }
            _ => false,
        }
    }

    /// Layer of the given kind.
    pub fn get(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.kind == kind)
    }

    /// Layer with the given id.
    pub fn get_by_id(&self, id: LayerId) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id == id)
    }

    fn get_mut(&mut self, kind: LayerKind) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.kind == kind)
    }

    /// Returns the count of layers in the collection.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns `true` if the collection contains zero layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Iterates over all layers in render order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter()
    }

    /// Iterates over visible layers in render order.
    pub fn visible(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.layers.iter().filter(|layer| layer.visible)
    }

    fn sort(&mut self) {
        self.layers.sort_by_key(|layer| (layer.z_index, layer.kind));
    }
}

impl Index<usize> for LayerCollection {
    type Output = Layer;

    fn index(&self, index: usize) -> &Self::Output {
        &self.layers[index]
    }
}
