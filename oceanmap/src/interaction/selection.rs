use std::sync::Arc;

use oceanmap_types::GeometryType;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::feature::{Feature, FeatureId};

/// Selected features of a map, in the order they were selected.
///
/// Any number of points can be selected together, but at most one line, track or polygon: selecting a non-point
/// feature leaves it as the only selected feature, and selecting a point drops a selected non-point feature.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Selection {
    entries: Vec<(FeatureId, GeometryType)>,
}

impl Selection {
    /// Selected ids, oldest first.
    pub fn ids(&self) -> impl Iterator<Item = &FeatureId> + '_ {
        self.entries.iter().map(|(id, _)| id)
    }

    /// Returns `true` if the feature is selected.
    pub fn contains(&self, id: &FeatureId) -> bool {
        self.entries.iter().any(|(selected, _)| selected == id)
    }

    /// Number of selected features.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Selects the feature if it is not selected, deselects it otherwise. Returns `true` if the feature ends up
    /// selected.
    pub fn toggle(&mut self, feature: &Feature) -> bool {
        if self.contains(feature.id()) {
            self.entries.retain(|(id, _)| id != feature.id());
            false
        } else {
            let has_shape = self
                .entries
                .iter()
                .any(|(_, geometry_type)| *geometry_type != GeometryType::Point);
            if has_shape || feature.geometry_type() != GeometryType::Point {
                self.entries.clear();
            }
            self.push(feature);
            true
        }
    }

    /// Adds features to the selection. Already selected features are skipped.
    pub fn extend<'a>(&mut self, features: impl IntoIterator<Item = &'a Feature>) {
        for feature in features {
            if !self.contains(feature.id()) {
                self.push(feature);
            }
        }
        self.collapse();
    }

    /// Replaces the selection.
    pub fn replace<'a>(&mut self, features: impl IntoIterator<Item = &'a Feature>) {
        self.entries.clear();
        self.extend(features);
    }

    /// Removes the features from the selection. Returns `true` if anything was removed.
    pub fn remove(&mut self, ids: &[FeatureId]) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(id, _)| !ids.contains(id));
        before != self.entries.len()
    }

    /// Deselects everything. Returns `true` if anything was selected.
    pub fn clear(&mut self) -> bool {
        let changed = !self.entries.is_empty();
        self.entries.clear();
        changed
    }

    fn push(&mut self, feature: &Feature) {
        self.entries
            .push((feature.id().clone(), feature.geometry_type()));
    }

    fn collapse(&mut self) {
        let newest_shape = self
            .entries
            .iter()
            .rposition(|(_, geometry_type)| *geometry_type != GeometryType::Point);
        if let Some(position) = newest_shape {
            let entry = self.entries.swap_remove(position);
            self.entries = vec![entry];
        }
    }
}

/// Selection shared by both surfaces of a map.
#[derive(Debug, Default, Clone)]
pub struct SharedSelection(Arc<RwLock<Selection>>);

impl SharedSelection {
    /// Locks the selection for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, Selection> {
        self.0.read()
    }

    /// Locks the selection for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, Selection> {
        self.0.write()
    }

    /// Returns `true` if both handles point to the same selection.
    pub fn ptr_eq(&self, other: &SharedSelection) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
