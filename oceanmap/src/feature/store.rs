use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use ahash::AHashMap;
use oceanmap_types::GeometryType;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::OceanMapError;
use crate::feature::{
    type_tag, Feature, FeatureClass, FeatureId, FeatureKind, FeatureProperties, Geometry,
};
use crate::projection::ProjectionId;

/// What [`FeatureStore::remove`] removes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveTarget {
    /// Every feature except observations.
    All,
    /// Features with the given ids, observations included.
    Ids(Vec<FeatureId>),
}

/// Criteria for [`FeatureStore::get_all`]. Empty filter matches every feature.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureFilter {
    geometry_type: Option<GeometryType>,
    class: Option<FeatureClass>,
}

impl FeatureFilter {
    /// Matches only features of the given geometry type.
    pub fn geometry_type(mut self, geometry_type: GeometryType) -> Self {
        self.geometry_type = Some(geometry_type);
        self
    }

    /// Matches only features of the given class.
    pub fn class(mut self, class: FeatureClass) -> Self {
        self.class = Some(class);
        self
    }

    /// Returns `true` if the feature satisfies the filter.
    pub fn matches(&self, feature: &Feature) -> bool {
        self.geometry_type
            .map_or(true, |t| t == feature.geometry_type())
            && self.class.map_or(true, |c| c == feature.class())
    }
}

/// Result of [`FeatureStore::upsert_loaded`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No feature with this id was stored.
    Inserted,
    /// Incoming geometry had finer resolution and replaced the stored one.
    Replaced,
    /// Stored geometry has the same or finer resolution and was kept.
    Kept,
    /// A feature of another type or class is stored under this id.
    Rejected,
}

/// Collection of features of one map, keyed by feature id.
///
/// Geometry of all features is in planar coordinates of the store's projection. A store is never reprojected: when
/// the projection of the map changes a new store is created.
///
/// Besides features, the store keeps the list of server feature sets (kind and id pairs) that are to be loaded on
/// every viewport change, and the number of loads in flight.
#[derive(Debug)]
pub struct FeatureStore {
    projection: ProjectionId,
    features: Vec<Feature>,
    index: AHashMap<FeatureId, usize>,
    load_requests: Vec<(FeatureKind, String)>,
    refresh_requested: bool,
    in_flight: Arc<AtomicUsize>,
    revision: u64,
}

impl FeatureStore {
    /// Creates an empty store for the given projection.
    pub fn new(projection: ProjectionId) -> Self {
        Self {
            projection,
            features: Vec::new(),
            index: AHashMap::new(),
            load_requests: Vec::new(),
            refresh_requested: false,
            in_flight: Arc::new(AtomicUsize::new(0)),
            revision: 0,
        }
    }

    /// Projection of stored geometries.
    pub fn projection(&self) -> ProjectionId {
        self.projection
    }

    /// Counter incremented by every change of the stored features.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Number of stored features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Returns `true` if the store has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Adds a feature.
    ///
    /// If a feature with the same id, geometry type and class is already stored, it is replaced. If the stored
    /// feature differs in type or class, the new feature is rejected.
    pub fn add(&mut self, feature: Feature) -> Result<(), OceanMapError> {
        match self.index.get(feature.id()) {
            Some(&position) => {
                let stored = &self.features[position];
                if !is_same_kind(stored, &feature) {
                    log::warn!(
                        "Feature {} is already stored as {} {:?}, rejecting {} {:?}",
                        feature.id(),
                        stored.geometry_type(),
                        stored.class(),
                        feature.geometry_type(),
                        feature.class()
                    );
                    return Err(OceanMapError::DuplicateFeature(feature.id().to_string()));
                }

                self.features[position] = feature;
            }
            None => {
                self.index
                    .insert(feature.id().clone(), self.features.len());
                self.features.push(feature);
            }
        }

        self.revision += 1;
        Ok(())
    }

    /// Removes features and returns them.
    pub fn remove(&mut self, target: RemoveTarget) -> Vec<Feature> {
        let removed = match target {
            RemoveTarget::All => self.extract(|f| !f.is_observation()),
            RemoveTarget::Ids(ids) => self.extract(|f| ids.contains(f.id())),
        };

        if !removed.is_empty() {
            self.revision += 1;
        }

        removed
    }

    /// Feature with the given id.
    pub fn get_by_id(&self, id: &FeatureId) -> Option<&Feature> {
        self.index.get(id).map(|&position| &self.features[position])
    }

    /// All features matching the filter, in insertion order.
    pub fn get_all(&self, filter: Option<&FeatureFilter>) -> Vec<&Feature> {
        self.features
            .iter()
            .filter(|f| filter.map_or(true, |filter| filter.matches(f)))
            .collect()
    }

    /// Iterates over all features.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Feature> {
        self.features.iter()
    }

    /// Removes all features, observations included, and forgets all server load requests.
    pub fn clear(&mut self) {
        self.features.clear();
        self.index.clear();
        self.load_requests.clear();
        self.refresh_requested = false;
        self.revision += 1;
    }

    /// Requests all registered server loads to be issued again, even if the viewport does not change.
    pub fn refresh(&mut self) {
        if !self.load_requests.is_empty() {
            self.refresh_requested = true;
        }
    }

    /// Registers a server feature set to be loaded on every viewport change.
    pub fn add_load_request(&mut self, kind: FeatureKind, id: impl Into<String>) {
        let id = id.into();
        if !self
            .load_requests
            .iter()
            .any(|(k, i)| *k == kind && *i == id)
        {
            self.load_requests.push((kind, id));
        }
        self.refresh_requested = true;
    }

    /// Stops loading the given feature set. Already loaded features are kept.
    pub fn remove_load_request(&mut self, kind: FeatureKind, id: &str) {
        self.load_requests.retain(|(k, i)| !(*k == kind && i == id));
    }

    /// Registered server feature sets.
    pub fn load_requests(&self) -> &[(FeatureKind, String)] {
        &self.load_requests
    }

    /// Returns whether a refresh was requested and resets the flag.
    pub(crate) fn take_refresh(&mut self) -> bool {
        std::mem::take(&mut self.refresh_requested)
    }

    /// Returns `true` while there is a server load in flight.
    pub fn reload_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire) > 0
    }

    pub(crate) fn start_load(&self) -> LoadGuard {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        LoadGuard(self.in_flight.clone())
    }

    /// Inserts a feature loaded from the server, keeping whichever copy has finer resolution.
    ///
    /// A copy without resolution replaces nothing. A stored feature without resolution is replaced by the first copy
    /// that has one, and otherwise stays as it was first loaded.
    pub fn upsert_loaded(&mut self, feature: Feature) -> UpsertOutcome {
        let Some(&position) = self.index.get(feature.id()) else {
            self.index
                .insert(feature.id().clone(), self.features.len());
            self.features.push(feature);
            self.revision += 1;
            return UpsertOutcome::Inserted;
        };

        let stored = &self.features[position];
        if !is_same_kind(stored, &feature) {
            log::warn!(
                "Loaded feature {} conflicts with stored {} feature",
                feature.id(),
                stored.geometry_type()
            );
            return UpsertOutcome::Rejected;
        }

        let is_finer = match (stored.resolution(), feature.resolution()) {
            (Some(stored), Some(incoming)) => incoming < stored,
            (None, Some(_)) => true,
            _ => false,
        };

        if is_finer {
            self.features[position] = feature;
            self.revision += 1;
            UpsertOutcome::Replaced
        } else {
            UpsertOutcome::Kept
        }
    }

    /// Replaces a line or polygon with point features at each of its vertices. Returns ids of the new points.
    pub fn split(&mut self, id: &FeatureId) -> Result<Vec<FeatureId>, OceanMapError> {
        self.check_no_reload()?;

        let feature = self
            .get_by_id(id)
            .ok_or_else(|| OceanMapError::NotFound(id.to_string()))?;
        if feature.geometry_type() == GeometryType::Point {
            return Err(OceanMapError::InvalidGeometry(
                "a point cannot be split".into(),
            ));
        }

        let class = feature.class();
        let points = feature
            .coordinates()
            .iter()
            .map(|vertex| {
                Geometry::point(*vertex).map(|geometry| {
                    Feature::new(FeatureId::random(), geometry, class).with_properties(
                        FeatureProperties {
                            kind: Some(type_tag(GeometryType::Point).to_string()),
                            ..Default::default()
                        },
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.extract(|f| f.id() == id);
        let ids = points.iter().map(|p| p.id().clone()).collect();
        for point in points {
            self.index.insert(point.id().clone(), self.features.len());
            self.features.push(point);
        }
        self.revision += 1;

        Ok(ids)
    }

    /// Replaces point features with a single line through them, in the given order. Returns id of the line.
    pub fn combine(&mut self, ids: &[FeatureId]) -> Result<FeatureId, OceanMapError> {
        self.check_no_reload()?;

        let mut vertices = Vec::with_capacity(ids.len());
        let mut class = FeatureClass::Standard;
        for id in ids {
            let feature = self
                .get_by_id(id)
                .ok_or_else(|| OceanMapError::NotFound(id.to_string()))?;
            match feature.geometry() {
                Geometry::Point(point) => vertices.push(*point),
                _ => {
                    return Err(OceanMapError::InvalidGeometry(format!(
                        "only points can be combined, {id} is a {}",
                        feature.geometry_type()
                    )))
                }
            }
            if feature.is_observation() {
                class = FeatureClass::Observation;
            }
        }

        let line = Feature::new(FeatureId::random(), Geometry::line_string(vertices)?, class)
            .with_properties(FeatureProperties {
                kind: Some(type_tag(GeometryType::LineString).to_string()),
                ..Default::default()
            });
        let line_id = line.id().clone();

        self.extract(|f| ids.contains(f.id()));
        self.index.insert(line_id.clone(), self.features.len());
        self.features.push(line);
        self.revision += 1;

        Ok(line_id)
    }

    fn check_no_reload(&self) -> Result<(), OceanMapError> {
        if self.reload_pending() {
            log::debug!("Store edit rejected: {} loads in flight", self.in_flight.load(Ordering::Acquire));
            return Err(OceanMapError::ReloadPending);
        }

        Ok(())
    }

    fn extract(&mut self, mut predicate: impl FnMut(&Feature) -> bool) -> Vec<Feature> {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.features).into_iter().partition(|f| predicate(f));
        self.features = kept;
        self.index = self
            .features
            .iter()
            .enumerate()
            .map(|(position, f)| (f.id().clone(), position))
            .collect();

        removed
    }
}

fn is_same_kind(a: &Feature, b: &Feature) -> bool {
    a.geometry_type() == b.geometry_type() && a.class() == b.class()
}

/// Marks a server load as in flight until dropped.
#[derive(Debug)]
pub(crate) struct LoadGuard(Arc<AtomicUsize>);

impl Drop for LoadGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Reference counted handle to a [`FeatureStore`].
///
/// Both surfaces of a map in comparison mode hold clones of the same handle, so an edit made through one surface is
/// visible through the other.
#[derive(Debug, Clone)]
pub struct SharedFeatureStore(Arc<RwLock<FeatureStore>>);

impl SharedFeatureStore {
    /// Creates a new empty store.
    pub fn new(projection: ProjectionId) -> Self {
        Self(Arc::new(RwLock::new(FeatureStore::new(projection))))
    }

    /// Locks the store for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, FeatureStore> {
        self.0.read()
    }

    /// Locks the store for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, FeatureStore> {
        self.0.write()
    }

    /// Returns `true` if both handles point to the same store.
    pub fn ptr_eq(&self, other: &SharedFeatureStore) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Clones of all features matching the filter.
    pub fn get_all(&self, filter: Option<&FeatureFilter>) -> Vec<Feature> {
        self.read().get_all(filter).into_iter().cloned().collect()
    }

    /// Clone of the feature with the given id.
    pub fn get_by_id(&self, id: &FeatureId) -> Option<Feature> {
        self.read().get_by_id(id).cloned()
    }

    pub(crate) fn downgrade(&self) -> Weak<RwLock<FeatureStore>> {
        Arc::downgrade(&self.0)
    }

    pub(crate) fn is_same(&self, weak: &Weak<RwLock<FeatureStore>>) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.0), weak.as_ptr())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use oceanmap_types::cartesian::Point2d;

    fn point(id: &str, x: f64, y: f64) -> Feature {
        Feature::new(
            id.into(),
            Geometry::point(Point2d::new(x, y)).expect("valid"),
            FeatureClass::Standard,
        )
    }

    fn track(id: &str, resolution: Option<f64>, vertices: &[(f64, f64)]) -> Feature {
        let geometry = Geometry::line_string(vertices.iter().map(|&(x, y)| Point2d::new(x, y)).collect())
            .expect("valid");
        Feature::new(id.into(), geometry, FeatureClass::Observation).with_properties(FeatureProperties {
            resolution,
            ..Default::default()
        })
    }

    #[test]
    fn duplicate_of_other_type_is_rejected() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        store.add(point("a", 0.0, 0.0)).expect("added");
        store.add(point("a", 1.0, 1.0)).expect("same type replaces");
        assert_eq!(store.len(), 1);

        let polygon = Feature::new(
            "a".into(),
            Geometry::polygon(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 0.0),
                Point2d::new(0.0, 1.0),
            ])
            .expect("valid"),
            FeatureClass::Standard,
        );
        assert_matches!(store.add(polygon), Err(OceanMapError::DuplicateFeature(_)));
        assert_eq!(store.get_by_id(&"a".into()).map(|f| f.geometry_type()), Some(GeometryType::Point));
        assert_eq!(
            store.get_by_id(&"a".into()).map(|f| f.coordinates().to_vec()),
            Some(vec![Point2d::new(1.0, 1.0)])
        );
    }

    #[test]
    fn remove_all_keeps_observations() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        store.add(point("a", 0.0, 0.0)).expect("added");
        store.add(track("obs", Some(10.0), &[(0.0, 0.0), (1.0, 1.0)])).expect("added");

        let removed = store.remove(RemoveTarget::All);
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get_by_id(&"obs".into()).is_some());

        store.remove(RemoveTarget::Ids(vec!["obs".into()]));
        assert!(store.is_empty());
    }

    #[test]
    fn filter_by_type_and_class() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        store.add(point("a", 0.0, 0.0)).expect("added");
        store.add(point("b", 1.0, 0.0)).expect("added");
        store.add(track("obs", None, &[(0.0, 0.0), (1.0, 1.0)])).expect("added");

        let points = FeatureFilter::default().geometry_type(GeometryType::Point);
        assert_eq!(store.get_all(Some(&points)).len(), 2);
        let observations = FeatureFilter::default().class(FeatureClass::Observation);
        assert_eq!(store.get_all(Some(&observations)).len(), 1);
        assert_eq!(store.get_all(None).len(), 3);
    }

    #[test]
    fn loaded_features_upgrade_to_finer_resolution_only() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        assert_eq!(
            store.upsert_loaded(track("t", Some(100.0), &[(0.0, 0.0), (5.0, 5.0)])),
            UpsertOutcome::Inserted
        );
        assert_eq!(
            store.upsert_loaded(track("t", Some(400.0), &[(0.0, 0.0), (9.0, 9.0)])),
            UpsertOutcome::Kept
        );
        assert_eq!(
            store.get_by_id(&"t".into()).map(|f| f.coordinates()[1]),
            Some(Point2d::new(5.0, 5.0))
        );
        assert_eq!(
            store.upsert_loaded(track("t", Some(25.0), &[(0.0, 0.0), (4.0, 4.5), (5.0, 5.0)])),
            UpsertOutcome::Replaced
        );
        assert_eq!(store.get_by_id(&"t".into()).map(|f| f.coordinates().len()), Some(3));
    }

    #[test]
    fn loaded_features_without_resolution() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        store.upsert_loaded(track("t", None, &[(0.0, 0.0), (5.0, 5.0)]));
        assert_eq!(
            store.upsert_loaded(track("t", None, &[(0.0, 0.0), (9.0, 9.0)])),
            UpsertOutcome::Kept
        );
        assert_eq!(
            store.get_by_id(&"t".into()).map(|f| f.coordinates()[1]),
            Some(Point2d::new(5.0, 5.0))
        );

        assert_eq!(
            store.upsert_loaded(track("t", Some(50.0), &[(0.0, 0.0), (6.0, 6.0)])),
            UpsertOutcome::Replaced
        );
        assert_eq!(
            store.upsert_loaded(track("t", None, &[(0.0, 0.0), (9.0, 9.0)])),
            UpsertOutcome::Kept
        );
        assert_eq!(store.get_by_id(&"t".into()).and_then(|f| f.resolution()), Some(50.0));
    }

    #[test]
    fn split_and_combine() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        let polygon = Feature::drawn(
            Geometry::polygon(vec![
                Point2d::new(0.0, 0.0),
                Point2d::new(1.0, 0.0),
                Point2d::new(0.0, 1.0),
            ])
            .expect("valid"),
        );
        let polygon_id = polygon.id().clone();
        store.add(polygon).expect("added");

        let points = store.split(&polygon_id).expect("split");
        assert_eq!(points.len(), 3);
        assert!(store.get_by_id(&polygon_id).is_none());
        assert_eq!(store.len(), 3);

        let line = store.combine(&points[..2]).expect("combined");
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.get_by_id(&line).map(|f| f.coordinates().to_vec()),
            Some(vec![Point2d::new(0.0, 0.0), Point2d::new(1.0, 0.0)])
        );
        assert_matches!(store.combine(&[line]), Err(OceanMapError::InvalidGeometry(_)));
    }

    #[test]
    fn edits_are_rejected_while_load_in_flight() {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        store.add(point("a", 0.0, 0.0)).expect("added");
        store.add(point("b", 1.0, 0.0)).expect("added");

        let guard = store.start_load();
        assert!(store.reload_pending());
        assert_matches!(store.combine(&["a".into(), "b".into()]), Err(OceanMapError::ReloadPending));

        drop(guard);
        assert!(!store.reload_pending());
        assert!(store.combine(&["a".into(), "b".into()]).is_ok());
    }

    #[test]
    fn shared_handles_alias_one_store() {
        let store = SharedFeatureStore::new(ProjectionId::Epsg3031);
        let other = store.clone();
        store.write().add(point("a", 0.0, 0.0)).expect("added");

        assert!(store.ptr_eq(&other));
        assert_eq!(other.get_all(None).len(), 1);
        assert!(!store.ptr_eq(&SharedFeatureStore::new(ProjectionId::Epsg3031)));
    }
}
