use std::sync::Arc;

use oceanmap_types::GeometryType;

use crate::api::{feature_from_api, ApiCoordinate, FeatureDescriptor};
use crate::config::OceanMapConfig;
use crate::error::OceanMapError;
use crate::event::{MapEvent, MapEventListener};
use crate::feature::{
    Feature, FeatureClass, FeatureFilter, FeatureId, FeatureKind, LoadTicket, RemoveTarget, SharedFeatureStore,
};
use crate::interaction::{EventPropagation, SharedSelection, UserEvent};
use crate::messenger::Messenger;
use crate::settings::{DatasetView, MapSettings};
use crate::surface::{MapSurface, SurfaceRole};
use crate::view::MapView;

mod builder;

pub use builder::OceanMapBuilder;

/// The map engine: a primary surface, an optional comparison surface, and the feature store and selection they
/// share.
///
/// All methods are expected to be called from the host's UI thread. Events produced while handling a call are
/// dispatched to listeners before the call returns.
pub struct OceanMap {
    config: Arc<OceanMapConfig>,
    settings: MapSettings,
    store: SharedFeatureStore,
    selection: SharedSelection,
    primary: MapSurface,
    secondary: Option<MapSurface>,
    messenger: Option<Arc<dyn Messenger>>,
    listeners: Vec<Box<dyn MapEventListener>>,
}

impl OceanMap {
    fn new(
        config: OceanMapConfig,
        settings: MapSettings,
        dataset: DatasetView,
        messenger: Option<Arc<dyn Messenger>>,
        listeners: Vec<Box<dyn MapEventListener>>,
    ) -> Self {
        let config = Arc::new(config);
        let store = SharedFeatureStore::new(settings.projection);
        let selection = SharedSelection::default();
        let primary = MapSurface::new(
            SurfaceRole::Primary,
            config.clone(),
            settings.clone(),
            dataset,
            store.clone(),
            selection.clone(),
            messenger.clone(),
        );

        Self {
            config,
            settings,
            store,
            selection,
            primary,
            secondary: None,
            messenger,
            listeners,
        }
    }

    /// Engine configuration.
    pub fn config(&self) -> &OceanMapConfig {
        &self.config
    }

    /// Current map settings.
    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Feature store shared by the surfaces.
    pub fn store(&self) -> &SharedFeatureStore {
        &self.store
    }

    /// Selection shared by the surfaces.
    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    /// The surface with the given role, if it exists.
    pub fn surface(&self, role: SurfaceRole) -> Option<&MapSurface> {
        match role {
            SurfaceRole::Primary => Some(&self.primary),
            SurfaceRole::Secondary => self.secondary.as_ref(),
        }
    }

    /// Returns `true` if the comparison surface exists.
    pub fn is_comparison_enabled(&self) -> bool {
        self.secondary.is_some()
    }

    /// Subscribes a listener to map events.
    pub fn add_listener(&mut self, listener: impl MapEventListener + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Sets the messenger notified when the surfaces need to be redrawn.
    pub fn set_messenger(&mut self, messenger: Option<impl Messenger + 'static>) {
        let messenger: Option<Arc<dyn Messenger>> = match messenger {
            Some(m) => Some(Arc::new(m)),
            None => None,
        };

        for surface in self.surfaces_mut() {
            surface.set_messenger(messenger.clone());
        }
        self.messenger = messenger;
    }

    /// Applies new settings to all surfaces in the same call.
    ///
    /// A projection change recreates the feature store, clears the selection and resets both surfaces. Other
    /// changes only replace the affected layer sources.
    pub fn update_settings(&mut self, settings: MapSettings) {
        if settings.projection != self.settings.projection {
            log::info!(
                "Changing projection from {} to {}",
                self.settings.projection,
                settings.projection
            );

            let store = SharedFeatureStore::new(settings.projection);
            self.store = store.clone();
            if self.selection.write().clear() {
                self.notify(MapEvent::SelectionChanged(Vec::new()));
            }
            for surface in self.surfaces_mut() {
                surface.reset(settings.clone(), store.clone());
            }
        } else {
            for surface in self.surfaces_mut() {
                surface.apply_settings(settings.clone());
            }
        }

        self.settings = settings;
        self.dispatch();
    }

    /// Shows a dataset on a surface.
    pub fn set_dataset(&mut self, role: SurfaceRole, dataset: DatasetView) -> Result<(), OceanMapError> {
        let surface = self
            .surface_mut(role)
            .ok_or_else(|| OceanMapError::NotFound(format!("{role:?} surface")))?;
        let result = surface.set_dataset(dataset);
        self.dispatch();
        result
    }

    /// Creates the comparison surface showing the given dataset, or changes its dataset if it exists.
    ///
    /// A new surface shares the feature store and selection of the primary one and starts with the same view.
    pub fn enable_comparison(&mut self, dataset: DatasetView) -> Result<(), OceanMapError> {
        if let Some(secondary) = &mut self.secondary {
            let result = secondary.set_dataset(dataset);
            self.dispatch();
            return result;
        }

        dataset.validate()?;
        let mut secondary = MapSurface::new(
            SurfaceRole::Secondary,
            self.config.clone(),
            self.settings.clone(),
            dataset,
            self.store.clone(),
            self.selection.clone(),
            self.messenger.clone(),
        );
        secondary.set_view(*self.primary.view());
        if let Some(session) = self.primary.draw_session() {
            secondary.start_drawing(session.geometry_type());
        }

        self.secondary = Some(secondary);
        self.dispatch();
        Ok(())
    }

    /// Destroys the comparison surface. The feature store is kept. Returns `false` if comparison was not enabled.
    pub fn disable_comparison(&mut self) -> bool {
        if self.secondary.take().is_none() {
            return false;
        }

        self.primary.redraw();
        true
    }

    /// Starts drawing on all surfaces. A draw in progress is cancelled.
    pub fn start_drawing(&mut self, geometry_type: GeometryType) {
        for surface in self.surfaces_mut() {
            surface.start_drawing(geometry_type);
        }
    }

    /// Cancels drawing on all surfaces.
    pub fn stop_drawing(&mut self) {
        for surface in self.surfaces_mut() {
            surface.stop_drawing();
        }
    }

    /// Completes the draw in progress on the surface. Returns the id of the new feature, or `None` if the geometry
    /// is incomplete and drawing continues.
    pub fn finish_drawing(&mut self, role: SurfaceRole) -> Option<FeatureId> {
        let id = self.surface_mut(role)?.finish_drawing();
        self.dispatch();
        id
    }

    /// Processes a pointer event of a surface.
    pub fn handle_event(&mut self, role: SurfaceRole, event: UserEvent) -> EventPropagation {
        let Some(surface) = self.surface_mut(role) else {
            log::debug!("Event for missing {role:?} surface ignored");
            return EventPropagation::Propagate;
        };

        let propagation = surface.handle_event(event);
        self.dispatch();
        propagation
    }

    /// Replaces the view of a surface. Returns `false` if the surface does not exist or the view is in another
    /// projection.
    pub fn set_view(&mut self, role: SurfaceRole, view: MapView) -> bool {
        let changed = self
            .surface_mut(role)
            .is_some_and(|surface| surface.set_view(view));
        self.dispatch();
        changed
    }

    /// Sets the viewport size of a surface in pixels.
    pub fn set_size(&mut self, role: SurfaceRole, width: f64, height: f64) {
        if let Some(surface) = self.surface_mut(role) {
            surface.set_size(width, height);
        }
        self.dispatch();
    }

    /// Replaces the annotations shown on a surface. Geometry must be in the current projection.
    pub fn set_annotations(&mut self, role: SurfaceRole, annotations: Vec<Feature>) {
        if let Some(surface) = self.surface_mut(role) {
            surface.set_annotations(annotations);
        }
    }

    /// Descriptors of stored features matching the filter.
    pub fn features(&self, filter: Option<&FeatureFilter>) -> Vec<FeatureDescriptor> {
        let store = self.store.read();
        let projection = store.projection();
        store
            .get_all(filter)
            .into_iter()
            .filter_map(|feature| FeatureDescriptor::from_feature(feature, projection))
            .collect()
    }

    /// Descriptors of the selected features, oldest first.
    pub fn selected_features(&self) -> Vec<FeatureDescriptor> {
        self.primary.selected_descriptors()
    }

    /// Replaces the selection with the stored features with the given ids. Unknown ids are ignored.
    pub fn set_selection(&mut self, ids: &[FeatureId]) {
        let changed = {
            let store = self.store.read();
            let features = ids.iter().filter_map(|id| store.get_by_id(id));
            let mut selection = self.selection.write();
            let before = selection.clone();
            selection.replace(features);
            *selection != before
        };

        if changed {
            self.selection_changed();
        }
    }

    /// Adds a feature given in `[lat, lon]` coordinates. Returns its id.
    pub fn add_api_feature(
        &mut self,
        id: Option<FeatureId>,
        geometry_type: GeometryType,
        coordinates: &[ApiCoordinate],
        class: FeatureClass,
    ) -> Result<FeatureId, OceanMapError> {
        let feature = feature_from_api(id, geometry_type, coordinates, class, self.settings.projection)?;
        let id = feature.id().clone();
        self.store.write().add(feature)?;
        self.redraw();
        Ok(id)
    }

    /// Removes features from the store and the selection. Returns ids of the removed features.
    pub fn remove_features(&mut self, target: RemoveTarget) -> Vec<FeatureId> {
        let removed: Vec<FeatureId> = self
            .store
            .write()
            .remove(target)
            .iter()
            .map(|feature| feature.id().clone())
            .collect();

        if removed.is_empty() {
            return removed;
        }

        if self.selection.write().remove(&removed) {
            self.selection_changed();
        } else {
            self.redraw();
        }

        removed
    }

    /// Starts loading a server feature set. It is loaded for the current view on the next
    /// [`begin_feature_load`](Self::begin_feature_load) and after every view change.
    pub fn load_features(&mut self, kind: FeatureKind, id: impl Into<String>) {
        self.store.write().add_load_request(kind, id);
    }

    /// Stops loading a server feature set. Features already loaded stay in the store.
    pub fn unload_features(&mut self, kind: FeatureKind, id: &str) {
        self.store.write().remove_load_request(kind, id);
    }

    /// Requests all server feature sets to be loaded again.
    pub fn refresh_features(&mut self) {
        self.store.write().refresh();
    }

    /// Issues loads of server feature sets for the primary view.
    ///
    /// The host runs [`LoadTicket::fetch`] for every ticket and passes the result to
    /// [`finish_feature_load`](Self::finish_feature_load).
    pub fn begin_feature_load(&mut self) -> Vec<LoadTicket> {
        self.primary.begin_feature_load()
    }

    /// Applies a completed feature load. Returns `false` if the result was discarded.
    pub fn finish_feature_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Feature>, OceanMapError>,
    ) -> bool {
        let applied = self.primary.finish_feature_load(ticket, result);
        if applied {
            if let Some(secondary) = &self.secondary {
                secondary.redraw();
            }
        }

        applied
    }

    /// Replaces a line or polygon with points at its vertices.
    pub fn split_feature(&mut self, id: &FeatureId) -> Result<Vec<FeatureId>, OceanMapError> {
        let points = self.store.write().split(id)?;
        if self.selection.write().remove(std::slice::from_ref(id)) {
            self.selection_changed();
        } else {
            self.redraw();
        }

        Ok(points)
    }

    /// Replaces points with a line through them.
    pub fn combine_features(&mut self, ids: &[FeatureId]) -> Result<FeatureId, OceanMapError> {
        let line = self.store.write().combine(ids)?;
        if self.selection.write().remove(ids) {
            self.selection_changed();
        } else {
            self.redraw();
        }

        Ok(line)
    }

    fn surface_mut(&mut self, role: SurfaceRole) -> Option<&mut MapSurface> {
        match role {
            SurfaceRole::Primary => Some(&mut self.primary),
            SurfaceRole::Secondary => self.secondary.as_mut(),
        }
    }

    fn surfaces_mut(&mut self) -> impl Iterator<Item = &mut MapSurface> {
        std::iter::once(&mut self.primary).chain(self.secondary.as_mut())
    }

    fn redraw(&self) {
        self.primary.redraw();
        if let Some(secondary) = &self.secondary {
            secondary.redraw();
        }
    }

    fn selection_changed(&self) {
        let descriptors = self.primary.selected_descriptors();
        self.redraw();
        self.notify(MapEvent::SelectionChanged(descriptors));
    }

    fn notify(&self, event: MapEvent) {
        for listener in &self.listeners {
            listener.on_event(&event);
        }
    }

    fn dispatch(&mut self) {
        let mut events = self.primary.drain_events();
        if let Some(secondary) = &mut self.secondary {
            events.extend(secondary.drain_events());
        }

        for event in events {
            match &event {
                MapEvent::DrawComplete(descriptor) => {
                    log::debug!("Feature {} drawn", descriptor.id);
                    self.stop_drawing();
                    self.redraw();
                }
                MapEvent::SelectionChanged(_) => self.redraw(),
                _ => {}
            }

            self.notify(event);
        }
    }
}
