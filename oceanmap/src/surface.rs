//! One live map: view, layer stack and pointer interaction bound to a projection, map settings and a dataset.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::GeometryType;
use serde::{Deserialize, Serialize};

use crate::api::FeatureDescriptor;
use crate::config::OceanMapConfig;
use crate::error::OceanMapError;
use crate::event::MapEvent;
use crate::feature::{Feature, FeatureId, FeatureRequest, Geometry, LoadTicket, SharedFeatureStore, UpsertOutcome};
use crate::interaction::{
    features_in_rect, hit_test, DrawSession, EventPropagation, InteractionMode, Modifiers, SharedSelection,
    UserEvent,
};
use crate::layer::{LayerCollection, LayerKind, LayerSource};
use crate::messenger::Messenger;
use crate::settings::{DatasetView, MapSettings};
use crate::style::{feature_style, FeatureStyle, StyleContext};
use crate::tile_source::{
    build_basemap_layer, build_bathymetry_boundary_source, build_bathymetry_source, build_data_tile_source,
    build_land_source, build_quiver_source, BasemapLayer, BASEMAP_Z_INDEX,
};
use crate::view::MapView;

/// Which of the two surfaces of a map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceRole {
    /// The main surface, always present.
    Primary,
    /// The comparison surface.
    Secondary,
}

/// Map surface controller.
///
/// A surface owns its view and layers, and holds handles to the feature store and selection, which are shared with
/// the other surface in comparison mode. Every change of visual state requests a redraw through the messenger.
/// Events for the host are queued and collected by [`crate::OceanMap`].
///
/// The surface generation is incremented on every [`reset`](Self::reset). Feature loads issued before a reset are
/// discarded when they complete.
pub struct MapSurface {
    role: SurfaceRole,
    config: Arc<OceanMapConfig>,
    settings: MapSettings,
    dataset: DatasetView,
    view: MapView,
    layers: LayerCollection,
    store: SharedFeatureStore,
    selection: SharedSelection,
    annotations: Vec<Feature>,
    draw: Option<DrawSession>,
    highlighted: Option<FeatureId>,
    generation: u64,
    last_load_view: Option<MapView>,
    events: Vec<MapEvent>,
    messenger: Option<Arc<dyn Messenger>>,
}

impl Debug for MapSurface {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSurface")
            .field("role", &self.role)
            .field("settings", &self.settings)
            .field("dataset", &self.dataset)
            .field("view", &self.view)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl MapSurface {
    /// Creates a surface with its full layer stack.
    ///
    /// The store must be in the projection of the settings.
    pub(crate) fn new(
        role: SurfaceRole,
        config: Arc<OceanMapConfig>,
        settings: MapSettings,
        dataset: DatasetView,
        store: SharedFeatureStore,
        selection: SharedSelection,
        messenger: Option<Arc<dyn Messenger>>,
    ) -> Self {
        let view = initial_view(&settings, &dataset, config.tile_size);
        let mut surface = Self {
            role,
            config,
            settings,
            dataset,
            view,
            layers: LayerCollection::default(),
            store,
            selection,
            annotations: Vec::new(),
            draw: None,
            highlighted: None,
            generation: 0,
            last_load_view: None,
            events: Vec::new(),
            messenger,
        };
        surface.rebuild_layers();
        surface
    }

    /// Role of the surface.
    pub fn role(&self) -> SurfaceRole {
        self.role
    }

    /// Current map settings.
    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    /// Current dataset.
    pub fn dataset(&self) -> &DatasetView {
        &self.dataset
    }

    /// Current view.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Layer stack in render order.
    pub fn layers(&self) -> &LayerCollection {
        &self.layers
    }

    /// Feature store displayed by the surface.
    pub fn store(&self) -> &SharedFeatureStore {
        &self.store
    }

    /// Selection shared with the other surface.
    pub fn selection(&self) -> &SharedSelection {
        &self.selection
    }

    /// Feature under the pointer.
    pub fn highlighted(&self) -> Option<&FeatureId> {
        self.highlighted.as_ref()
    }

    /// Draw in progress.
    pub fn draw_session(&self) -> Option<&DrawSession> {
        self.draw.as_ref()
    }

    /// Number of resets the surface went through.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Current interaction mode.
    pub fn mode(&self) -> InteractionMode {
        if let Some(session) = &self.draw {
            InteractionMode::Drawing(session.geometry_type())
        } else if !self.selection.read().is_empty() {
            InteractionMode::Selecting
        } else {
            InteractionMode::Idle
        }
    }

    /// Features of the store with the style they should be rendered with, in render order.
    pub fn styled_features(&self) -> Vec<(Feature, FeatureStyle)> {
        let store = self.store.read();
        let selection = self.selection.read();
        store
            .iter()
            .map(|feature| {
                let context = StyleContext {
                    selected: selection.contains(feature.id()),
                    highlighted: self.highlighted.as_ref() == Some(feature.id()),
                    settings: &self.settings,
                };
                (feature.clone(), feature_style(feature, &context))
            })
            .collect()
    }

    /// Recreates the surface for new settings and a new store: pending draws and loads are dropped, every layer
    /// source is rebuilt and the view moves to the default location of the projection or of the dataset.
    ///
    /// Layers are rebuilt before the view is replaced.
    pub(crate) fn reset(&mut self, settings: MapSettings, store: SharedFeatureStore) {
        log::debug!(
            "Resetting {:?} surface to {}",
            self.role,
            settings.projection
        );

        self.generation += 1;
        self.settings = settings;
        self.store = store;
        self.draw = None;
        self.highlighted = None;
        self.annotations.clear();
        self.last_load_view = None;
        self.rebuild_layers();

        let (width, height) = self.view.size();
        self.view = initial_view(&self.settings, &self.dataset, self.config.tile_size).with_size(width, height);
        self.push_view_changed();
        self.redraw();
    }

    /// Applies settings that keep the projection. Only sources that depend on changed settings are replaced.
    pub(crate) fn apply_settings(&mut self, settings: MapSettings) {
        if settings.projection != self.settings.projection {
            log::warn!(
                "Projection change to {} requires a surface reset, keeping {}",
                settings.projection,
                self.settings.projection
            );
        }

        self.settings = MapSettings {
            projection: self.settings.projection,
            ..settings
        };
        self.rebuild_layers();
        self.redraw();
    }

    /// Shows another dataset or other parameters of the same dataset.
    ///
    /// Only the data and quiver layer sources change. When the dataset id changes and the new dataset has a default
    /// location, the view moves there.
    pub(crate) fn set_dataset(&mut self, dataset: DatasetView) -> Result<(), OceanMapError> {
        dataset.validate()?;

        let moves = dataset.dataset != self.dataset.dataset && dataset.default_location.is_some();
        self.dataset = dataset;
        self.rebuild_layers();

        if moves {
            let (width, height) = self.view.size();
            self.view = initial_view(&self.settings, &self.dataset, self.config.tile_size).with_size(width, height);
            self.push_view_changed();
        }

        self.redraw();
        Ok(())
    }

    /// Replaces the view. Views of another projection are ignored.
    pub(crate) fn set_view(&mut self, view: MapView) -> bool {
        if view.projection() != self.settings.projection {
            log::warn!(
                "Ignoring view in {} on a {} surface",
                view.projection(),
                self.settings.projection
            );
            return false;
        }

        self.view = view;
        self.push_view_changed();
        self.redraw();
        true
    }

    /// Sets the size of the viewport in pixels.
    pub(crate) fn set_size(&mut self, width: f64, height: f64) {
        self.view = self.view.with_size(width, height);
        self.push_view_changed();
        self.redraw();
    }

    /// Replaces the features of the annotation layer. Geometry must be in the surface projection.
    pub(crate) fn set_annotations(&mut self, annotations: Vec<Feature>) {
        self.annotations = annotations;
        if self
            .layers
            .replace_source(LayerKind::Annotation, LayerSource::Annotations(self.annotations.clone()))
        {
            self.redraw();
        }
    }

    /// Starts drawing a geometry, discarding a draw in progress.
    pub(crate) fn start_drawing(&mut self, geometry_type: GeometryType) {
        if let Some(session) = &self.draw {
            log::debug!("Cancelling {} draw", session.geometry_type());
        }

        self.draw = Some(DrawSession::new(geometry_type));
        self.highlighted = None;
        self.update_sketch();
    }

    /// Cancels the draw in progress without adding a feature. Returns `false` if nothing was drawn.
    pub(crate) fn stop_drawing(&mut self) -> bool {
        if self.draw.take().is_none() {
            return false;
        }

        self.update_sketch();
        true
    }

    /// Completes the draw in progress. If the geometry has too few vertices, the draw continues and `None` is
    /// returned.
    pub(crate) fn finish_drawing(&mut self) -> Option<FeatureId> {
        let geometry = match self.draw.as_ref()?.finish() {
            Ok(geometry) => geometry,
            Err(err) => {
                log::info!("Draw not finished: {err}");
                return None;
            }
        };

        self.commit(geometry)
    }

    /// Processes a pointer event.
    pub(crate) fn handle_event(&mut self, event: UserEvent) -> EventPropagation {
        match event {
            UserEvent::Click { position, modifiers } => match &mut self.draw {
                Some(session) => {
                    if let Some(geometry) = session.add_vertex(position) {
                        self.commit(geometry);
                    } else {
                        self.update_sketch();
                    }
                    EventPropagation::Stop
                }
                None => self.click(position, modifiers),
            },
            UserEvent::DoubleClick { position, modifiers } => match &mut self.draw {
                Some(session) => {
                    if let Some(geometry) = session.add_vertex(position) {
                        self.commit(geometry);
                    } else {
                        self.finish_drawing();
                        self.update_sketch();
                    }
                    EventPropagation::Stop
                }
                None => self.double_click(position, modifiers),
            },
            UserEvent::PointerMoved { position } => {
                self.hover(position);
                EventPropagation::Propagate
            }
            UserEvent::BoxSelect { extent, modifiers } => {
                if self.draw.is_some() {
                    EventPropagation::Propagate
                } else {
                    self.box_select(&extent, modifiers)
                }
            }
        }
    }

    /// Issues server feature loads if the view changed since the last loads or a refresh was requested.
    pub(crate) fn begin_feature_load(&mut self) -> Vec<LoadTicket> {
        let refresh = self.store.write().take_refresh();
        if !refresh && self.last_load_view == Some(self.view) {
            return Vec::new();
        }

        let requests = self.store.read().load_requests().to_vec();
        if requests.is_empty() {
            return Vec::new();
        }

        self.last_load_view = Some(self.view);
        let resolution = self.view.resolution();
        let extent = self.view.extent();
        requests
            .into_iter()
            .map(|(kind, id)| {
                let request = FeatureRequest {
                    kind,
                    id,
                    projection: self.settings.projection,
                    resolution,
                    extent,
                };
                LoadTicket::new(self.generation, &self.store, request)
            })
            .collect()
    }

    /// Applies the result of a feature load. Returns `true` if the result was applied to the store.
    ///
    /// Results of tickets issued before the last reset are discarded. A failed load leaves the store unchanged.
    pub(crate) fn finish_feature_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<Feature>, OceanMapError>,
    ) -> bool {
        let request = ticket.request();
        if ticket.generation() != self.generation || !ticket.targets(&self.store) {
            log::debug!(
                "Discarding stale {:?} features {} of generation {}",
                request.kind,
                request.id,
                ticket.generation()
            );
            return false;
        }

        let features = match result {
            Ok(features) => features,
            Err(err) => {
                log::warn!("Failed to load {:?} features {}: {err}", request.kind, request.id);
                return false;
            }
        };

        let mut changed = false;
        {
            let mut store = self.store.write();
            for feature in features {
                changed |= matches!(
                    store.upsert_loaded(feature),
                    UpsertOutcome::Inserted | UpsertOutcome::Replaced
                );
            }
        }

        if changed {
            self.redraw();
        }

        true
    }

    /// Takes the queued events.
    pub(crate) fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    /// Requests a redraw of the surface.
    pub fn redraw(&self) {
        if let Some(messenger) = &self.messenger {
            messenger.request_redraw();
        }
    }

    pub(crate) fn set_messenger(&mut self, messenger: Option<Arc<dyn Messenger>>) {
        self.messenger = messenger;
    }

    /// Descriptors of the selected features.
    pub(crate) fn selected_descriptors(&self) -> Vec<FeatureDescriptor> {
        let store = self.store.read();
        let selection = self.selection.read();
        selection
            .ids()
            .filter_map(|id| store.get_by_id(id))
            .filter_map(|feature| FeatureDescriptor::from_feature(feature, self.settings.projection))
            .collect()
    }

    fn commit(&mut self, geometry: Geometry) -> Option<FeatureId> {
        let feature = Feature::drawn(geometry);
        let id = feature.id().clone();
        let descriptor = FeatureDescriptor::from_feature(&feature, self.settings.projection);

        if let Err(err) = self.store.write().add(feature) {
            log::warn!("Drawn feature was not added: {err}");
            return None;
        }

        self.draw = None;
        self.update_sketch();
        match descriptor {
            Some(descriptor) => self.events.push(MapEvent::DrawComplete(descriptor)),
            None => log::warn!("Drawn feature {id} cannot be converted to geographic coordinates"),
        }

        Some(id)
    }

    fn click(&mut self, position: Point2d, modifiers: Modifiers) -> EventPropagation {
        match self.feature_at(&position) {
            Some(feature) => {
                self.selection.write().toggle(&feature);
                self.push_selection_changed();
                EventPropagation::Stop
            }
            None => {
                if !modifiers.any() && self.selection.write().clear() {
                    self.push_selection_changed();
                }
                EventPropagation::Propagate
            }
        }
    }

    fn double_click(&mut self, position: Point2d, modifiers: Modifiers) -> EventPropagation {
        let Some(feature) = self.feature_at(&position) else {
            return EventPropagation::Propagate;
        };

        if !self.selection.read().contains(feature.id()) {
            return self.click(position, modifiers);
        }

        match FeatureDescriptor::from_feature(&feature, self.settings.projection) {
            Some(descriptor) => self.events.push(MapEvent::FeatureActivated(descriptor)),
            None => log::warn!("Activated feature {} cannot be described", feature.id()),
        }

        EventPropagation::Stop
    }

    fn hover(&mut self, position: Point2d) {
        let previous = self.highlighted.take();
        if self.draw.is_none() {
            self.highlighted = self.feature_at(&position).map(|feature| feature.id().clone());
        }

        if previous != self.highlighted {
            self.redraw();
        }
    }

    fn box_select(&mut self, extent: &Rect, modifiers: Modifiers) -> EventPropagation {
        let changed = {
            let store = self.store.read();
            let hits = features_in_rect(&store, extent);
            let mut selection = self.selection.write();
            let before = selection.clone();
            if modifiers.any() {
                selection.extend(hits);
            } else {
                selection.replace(hits);
            }
            *selection != before
        };

        if changed {
            self.push_selection_changed();
        }

        EventPropagation::Stop
    }

    fn feature_at(&self, position: &Point2d) -> Option<Feature> {
        let tolerance = self.config.hit_tolerance_px * self.view.resolution();
        let store = self.store.read();
        let hit = hit_test(&store, position, tolerance)
            .first()
            .map(|&feature| feature.clone());
        hit
    }

    fn push_selection_changed(&mut self) {
        let descriptors = self.selected_descriptors();
        self.events.push(MapEvent::SelectionChanged(descriptors));
        self.redraw();
    }

    fn push_view_changed(&mut self) {
        match self.view.geo_center() {
            Some(center) => self.events.push(MapEvent::ViewChanged {
                surface: self.role,
                center,
                zoom: self.view.zoom(),
                extent: self.view.extent(),
            }),
            None => log::debug!("View center of {:?} surface is outside of the projection", self.role),
        }
    }

    fn update_sketch(&mut self) {
        let vertices = self
            .draw
            .as_ref()
            .map(|session| session.vertices().to_vec())
            .unwrap_or_default();
        if self
            .layers
            .replace_source(LayerKind::ObservationDraw, LayerSource::Sketch(vertices))
        {
            self.redraw();
        }
    }

    fn rebuild_layers(&mut self) {
        let basemap = match build_basemap_layer(
            &self.config.api_base_url,
            self.settings.basemap,
            self.settings.projection,
            self.config.attribution.clone(),
            self.settings.shaded_relief,
        ) {
            Ok(basemap) => Some(basemap),
            Err(err) => {
                log::warn!("Failed to build base map: {err}");
                None
            }
        };

        for kind in LayerKind::ALL {
            let source = self.layer_source(kind, basemap.as_ref());
            self.layers.insert(kind, source);
        }

        let overlays = basemap.as_ref().map_or(true, |basemap| basemap.overlays_enabled);
        let bathymetry = &self.settings.bathymetry;
        self.layers.set_z_index(
            LayerKind::Basemap,
            basemap.as_ref().map_or(BASEMAP_Z_INDEX, |basemap| basemap.z_index),
        );
        self.layers.set_visible(LayerKind::Land, overlays);
        self.layers.set_visible(LayerKind::Bathymetry, bathymetry.visible);
        self.layers.set_opacity(LayerKind::Bathymetry, bathymetry.opacity());
        self.layers
            .set_visible(LayerKind::BathymetryBoundary, overlays && bathymetry.visible);

        let has_quiver = self
            .layers
            .get(LayerKind::Quiver)
            .is_some_and(|layer| !layer.source().is_empty());
        self.layers.set_visible(LayerKind::Quiver, has_quiver);
    }

    fn layer_source(&self, kind: LayerKind, basemap: Option<&BasemapLayer>) -> LayerSource {
        let base_url = self.config.api_base_url.as_str();
        let projection = self.settings.projection;
        let no_dataset = self.dataset.dataset.is_empty();

        let source = match kind {
            LayerKind::Basemap => Ok(basemap.map_or(LayerSource::Empty, |basemap| {
                LayerSource::Raster(basemap.source.clone())
            })),
            LayerKind::Data if no_dataset => Ok(LayerSource::Empty),
            LayerKind::Data => build_data_tile_source(base_url, &self.dataset, &self.settings).map(LayerSource::Raster),
            LayerKind::Land => build_land_source(base_url, projection).map(LayerSource::Vector),
            LayerKind::Bathymetry => build_bathymetry_source(base_url, projection).map(LayerSource::Raster),
            LayerKind::BathymetryBoundary => build_bathymetry_boundary_source(
                base_url,
                projection,
                self.settings.bathymetry.contour_layer,
            )
            .map(LayerSource::Vector),
            LayerKind::Annotation => Ok(LayerSource::Annotations(self.annotations.clone())),
            LayerKind::Features => Ok(LayerSource::Features(self.store.clone())),
            LayerKind::ObservationDraw => Ok(LayerSource::Sketch(
                self.draw
                    .as_ref()
                    .map(|session| session.vertices().to_vec())
                    .unwrap_or_default(),
            )),
            LayerKind::Quiver if no_dataset => Ok(LayerSource::Empty),
            LayerKind::Quiver => build_quiver_source(base_url, &self.dataset, &self.settings)
                .map(|quiver| quiver.map_or(LayerSource::Empty, LayerSource::Quiver)),
        };

        source.unwrap_or_else(|err| {
            log::warn!("Failed to build source of {kind:?} layer: {err}");
            LayerSource::Empty
        })
    }
}

fn initial_view(settings: &MapSettings, dataset: &DatasetView, tile_size: u32) -> MapView {
    let projection = settings.projection;
    dataset
        .default_location
        .as_ref()
        .and_then(|location| MapView::at(projection, &location.center, location.zoom, tile_size))
        .unwrap_or_else(|| MapView::for_projection(projection, tile_size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureClass, FeatureKind};
    use crate::projection::ProjectionId;
    use crate::settings::{BasemapChoice, DefaultLocation, QuiverSettings};
    use assert_matches::assert_matches;
    use oceanmap_types::latlon;

    fn dataset() -> DatasetView {
        DatasetView::new("giops_day", "votemper")
    }

    fn surface_with(settings: MapSettings) -> MapSurface {
        let store = SharedFeatureStore::new(settings.projection);
        MapSurface::new(
            SurfaceRole::Primary,
            Arc::new(OceanMapConfig::default()),
            settings,
            dataset(),
            store,
            SharedSelection::default(),
            None,
        )
    }

    fn surface() -> MapSurface {
        surface_with(MapSettings::default())
    }

    fn offset(surface: &MapSurface, dx: f64, dy: f64) -> Point2d {
        let center = surface.view().center();
        Point2d::new(center.x + dx, center.y + dy)
    }

    fn add(surface: &MapSurface, id: &str, geometry: Geometry) {
        surface
            .store()
            .write()
            .add(Feature::new(FeatureId::new(id), geometry, FeatureClass::Standard))
            .expect("added");
    }

    fn selected(surface: &MapSurface) -> Vec<String> {
        surface
            .selection()
            .read()
            .ids()
            .map(|id| id.to_string())
            .collect()
    }

    #[test]
    fn layers_in_fixed_order() {
        let surface = surface();
        let kinds: Vec<_> = surface.layers().iter().map(|layer| layer.kind()).collect();
        assert_eq!(kinds, LayerKind::ALL);

        let data = surface.layers().get(LayerKind::Data).expect("data layer");
        let template = data.source().tile_source().expect("tiles").template();
        assert!(template.contains("/giops_day/votemper/"));

        let quiver = surface.layers().get(LayerKind::Quiver).expect("quiver layer");
        assert!(quiver.source().is_empty());
        assert!(!quiver.is_visible());
    }

    #[test]
    fn dataset_change_replaces_only_data_source() {
        let mut surface = surface();
        let data = surface.layers().get(LayerKind::Data).cloned().expect("data layer");
        let land = surface.layers().get(LayerKind::Land).cloned().expect("land layer");

        let mut dataset = dataset();
        dataset.time = 2_212_012_800;
        surface.set_dataset(dataset).expect("valid dataset");

        let new_data = surface.layers().get(LayerKind::Data).expect("data layer");
        assert_eq!(new_data.id(), data.id());
        assert_eq!(new_data.revision(), data.revision() + 1);
        assert_eq!(surface.layers().get(LayerKind::Land), Some(&land));
    }

    #[test]
    fn invalid_dataset_is_rejected() {
        let mut surface = surface();
        assert_matches!(
            surface.set_dataset(DatasetView::new("", "votemper")),
            Err(OceanMapError::InvalidDataset(_))
        );
        assert_eq!(surface.dataset().dataset, "giops_day");
    }

    #[test]
    fn new_dataset_moves_to_its_default_location() {
        let mut surface = surface();
        let mut dataset = DatasetView::new("riops_day", "votemper");
        dataset.default_location = Some(DefaultLocation {
            center: latlon!(47.0, -60.0),
            zoom: 6.0,
        });
        surface.set_dataset(dataset).expect("valid dataset");

        let center = surface.view().geo_center().expect("center");
        approx::assert_abs_diff_eq!(center.lat(), 47.0, epsilon = 1e-6);
        assert_eq!(surface.view().zoom(), 6.0);
        assert_matches!(surface.drain_events().as_slice(), [MapEvent::ViewChanged { .. }]);
    }

    #[test]
    fn chart_basemap_hides_overlays() {
        let mut surface = surface();
        surface.apply_settings(MapSettings {
            basemap: BasemapChoice::Chart,
            ..MapSettings::default()
        });

        let kinds: Vec<_> = surface.layers().iter().map(|layer| layer.kind()).collect();
        assert_eq!(kinds[..3], [LayerKind::Data, LayerKind::Basemap, LayerKind::Land]);

        let layers = surface.layers();
        assert!(!layers.get(LayerKind::Land).expect("land").is_visible());
        assert!(!layers.get(LayerKind::BathymetryBoundary).expect("boundary").is_visible());
        assert!(layers.get(LayerKind::Bathymetry).expect("bathymetry").is_visible());
    }

    #[test]
    fn quiver_layer_follows_dataset() {
        let mut surface = surface();
        let mut dataset = dataset();
        dataset.quiver = QuiverSettings {
            variable: "magwatervel".into(),
            density: 1,
        };
        surface.set_dataset(dataset).expect("valid dataset");

        let quiver = surface.layers().get(LayerKind::Quiver).expect("quiver layer");
        assert_matches!(quiver.source(), LayerSource::Quiver(_));
        assert!(quiver.is_visible());
    }

    #[test]
    fn draw_polygon() {
        let mut surface = surface();
        surface.start_drawing(GeometryType::Polygon);
        assert_eq!(surface.mode(), InteractionMode::Drawing(GeometryType::Polygon));

        let vertices = [
            offset(&surface, 0.0, 0.0),
            offset(&surface, 100_000.0, 0.0),
            offset(&surface, 50_000.0, 100_000.0),
        ];
        for vertex in vertices {
            surface.handle_event(UserEvent::click(vertex));
        }
        assert_eq!(surface.draw_session().map(|s| s.vertices().len()), Some(3));

        surface.handle_event(UserEvent::double_click(vertices[2]));

        assert_eq!(surface.mode(), InteractionMode::Idle);
        let store = surface.store().read();
        assert_eq!(store.len(), 1);
        let feature = store.iter().next().expect("feature");
        assert_eq!(feature.coordinates(), vertices);
        assert_eq!(feature.properties().kind.as_deref(), Some("area"));
        drop(store);

        assert_matches!(surface.drain_events().as_slice(), [MapEvent::DrawComplete(descriptor)] if descriptor.coordinates.len() == 3);
    }

    #[test]
    fn too_short_draw_is_rejected() {
        let mut surface = surface();
        surface.start_drawing(GeometryType::LineString);
        surface.handle_event(UserEvent::click(offset(&surface, 0.0, 0.0)));

        assert_eq!(surface.finish_drawing(), None);
        assert_eq!(surface.mode(), InteractionMode::Drawing(GeometryType::LineString));
        assert!(surface.store().read().is_empty());

        assert!(surface.stop_drawing());
        assert_eq!(surface.mode(), InteractionMode::Idle);
        assert!(surface.store().read().is_empty());
    }

    #[test]
    fn click_toggles_selection() {
        let mut surface = surface();
        let position = offset(&surface, 0.0, 0.0);
        add(&surface, "a", Geometry::point(position).expect("valid"));

        assert_eq!(surface.handle_event(UserEvent::click(position)), EventPropagation::Stop);
        assert_eq!(selected(&surface), ["a"]);
        assert_eq!(surface.mode(), InteractionMode::Selecting);

        let empty = offset(&surface, 2_000_000.0, 0.0);
        assert_eq!(surface.handle_event(UserEvent::click(empty)), EventPropagation::Propagate);
        assert!(selected(&surface).is_empty());

        let events = surface.drain_events();
        assert_matches!(events.as_slice(), [MapEvent::SelectionChanged(first), MapEvent::SelectionChanged(second)] if first.len() == 1 && second.is_empty());
    }

    #[test]
    fn double_click_activates_selected_feature() {
        let mut surface = surface();
        let position = offset(&surface, 0.0, 0.0);
        add(&surface, "a", Geometry::point(position).expect("valid"));
        surface.handle_event(UserEvent::click(position));
        surface.drain_events();

        surface.handle_event(UserEvent::double_click(position));
        assert_eq!(selected(&surface), ["a"]);
        assert_matches!(surface.drain_events().as_slice(), [MapEvent::FeatureActivated(descriptor)] if descriptor.id.as_str() == "a");
    }

    #[test]
    fn box_select_collapses_to_shape() {
        let mut surface = surface();
        add(&surface, "p", Geometry::point(offset(&surface, 0.0, 0.0)).expect("valid"));
        add(
            &surface,
            "line",
            Geometry::line_string(vec![offset(&surface, 10.0, 10.0), offset(&surface, 20.0, 20.0)]).expect("valid"),
        );

        let extent = Rect::from_center(surface.view().center(), 1000.0, 1000.0);
        surface.handle_event(UserEvent::BoxSelect {
            extent,
            modifiers: Modifiers {
                shift: true,
                platform: false,
            },
        });
        assert_eq!(selected(&surface), ["line"]);
    }

    #[test]
    fn at_most_one_feature_highlighted() {
        let mut surface = surface();
        let position = offset(&surface, 0.0, 0.0);
        add(&surface, "a", Geometry::point(position).expect("valid"));
        add(&surface, "b", Geometry::point(position).expect("valid"));

        surface.handle_event(UserEvent::PointerMoved { position });
        assert_eq!(surface.highlighted().map(|id| id.as_str()), Some("b"));

        let styled = surface.styled_features();
        assert_eq!(styled.len(), 2);
        assert_ne!(styled[0].1, styled[1].1);

        surface.handle_event(UserEvent::PointerMoved {
            position: offset(&surface, 3_000_000.0, 0.0),
        });
        assert_eq!(surface.highlighted(), None);
    }

    #[test]
    fn loads_only_on_view_change_or_refresh() {
        let mut surface = surface();
        assert!(surface.begin_feature_load().is_empty());

        surface
            .store()
            .write()
            .add_load_request(FeatureKind::ObservationPoint, "argo");
        let tickets = surface.begin_feature_load();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].request().projection, ProjectionId::Epsg3857);
        assert!(surface.store().read().reload_pending());
        drop(tickets);

        assert!(surface.begin_feature_load().is_empty());
        surface.set_view(surface.view().translate(10.0, 0.0));
        assert_eq!(surface.begin_feature_load().len(), 1);

        surface.store().write().refresh();
        assert_eq!(surface.begin_feature_load().len(), 1);
        assert!(!surface.store().read().reload_pending());
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut surface = surface();
        surface
            .store()
            .write()
            .add_load_request(FeatureKind::Class4, "class4_20200101");
        let ticket = surface.begin_feature_load().pop().expect("ticket");

        let settings = MapSettings {
            projection: ProjectionId::Epsg3031,
            ..MapSettings::default()
        };
        surface.reset(settings, SharedFeatureStore::new(ProjectionId::Epsg3031));
        assert_eq!(surface.generation(), 1);

        let feature = Feature::new(
            FeatureId::new("class4:a"),
            Geometry::point(Point2d::new(0.0, 0.0)).expect("valid"),
            FeatureClass::Standard,
        );
        assert!(!surface.finish_feature_load(ticket, Ok(vec![feature])));
        assert!(surface.store().read().is_empty());
    }

    #[test]
    fn failed_load_leaves_store_unchanged() {
        let mut surface = surface();
        add(&surface, "a", Geometry::point(offset(&surface, 0.0, 0.0)).expect("valid"));
        surface
            .store()
            .write()
            .add_load_request(FeatureKind::KmlPoint, "ports");
        let ticket = surface.begin_feature_load().pop().expect("ticket");

        assert!(!surface.finish_feature_load(ticket, Err(OceanMapError::IO)));
        assert_eq!(surface.store().read().len(), 1);
    }

    #[test]
    fn reset_moves_view_and_keeps_size() {
        let mut surface = surface();
        surface.set_size(800.0, 600.0);
        surface.start_drawing(GeometryType::Point);

        let settings = MapSettings {
            projection: ProjectionId::Epsg32661,
            ..MapSettings::default()
        };
        surface.reset(settings, SharedFeatureStore::new(ProjectionId::Epsg32661));

        assert_eq!(surface.view().projection(), ProjectionId::Epsg32661);
        assert_eq!(surface.view().size(), (800.0, 600.0));
        assert_eq!(surface.mode(), InteractionMode::Idle);
        let data = surface.layers().get(LayerKind::Data).expect("data layer");
        assert!(data.source().tile_source().expect("tiles").template().contains("/EPSG:32661/"));
    }
}
