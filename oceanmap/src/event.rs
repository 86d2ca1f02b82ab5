//! Events sent by the engine to the host application.

use oceanmap_types::cartesian::Rect;
use oceanmap_types::geo::GeoPoint2d;

use crate::api::FeatureDescriptor;
use crate::surface::SurfaceRole;

/// Change of the map state the host application may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// Set of selected features changed. Contains all currently selected features, oldest first.
    SelectionChanged(Vec<FeatureDescriptor>),
    /// An already selected feature was double clicked.
    FeatureActivated(FeatureDescriptor),
    /// User finished drawing a geometry, which was added to the feature store.
    DrawComplete(FeatureDescriptor),
    /// A surface was panned or zoomed.
    ViewChanged {
        /// Surface that changed.
        surface: SurfaceRole,
        /// Geographic center of the view.
        center: GeoPoint2d,
        /// Zoom level.
        zoom: f64,
        /// Visible area in planar coordinates.
        extent: Rect,
    },
}

/// Subscriber to [`MapEvent`]s.
pub trait MapEventListener: Send + Sync {
    /// Called for every event, in the order events occurred.
    fn on_event(&self, event: &MapEvent);
}

impl<T: Fn(&MapEvent) + Send + Sync> MapEventListener for T {
    fn on_event(&self, event: &MapEvent) {
        self(event)
    }
}
