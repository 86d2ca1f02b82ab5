//! Notification of the host application about changes in visual state of the map.

/// Receives redraw requests from map surfaces.
///
/// The engine never renders anything itself. A surface calls [`Messenger::request_redraw`] every time its layers,
/// view or feature styles change, and the host schedules a new frame.
pub trait Messenger: Send + Sync {
    /// Requests a new frame to be rendered.
    fn request_redraw(&self);
}

impl<T: Fn() + Send + Sync> Messenger for T {
    fn request_redraw(&self) {
        self()
    }
}
