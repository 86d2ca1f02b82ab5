//! Pointer interaction: drawing new geometry, selecting and hovering features.
//!
//! The host converts its input events into [`UserEvent`]s with positions in planar coordinates of the surface (see
//! [`crate::MapView::screen_to_map`]) and hands them to [`crate::OceanMap::handle_event`]. What an event does
//! depends on the [`InteractionMode`] of the surface:
//!
//! * `Drawing` - clicks add vertices, a double click finishes the geometry;
//! * `Idle` and `Selecting` - clicks toggle selection of the feature under the pointer, a double click on a selected
//!   feature activates it, pointer moves highlight the feature under the pointer.

use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::GeometryType;

mod draw;
mod hit_test;
mod selection;

pub use draw::DrawSession;
pub use hit_test::{distance_to_geometry, features_in_rect, hit_test};
pub use selection::{Selection, SharedSelection};

/// Keyboard modifiers held during an event.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key.
    pub shift: bool,
    /// Platform modifier: Ctrl, or Cmd on macOS.
    pub platform: bool,
}

impl Modifiers {
    /// No modifiers.
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        platform: false,
    };

    /// Returns `true` if any modifier is held.
    pub fn any(&self) -> bool {
        self.shift || self.platform
    }
}

/// User interaction event in planar coordinates of the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum UserEvent {
    /// A single click. Clicks that are part of a double click must not be reported.
    Click {
        /// Position of the pointer.
        position: Point2d,
        /// Modifiers held.
        modifiers: Modifiers,
    },
    /// A double click.
    DoubleClick {
        /// Position of the pointer.
        position: Point2d,
        /// Modifiers held.
        modifiers: Modifiers,
    },
    /// Pointer moved.
    PointerMoved {
        /// New position of the pointer.
        position: Point2d,
    },
    /// A selection box was dragged.
    BoxSelect {
        /// Area of the box.
        extent: Rect,
        /// Modifiers held.
        modifiers: Modifiers,
    },
}

impl UserEvent {
    /// A click without modifiers.
    pub fn click(position: Point2d) -> Self {
        Self::Click {
            position,
            modifiers: Modifiers::NONE,
        }
    }

    /// A double click without modifiers.
    pub fn double_click(position: Point2d) -> Self {
        Self::DoubleClick {
            position,
            modifiers: Modifiers::NONE,
        }
    }
}

/// What the surface does with pointer events.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum InteractionMode {
    /// Nothing is selected or drawn.
    Idle,
    /// A geometry of the given type is being drawn.
    Drawing(GeometryType),
    /// At least one feature is selected.
    Selecting,
}

/// Tells the host whether the event was used by the map.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventPropagation {
    /// Event was not used and can be handled by the host (e.g. to pan the map).
    Propagate,
    /// Event was consumed.
    Stop,
}
