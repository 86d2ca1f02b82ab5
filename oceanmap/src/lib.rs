//! Oceanmap is the map engine of an oceanographic dataset viewer. It keeps one or two map surfaces in sync with the
//! selected datasets and map settings, builds tile source URLs for the data server, stores vector features in the
//! planar coordinates of the active projection and runs the drawing and selection state machine.
//!
//! The engine does not render anything. The host application renders the [`layers`](layer) of every
//! [`surface`] and forwards pointer input to the map.
//!
//! # Quick start
//!
//! ```no_run
//! use oceanmap::interaction::UserEvent;
//! use oceanmap::event::MapEvent;
//! use oceanmap::settings::DatasetView;
//! use oceanmap::surface::SurfaceRole;
//! use oceanmap::oceanmap_types::GeometryType;
//! use oceanmap::OceanMapBuilder;
//!
//! let mut map = OceanMapBuilder::default()
//!     .with_dataset(DatasetView::new("giops_day", "votemper"))
//!     .with_listener(|event: &MapEvent| {
//!         if let MapEvent::DrawComplete(feature) = event {
//!             println!("plot requested for {:?}", feature.coordinates);
//!         }
//!     })
//!     .build()?;
//!
//! map.start_drawing(GeometryType::Point);
//! let position = map.surface(SurfaceRole::Primary).unwrap().view().center();
//! map.handle_event(SurfaceRole::Primary, UserEvent::click(position));
//! # Ok::<(), oceanmap::OceanMapError>(())
//! ```
//!
//! # Main components
//!
//! * [`OceanMap`] owns the [`primary and optional comparison surfaces`](surface::MapSurface), the shared
//!   [`feature store`](feature::FeatureStore) and the shared [`selection`](interaction::Selection). All changes go
//!   through it, and it dispatches [`events`](event::MapEvent) to the registered listeners.
//! * [`projection`] is the registry of the supported projections. Geometry is converted between planar and
//!   geographic coordinates only by the functions in [`api`].
//! * [`tile_source`] builds the tile endpoints of every layer from [`settings`].
//! * Server feature sets are loaded asynchronously through [`feature::LoadTicket`]s, which are discarded when the
//!   surface was reset while they were in flight.

pub mod api;
mod color;
pub mod config;
pub mod error;
pub mod event;
pub mod feature;
pub mod interaction;
pub mod layer;
mod map;
mod messenger;
pub mod projection;
pub mod settings;
pub mod style;
pub mod surface;
pub mod tile_source;
mod view;

pub use color::Color;
pub use error::OceanMapError;
pub use map::{OceanMap, OceanMapBuilder};
pub use messenger::Messenger;
pub use view::MapView;

// Reexport oceanmap_types
pub use oceanmap_types;
