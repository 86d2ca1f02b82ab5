//! Position and scale of a map surface.

use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::geo::GeoPoint2d;

use crate::projection::ProjectionId;

/// Default size of a surface in pixels until the host reports the real one.
const DEFAULT_SIZE: (f64, f64) = (1024.0, 768.0);

/// View of a surface: projection, planar center, zoom level and size of the viewport in pixels.
///
/// Zoom is always kept inside the range allowed by the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    projection: ProjectionId,
    center: Point2d,
    zoom: f64,
    width: f64,
    height: f64,
    tile_size: u32,
}

impl MapView {
    /// Default view of the projection.
    pub fn for_projection(projection: ProjectionId, tile_size: u32) -> Self {
        let info = projection.info();
        let center = projection
            .project(&info.center)
            .unwrap_or_else(|| info.planar_extent.center());

        Self {
            projection,
            center,
            zoom: info.zoom,
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            tile_size,
        }
    }

    /// View centered at the geographic point. Returns `None` if the point is outside the projection's world extent.
    pub fn at(projection: ProjectionId, center: &GeoPoint2d, zoom: f64, tile_size: u32) -> Option<Self> {
        if !projection.info().covers(center) {
            return None;
        }

        let view = Self::for_projection(projection, tile_size);
        Some(view.with_center(projection.project(center)?).with_zoom(zoom))
    }

    /// Returns a copy of the view with the given planar center.
    pub fn with_center(&self, center: Point2d) -> Self {
        Self { center, ..*self }
    }

    /// Returns a copy of the view with the given zoom, clamped into the projection's zoom range.
    pub fn with_zoom(&self, zoom: f64) -> Self {
        let zoom = if zoom.is_finite() {
            self.projection.info().clamp_zoom(zoom)
        } else {
            self.zoom
        };
        Self { zoom, ..*self }
    }

    /// Returns a copy of the view with the given viewport size in pixels.
    pub fn with_size(&self, width: f64, height: f64) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
            ..*self
        }
    }

    /// Projection of the view.
    pub fn projection(&self) -> ProjectionId {
        self.projection
    }

    /// Planar center.
    pub fn center(&self) -> Point2d {
        self.center
    }

    /// Geographic center.
    pub fn geo_center(&self) -> Option<GeoPoint2d> {
        self.projection.unproject(&self.center)
    }

    /// Zoom level.
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    /// Viewport width and height in pixels.
    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Size of a pixel in projected units.
    pub fn resolution(&self) -> f64 {
        self.projection.info().resolution(self.zoom, self.tile_size)
    }

    /// Visible area in projected units.
    pub fn extent(&self) -> Rect {
        let resolution = self.resolution();
        Rect::from_center(self.center, self.width * resolution, self.height * resolution)
    }

    /// Converts a screen position (pixels from the top-left corner) into planar coordinates.
    pub fn screen_to_map(&self, screen: Point2d) -> Point2d {
        let resolution = self.resolution();
        Point2d::new(
            self.center.x + (screen.x - self.width / 2.0) * resolution,
            self.center.y - (screen.y - self.height / 2.0) * resolution,
        )
    }

    /// Converts planar coordinates into a screen position.
    pub fn map_to_screen(&self, map: Point2d) -> Point2d {
        let resolution = self.resolution();
        Point2d::new(
            (map.x - self.center.x) / resolution + self.width / 2.0,
            (self.center.y - map.y) / resolution + self.height / 2.0,
        )
    }

    /// Moves the view by the given number of pixels.
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        let resolution = self.resolution();
        self.with_center(Point2d::new(
            self.center.x - dx * resolution,
            self.center.y + dy * resolution,
        ))
    }

    /// Changes zoom by `delta` levels keeping the given screen position fixed.
    pub fn zoom_at(&self, delta: f64, screen: Point2d) -> Self {
        let anchor = self.screen_to_map(screen);
        let zoomed = self.with_zoom(self.zoom + delta);
        let moved = zoomed.screen_to_map(screen);
        zoomed.with_center(Point2d::new(
            zoomed.center.x + anchor.x - moved.x,
            zoomed.center.y + anchor.y - moved.y,
        ))
    }
}
