//! Styling of features.
//!
//! Styles are not stored anywhere: [`feature_style`] is called for every feature on every render, with the current
//! selection, hover state and map settings.

use oceanmap_types::GeometryType;

use crate::color::Color;
use crate::feature::Feature;
use crate::settings::{BasemapChoice, MapSettings};

/// Class4 error value rendered with the last color of the error ramp.
const MAX_CLASS4_ERROR: f64 = 1.0;
const ERROR_LOW: Color = Color::rgba(0, 160, 0, 255);
const ERROR_HIGH: Color = Color::rgba(220, 0, 0, 255);

/// State a feature is rendered in.
#[derive(Debug, Clone, Copy)]
pub struct StyleContext<'a> {
    /// Feature is in the selection.
    pub selected: bool,
    /// Feature is under the pointer.
    pub highlighted: bool,
    /// Current map settings.
    pub settings: &'a MapSettings,
}

/// How a feature is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureStyle {
    /// Line and outline color.
    pub stroke: Color,
    /// Fill of polygons and point symbols.
    pub fill: Color,
    /// Line width in pixels.
    pub stroke_width: f64,
    /// Radius of point symbols in pixels.
    pub point_radius: f64,
}

/// Computes the style of a feature.
pub fn feature_style(feature: &Feature, context: &StyleContext) -> FeatureStyle {
    let properties = feature.properties();
    let mut stroke = if feature.is_observation() {
        Color::OBSERVATION
    } else if let Some(error) = properties.error {
        ERROR_LOW.lerp(ERROR_HIGH, error.abs() / MAX_CLASS4_ERROR)
    } else if context.settings.basemap == BasemapChoice::World {
        // Imagery is dark.
        Color::WHITE
    } else {
        Color::DRAWN
    };

    let mut stroke_width = match feature.geometry_type() {
        GeometryType::Point => 1.5,
        _ => 2.0,
    };
    let mut point_radius = if feature.is_observation() { 4.0 } else { 5.0 };

    if context.selected {
        stroke = Color::SELECTED;
        stroke_width += 1.0;
    }
    if context.highlighted {
        stroke = Color::HOVERED;
        stroke_width += 2.0;
        point_radius += 2.0;
    }

    let fill = match feature.geometry_type() {
        GeometryType::Polygon => stroke.with_alpha(64),
        GeometryType::Point => stroke.with_alpha(200),
        GeometryType::LineString => Color::TRANSPARENT,
    };

    FeatureStyle {
        stroke,
        fill,
        stroke_width,
        point_radius,
    }
}
