use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Kind of a geometry that can be drawn on or loaded into a map.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeometryType {
    /// Single point.
    Point,
    /// Open polyline (a line or a track).
    LineString,
    /// Closed area.
    Polygon,
}

impl GeometryType {
    /// Minimum number of distinct vertices a geometry of this type must have.
    pub fn min_vertices(&self) -> usize {
        match self {
            GeometryType::Point => 1,
            GeometryType::LineString => 2,
            GeometryType::Polygon => 3,
        }
    }
}

impl Display for GeometryType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GeometryType::Point => "Point",
            GeometryType::LineString => "LineString",
            GeometryType::Polygon => "Polygon",
        };
        f.write_str(name)
    }
}
