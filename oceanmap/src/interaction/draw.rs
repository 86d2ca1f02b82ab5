use oceanmap_types::cartesian::Point2d;
use oceanmap_types::GeometryType;

use crate::error::OceanMapError;
use crate::feature::Geometry;

/// State of an interactive draw.
///
/// Vertices are collected from clicks. A point is complete after the first click; lines and polygons are completed
/// with [`DrawSession::finish`], which refuses to produce a geometry with too few vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawSession {
    geometry_type: GeometryType,
    vertices: Vec<Point2d>,
}

impl DrawSession {
    /// Starts drawing a geometry of the given type.
    pub fn new(geometry_type: GeometryType) -> Self {
        Self {
            geometry_type,
            vertices: Vec::new(),
        }
    }

    /// Type of the geometry being drawn.
    pub fn geometry_type(&self) -> GeometryType {
        self.geometry_type
    }

    /// Vertices added so far.
    pub fn vertices(&self) -> &[Point2d] {
        &self.vertices
    }

    /// Adds a vertex. Returns the finished geometry when drawing a point.
    pub fn add_vertex(&mut self, position: Point2d) -> Option<Geometry> {
        if self.geometry_type == GeometryType::Point {
            return match Geometry::point(position) {
                Ok(geometry) => Some(geometry),
                Err(err) => {
                    log::info!("Point rejected: {err}");
                    None
                }
            };
        }

        if self.vertices.last() != Some(&position) {
            self.vertices.push(position);
        }

        None
    }

    /// Completes the geometry. On error the session keeps its vertices, so drawing can continue.
    pub fn finish(&self) -> Result<Geometry, OceanMapError> {
        Geometry::new(self.geometry_type, self.vertices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn point_completes_on_first_click() {
        let mut session = DrawSession::new(GeometryType::Point);
        assert_matches!(session.add_vertex(Point2d::new(1.0, 2.0)), Some(Geometry::Point(_)));
    }

    #[test]
    fn polygon_needs_three_vertices() {
        let mut session = DrawSession::new(GeometryType::Polygon);
        assert!(session.add_vertex(Point2d::new(0.0, 0.0)).is_none());
        assert!(session.add_vertex(Point2d::new(1.0, 0.0)).is_none());
        assert!(session.add_vertex(Point2d::new(1.0, 0.0)).is_none());
        assert_eq!(session.vertices().len(), 2);
        assert_matches!(session.finish(), Err(OceanMapError::InvalidGeometry(_)));

        session.add_vertex(Point2d::new(0.0, 1.0));
        let polygon = session.finish().expect("valid polygon");
        assert_eq!(polygon.coordinates().len(), 3);
        assert_eq!(polygon.stored_vertices().len(), 4);
    }

    #[test]
    fn line_needs_two_vertices() {
        let mut session = DrawSession::new(GeometryType::LineString);
        session.add_vertex(Point2d::new(0.0, 0.0));
        assert!(session.finish().is_err());
        session.add_vertex(Point2d::new(3.0, 3.0));
        assert_matches!(session.finish(), Ok(Geometry::LineString(v)) if v.len() == 2);
    }
}
