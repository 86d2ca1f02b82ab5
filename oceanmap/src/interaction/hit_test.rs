use oceanmap_types::cartesian::{Point2d, Rect};
use oceanmap_types::GeometryType;

use crate::feature::{Feature, FeatureStore, Geometry};

/// Features within `tolerance` of the position, topmost (last added) first.
pub fn hit_test<'a>(store: &'a FeatureStore, position: &Point2d, tolerance: f64) -> Vec<&'a Feature> {
    let mut hits: Vec<(&Feature, f64)> = store
        .iter()
        .rev()
        .filter_map(|feature| {
            let distance = distance_to_geometry(feature.geometry(), position);
            (distance <= tolerance).then_some((feature, distance))
        })
        .collect();

    // Points and lines win over polygons containing the position.
    hits.sort_by(|a, b| {
        rank(a.0)
            .cmp(&rank(b.0))
            .then_with(|| a.1.total_cmp(&b.1))
    });
    hits.into_iter().map(|(feature, _)| feature).collect()
}

fn rank(feature: &Feature) -> u8 {
    match feature.geometry_type() {
        GeometryType::Point => 0,
        GeometryType::LineString => 1,
        GeometryType::Polygon => 2,
    }
}

/// Features intersecting the rectangle, in insertion order.
pub fn features_in_rect<'a>(store: &'a FeatureStore, rect: &Rect) -> Vec<&'a Feature> {
    store
        .iter()
        .filter(|feature| match feature.geometry() {
            Geometry::Point(point) => rect.contains(point),
            geometry => {
                geometry.stored_vertices().iter().any(|v| rect.contains(v))
                    || geometry
                        .bounding_rect()
                        .is_some_and(|bbox| bbox.intersects(rect) && crosses(geometry, rect))
            }
        })
        .collect()
}

fn crosses(geometry: &Geometry, rect: &Rect) -> bool {
    if let Geometry::Polygon(ring) = geometry {
        if contains(ring, &rect.center()) {
            return true;
        }
    }

    let corners = [
        Point2d::new(rect.x_min, rect.y_min),
        Point2d::new(rect.x_max, rect.y_min),
        Point2d::new(rect.x_max, rect.y_max),
        Point2d::new(rect.x_min, rect.y_max),
    ];
    let edges = [
        (corners[0], corners[1]),
        (corners[1], corners[2]),
        (corners[2], corners[3]),
        (corners[3], corners[0]),
    ];

    geometry.stored_vertices().windows(2).any(|segment| {
        edges
            .iter()
            .any(|(a, b)| segments_intersect(&segment[0], &segment[1], a, b))
    })
}

/// Distance from the position to the geometry. Zero for positions inside a polygon.
pub fn distance_to_geometry(geometry: &Geometry, position: &Point2d) -> f64 {
    match geometry {
        Geometry::Point(point) => (point - position).norm(),
        Geometry::LineString(vertices) => distance_to_polyline(vertices, position),
        Geometry::Polygon(ring) => {
            if contains(ring, position) {
                0.0
            } else {
                distance_to_polyline(ring, position)
            }
        }
    }
}

fn distance_to_polyline(vertices: &[Point2d], position: &Point2d) -> f64 {
    vertices
        .windows(2)
        .map(|segment| distance_to_segment(&segment[0], &segment[1], position))
        .fold(f64::INFINITY, f64::min)
}

fn distance_to_segment(a: &Point2d, b: &Point2d, p: &Point2d) -> f64 {
    let ab = b - a;
    let length_sq = ab.norm_squared();
    if length_sq == 0.0 {
        return (p - a).norm();
    }

    let t = ((p - a).dot(&ab) / length_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).norm()
}

/// Even-odd rule on a closed ring.
fn contains(ring: &[Point2d], p: &Point2d) -> bool {
    let mut inside = false;
    for segment in ring.windows(2) {
        let (a, b) = (segment[0], segment[1]);
        if (a.y > p.y) != (b.y > p.y) {
            let x = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x {
                inside = !inside;
            }
        }
    }

    inside
}

fn segments_intersect(p1: &Point2d, p2: &Point2d, q1: &Point2d, q2: &Point2d) -> bool {
    let orientation = |a: &Point2d, b: &Point2d, c: &Point2d| {
        let value = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
        value.partial_cmp(&0.0).map_or(0, |o| o as i8)
    };

    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    d1 * d2 <= 0 && d3 * d4 <= 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{FeatureClass, FeatureId};
    use crate::projection::ProjectionId;
    use approx::assert_abs_diff_eq;

    fn store() -> FeatureStore {
        let mut store = FeatureStore::new(ProjectionId::Epsg3857);
        let features = [
            (
                "area",
                Geometry::polygon(vec![
                    Point2d::new(0.0, 0.0),
                    Point2d::new(10.0, 0.0),
                    Point2d::new(10.0, 10.0),
                    Point2d::new(0.0, 10.0),
                ]),
            ),
            ("point", Geometry::point(Point2d::new(5.0, 5.0))),
            (
                "line",
                Geometry::line_string(vec![Point2d::new(20.0, 0.0), Point2d::new(20.0, 10.0)]),
            ),
        ];
        for (id, geometry) in features {
            store
                .add(Feature::new(FeatureId::new(id), geometry.expect("valid"), FeatureClass::Standard))
                .expect("added");
        }

        store
    }

    fn ids(features: Vec<&Feature>) -> Vec<&str> {
        features.into_iter().map(|f| f.id().as_str()).collect()
    }

    #[test]
    fn distances() {
        let line = Geometry::line_string(vec![Point2d::new(0.0, 0.0), Point2d::new(10.0, 0.0)]).expect("valid");
        assert_abs_diff_eq!(distance_to_geometry(&line, &Point2d::new(5.0, 3.0)), 3.0);
        assert_abs_diff_eq!(distance_to_geometry(&line, &Point2d::new(13.0, 4.0)), 5.0);
    }

    #[test]
    fn nearest_hit_first() {
        let store = store();
        assert_eq!(ids(hit_test(&store, &Point2d::new(5.2, 5.0), 1.0)), ["point", "area"]);
        assert_eq!(ids(hit_test(&store, &Point2d::new(2.0, 2.0), 1.0)), ["area"]);
        assert_eq!(ids(hit_test(&store, &Point2d::new(20.5, 5.0), 1.0)), ["line"]);
        assert!(hit_test(&store, &Point2d::new(15.0, 5.0), 1.0).is_empty());
    }

    #[test]
    fn rectangle_selection() {
        let store = store();
        let inside_area = Rect::new(1.0, 1.0, 3.0, 3.0);
        assert_eq!(ids(features_in_rect(&store, &inside_area)), ["area"]);

        let crossing_line = Rect::new(15.0, 4.0, 25.0, 6.0);
        assert_eq!(ids(features_in_rect(&store, &crossing_line)), ["line"]);

        let around_point = Rect::new(4.0, 4.0, 6.0, 6.0);
        assert_eq!(ids(features_in_rect(&store, &around_point)), ["area", "point"]);
    }
}
