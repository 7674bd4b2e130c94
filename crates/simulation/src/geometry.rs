//! Geometry primitives shared by assignment, dispatch and flight code.
//!
//! Pure functions over `Vec2`, no state. Distances are straight-line
//! (road-network driving distance lives in [`crate::road_network`]).

use bevy::math::Vec2;

/// Straight-line distance between two points.
pub fn euclidean_distance(a: Vec2, b: Vec2) -> f32 {
    (b - a).length()
}

/// Bearing from `from` to `to` in radians, `atan2` convention
/// (east = 0, north = +π/2, range (-π, π]).
pub fn bearing(from: Vec2, to: Vec2) -> f32 {
    (to.y - from.y).atan2(to.x - from.x)
}

/// Centroid of a polygon, taken as the arithmetic mean of its vertices.
///
/// This is the vertex mean, not the area centroid; destination shapes in
/// this simulation are small quads where the two coincide. Panics on an
/// empty vertex list, which indicates malformed world data.
pub fn polygon_centroid(vertices: &[Vec2]) -> Vec2 {
    assert!(
        !vertices.is_empty(),
        "polygon_centroid: empty vertex list"
    );
    let sum: Vec2 = vertices.iter().copied().sum();
    sum / vertices.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_distance_3_4_5() {
        assert_eq!(
            euclidean_distance(Vec2::new(0.0, 0.0), Vec2::new(3.0, 4.0)),
            5.0
        );
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = Vec2::new(-2.5, 7.0);
        let b = Vec2::new(4.0, -1.5);
        assert_eq!(euclidean_distance(a, b), euclidean_distance(b, a));
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        let p = Vec2::new(11.0, -3.0);
        assert_eq!(euclidean_distance(p, p), 0.0);
    }

    #[test]
    fn test_bearing_cardinals() {
        let o = Vec2::ZERO;
        assert_eq!(bearing(o, Vec2::new(5.0, 0.0)), 0.0);
        assert_eq!(bearing(o, Vec2::new(0.0, 5.0)), FRAC_PI_2);
        assert_eq!(bearing(o, Vec2::new(0.0, -5.0)), -FRAC_PI_2);
    }

    #[test]
    fn test_unit_square_centroid() {
        let square = [
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        assert_eq!(polygon_centroid(&square), Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_single_vertex_centroid_is_the_vertex() {
        let p = [Vec2::new(3.0, -8.0)];
        assert_eq!(polygon_centroid(&p), Vec2::new(3.0, -8.0));
    }

    #[test]
    #[should_panic(expected = "empty vertex list")]
    fn test_empty_polygon_panics() {
        polygon_centroid(&[]);
    }
}
