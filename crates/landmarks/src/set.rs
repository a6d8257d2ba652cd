//! Landmark points and per-frame landmark sets

use serde::{Deserialize, Serialize};

use crate::error::GeometryError;
use crate::scheme::{EyeIndexMap, LandmarkScheme};

/// 2D landmark coordinate (pixel or normalized units)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 2]", into = "[f32; 2]")]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f32; 2]> for Point {
    fn from([x, y]: [f32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Point> for [f32; 2] {
    fn from(p: Point) -> Self {
        [p.x, p.y]
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// Ordered landmarks for one face in one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkSet {
    /// Index scheme of the backend that produced the points
    pub scheme: LandmarkScheme,
    /// Points in scheme order
    pub points: Vec<Point>,
}

impl LandmarkSet {
    pub fn new(scheme: LandmarkScheme, points: Vec<Point>) -> Self {
        Self { scheme, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Point at `index`, failing with `OutOfRange` past the end
    pub fn point(&self, index: usize) -> Result<Point, GeometryError> {
        self.points
            .get(index)
            .copied()
            .ok_or(GeometryError::OutOfRange {
                index,
                available: self.points.len(),
            })
    }

    /// Select the six landmarks of one eye
    pub fn eye(&self, map: &EyeIndexMap) -> Result<EyeLandmarks, GeometryError> {
        map.check_bounds(self.points.len())?;

        let mut points = [Point::default(); 6];
        for (slot, &index) in points.iter_mut().zip(map.0.iter()) {
            let p = self.point(index)?;
            if !p.is_finite() {
                return Err(GeometryError::NonFiniteCoordinate { index });
            }
            *slot = p;
        }
        Ok(EyeLandmarks(points))
    }
}

/// Six ordered landmarks p1..p6 of one eye
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EyeLandmarks(pub [Point; 6]);

impl EyeLandmarks {
    /// Horizontal corner-to-corner width ‖p1−p4‖
    pub fn width(&self) -> f32 {
        self.0[0].distance(&self.0[3])
    }

    /// Eye Aspect Ratio: (‖p2−p6‖ + ‖p3−p5‖) / (2·‖p1−p4‖)
    pub fn aspect_ratio(&self, epsilon: f32) -> Result<f32, GeometryError> {
        let [p1, p2, p3, p4, p5, p6] = self.0;

        let a = p2.distance(&p6);
        let b = p3.distance(&p5);
        let c = p1.distance(&p4);

        if c < epsilon {
            return Err(GeometryError::DegenerateGeometry { width: c, epsilon });
        }

        let vertical = a + b;
        let ratio = vertical / (2.0 * c);
        if !c.is_finite() || !ratio.is_finite() {
            return Err(GeometryError::NonFiniteRatio { vertical, width: c });
        }
        Ok(ratio)
    }

    pub fn points(&self) -> &[Point; 6] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eye(width: f32, half_height: f32) -> EyeLandmarks {
        let third = width / 3.0;
        EyeLandmarks([
            Point::new(0.0, 0.0),
            Point::new(third, half_height),
            Point::new(2.0 * third, half_height),
            Point::new(width, 0.0),
            Point::new(2.0 * third, -half_height),
            Point::new(third, -half_height),
        ])
    }

    #[test]
    fn test_point_distance() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(3.0, 4.0);
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_point_serializes_as_pair() {
        let json = serde_json::to_string(&Point::new(1.5, 2.0)).unwrap();
        assert_eq!(json, "[1.5,2.0]");
        let p: Point = serde_json::from_str("[3.0, 4.0]").unwrap();
        assert_eq!(p, Point::new(3.0, 4.0));
    }

    #[test]
    fn test_aspect_ratio_of_open_eye() {
        // Vertical distances are 2h each, so EAR = 4h / 2w = 2h / w
        let ear = eye(30.0, 3.0).aspect_ratio(1e-6).unwrap();
        assert!((ear - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_aspect_ratio_degenerate() {
        let mut e = eye(30.0, 3.0);
        e.0[3] = e.0[0];
        assert!(matches!(
            e.aspect_ratio(1e-6),
            Err(GeometryError::DegenerateGeometry { .. })
        ));
    }

    #[test]
    fn test_eye_out_of_range() {
        let set = LandmarkSet::new(LandmarkScheme::Dlib68, vec![Point::default(); 40]);
        let map = LandmarkScheme::Dlib68.eye_maps().left;
        assert_eq!(
            set.eye(&map),
            Err(GeometryError::OutOfRange { index: 47, available: 40 })
        );
    }

    #[test]
    fn test_eye_rejects_nan() {
        let mut points = vec![Point::new(1.0, 1.0); 68];
        points[38] = Point::new(f32::NAN, 0.0);
        let set = LandmarkSet::new(LandmarkScheme::Dlib68, points);
        let map = LandmarkScheme::Dlib68.eye_maps().right;
        assert_eq!(
            set.eye(&map),
            Err(GeometryError::NonFiniteCoordinate { index: 38 })
        );
    }

    #[test]
    fn test_overflowing_distances_are_rejected() {
        let tall = EyeLandmarks([
            Point::new(0.0, 0.0),
            Point::new(10.0, -3.0e38),
            Point::new(20.0, -3.0e38),
            Point::new(30.0, 0.0),
            Point::new(20.0, 3.0e38),
            Point::new(10.0, 3.0e38),
        ]);
        assert!(matches!(
            tall.aspect_ratio(1e-6),
            Err(GeometryError::NonFiniteRatio { .. })
        ));

        let wide = EyeLandmarks([
            Point::new(-3.0e38, 0.0),
            Point::new(-1.0, -1.0),
            Point::new(1.0, -1.0),
            Point::new(3.0e38, 0.0),
            Point::new(1.0, 1.0),
            Point::new(-1.0, 1.0),
        ]);
        assert!(matches!(
            wide.aspect_ratio(1e-6),
            Err(GeometryError::NonFiniteRatio { .. })
        ));
    }
}
