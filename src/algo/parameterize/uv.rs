//! UV coordinate storage.
//!
//! This module provides the [`UVMap`] type for storing 2D parameterization
//! coordinates, either for the vertices of a whole mesh or for the local
//! vertices of a single chart.

use nalgebra::{Point2, Vector2};

/// UV coordinates indexed by vertex.
///
/// UV coordinates are typically in the range [0, 1] but may extend outside
/// this range between pipeline stages.
///
/// # Example
///
/// ```
/// use chartwise::algo::parameterize::UVMap;
/// use nalgebra::Point2;
///
/// let mut uvs = UVMap::new(vec![Point2::new(2.0, 1.0), Point2::new(6.0, 3.0)]);
/// uvs.normalize();
///
/// assert_eq!(uvs.get(0), Point2::new(0.0, 0.0));
/// assert_eq!(uvs.get(1), Point2::new(1.0, 0.5));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UVMap {
    coords: Vec<Point2<f64>>,
}

impl UVMap {
    /// Create a new UV map with the given coordinates.
    pub fn new(coords: Vec<Point2<f64>>) -> Self {
        Self { coords }
    }

    /// Create a UV map filled with zeros.
    pub fn zeros(n: usize) -> Self {
        Self {
            coords: vec![Point2::origin(); n],
        }
    }

    /// Get the UV coordinates for a vertex.
    #[inline]
    pub fn get(&self, v: usize) -> Point2<f64> {
        self.coords[v]
    }

    /// Set the UV coordinates for a vertex.
    #[inline]
    pub fn set(&mut self, v: usize, uv: Point2<f64>) {
        self.coords[v] = uv;
    }

    /// Get the number of UV coordinates.
    #[inline]
    pub fn len(&self) -> usize {
        self.coords.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Iterate over all UV coordinates with their vertex indices.
    pub fn iter(&self) -> impl Iterator<Item = (usize, Point2<f64>)> + '_ {
        self.coords.iter().copied().enumerate()
    }

    /// Get the raw coordinates slice.
    pub fn as_slice(&self) -> &[Point2<f64>] {
        &self.coords
    }

    /// Compute the bounding box of the UV coordinates.
    ///
    /// Returns `None` if the UV map is empty.
    pub fn bounding_box(&self) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(self.coords.iter())
    }

    /// Compute the bounding box of a subset of vertices.
    ///
    /// Returns `None` if `vertices` is empty.
    pub fn bounding_box_of(&self, vertices: &[usize]) -> Option<(Point2<f64>, Point2<f64>)> {
        bounds(vertices.iter().map(|&v| &self.coords[v]))
    }

    /// Translate to the origin and scale uniformly so the larger side is 1.
    ///
    /// Both axes share the same factor; a conformal map stays conformal only
    /// under uniform scaling. If the extent is zero only the translation is
    /// applied.
    pub fn normalize(&mut self) {
        if let Some((min, max)) = self.bounding_box() {
            let extent = (max.x - min.x).max(max.y - min.y);
            let scale = if extent > 1e-12 { 1.0 / extent } else { 1.0 };

            for uv in &mut self.coords {
                uv.x = (uv.x - min.x) * scale;
                uv.y = (uv.y - min.y) * scale;
            }
        }
    }

    /// Move a subset of vertices by `offset`.
    pub fn translate(&mut self, vertices: &[usize], offset: Vector2<f64>) {
        for &v in vertices {
            self.coords[v] += offset;
        }
    }

    /// Scale every coordinate about the origin.
    pub fn scale(&mut self, factor: f64) {
        for uv in &mut self.coords {
            uv.coords *= factor;
        }
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.coords.iter().all(|uv| uv.x.is_finite() && uv.y.is_finite())
    }
}

fn bounds<'a, I>(mut points: I) -> Option<(Point2<f64>, Point2<f64>)>
where
    I: Iterator<Item = &'a Point2<f64>>,
{
    let first = *points.next()?;
    let mut min = first;
    let mut max = first;
    for uv in points {
        min.x = min.x.min(uv.x);
        min.y = min.y.min(uv.y);
        max.x = max.x.max(uv.x);
        max.y = max.y.max(uv.y);
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_map_basic() {
        let coords = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(0.5, 1.0),
        ];
        let uv_map = UVMap::new(coords);

        assert_eq!(uv_map.len(), 3);
        assert!(!uv_map.is_empty());
        assert_eq!(uv_map.get(0), Point2::new(0.0, 0.0));
        assert_eq!(uv_map.get(1), Point2::new(1.0, 0.0));
        assert_eq!(uv_map.get(2), Point2::new(0.5, 1.0));
    }

    #[test]
    fn test_uv_map_bounding_box() {
        let coords = vec![
            Point2::new(-1.0, 0.5),
            Point2::new(2.0, -0.5),
            Point2::new(0.5, 3.0),
        ];
        let uv_map = UVMap::new(coords);

        let (min, max) = uv_map.bounding_box().unwrap();
        assert_eq!(min, Point2::new(-1.0, -0.5));
        assert_eq!(max, Point2::new(2.0, 3.0));

        let (min, max) = uv_map.bounding_box_of(&[0, 1]).unwrap();
        assert_eq!(min, Point2::new(-1.0, -0.5));
        assert_eq!(max, Point2::new(2.0, 0.5));
        assert!(uv_map.bounding_box_of(&[]).is_none());
    }

    #[test]
    fn test_uv_map_normalize() {
        let coords = vec![
            Point2::new(0.0, 0.0),
            Point2::new(4.0, 0.0),
            Point2::new(2.0, 2.0),
        ];
        let mut uv_map = UVMap::new(coords);
        uv_map.normalize();

        let (min, max) = uv_map.bounding_box().unwrap();
        assert!((min.x - 0.0).abs() < 1e-10);
        assert!((min.y - 0.0).abs() < 1e-10);
        // Max x should be 1.0 (since x range is larger)
        assert!((max.x - 1.0).abs() < 1e-10);
        // Max y should be 0.5 (maintains aspect ratio)
        assert!((max.y - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_normalize_zero_extent_only_translates() {
        let mut uv_map = UVMap::new(vec![Point2::new(3.0, -2.0); 4]);
        uv_map.normalize();
        assert!(uv_map.iter().all(|(_, uv)| uv == Point2::origin()));
    }

    #[test]
    fn test_translate_and_scale() {
        let mut uv_map = UVMap::new(vec![Point2::new(1.0, 1.0), Point2::new(2.0, 2.0)]);
        uv_map.translate(&[1], Vector2::new(1.0, -1.0));
        uv_map.scale(0.5);
        assert_eq!(uv_map.get(0), Point2::new(0.5, 0.5));
        assert_eq!(uv_map.get(1), Point2::new(1.5, 0.5));
    }
}
