//! Shelf packing of charts into the unit square.
//!
//! Charts are placed tallest first, left to right in horizontal shelves of
//! unit width, then the whole layout is scaled uniformly so its larger side
//! is 1. Each chart keeps its shape; only translation and one global scale
//! are applied.
//!
//! # Example
//!
//! ```
//! use chartwise::algo::pack::pack_charts;
//! use chartwise::algo::parameterize::UVMap;
//! use nalgebra::Point2;
//!
//! // Two unit triangles, both normalized onto the same spot
//! let mut uvs = UVMap::new(vec![
//!     Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0),
//!     Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(0.0, 1.0),
//! ]);
//! let triangles = [[0, 1, 2], [3, 4, 5]];
//!
//! let report = pack_charts(&mut uvs, &triangles, &[0, 1], 2, 0.0).unwrap();
//! assert_eq!(report.placed, 2);
//! assert!(uvs.iter().all(|(_, uv)| (0.0..=1.0).contains(&uv.x) && (0.0..=1.0).contains(&uv.y)));
//! ```

use std::cmp::Ordering;

use nalgebra::{Point2, Vector2};

use super::parameterize::UVMap;

/// Width of a shelf before a new one is started.
const SHELF_WIDTH: f64 = 1.0;

/// Outcome of a packing pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackReport {
    /// Charts that received a position.
    pub placed: usize,
    /// Layout width before rescaling.
    pub width: f64,
    /// Layout height before rescaling.
    pub height: f64,
    /// Uniform factor applied to every UV.
    pub scale: f64,
}

/// A chart's vertex set and UV bounding box.
#[derive(Debug, Clone)]
struct ChartBounds {
    vertices: Vec<usize>,
    min: Point2<f64>,
    width: f64,
    height: f64,
}

impl ChartBounds {
    fn is_empty(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// Pack charts into `[0,1]²` without overlap.
///
/// Each vertex belongs to the first chart, in face order, that references
/// it. A vertex shared across a seam therefore moves with that chart only.
/// Charts with an empty bounding box (no usable vertices, or every vertex
/// at one point) are left in place.
///
/// Returns `None` if there are fewer than two charts, in which case the
/// UVs are not touched.
pub fn pack_charts(
    uvs: &mut UVMap,
    triangles: &[[usize; 3]],
    face_chart: &[usize],
    num_charts: usize,
    margin: f64,
) -> Option<PackReport> {
    if num_charts <= 1 {
        return None;
    }

    let charts = chart_bounds(uvs, triangles, face_chart, num_charts);

    // Tallest first; ties keep chart id order
    let mut order: Vec<usize> = (0..num_charts).collect();
    order.sort_by(|&a, &b| {
        charts[b]
            .height
            .partial_cmp(&charts[a].height)
            .unwrap_or(Ordering::Equal)
    });

    let mut targets: Vec<Option<Point2<f64>>> = vec![None; num_charts];
    let mut cursor_x = 0.0;
    let mut cursor_y = 0.0;
    let mut shelf_height: f64 = 0.0;
    let mut packed_w: f64 = 0.0;
    let mut packed_h: f64 = 0.0;
    let mut placed = 0;

    for &c in &order {
        let chart = &charts[c];
        if chart.is_empty() {
            continue;
        }

        if cursor_x + chart.width > SHELF_WIDTH && cursor_x > 0.0 {
            cursor_y += shelf_height + margin;
            cursor_x = 0.0;
            shelf_height = 0.0;
        }

        targets[c] = Some(Point2::new(cursor_x, cursor_y));
        packed_w = packed_w.max(cursor_x + chart.width);
        packed_h = packed_h.max(cursor_y + chart.height);

        cursor_x += chart.width + margin;
        shelf_height = shelf_height.max(chart.height);
        placed += 1;
    }

    for (chart, target) in charts.iter().zip(&targets) {
        if let Some(target) = target {
            let offset: Vector2<f64> = *target - chart.min;
            uvs.translate(&chart.vertices, offset);
        }
    }

    let extent = packed_w.max(packed_h);
    let scale = if extent > 0.0 { 1.0 / extent } else { 1.0 };
    uvs.scale(scale);

    log::debug!(
        "packed {} of {} charts into {:.3} x {:.3} (scale {:.3})",
        placed,
        num_charts,
        packed_w,
        packed_h,
        scale
    );

    Some(PackReport {
        placed,
        width: packed_w,
        height: packed_h,
        scale,
    })
}

/// Collect vertex sets (first assignment wins) and bounding boxes.
fn chart_bounds(
    uvs: &UVMap,
    triangles: &[[usize; 3]],
    face_chart: &[usize],
    num_charts: usize,
) -> Vec<ChartBounds> {
    let mut owner = vec![false; uvs.len()];
    let mut members: Vec<Vec<usize>> = vec![Vec::new(); num_charts];

    for (tri, &c) in triangles.iter().zip(face_chart) {
        if c >= num_charts {
            continue;
        }
        for &v in tri {
            if !owner[v] {
                owner[v] = true;
                members[c].push(v);
            }
        }
    }

    members
        .into_iter()
        .map(|vertices| match uvs.bounding_box_of(&vertices) {
            Some((min, max)) => ChartBounds {
                vertices,
                min,
                width: max.x - min.x,
                height: max.y - min.y,
            },
            None => ChartBounds {
                vertices,
                min: Point2::origin(),
                width: 0.0,
                height: 0.0,
            },
        })
        .collect()
}
