use std::collections::HashMap;

use crate::geo::wrap_lon;

/// Grid-based spatial index for geographic points.
/// Cells wrap across the antimeridian so lookups near ±180° see both sides.
pub struct PointIndex<T> {
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<T>,
    cell_size: f64,
    columns: i32,
}

impl<T> PointIndex<T> {
    /// Create a new index with the given cell size in degrees
    pub fn new(cell_size: f64) -> Self {
        Self {
            cells: HashMap::new(),
            items: Vec::new(),
            cell_size,
            columns: (360.0 / cell_size).ceil() as i32,
        }
    }

    #[inline(always)]
    fn to_cell(&self, lon: f64, lat: f64) -> (i32, i32) {
        let x = ((wrap_lon(lon) + 180.0) / self.cell_size).floor() as i32;
        let y = ((lat + 90.0) / self.cell_size).floor() as i32;
        (x.rem_euclid(self.columns), y)
    }

    /// Insert an item at a geographic position
    pub fn insert(&mut self, lon: f64, lat: f64, item: T) {
        let idx = self.items.len();
        self.items.push(item);

        let cell = self.to_cell(lon, lat);
        self.cells.entry(cell).or_default().push(idx);
    }

    /// Query items in a radius around a point (returns indices).
    /// Conservative: may include items slightly outside the radius.
    pub fn query_radius(&self, lon: f64, lat: f64, radius_degrees: f64) -> Vec<usize> {
        let (cx, cy) = self.to_cell(lon, lat);
        let row_radius = (radius_degrees / self.cell_size).ceil() as i32;

        // Meridians converge, so the same radius spans more longitude poleward
        let widest = (lat.abs() + radius_degrees).min(90.0).to_radians().cos();
        let lon_radius = if widest > 1e-6 {
            radius_degrees / widest
        } else {
            180.0
        };
        let col_radius = ((lon_radius / self.cell_size).ceil() as i32).min(self.columns / 2);

        let mut results = Vec::new();
        for dy in -row_radius..=row_radius {
            for dx in -col_radius..=col_radius {
                let cell = ((cx + dx).rem_euclid(self.columns), cy + dy);
                if let Some(indices) = self.cells.get(&cell) {
                    results.extend_from_slice(indices);
                }
            }
        }

        results.sort_unstable();
        results.dedup();
        results
    }

    /// Get item by index
    #[inline(always)]
    pub fn get(&self, idx: usize) -> Option<&T> {
        self.items.get(idx)
    }

    /// Get all items
    #[inline(always)]
    pub fn items(&self) -> &[T] {
        &self.items
    }
}
