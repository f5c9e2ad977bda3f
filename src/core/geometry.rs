//! Per-pixel angles for a flat detector normal to the beam.
//!
//! Geometry tuples follow the array axes: the first component belongs to the
//! rows (axis 0) and the second to the columns (axis 1). Pixel (i, j) sits
//! `(i - c0) * p0` from the beam center along the rows and `(j - c1) * p1`
//! along the columns.

use ndarray::Array2;

use crate::types::DetectorGeometry;

/// Scattering angle (radians) of every pixel
pub fn scattering_angles(frame_shape: (usize, usize), geometry: &DetectorGeometry) -> Array2<f64> {
    let (center_row, center_col) = geometry.beam_center;
    let (row_pitch, col_pitch) = geometry.pixel_sizes;
    let distance = geometry.distance;

    Array2::from_shape_fn(frame_shape, |(i, j)| {
        let along_rows = (i as f64 - center_row) * row_pitch;
        let along_cols = (j as f64 - center_col) * col_pitch;
        (along_rows.hypot(along_cols) / distance).atan()
    })
}

/// Azimuthal angle (radians, in (-pi, pi]) of every pixel about the beam center,
/// zero along increasing column index
pub fn azimuthal_angles(frame_shape: (usize, usize), beam_center: (f64, f64)) -> Array2<f64> {
    let (center_row, center_col) = beam_center;
    Array2::from_shape_fn(frame_shape, |(i, j)| {
        (i as f64 - center_row).atan2(j as f64 - center_col)
    })
}
