use ndarray::arr0;

use crate::core::uncertain::{self, Uncertain};
use crate::types::{FrameStack, SaxsResult};

/// Divide intensities by the sample thickness
pub fn normalize_thickness(frames: &FrameStack, thickness: f64) -> SaxsResult<FrameStack> {
    log::info!("Normalizing by sample thickness {}", thickness);
    frames.with_data(uncertain::divide(&frames.data, &arr0(Uncertain::exact(thickness)))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_thickness_normalization() {
        let frames = FrameStack::unmasked(Array3::from_elem((1, 2, 2), Uncertain::new(6.0, 3.0)));
        let normalized = normalize_thickness(&frames, 2.0).unwrap();
        assert_relative_eq!(normalized.data[[0, 0, 0]].nominal(), 3.0);
        assert_relative_eq!(normalized.data[[0, 0, 0]].uncertainty(), 1.5);
    }

    #[test]
    fn test_zero_thickness_is_degenerate() {
        let frames = FrameStack::unmasked(Array3::from_elem((1, 2, 2), Uncertain::new(6.0, 3.0)));
        let normalized = normalize_thickness(&frames, 0.0).unwrap();
        assert_eq!(normalized.count_non_finite(), 4);
    }
}
