use ndarray::Array2;

use crate::core::uncertain;
use crate::types::{FrameStack, SaxsResult};

/// Multiply every frame by a per-pixel sensitivity map
pub fn correct_flatfield(frames: &FrameStack, flatfield: &Array2<f64>) -> SaxsResult<FrameStack> {
    log::info!("Applying {:?} flatfield to {} frames", flatfield.dim(), frames.num_frames());
    frames.with_data(uncertain::multiply(&frames.data, &uncertain::exact(flatfield))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uncertain::Uncertain;
    use approx::assert_relative_eq;
    use ndarray::{arr2, Array3};

    #[test]
    fn test_flatfield_scales_pixels() {
        let frames = FrameStack::unmasked(Array3::from_elem((2, 2, 2), Uncertain::new(4.0, 2.0)));
        let flatfield = arr2(&[[1.0, 0.5], [2.0, 0.0]]);

        let corrected = correct_flatfield(&frames, &flatfield).unwrap();
        assert_relative_eq!(corrected.data[[1, 0, 1]].nominal(), 2.0);
        assert_relative_eq!(corrected.data[[1, 0, 1]].uncertainty(), 1.0);
        assert_relative_eq!(corrected.data[[0, 1, 0]].nominal(), 8.0);
        assert_eq!(corrected.data[[0, 1, 1]], Uncertain::exact(0.0));
    }

    #[test]
    fn test_wrong_map_shape() {
        let frames = FrameStack::unmasked(Array3::from_elem((1, 2, 2), Uncertain::new(4.0, 2.0)));
        assert!(correct_flatfield(&frames, &Array2::ones((2, 3))).is_err());
    }
}
