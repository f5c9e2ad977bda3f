use ndarray::{ArrayBase, Data, Dimension};

use crate::core::uncertain::{self, Uncertain};
use crate::types::{FrameStack, SaxsResult};

/// Subtract a measured background (empty cell or solvent) from every frame.
///
/// The background may be a single frame or a full stack; its uncertainty adds
/// to that of the frames.
pub fn subtract_background<S, D>(
    frames: &FrameStack,
    background: &ArrayBase<S, D>,
) -> SaxsResult<FrameStack>
where
    S: Data<Elem = Uncertain>,
    D: Dimension,
{
    log::info!(
        "Subtracting background of shape {:?} from {} frames",
        background.shape(),
        frames.num_frames()
    );
    frames.with_data(uncertain::subtract(&frames.data, background)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaxsError;
    use approx::assert_relative_eq;
    use ndarray::{Array2, Array3};

    #[test]
    fn test_subtracts_per_pixel_background() {
        let frames = FrameStack::unmasked(Array3::from_elem((2, 2, 2), Uncertain::new(10.0, 3.0)));
        let background = Array2::from_shape_fn((2, 2), |(i, j)| Uncertain::new((i + j) as f64, 4.0));

        let corrected = subtract_background(&frames, &background).unwrap();
        assert_relative_eq!(corrected.data[[1, 1, 1]].nominal(), 8.0);
        assert_relative_eq!(corrected.data[[1, 1, 1]].uncertainty(), 5.0, epsilon = 1e-12);
        assert_relative_eq!(corrected.data[[0, 0, 0]].nominal(), 10.0);
    }

    #[test]
    fn test_background_shape_must_broadcast() {
        let frames = FrameStack::unmasked(Array3::from_elem((1, 2, 2), Uncertain::new(1.0, 1.0)));
        let background = Array2::from_elem((3, 2), Uncertain::exact(0.0));
        assert!(matches!(
            subtract_background(&frames, &background),
            Err(SaxsError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_background_cannot_grow_stack() {
        let frames = FrameStack::unmasked(Array3::from_elem((1, 2, 2), Uncertain::new(1.0, 1.0)));
        let background = Array3::from_elem((3, 2, 2), Uncertain::exact(0.0));
        assert!(matches!(
            subtract_background(&frames, &background),
            Err(SaxsError::ShapeMismatch { .. })
        ));
    }
}
