use ndarray::{arr0, Axis, Ix2};

use crate::core::uncertain::{self, Uncertain};
use crate::types::{Frame, FrameStack, SaxsError, SaxsResult};

/// Average a stack over its frames.
///
/// The result keeps the mask of the first frame.
pub fn average_frames(frames: &FrameStack) -> SaxsResult<Frame> {
    let num_frames = frames.num_frames();
    if num_frames == 0 {
        return Err(SaxsError::InvalidParameter(
            "Cannot average an empty frame stack".to_string(),
        ));
    }
    log::info!("Averaging {} frames", num_frames);

    let total = uncertain::sum(&frames.data, Axis(0))?;
    let average = uncertain::divide(&total, &arr0(Uncertain::exact(num_frames as f64)))?
        .into_dimensionality::<Ix2>()?;

    let mask = frames.frame(0)?.mask;
    Frame::new(average, mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_identical_frames_shrink_uncertainty() {
        let frames = FrameStack::unmasked(Array3::from_elem((4, 2, 3), Uncertain::new(7.0, 2.0)));
        let average = average_frames(&frames).unwrap();

        assert_eq!(average.shape(), &[2, 3]);
        for value in average.data.iter() {
            assert_relative_eq!(value.nominal(), 7.0, epsilon = 1e-12);
            assert_relative_eq!(value.uncertainty(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_keeps_first_frame_mask() {
        let data = Array3::from_elem((2, 2, 2), Uncertain::new(1.0, 1.0));
        let mut mask = Array3::from_elem((2, 2, 2), false);
        mask[[0, 1, 0]] = true;
        mask[[1, 0, 0]] = true;
        let frames = FrameStack::new(data, Some(mask.into_dyn())).unwrap();

        let average = average_frames(&frames).unwrap();
        let average_mask = average.full_mask();
        assert!(average_mask[[1, 0]]);
        assert!(!average_mask[[0, 0]]);
    }

    #[test]
    fn test_empty_stack() {
        let frames = FrameStack::unmasked(Array3::from_elem((0, 2, 2), Uncertain::exact(0.0)));
        assert!(matches!(
            average_frames(&frames),
            Err(SaxsError::InvalidParameter(_))
        ));
    }
}
