use ndarray::{Array, ArrayBase, Data, Dimension, Zip};
use num_traits::Zero;

use crate::types::{SaxsError, SaxsResult};

/// Replace every masked element with the neutral fill value.
///
/// The mask is broadcast to the shape of `frames`, so a single detector mask
/// may be applied to a whole stack. Works for plain and uncertain elements.
pub fn mask_frames<A, S, D, SM, DM>(
    frames: &ArrayBase<S, D>,
    mask: &ArrayBase<SM, DM>,
) -> SaxsResult<Array<A, D>>
where
    A: Clone + Zero,
    S: Data<Elem = A>,
    D: Dimension,
    SM: Data<Elem = bool>,
    DM: Dimension,
{
    let mask_view = mask
        .broadcast(frames.raw_dim())
        .ok_or_else(|| SaxsError::ShapeMismatch {
            left: frames.shape().to_vec(),
            right: mask.shape().to_vec(),
        })?;

    Ok(Zip::from(frames)
        .and(&mask_view)
        .map_collect(|value, &masked| if masked { A::zero() } else { value.clone() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uncertain::Uncertain;
    use ndarray::{arr2, Array3};

    #[test]
    fn test_masked_elements_are_zeroed() {
        let frames = Array3::from_elem((2, 2, 2), 5.0f64);
        let mask = arr2(&[[true, false], [false, true]]);

        let filled = mask_frames(&frames, &mask).unwrap();
        for frame in filled.outer_iter() {
            assert_eq!(frame, arr2(&[[0.0, 5.0], [5.0, 0.0]]));
        }
    }

    #[test]
    fn test_masking_is_idempotent() {
        let frames = Array3::from_shape_fn((2, 3, 3), |(k, i, j)| {
            Uncertain::new((k + i + j) as f64, 1.0)
        });
        let mut mask = Array3::from_elem((2, 3, 3), false);
        mask[[0, 1, 1]] = true;
        mask[[1, 2, 0]] = true;

        let once = mask_frames(&frames, &mask).unwrap();
        let twice = mask_frames(&once, &mask).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once[[0, 1, 1]], Uncertain::zero());
        assert_eq!(once[[1, 1, 1]], frames[[1, 1, 1]]);
    }

    #[test]
    fn test_mask_shape_mismatch() {
        let frames = Array3::from_elem((1, 2, 3), 1.0f64);
        let mask = arr2(&[[true, false], [false, true]]);
        assert!(matches!(
            mask_frames(&frames, &mask),
            Err(SaxsError::ShapeMismatch { .. })
        ));
    }
}
