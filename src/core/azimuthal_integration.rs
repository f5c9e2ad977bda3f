//! Reduction of 2D frames to intensity against scattering angle.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use ndarray::{Array1, Zip};

use crate::core::uncertain::Uncertain;
use crate::types::{DetectorGeometry, Frame, FrameStack, SaxsError, SaxsResult};

/// Binned intensity profile of one frame
#[derive(Debug, Clone, PartialEq)]
pub struct AzimuthalProfile {
    /// Bin centre scattering angles (radians)
    pub angles: Array1<f64>,
    /// Mean intensity of each bin; NaN for bins without valid pixels
    pub intensities: Array1<Uncertain>,
    /// Number of valid pixels in each bin
    pub counts: Array1<usize>,
}

impl AzimuthalProfile {
    pub fn len(&self) -> usize {
        self.angles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.angles.is_empty()
    }
}

/// Integrate a frame over the azimuth into `num_bins` equal width angle bins.
///
/// Bins span the range of scattering angles of the unmasked pixels; the last
/// bin includes its upper edge. Each bin holds the mean of its pixels, with
/// uncertainties summed in quadrature.
pub fn azimuthally_integrate(
    frame: &Frame,
    geometry: &DetectorGeometry,
    num_bins: usize,
) -> SaxsResult<AzimuthalProfile> {
    if num_bins == 0 {
        return Err(SaxsError::InvalidParameter(
            "Azimuthal integration needs at least one bin".to_string(),
        ));
    }

    let (rows, cols) = frame.data.dim();
    let angles = geometry.scattering_angles((rows, cols));
    let mask = frame.full_mask();

    let mut samples = Vec::with_capacity(rows * cols);
    Zip::from(&angles)
        .and(&frame.data)
        .and(&mask)
        .for_each(|&angle, &value, &masked| {
            if !masked && angle.is_finite() {
                samples.push((angle, value));
            }
        });

    if samples.is_empty() {
        return Err(SaxsError::Processing(
            "No valid pixels to integrate".to_string(),
        ));
    }

    let (mut lower, mut upper) = samples
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(angle, _)| {
            (lo.min(angle), hi.max(angle))
        });
    if lower == upper {
        lower -= 0.5;
        upper += 0.5;
    }
    let width = (upper - lower) / num_bins as f64;
    log::debug!(
        "Integrating {} pixels into {} bins over [{:.4e}, {:.4e}]",
        samples.len(),
        num_bins,
        lower,
        upper
    );

    let mut sums = vec![0.0; num_bins];
    let mut variances = vec![0.0; num_bins];
    let mut counts = vec![0usize; num_bins];
    for (angle, value) in samples {
        let bin = (((angle - lower) / width) as usize).min(num_bins - 1);
        sums[bin] += value.nominal();
        variances[bin] += value.uncertainty() * value.uncertainty();
        counts[bin] += 1;
    }

    let empty_bins = counts.iter().filter(|&&count| count == 0).count();
    if empty_bins > 0 {
        log::debug!("{} of {} bins hold no valid pixels", empty_bins, num_bins);
    }

    let intensities = (0..num_bins)
        .map(|bin| {
            if counts[bin] == 0 {
                Uncertain::new(f64::NAN, f64::NAN)
            } else {
                Uncertain::new(sums[bin], variances[bin].sqrt())
                    / Uncertain::exact(counts[bin] as f64)
            }
        })
        .collect();
    let centres = Array1::from_shape_fn(num_bins, |bin| lower + (bin as f64 + 0.5) * width);

    Ok(AzimuthalProfile {
        angles: centres,
        intensities,
        counts: Array1::from(counts),
    })
}

/// Integrate every frame of a stack
pub fn azimuthally_integrate_stack(
    frames: &FrameStack,
    geometry: &DetectorGeometry,
    num_bins: usize,
) -> SaxsResult<Vec<AzimuthalProfile>> {
    log::info!(
        "Azimuthally integrating {} frames into {} bins",
        frames.num_frames(),
        num_bins
    );
    let integrate = |index: usize| {
        frames
            .frame(index)
            .and_then(|frame| azimuthally_integrate(&frame, geometry, num_bins))
    };

    #[cfg(feature = "parallel")]
    let profiles = (0..frames.num_frames()).into_par_iter().map(integrate).collect();

    #[cfg(not(feature = "parallel"))]
    let profiles = (0..frames.num_frames()).map(integrate).collect();

    profiles
}
