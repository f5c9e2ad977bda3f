use ndarray::{Array2, Zip};

use crate::core::uncertain;
use crate::types::{DetectorGeometry, FrameStack, SaxsResult};

/// Polarization factor for every pixel.
///
/// `horizontal_fraction` is the fraction of the incident beam polarized in the
/// horizontal plane; 0.5 is an unpolarized source.
pub fn polarization_factors(
    frame_shape: (usize, usize),
    geometry: &DetectorGeometry,
    horizontal_fraction: f64,
) -> Array2<f64> {
    let scattering = geometry.scattering_angles(frame_shape);
    let azimuths = geometry.azimuthal_angles(frame_shape);

    Zip::from(&scattering)
        .and(&azimuths)
        .map_collect(|&theta, &azimuth| {
            let sin_theta = theta.sin();
            horizontal_fraction * (1.0 - (azimuth.sin() * sin_theta).powi(2))
                + (1.0 - horizontal_fraction) * (1.0 - (azimuth.cos() * sin_theta).powi(2))
        })
}

/// Correct for the polarization of the incident beam
pub fn correct_polarization(
    frames: &FrameStack,
    geometry: &DetectorGeometry,
    horizontal_fraction: f64,
) -> SaxsResult<FrameStack> {
    log::info!("Correcting polarization (horizontal fraction {})", horizontal_fraction);
    let factors = polarization_factors(frames.frame_shape(), geometry, horizontal_fraction);
    frames.with_data(uncertain::multiply(&frames.data, &uncertain::exact(&factors))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uncertain::Uncertain;
    use approx::assert_relative_eq;
    use ndarray::Array3;

    #[test]
    fn test_no_effect_at_beam_center() {
        let geometry = DetectorGeometry::new((1.0, 1.0), (1.0, 1.0), 1.0);
        let factors = polarization_factors((3, 3), &geometry, 0.3);
        assert_relative_eq!(factors[[1, 1]], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_horizontal_polarization() {
        // One column right of center at 45 degrees: azimuth 0, sin^2(theta) = 1/2
        let geometry = DetectorGeometry::new((0.0, 0.0), (1.0, 1.0), 1.0);
        let factors = polarization_factors((1, 2), &geometry, 1.0);
        assert_relative_eq!(factors[[0, 1]], 1.0, epsilon = 1e-12);

        let factors = polarization_factors((1, 2), &geometry, 0.0);
        assert_relative_eq!(factors[[0, 1]], 0.5, epsilon = 1e-12);

        let factors = polarization_factors((1, 2), &geometry, 0.5);
        assert_relative_eq!(factors[[0, 1]], 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_correction_multiplies() {
        let geometry = DetectorGeometry::new((0.0, 0.0), (1.0, 1.0), 1.0);
        let frames = FrameStack::unmasked(Array3::from_elem((2, 1, 2), Uncertain::new(4.0, 2.0)));
        let corrected = correct_polarization(&frames, &geometry, 0.0).unwrap();
        assert_relative_eq!(corrected.data[[1, 0, 1]].nominal(), 2.0, epsilon = 1e-12);
        assert_relative_eq!(corrected.data[[1, 0, 1]].uncertainty(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(corrected.data[[1, 0, 0]].nominal(), 4.0);
    }
}
