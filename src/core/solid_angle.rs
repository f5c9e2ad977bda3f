use serde::{Deserialize, Serialize};

use crate::core::uncertain;
use crate::types::{DetectorGeometry, FrameStack, SaxsResult};

/// Form of the per-pixel solid angle factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SolidAngleFormulation {
    /// arccos of the scattering angle
    #[default]
    Arccos,
    /// arccos of the scattering angle, cubed
    ArccosCubed,
}

impl SolidAngleFormulation {
    pub fn factor(&self, angle: f64) -> f64 {
        match self {
            Self::Arccos => angle.acos(),
            Self::ArccosCubed => angle.acos().powi(3),
        }
    }
}

/// Correct for the solid angle subtended by each pixel
pub fn correct_solid_angle(
    frames: &FrameStack,
    geometry: &DetectorGeometry,
    formulation: SolidAngleFormulation,
) -> SaxsResult<FrameStack> {
    log::info!("Correcting solid angle ({:?})", formulation);

    let factors = geometry
        .scattering_angles(frames.frame_shape())
        .mapv(|angle| formulation.factor(angle));
    log::debug!("Solid angle factors computed for {:?} pixels", factors.dim());

    frames.with_data(uncertain::divide(&frames.data, &uncertain::exact(&factors))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::uncertain::Uncertain;
    use approx::assert_relative_eq;
    use ndarray::Array3;
    use std::f64::consts::FRAC_PI_2;

    fn frames() -> FrameStack {
        FrameStack::unmasked(Array3::from_elem((1, 1, 2), Uncertain::new(2.0, 1.0)))
    }

    #[test]
    fn test_beam_center_divides_by_half_pi() {
        let geometry = DetectorGeometry::new((0.0, 0.0), (1.0, 1.0), 1.0);
        let corrected = correct_solid_angle(&frames(), &geometry, SolidAngleFormulation::default()).unwrap();

        assert_relative_eq!(corrected.data[[0, 0, 0]].nominal(), 2.0 / FRAC_PI_2, epsilon = 1e-12);
        let off_axis = (std::f64::consts::FRAC_PI_4).acos();
        assert_relative_eq!(corrected.data[[0, 0, 1]].nominal(), 2.0 / off_axis, epsilon = 1e-12);
    }

    #[test]
    fn test_cubed_formulation() {
        let geometry = DetectorGeometry::new((0.0, 0.0), (1.0, 1.0), 1.0);
        let corrected = correct_solid_angle(&frames(), &geometry, SolidAngleFormulation::ArccosCubed).unwrap();
        assert_relative_eq!(
            corrected.data[[0, 0, 0]].nominal(),
            2.0 / FRAC_PI_2.powi(3),
            epsilon = 1e-12
        );
    }
}
