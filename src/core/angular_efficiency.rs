use ndarray::Array2;

use crate::core::uncertain;
use crate::types::{DetectorGeometry, FrameStack, SaxsResult};

/// Fraction of photons absorbed by a detector sensor of the given attenuation
/// coefficient and thickness, for every pixel.
///
/// Oblique rays travel `t / cos(theta)` through the sensor.
pub fn angular_efficiency(
    frame_shape: (usize, usize),
    geometry: &DetectorGeometry,
    absorption_coefficient: f64,
    sensor_thickness: f64,
) -> Array2<f64> {
    geometry
        .scattering_angles(frame_shape)
        .mapv(|angle| 1.0 - (-absorption_coefficient * sensor_thickness / angle.cos()).exp())
}

/// Divide out the angle dependent absorption efficiency of the detector sensor
pub fn correct_angular_efficiency(
    frames: &FrameStack,
    geometry: &DetectorGeometry,
    absorption_coefficient: f64,
    sensor_thickness: f64,
) -> SaxsResult<FrameStack> {
    log::info!(
        "Correcting angular efficiency (mu = {}, t = {})",
        absorption_coefficient,
        sensor_thickness
    );

    let efficiency = angular_efficiency(
        frames.frame_shape(),
        geometry,
        absorption_coefficient,
        sensor_thickness,
    );
    frames.with_data(uncertain::divide(&frames.data, &uncertain::exact(&efficiency))?)
}
