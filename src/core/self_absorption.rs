use ndarray::Array2;

use crate::core::uncertain;
use crate::types::{DetectorGeometry, FrameStack, SaxsResult};

/// Self-absorption factor for a scattering angle and sample transmissibility.
///
/// Evaluates `(1 - T^(1/cos(theta) - 1)) / (ln(T) (1 - 1/cos(theta)))`, which
/// equals `expm1(u) / u` with `u = (1/cos(theta) - 1) ln(T)`. The rewritten form
/// stays accurate near the beam and takes its limit of 1 at `theta = 0`.
/// Transmissibilities outside (0, 1] give non-finite factors.
pub fn self_absorption_factor(angle: f64, transmissibility: f64) -> f64 {
    let path_excess = 1.0 / angle.cos() - 1.0;
    let log_transmissibility = transmissibility.ln();
    let u = path_excess * log_transmissibility;

    if u == 0.0 && log_transmissibility.is_finite() && log_transmissibility != 0.0 {
        1.0
    } else if u.is_finite() && u != 0.0 {
        u.exp_m1() / u
    } else {
        (1.0 - transmissibility.powf(path_excess)) / (log_transmissibility * -path_excess)
    }
}

/// Self-absorption factors for every pixel of a frame
pub fn self_absorption_factors(
    frame_shape: (usize, usize),
    geometry: &DetectorGeometry,
    transmissibility: f64,
) -> Array2<f64> {
    geometry
        .scattering_angles(frame_shape)
        .mapv(|angle| self_absorption_factor(angle, transmissibility))
}

/// Correct for the longer path scattered photons travel through the sample
pub fn correct_self_absorption(
    frames: &FrameStack,
    geometry: &DetectorGeometry,
    transmissibility: f64,
) -> SaxsResult<FrameStack> {
    log::info!("Correcting self-absorption (transmissibility {})", transmissibility);
    let factors = self_absorption_factors(frames.frame_shape(), geometry, transmissibility);
    frames.with_data(uncertain::multiply(&frames.data, &uncertain::exact(&factors))?)
}
