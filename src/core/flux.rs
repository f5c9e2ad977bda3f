use ndarray::Axis;

use crate::core::uncertain::{self, per_frame_uncertain};
use crate::types::{FrameStack, SaxsResult};

/// Normalize each frame by its total transmitted flux.
///
/// The flux is the quadrature sum over the unmasked pixels of the frame, so
/// both the incident intensity and the sample transmission are divided out.
pub fn normalize_transmitted_flux(frames: &FrameStack) -> SaxsResult<FrameStack> {
    log::info!("Normalizing transmitted flux for {} frames", frames.num_frames());

    let filled = frames.filled()?;
    let row_sums = uncertain::sum(&filled, Axis(2))?;
    let frame_flux = uncertain::sum(&row_sums, Axis(1))?;
    if log::log_enabled!(log::Level::Debug) {
        for (index, flux) in frame_flux.iter().enumerate() {
            log::debug!("Frame {} transmitted flux: {}", index, flux);
        }
    }

    frames.with_data(uncertain::divide(&frames.data, &per_frame_uncertain(frame_flux))?)
}
