use ndarray::arr0;

use crate::core::uncertain::{self, Uncertain};
use crate::types::{FrameStack, SaxsResult};

/// Scale by the fraction of solvent retained after the analyte displaced part of it
pub fn correct_displaced_volume(frames: &FrameStack, displaced_fraction: f64) -> SaxsResult<FrameStack> {
    log::info!("Correcting for displaced volume fraction {}", displaced_fraction);
    let retained = arr0(Uncertain::exact(1.0 - displaced_fraction));
    frames.with_data(uncertain::multiply(&frames.data, &retained)?)
}
