use ndarray::{arr0, Array1};

use crate::core::uncertain::{self, per_frame, Uncertain};
use crate::types::{FrameStack, SaxsResult};

/// Dark current model subtracted from every pixel
#[derive(Debug, Clone, PartialEq)]
pub enum DarkCurrent {
    /// A constant count per pixel
    Constant(f64),
    /// Base, time dependent and flux dependent contributions
    Composite {
        /// Counts per pixel irrespective of time
        base: f64,
        /// Counts per pixel per unit count time
        temporal: f64,
        /// Counts per pixel as a fraction of the measured counts
        flux_dependent: f64,
        /// Count time of each frame
        count_times: Array1<f64>,
    },
}

/// Subtract detector dark current from a stack of frames.
///
/// The constant and base terms are exact. The flux dependent term scales the
/// measured counts and therefore carries their uncertainty.
pub fn correct_dark_current(frames: &FrameStack, dark_current: &DarkCurrent) -> SaxsResult<FrameStack> {
    log::info!("Correcting dark current for {} frames", frames.num_frames());

    let corrected = match dark_current {
        DarkCurrent::Constant(counts) => {
            log::debug!("Constant dark current: {}", counts);
            uncertain::subtract(&frames.data, &arr0(Uncertain::exact(*counts)))?
        }
        DarkCurrent::Composite {
            base,
            temporal,
            flux_dependent,
            count_times,
        } => {
            log::debug!(
                "Composite dark current: base {}, temporal {}, flux dependent {}",
                base,
                temporal,
                flux_dependent
            );
            let temporal_counts = per_frame(&count_times.mapv(|time| temporal * time));
            let flux_counts =
                uncertain::multiply(&frames.data, &arr0(Uncertain::exact(*flux_dependent)))?;

            let corrected = uncertain::subtract(&frames.data, &arr0(Uncertain::exact(*base)))?;
            let corrected = uncertain::subtract(&corrected, &temporal_counts)?;
            uncertain::subtract(&corrected, &flux_counts)?
        }
    };

    frames.with_data(corrected)
}
