use ndarray::Array1;

use crate::core::uncertain::{self, per_frame};
use crate::types::{FrameStack, SaxsResult};

/// Convert counts to count rates by dividing each frame by its acquisition time.
///
/// With `dead_times` the divisor is the full frame period, count plus dead time.
pub fn normalize_frame_time(
    frames: &FrameStack,
    count_times: &Array1<f64>,
    dead_times: Option<&Array1<f64>>,
) -> SaxsResult<FrameStack> {
    log::info!("Normalizing frame time for {} frames", frames.num_frames());

    let counting = per_frame(count_times);
    let periods = match dead_times {
        Some(dead_times) => uncertain::add(&counting, &per_frame(dead_times))?,
        None => counting.into_dyn(),
    };
    log::debug!(
        "Frame periods: {:?}",
        periods.iter().map(|p| p.nominal()).collect::<Vec<_>>()
    );

    frames.with_data(uncertain::divide(&frames.data, &periods)?)
}
