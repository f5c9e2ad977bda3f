use ndarray::{Array1, Zip};

use crate::core::uncertain::{self, per_frame, Uncertain};
use crate::types::{FrameStack, SaxsError, SaxsResult};

/// Detector deadtime model
#[derive(Debug, Clone, PartialEq)]
pub enum DeadtimeModel {
    /// Counts are lost for a fixed dead period after each counting period
    DutyCycle {
        count_times: Array1<f64>,
        dead_times: Array1<f64>,
    },
    /// Counts are lost when photon arrivals overlap within the resolving time
    Overlap {
        count_times: Array1<f64>,
        min_pulse_separation: f64,
        min_arrival_separation: f64,
    },
}

/// Scale counts up to account for photons lost while the detector was dead
pub fn correct_deadtime(frames: &FrameStack, model: &DeadtimeModel) -> SaxsResult<FrameStack> {
    log::info!("Correcting deadtime for {} frames", frames.num_frames());

    let corrected = match model {
        DeadtimeModel::DutyCycle {
            count_times,
            dead_times,
        } => {
            // Either list may hold a single value shared by every frame
            let counting = per_frame(count_times);
            let period = uncertain::add(&counting, &per_frame(dead_times))?;
            let scale = uncertain::divide(&period, &counting)?;
            log::debug!(
                "Duty cycle scale factors: {:?}",
                scale.iter().map(|s| s.nominal()).collect::<Vec<_>>()
            );
            uncertain::multiply(&frames.data, &scale)?
        }
        DeadtimeModel::Overlap {
            count_times,
            min_pulse_separation,
            min_arrival_separation,
        } => {
            let num_frames = frames.num_frames();
            if count_times.len() != num_frames && count_times.len() != 1 {
                return Err(SaxsError::ShapeMismatch {
                    left: frames.shape().to_vec(),
                    right: count_times.shape().to_vec(),
                });
            }
            let resolving_time = min_pulse_separation + min_arrival_separation;
            let rates = count_times.mapv(|count| resolving_time / count);
            log::debug!("Overlap model resolving time: {}", resolving_time);

            let rate_of = |frame: usize| if rates.len() == 1 { rates[0] } else { rates[frame] };
            Zip::indexed(&frames.data)
                .map_collect(|(frame, _, _), value| overlap_correction(*value, rate_of(frame)))
                .into_dyn()
        }
    };

    frames.with_data(corrected)
}

/// n -> n exp(n r), with first order propagation of the count uncertainty
fn overlap_correction(counts: Uncertain, rate: f64) -> Uncertain {
    let exponent = counts.nominal() * rate;
    let growth = exponent.exp();
    Uncertain::new(
        counts.nominal() * growth,
        counts.uncertainty() * growth * (1.0 + exponent).abs(),
    )
}
