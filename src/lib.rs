//! saxscorr: Uncertainty-Propagating Correction of Small-Angle Scattering Frames
//!
//! This library corrects stacks of photon-counting detector frames for
//! instrumental and sample effects (deadtime, dark current, flux, absorption,
//! solid angle, polarization and more) and reduces them to azimuthally
//! integrated intensity profiles, carrying a one-sigma uncertainty alongside
//! every value.

pub mod types;
pub mod io;
pub mod core;

#[cfg(feature = "python")]
mod python;

// Re-export main types and functions for easier access
pub use types::{
    DetectorGeometry, Frame, FrameStack, Mask, Masked, SaxsError, SaxsResult, UncertainArray,
};

pub use crate::core::{AzimuthalProfile, CorrectionPipeline, CorrectionStage, Uncertain};
pub use io::ReductionConfig;
