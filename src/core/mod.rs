//! Uncertainty-propagating frame corrections and reductions

pub mod uncertain;
pub mod uncertainties;
pub mod geometry;
pub mod masking;

pub mod deadtime;
pub mod dark_current;
pub mod frame_time;
pub mod flux;
pub mod self_absorption;
pub mod background;
pub mod flatfield;
pub mod angular_efficiency;
pub mod solid_angle;
pub mod polarization;
pub mod thickness;
pub mod displaced_volume;

pub mod frame_average;
pub mod azimuthal_integration;
pub mod pipeline;

// Re-export main types
pub use uncertain::Uncertain;
pub use uncertainties::estimate_poisson_uncertainty;
pub use geometry::{azimuthal_angles, scattering_angles};
pub use masking::mask_frames;
pub use deadtime::{correct_deadtime, DeadtimeModel};
pub use dark_current::{correct_dark_current, DarkCurrent};
pub use frame_time::normalize_frame_time;
pub use flux::normalize_transmitted_flux;
pub use self_absorption::{correct_self_absorption, self_absorption_factor};
pub use background::subtract_background;
pub use flatfield::correct_flatfield;
pub use angular_efficiency::correct_angular_efficiency;
pub use solid_angle::{correct_solid_angle, SolidAngleFormulation};
pub use polarization::correct_polarization;
pub use thickness::normalize_thickness;
pub use displaced_volume::correct_displaced_volume;
pub use frame_average::average_frames;
pub use azimuthal_integration::{azimuthally_integrate, azimuthally_integrate_stack, AzimuthalProfile};
pub use pipeline::{CorrectionPipeline, CorrectionStage};
