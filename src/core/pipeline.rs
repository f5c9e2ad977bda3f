//! Ordered composition of correction stages.
//!
//! Stages are applied in the sequence of the modular SAXS data correction
//! scheme (Pauw et al., J. Appl. Cryst. 2017; Pauw, J. Phys.: Condens.
//! Matter 2013), regardless of the order they are added in.

use ndarray::{Array1, Array2};

use crate::core::angular_efficiency::correct_angular_efficiency;
use crate::core::azimuthal_integration::{azimuthally_integrate, AzimuthalProfile};
use crate::core::background::subtract_background;
use crate::core::dark_current::{correct_dark_current, DarkCurrent};
use crate::core::deadtime::{correct_deadtime, DeadtimeModel};
use crate::core::displaced_volume::correct_displaced_volume;
use crate::core::flatfield::correct_flatfield;
use crate::core::flux::normalize_transmitted_flux;
use crate::core::frame_average::average_frames;
use crate::core::frame_time::normalize_frame_time;
use crate::core::polarization::correct_polarization;
use crate::core::self_absorption::correct_self_absorption;
use crate::core::solid_angle::{correct_solid_angle, SolidAngleFormulation};
use crate::core::thickness::normalize_thickness;
use crate::io::config::ReductionConfig;
use crate::types::{DetectorGeometry, FrameStack, SaxsError, SaxsResult, UncertainArray};

/// A correction stage together with its calibration
#[derive(Debug, Clone, PartialEq)]
pub enum CorrectionStage {
    Deadtime(DeadtimeModel),
    DarkCurrent(DarkCurrent),
    FrameTime {
        count_times: Array1<f64>,
        dead_times: Option<Array1<f64>>,
    },
    TransmittedFlux,
    SelfAbsorption {
        transmissibility: f64,
    },
    Background(UncertainArray),
    Flatfield(Array2<f64>),
    AngularEfficiency {
        absorption_coefficient: f64,
        sensor_thickness: f64,
    },
    SolidAngle(SolidAngleFormulation),
    Polarization {
        horizontal_fraction: f64,
    },
    Thickness(f64),
    DisplacedVolume {
        fraction: f64,
    },
}

impl CorrectionStage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Deadtime(_) => "deadtime",
            Self::DarkCurrent(_) => "dark current",
            Self::FrameTime { .. } => "frame time",
            Self::TransmittedFlux => "flux and transmission",
            Self::SelfAbsorption { .. } => "self-absorption",
            Self::Background(_) => "background",
            Self::Flatfield(_) => "flatfield",
            Self::AngularEfficiency { .. } => "angular efficiency",
            Self::SolidAngle(_) => "solid angle",
            Self::Polarization { .. } => "polarization",
            Self::Thickness(_) => "thickness",
            Self::DisplacedVolume { .. } => "displaced volume",
        }
    }

    /// Position of the stage in the correction sequence, starting at 1
    pub fn sequence_position(&self) -> usize {
        match self {
            Self::Deadtime(_) => 1,
            Self::DarkCurrent(_) => 2,
            Self::FrameTime { .. } => 3,
            Self::TransmittedFlux => 4,
            Self::SelfAbsorption { .. } => 5,
            Self::Background(_) => 6,
            Self::Flatfield(_) => 7,
            Self::AngularEfficiency { .. } => 8,
            Self::SolidAngle(_) => 9,
            Self::Polarization { .. } => 10,
            Self::Thickness(_) => 11,
            Self::DisplacedVolume { .. } => 12,
        }
    }

    pub fn apply(&self, frames: &FrameStack, geometry: &DetectorGeometry) -> SaxsResult<FrameStack> {
        match self {
            Self::Deadtime(model) => correct_deadtime(frames, model),
            Self::DarkCurrent(dark_current) => correct_dark_current(frames, dark_current),
            Self::FrameTime {
                count_times,
                dead_times,
            } => normalize_frame_time(frames, count_times, dead_times.as_ref()),
            Self::TransmittedFlux => normalize_transmitted_flux(frames),
            Self::SelfAbsorption { transmissibility } => {
                correct_self_absorption(frames, geometry, *transmissibility)
            }
            Self::Background(background) => subtract_background(frames, background),
            Self::Flatfield(flatfield) => correct_flatfield(frames, flatfield),
            Self::AngularEfficiency {
                absorption_coefficient,
                sensor_thickness,
            } => correct_angular_efficiency(
                frames,
                geometry,
                *absorption_coefficient,
                *sensor_thickness,
            ),
            Self::SolidAngle(formulation) => correct_solid_angle(frames, geometry, *formulation),
            Self::Polarization {
                horizontal_fraction,
            } => correct_polarization(frames, geometry, *horizontal_fraction),
            Self::Thickness(thickness) => normalize_thickness(frames, *thickness),
            Self::DisplacedVolume { fraction } => correct_displaced_volume(frames, *fraction),
        }
    }
}

/// Correction stages bound to one detector geometry
#[derive(Debug, Clone)]
pub struct CorrectionPipeline {
    geometry: DetectorGeometry,
    stages: Vec<CorrectionStage>,
}

impl CorrectionPipeline {
    pub fn new(geometry: DetectorGeometry) -> Self {
        Self {
            geometry,
            stages: Vec::new(),
        }
    }

    /// Add a stage at its place in the correction sequence.
    /// Stages sharing a position keep the order they were added in.
    pub fn with_stage(mut self, stage: CorrectionStage) -> Self {
        let position = stage.sequence_position();
        let index = self
            .stages
            .partition_point(|existing| existing.sequence_position() <= position);
        self.stages.insert(index, stage);
        self
    }

    pub fn geometry(&self) -> &DetectorGeometry {
        &self.geometry
    }

    pub fn stages(&self) -> &[CorrectionStage] {
        &self.stages
    }

    /// Build the scalar stages described by a validated recipe.
    ///
    /// Background frames and flatfield maps are not part of a recipe and are
    /// added afterwards with [`CorrectionPipeline::with_stage`].
    pub fn from_config(config: &ReductionConfig) -> SaxsResult<Self> {
        config.validate()?;
        let mut pipeline = Self::new(config.geometry());

        if let Some(deadtime) = &config.deadtime {
            let count_times = config.required_count_times("deadtime")?;
            let model = match deadtime.model.trim() {
                "dutyCycle" => DeadtimeModel::DutyCycle {
                    count_times,
                    dead_times: config.required_dead_times("deadtime")?,
                },
                "overlap" => DeadtimeModel::Overlap {
                    count_times,
                    min_pulse_separation: deadtime.min_pulse_separation.unwrap_or(0.0),
                    min_arrival_separation: deadtime.min_arrival_separation.unwrap_or(0.0),
                },
                other => {
                    return Err(SaxsError::Config(format!("Unknown deadtime model: {}", other)))
                }
            };
            pipeline = pipeline.with_stage(CorrectionStage::Deadtime(model));
        }

        if let Some(dark_current) = &config.dark_current {
            let model = if dark_current.is_composite() {
                DarkCurrent::Composite {
                    base: dark_current.base,
                    temporal: dark_current.temporal.unwrap_or(0.0),
                    flux_dependent: dark_current.flux_dependent.unwrap_or(0.0),
                    count_times: config.required_count_times("darkCurrent")?,
                }
            } else {
                DarkCurrent::Constant(dark_current.base)
            };
            pipeline = pipeline.with_stage(CorrectionStage::DarkCurrent(model));
        }

        if let Some(frame_time) = &config.frame_time {
            let dead_times = if frame_time.include_dead_time.unwrap_or(false) {
                Some(config.required_dead_times("frameTime")?)
            } else {
                None
            };
            pipeline = pipeline.with_stage(CorrectionStage::FrameTime {
                count_times: config.required_count_times("frameTime")?,
                dead_times,
            });
        }

        if config.flux_normalization.unwrap_or(false) {
            pipeline = pipeline.with_stage(CorrectionStage::TransmittedFlux);
        }

        if let Some(section) = &config.self_absorption {
            pipeline = pipeline.with_stage(CorrectionStage::SelfAbsorption {
                transmissibility: section.transmissibility,
            });
        }

        if let Some(section) = &config.angular_efficiency {
            pipeline = pipeline.with_stage(CorrectionStage::AngularEfficiency {
                absorption_coefficient: section.absorption_coefficient,
                sensor_thickness: section.sensor_thickness,
            });
        }

        if let Some(formulation) = config.solid_angle_formulation()? {
            pipeline = pipeline.with_stage(CorrectionStage::SolidAngle(formulation));
        }

        if let Some(section) = &config.polarization {
            pipeline = pipeline.with_stage(CorrectionStage::Polarization {
                horizontal_fraction: section.horizontal_fraction,
            });
        }

        if let Some(thickness) = config.sample_thickness {
            pipeline = pipeline.with_stage(CorrectionStage::Thickness(thickness));
        }

        if let Some(fraction) = config.displaced_fraction {
            pipeline = pipeline.with_stage(CorrectionStage::DisplacedVolume { fraction });
        }

        log::info!("Built correction pipeline with {} stages", pipeline.stages.len());
        Ok(pipeline)
    }

    /// Apply every stage in sequence.
    ///
    /// Degenerate calibration does not stop the run: a warning reports how
    /// many unmasked values each stage turned non-finite.
    pub fn run(&self, frames: &FrameStack) -> SaxsResult<FrameStack> {
        log::info!(
            "Running {} correction stages on {} frames of {:?}",
            self.stages.len(),
            frames.num_frames(),
            frames.frame_shape()
        );

        let mut corrected = frames.clone();
        let mut non_finite = corrected.count_non_finite();
        for stage in &self.stages {
            log::debug!("Applying {} correction", stage.name());
            corrected = stage.apply(&corrected, &self.geometry)?;

            let now_non_finite = corrected.count_non_finite();
            if now_non_finite > non_finite {
                log::warn!(
                    "{} correction produced {} non-finite values",
                    stage.name(),
                    now_non_finite - non_finite
                );
            }
            non_finite = now_non_finite;
        }

        log::info!("Correction pipeline completed");
        Ok(corrected)
    }

    /// Correct, average and azimuthally integrate a stack
    pub fn reduce(&self, frames: &FrameStack, num_bins: usize) -> SaxsResult<AzimuthalProfile> {
        let corrected = self.run(frames)?;
        let averaged = average_frames(&corrected)?;
        azimuthally_integrate(&averaged, &self.geometry, num_bins)
    }
}
