use std::path::Path;

use ndarray::Array1;
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::core::solid_angle::SolidAngleFormulation;
use crate::types::{DetectorGeometry, SaxsError, SaxsResult};

/// Reduction recipe for one acquisition.
/// This represents the root <reduction> element directly
#[derive(Debug, Clone, Deserialize)]
pub struct ReductionConfig {
    pub geometry: GeometryConfig,
    /// Whitespace separated count time of every frame
    #[serde(rename = "countTimes", default)]
    pub count_times: Option<String>,
    /// Whitespace separated dead time of every frame
    #[serde(rename = "deadTimes", default)]
    pub dead_times: Option<String>,
    #[serde(default)]
    pub deadtime: Option<DeadtimeConfig>,
    #[serde(rename = "darkCurrent", default)]
    pub dark_current: Option<DarkCurrentConfig>,
    #[serde(rename = "frameTime", default)]
    pub frame_time: Option<FrameTimeConfig>,
    #[serde(rename = "fluxNormalization", default)]
    pub flux_normalization: Option<bool>,
    #[serde(rename = "selfAbsorption", default)]
    pub self_absorption: Option<SelfAbsorptionConfig>,
    #[serde(rename = "angularEfficiency", default)]
    pub angular_efficiency: Option<AngularEfficiencyConfig>,
    #[serde(rename = "solidAngle", default)]
    pub solid_angle: Option<SolidAngleConfig>,
    #[serde(default)]
    pub polarization: Option<PolarizationConfig>,
    #[serde(rename = "sampleThickness", default)]
    pub sample_thickness: Option<f64>,
    #[serde(rename = "displacedFraction", default)]
    pub displaced_fraction: Option<f64>,
    #[serde(rename = "azimuthalBins", default)]
    pub azimuthal_bins: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeometryConfig {
    #[serde(rename = "beamCenterColumn")]
    pub beam_center_column: f64,
    #[serde(rename = "beamCenterRow")]
    pub beam_center_row: f64,
    #[serde(rename = "pixelSizeColumn")]
    pub pixel_size_column: f64,
    #[serde(rename = "pixelSizeRow")]
    pub pixel_size_row: f64,
    pub distance: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeadtimeConfig {
    /// `dutyCycle` or `overlap`
    pub model: String,
    #[serde(rename = "minPulseSeparation", default)]
    pub min_pulse_separation: Option<f64>,
    #[serde(rename = "minArrivalSeparation", default)]
    pub min_arrival_separation: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DarkCurrentConfig {
    pub base: f64,
    #[serde(default)]
    pub temporal: Option<f64>,
    #[serde(rename = "fluxDependent", default)]
    pub flux_dependent: Option<f64>,
}

impl DarkCurrentConfig {
    pub fn is_composite(&self) -> bool {
        self.temporal.is_some() || self.flux_dependent.is_some()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FrameTimeConfig {
    #[serde(rename = "includeDeadTime", default)]
    pub include_dead_time: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SelfAbsorptionConfig {
    pub transmissibility: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AngularEfficiencyConfig {
    #[serde(rename = "absorptionCoefficient")]
    pub absorption_coefficient: f64,
    #[serde(rename = "sensorThickness")]
    pub sensor_thickness: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SolidAngleConfig {
    /// `arccos` or `arccosCubed`
    #[serde(default)]
    pub formulation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolarizationConfig {
    #[serde(rename = "horizontalFraction", default = "default_horizontal_fraction")]
    pub horizontal_fraction: f64,
}

fn default_horizontal_fraction() -> f64 {
    0.5
}

impl ReductionConfig {
    /// Parse a recipe from XML text
    pub fn from_xml(xml_content: &str) -> SaxsResult<Self> {
        log::debug!("Parsing reduction recipe (length: {})", xml_content.len());
        from_str::<ReductionConfig>(xml_content)
            .map_err(|e| SaxsError::XmlParsing(format!("Failed to parse reduction recipe: {}", e)))
    }

    /// Read and parse a recipe file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SaxsResult<Self> {
        let path = path.as_ref();
        log::info!("Loading reduction recipe from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_xml(&content)
    }

    pub fn geometry(&self) -> DetectorGeometry {
        DetectorGeometry::new(
            (self.geometry.beam_center_row, self.geometry.beam_center_column),
            (self.geometry.pixel_size_row, self.geometry.pixel_size_column),
            self.geometry.distance,
        )
    }

    pub fn count_times(&self) -> SaxsResult<Option<Array1<f64>>> {
        parse_frame_list(self.count_times.as_deref(), "countTimes")
    }

    pub fn dead_times(&self) -> SaxsResult<Option<Array1<f64>>> {
        parse_frame_list(self.dead_times.as_deref(), "deadTimes")
    }

    /// Count times, required by the named section
    pub fn required_count_times(&self, section: &str) -> SaxsResult<Array1<f64>> {
        self.count_times()?
            .ok_or_else(|| SaxsError::Config(format!("{} requires countTimes", section)))
    }

    /// Dead times, required by the named section
    pub fn required_dead_times(&self, section: &str) -> SaxsResult<Array1<f64>> {
        self.dead_times()?
            .ok_or_else(|| SaxsError::Config(format!("{} requires deadTimes", section)))
    }

    pub fn solid_angle_formulation(&self) -> SaxsResult<Option<SolidAngleFormulation>> {
        let Some(section) = &self.solid_angle else {
            return Ok(None);
        };
        match section.formulation.as_deref().map(str::trim) {
            None | Some("arccos") => Ok(Some(SolidAngleFormulation::Arccos)),
            Some("arccosCubed") => Ok(Some(SolidAngleFormulation::ArccosCubed)),
            Some(other) => Err(SaxsError::Config(format!(
                "Unknown solid angle formulation: {}",
                other
            ))),
        }
    }

    /// Reject calibration values that would make a correction degenerate.
    ///
    /// Correction stages accept any value and let NaN or infinity propagate;
    /// this is where a recipe is checked before it is used.
    pub fn validate(&self) -> SaxsResult<()> {
        let geometry = &self.geometry;
        require(geometry.distance > 0.0, "distance must be positive")?;
        require(
            geometry.pixel_size_column > 0.0 && geometry.pixel_size_row > 0.0,
            "pixel sizes must be positive",
        )?;
        require(
            geometry.beam_center_column.is_finite() && geometry.beam_center_row.is_finite(),
            "beam center must be finite",
        )?;

        let count_times = self.count_times()?;
        let dead_times = self.dead_times()?;
        if let Some(times) = &count_times {
            require(!times.is_empty(), "countTimes must not be empty")?;
            require(times.iter().all(|&t| t > 0.0), "count times must be positive")?;
        }
        if let Some(times) = &dead_times {
            require(times.iter().all(|&t| t >= 0.0), "dead times must not be negative")?;
        }
        if let (Some(count), Some(dead)) = (&count_times, &dead_times) {
            require(
                count.len() == dead.len() || count.len() == 1 || dead.len() == 1,
                "countTimes and deadTimes must list the same number of frames or a single value",
            )?;
        }

        if let Some(deadtime) = &self.deadtime {
            match deadtime.model.trim() {
                "dutyCycle" => {
                    self.required_count_times("deadtime")?;
                    self.required_dead_times("deadtime")?;
                }
                "overlap" => {
                    self.required_count_times("deadtime")?;
                    let pulse = deadtime.min_pulse_separation.unwrap_or(0.0);
                    let arrival = deadtime.min_arrival_separation.unwrap_or(0.0);
                    require(
                        pulse >= 0.0 && arrival >= 0.0,
                        "deadtime separations must not be negative",
                    )?;
                }
                other => {
                    return Err(SaxsError::Config(format!("Unknown deadtime model: {}", other)))
                }
            }
        }

        if let Some(dark_current) = &self.dark_current {
            if dark_current.is_composite() {
                self.required_count_times("darkCurrent")?;
            }
        }

        if let Some(frame_time) = &self.frame_time {
            self.required_count_times("frameTime")?;
            if frame_time.include_dead_time.unwrap_or(false) {
                self.required_dead_times("frameTime")?;
            }
        }

        if let Some(section) = &self.self_absorption {
            require(
                section.transmissibility > 0.0 && section.transmissibility < 1.0,
                "transmissibility must lie in (0, 1)",
            )?;
        }

        if let Some(section) = &self.angular_efficiency {
            require(
                section.absorption_coefficient > 0.0 && section.sensor_thickness > 0.0,
                "sensor absorption coefficient and thickness must be positive",
            )?;
        }

        self.solid_angle_formulation()?;

        if let Some(section) = &self.polarization {
            require(
                (0.0..=1.0).contains(&section.horizontal_fraction),
                "horizontal polarization fraction must lie in [0, 1]",
            )?;
        }

        if let Some(thickness) = self.sample_thickness {
            require(thickness > 0.0, "sample thickness must be positive")?;
        }

        if let Some(fraction) = self.displaced_fraction {
            require(
                (0.0..1.0).contains(&fraction),
                "displaced fraction must lie in [0, 1)",
            )?;
        }

        if let Some(bins) = self.azimuthal_bins {
            require(bins > 0, "azimuthalBins must be at least one")?;
        }

        log::debug!("Reduction recipe validated");
        Ok(())
    }
}

fn require(condition: bool, message: &str) -> SaxsResult<()> {
    if condition {
        Ok(())
    } else {
        Err(SaxsError::Config(message.to_string()))
    }
}

fn parse_frame_list(input: Option<&str>, name: &str) -> SaxsResult<Option<Array1<f64>>> {
    input
        .map(|text| parse_space_separated_numbers::<f64>(text, name).map(Array1::from))
        .transpose()
}

/// Parse space-separated numbers from a string
fn parse_space_separated_numbers<T>(input: &str, name: &str) -> SaxsResult<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    input
        .split_whitespace()
        .map(|s| {
            s.parse::<T>()
                .map_err(|e| SaxsError::Config(format!("Invalid value {:?} in {}: {}", s, name, e)))
        })
        .collect()
}
