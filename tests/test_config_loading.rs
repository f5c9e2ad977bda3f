use std::io::Write;

use approx::assert_relative_eq;
use ndarray::Array3;
use saxscorr::core::dark_current::DarkCurrent;
use saxscorr::core::deadtime::DeadtimeModel;
use saxscorr::core::solid_angle::SolidAngleFormulation;
use saxscorr::{CorrectionPipeline, CorrectionStage, FrameStack, ReductionConfig, SaxsError, Uncertain};
use tempfile::NamedTempFile;

const RECIPE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<reduction>
  <geometry>
    <beamCenterColumn>3.0</beamCenterColumn>
    <beamCenterRow>2.0</beamCenterRow>
    <pixelSizeColumn>0.172</pixelSizeColumn>
    <pixelSizeRow>0.172</pixelSizeRow>
    <distance>1500.0</distance>
  </geometry>
  <countTimes>9.0 9.0</countTimes>
  <deadTimes>1.0 1.0</deadTimes>
  <deadtime>
    <model>dutyCycle</model>
  </deadtime>
  <darkCurrent>
    <base>0.5</base>
  </darkCurrent>
  <frameTime>
    <includeDeadTime>true</includeDeadTime>
  </frameTime>
  <solidAngle>
    <formulation>arccosCubed</formulation>
  </solidAngle>
  <polarization>
    <horizontalFraction>0.5</horizontalFraction>
  </polarization>
  <sampleThickness>0.1</sampleThickness>
  <displacedFraction>0.02</displacedFraction>
  <azimuthalBins>16</azimuthalBins>
</reduction>"#;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn test_recipe_from_file() {
    init_logging();

    let mut file = NamedTempFile::new().unwrap();
    file.write_all(RECIPE.as_bytes()).unwrap();

    let config = ReductionConfig::from_file(file.path()).unwrap();
    assert!(config.validate().is_ok());
    assert_eq!(config.geometry().beam_center, (2.0, 3.0));
    assert_eq!(config.azimuthal_bins, Some(16));
    assert_eq!(config.count_times().unwrap().unwrap().to_vec(), vec![9.0, 9.0]);
}

#[test]
fn test_missing_file_is_io_error() {
    let result = ReductionConfig::from_file("/nonexistent/recipe.xml");
    assert!(matches!(result, Err(SaxsError::Io(_))));
}

#[test]
fn test_recipe_builds_ordered_pipeline() {
    init_logging();

    let config = ReductionConfig::from_xml(RECIPE).unwrap();
    let pipeline = CorrectionPipeline::from_config(&config).unwrap();
    assert_eq!(pipeline.geometry(), &config.geometry());

    let names: Vec<&str> = pipeline.stages().iter().map(|s| s.name()).collect();
    assert_eq!(
        names,
        vec![
            "deadtime",
            "dark current",
            "frame time",
            "solid angle",
            "polarization",
            "thickness",
            "displaced volume"
        ]
    );
    assert_eq!(
        pipeline.stages()[0],
        CorrectionStage::Deadtime(DeadtimeModel::DutyCycle {
            count_times: ndarray::arr1(&[9.0, 9.0]),
            dead_times: ndarray::arr1(&[1.0, 1.0]),
        })
    );
    assert_eq!(
        pipeline.stages()[1],
        CorrectionStage::DarkCurrent(DarkCurrent::Constant(0.5))
    );
    assert_eq!(
        pipeline.stages()[3],
        CorrectionStage::SolidAngle(SolidAngleFormulation::ArccosCubed)
    );

    let frames = FrameStack::unmasked(Array3::from_elem((2, 5, 7), Uncertain::new(9.0, 3.0)));
    let profile = pipeline.reduce(&frames, config.azimuthal_bins.unwrap()).unwrap();
    assert_eq!(profile.len(), 16);
    assert!(profile.intensities.iter().any(|v| v.nominal().is_finite()));
}

#[test]
fn test_composite_dark_current_recipe() {
    let recipe = RECIPE.replace(
        "<base>0.5</base>",
        "<base>0.5</base><temporal>0.1</temporal><fluxDependent>0.01</fluxDependent>",
    );
    let config = ReductionConfig::from_xml(&recipe).unwrap();
    let pipeline = CorrectionPipeline::from_config(&config).unwrap();

    match &pipeline.stages()[1] {
        CorrectionStage::DarkCurrent(DarkCurrent::Composite {
            base,
            temporal,
            flux_dependent,
            count_times,
        }) => {
            assert_relative_eq!(*base, 0.5);
            assert_relative_eq!(*temporal, 0.1);
            assert_relative_eq!(*flux_dependent, 0.01);
            assert_eq!(count_times.len(), 2);
        }
        other => panic!("unexpected stage {:?}", other),
    }
}

#[test]
fn test_validation_rejects_degenerate_calibration() {
    let cases = [
        ("<distance>1500.0</distance>", "<distance>0.0</distance>"),
        ("<countTimes>9.0 9.0</countTimes>", "<countTimes>9.0 0.0</countTimes>"),
        ("<deadTimes>1.0 1.0</deadTimes>", "<deadTimes>1.0 1.0 1.0</deadTimes>"),
        ("<deadTimes>1.0 1.0</deadTimes>", "<deadTimes>1.0 -1.0</deadTimes>"),
        ("<model>dutyCycle</model>", "<model>paralyzable</model>"),
        ("<sampleThickness>0.1</sampleThickness>", "<sampleThickness>0.0</sampleThickness>"),
        ("<displacedFraction>0.02</displacedFraction>", "<displacedFraction>1.0</displacedFraction>"),
        ("<azimuthalBins>16</azimuthalBins>", "<azimuthalBins>0</azimuthalBins>"),
        (
            "<horizontalFraction>0.5</horizontalFraction>",
            "<horizontalFraction>1.5</horizontalFraction>",
        ),
        (
            "<sampleThickness>0.1</sampleThickness>",
            "<selfAbsorption><transmissibility>1.0</transmissibility></selfAbsorption>",
        ),
    ];

    for (original, degenerate) in cases {
        let recipe = RECIPE.replace(original, degenerate);
        let config = ReductionConfig::from_xml(&recipe).unwrap();
        assert!(
            matches!(config.validate(), Err(SaxsError::Config(_))),
            "accepted {}",
            degenerate
        );
        assert!(CorrectionPipeline::from_config(&config).is_err());
    }
}

#[test]
fn test_single_dead_time_shared_by_frames() {
    let recipe = RECIPE.replace("<deadTimes>1.0 1.0</deadTimes>", "<deadTimes>1.0</deadTimes>");
    let config = ReductionConfig::from_xml(&recipe).unwrap();
    assert!(config.validate().is_ok());

    let pipeline = CorrectionPipeline::from_config(&config).unwrap();
    let frames = FrameStack::unmasked(Array3::from_elem((2, 3, 3), Uncertain::new(9.0, 3.0)));
    let corrected = pipeline.run(&frames).unwrap();
    assert_eq!(corrected.shape(), &[2, 3, 3]);
}

#[test]
fn test_sections_requiring_frame_times() {
    let recipe = RECIPE
        .replace("<countTimes>9.0 9.0</countTimes>", "")
        .replace("<deadTimes>1.0 1.0</deadTimes>", "");
    let config = ReductionConfig::from_xml(&recipe).unwrap();
    assert!(matches!(config.validate(), Err(SaxsError::Config(_))));
}
