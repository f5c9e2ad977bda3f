//! Python bindings, exposed as the `_core` extension module.

use numpy::{PyReadonlyArray3, PyReadonlyArrayDyn, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::core::pipeline::CorrectionPipeline;
use crate::io::config::ReductionConfig;
use crate::types::{FrameStack, SaxsError};

fn to_py_err(context: &str, error: SaxsError) -> PyErr {
    PyValueError::new_err(format!("{}: {}", context, error))
}

/// Build an uncertain stack from raw counts and an optional detector or stack mask
fn frames_from_numpy(
    counts: PyReadonlyArray3<f64>,
    mask: Option<PyReadonlyArrayDyn<bool>>,
) -> PyResult<FrameStack> {
    let counts = counts.as_array().to_owned();
    let mask = mask.map(|mask| mask.as_array().to_owned());
    FrameStack::from_counts(&counts, mask).map_err(|e| to_py_err("Invalid frames", e))
}

fn pipeline_from_xml(config_xml: &str) -> PyResult<(ReductionConfig, CorrectionPipeline)> {
    let config =
        ReductionConfig::from_xml(config_xml).map_err(|e| to_py_err("Invalid recipe", e))?;
    let pipeline =
        CorrectionPipeline::from_config(&config).map_err(|e| to_py_err("Invalid recipe", e))?;
    Ok((config, pipeline))
}

/// Poisson counting uncertainty of raw frames
#[pyfunction]
fn estimate_poisson_uncertainty(py: Python, counts: PyReadonlyArray3<f64>) -> PyResult<PyObject> {
    let frames = FrameStack::from_counts(&counts.as_array().to_owned(), None)
        .map_err(|e| to_py_err("Invalid frames", e))?;

    let result = PyDict::new(py);
    result.set_item("nominal", frames.nominal().to_pyarray(py))?;
    result.set_item("uncertainty", frames.uncertainty().to_pyarray(py))?;
    Ok(result.into())
}

/// Apply the corrections of an XML recipe to raw frames
#[pyfunction]
#[pyo3(signature = (config_xml, counts, mask=None))]
fn correct_frames(
    py: Python,
    config_xml: &str,
    counts: PyReadonlyArray3<f64>,
    mask: Option<PyReadonlyArrayDyn<bool>>,
) -> PyResult<PyObject> {
    let (_, pipeline) = pipeline_from_xml(config_xml)?;
    let frames = frames_from_numpy(counts, mask)?;
    let corrected = pipeline
        .run(&frames)
        .map_err(|e| to_py_err("Correction failed", e))?;

    let result = PyDict::new(py);
    result.set_item("nominal", corrected.nominal().to_pyarray(py))?;
    result.set_item("uncertainty", corrected.uncertainty().to_pyarray(py))?;
    result.set_item("mask", corrected.full_mask().to_pyarray(py))?;
    result.set_item("stages", pipeline.stages().iter().map(|s| s.name()).collect::<Vec<_>>())?;
    Ok(result.into())
}

/// Correct, average and azimuthally integrate raw frames
#[pyfunction]
#[pyo3(signature = (config_xml, counts, mask=None))]
fn reduce_frames(
    py: Python,
    config_xml: &str,
    counts: PyReadonlyArray3<f64>,
    mask: Option<PyReadonlyArrayDyn<bool>>,
) -> PyResult<PyObject> {
    let (config, pipeline) = pipeline_from_xml(config_xml)?;
    let num_bins = config.azimuthal_bins.unwrap_or(1000);
    let frames = frames_from_numpy(counts, mask)?;
    let profile = pipeline
        .reduce(&frames, num_bins)
        .map_err(|e| to_py_err("Reduction failed", e))?;

    let result = PyDict::new(py);
    result.set_item("angles", profile.angles.to_pyarray(py))?;
    result.set_item("intensity", profile.intensities.mapv(|v| v.nominal()).to_pyarray(py))?;
    result.set_item(
        "uncertainty",
        profile.intensities.mapv(|v| v.uncertainty()).to_pyarray(py),
    )?;
    result.set_item("counts", profile.counts.to_pyarray(py))?;
    Ok(result.into())
}

#[pymodule]
fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(estimate_poisson_uncertainty, m)?)?;
    m.add_function(wrap_pyfunction!(correct_frames, m)?)?;
    m.add_function(wrap_pyfunction!(reduce_frames, m)?)?;
    Ok(())
}
