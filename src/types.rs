use ndarray::{Array, Array2, Array3, ArrayD, Axis, Dimension, Ix2, Ix3, Zip};
use serde::{Deserialize, Serialize};

use crate::core::masking::mask_frames;
use crate::core::uncertain::Uncertain;

/// Uncertain array of arbitrary dimensionality
pub type UncertainArray = ArrayD<Uncertain>;

/// Boolean mask where `true` marks an excluded pixel
pub type Mask = ArrayD<bool>;

/// A stack of uncertain detector frames with an optional mask
pub type FrameStack = Masked<Ix3>;

/// A single uncertain detector frame with an optional mask
pub type Frame = Masked<Ix2>;

/// Detector geometry for one acquisition
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorGeometry {
    /// Beam center in pixels as (row, column)
    pub beam_center: (f64, f64),
    /// Real space pixel pitch as (row pitch, column pitch)
    pub pixel_sizes: (f64, f64),
    /// Sample to detector distance, in the same units as the pixel pitch
    pub distance: f64,
}

impl DetectorGeometry {
    pub fn new(beam_center: (f64, f64), pixel_sizes: (f64, f64), distance: f64) -> Self {
        Self {
            beam_center,
            pixel_sizes,
            distance,
        }
    }

    /// Scattering angle of every pixel in a frame of the given shape
    pub fn scattering_angles(&self, frame_shape: (usize, usize)) -> Array2<f64> {
        crate::core::geometry::scattering_angles(frame_shape, self)
    }

    /// Azimuthal angle of every pixel in a frame of the given shape
    pub fn azimuthal_angles(&self, frame_shape: (usize, usize)) -> Array2<f64> {
        crate::core::geometry::azimuthal_angles(frame_shape, self.beam_center)
    }
}

/// Uncertain data paired with an optional mask.
///
/// The mask is stored at whatever shape the caller supplied, as long as it
/// broadcasts to the data shape; a 2D detector mask therefore serves every
/// frame of a stack without being copied.
#[derive(Debug, Clone, PartialEq)]
pub struct Masked<D: Dimension> {
    pub data: Array<Uncertain, D>,
    pub mask: Option<Mask>,
}

impl<D: Dimension> Masked<D> {
    /// Pair data with a mask, rejecting masks that do not broadcast to the data
    pub fn new(data: Array<Uncertain, D>, mask: Option<Mask>) -> SaxsResult<Self> {
        if let Some(mask) = &mask {
            if mask.broadcast(data.raw_dim()).is_none() {
                return Err(SaxsError::ShapeMismatch {
                    left: data.shape().to_vec(),
                    right: mask.shape().to_vec(),
                });
            }
        }
        Ok(Self { data, mask })
    }

    /// Data without any excluded pixels
    pub fn unmasked(data: Array<Uncertain, D>) -> Self {
        Self { data, mask: None }
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    pub fn nominal(&self) -> Array<f64, D> {
        self.data.map(|value| value.nominal())
    }

    pub fn uncertainty(&self) -> Array<f64, D> {
        self.data.map(|value| value.uncertainty())
    }

    /// Mask materialized at the data shape (all `false` when unmasked)
    pub fn full_mask(&self) -> Array<bool, D> {
        match &self.mask {
            Some(mask) => match mask.broadcast(self.data.raw_dim()) {
                Some(view) => view.to_owned(),
                None => Array::from_elem(self.data.raw_dim(), false),
            },
            None => Array::from_elem(self.data.raw_dim(), false),
        }
    }

    /// Data with masked elements replaced by zero
    pub fn filled(&self) -> SaxsResult<Array<Uncertain, D>> {
        match &self.mask {
            Some(mask) => mask_frames(&self.data, mask),
            None => Ok(self.data.clone()),
        }
    }

    /// Number of unmasked elements whose nominal value or uncertainty is not finite
    pub fn count_non_finite(&self) -> usize {
        let mask = self.full_mask();
        Zip::from(&self.data)
            .and(&mask)
            .fold(0, |count, value, &masked| {
                if !masked && !value.is_finite() {
                    count + 1
                } else {
                    count
                }
            })
    }

    /// Replace the data, keeping this mask.
    ///
    /// The replacement must have exactly the current shape: a calibration
    /// parameter that broadcast the result to a larger shape is rejected.
    pub fn with_data(&self, data: UncertainArray) -> SaxsResult<Self> {
        if data.shape() != self.data.shape() {
            return Err(SaxsError::ShapeMismatch {
                left: self.data.shape().to_vec(),
                right: data.shape().to_vec(),
            });
        }
        Ok(Self {
            data: data.into_dimensionality::<D>()?,
            mask: self.mask.clone(),
        })
    }
}

impl Masked<Ix3> {
    /// Build a stack from raw photon counts with Poisson uncertainties
    pub fn from_counts(counts: &Array3<f64>, mask: Option<Mask>) -> SaxsResult<Self> {
        Self::new(
            crate::core::uncertainties::estimate_poisson_uncertainty(counts),
            mask,
        )
    }

    pub fn num_frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// (rows, columns) of each frame
    pub fn frame_shape(&self) -> (usize, usize) {
        let (_, rows, cols) = self.data.dim();
        (rows, cols)
    }

    /// Extract one frame together with its slice of the mask
    pub fn frame(&self, index: usize) -> SaxsResult<Frame> {
        if index >= self.num_frames() {
            return Err(SaxsError::InvalidParameter(format!(
                "Frame index {} out of range for stack of {} frames",
                index,
                self.num_frames()
            )));
        }
        let data = self.data.index_axis(Axis(0), index).to_owned();
        let mask = self.mask.as_ref().map(|mask| {
            if mask.ndim() == 3 {
                // A leading axis of one is shared by every frame
                let mask_index = if mask.len_of(Axis(0)) == 1 { 0 } else { index };
                mask.index_axis(Axis(0), mask_index).to_owned()
            } else {
                mask.clone()
            }
        });
        Frame::new(data, mask)
    }
}

/// Error types for frame correction
#[derive(Debug, thiserror::Error)]
pub enum SaxsError {
    #[error("Shape mismatch: {left:?} cannot be broadcast with {right:?}")]
    ShapeMismatch { left: Vec<usize>, right: Vec<usize> },

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Processing error: {0}")]
    Processing(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for frame correction operations
pub type SaxsResult<T> = Result<T, SaxsError>;
