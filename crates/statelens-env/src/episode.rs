//! Episode and label-frame data model.
//!
//! An [`Episode`] is one continuous environment trajectory: an ordered stack
//! of fixed-shape frames stored as a single row-major `f32` tensor whose
//! first dimension is time. Raw pixel episodes are
//! `[time, channel, height, width]`; pre-encoded representation episodes are
//! `[time, features]`. Episodes are immutable once constructed.
//!
//! Labels travel alongside frames as [`LabelFrame`] maps, one per frame,
//! keyed by label name with categorical integer values. The probing protocol
//! requires the key set to be identical across every label frame of a run;
//! keys are only ever dropped globally, never per frame.

use std::collections::BTreeMap;

/// A mapping from label key to categorical value for one frame.
pub type LabelFrame = BTreeMap<String, i64>;

/// Per-frame labels for one episode, aligned 1:1 with its frames.
pub type EpisodeLabels = Vec<LabelFrame>;

/// Errors raised when assembling an episode tensor.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EpisodeShapeError {
    /// Episodes must contain at least one frame.
    #[display("episode must contain at least one frame")]
    Empty,
    /// All frames within one episode must share identical shape.
    #[display("frame {index} has dims {found:?}, expected {expected:?}")]
    MismatchedFrame {
        index: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    /// Tensor data length must equal the product of its dims.
    #[display("tensor data length {len} does not match dims {dims:?}")]
    LengthMismatch { dims: Vec<usize>, len: usize },
}

/// A single observation frame: an n-dimensional `f32` tensor.
///
/// Raw pixel frames are `[channel, height, width]`; pre-encoded feature
/// frames are `[features]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    dims: Vec<usize>,
    data: Vec<f32>,
}

impl Frame {
    /// Creates a frame from dims and row-major data.
    pub fn new(dims: Vec<usize>, data: Vec<f32>) -> Result<Self, EpisodeShapeError> {
        if dims.iter().product::<usize>() != data.len() {
            return Err(EpisodeShapeError::LengthMismatch {
                dims,
                len: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    /// The frame's dimensions.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// The frame's row-major data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// An ordered, immutable stack of identically-shaped frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Episode {
    dims: Vec<usize>,
    data: Vec<f32>,
}

impl Episode {
    /// Stacks frames into one episode tensor of dims `[time, ...frame dims]`.
    pub fn from_frames(frames: Vec<Frame>) -> Result<Self, EpisodeShapeError> {
        let first = frames.first().ok_or(EpisodeShapeError::Empty)?;
        let frame_dims = first.dims.clone();
        let mut dims = Vec::with_capacity(frame_dims.len() + 1);
        dims.push(frames.len());
        dims.extend_from_slice(&frame_dims);

        let mut data = Vec::with_capacity(frames.len() * first.data.len());
        for (index, frame) in frames.iter().enumerate() {
            if frame.dims != frame_dims {
                return Err(EpisodeShapeError::MismatchedFrame {
                    index,
                    expected: frame_dims,
                    found: frame.dims.clone(),
                });
            }
            data.extend_from_slice(&frame.data);
        }
        Ok(Self { dims, data })
    }

    /// Creates an episode directly from dims and row-major data.
    ///
    /// `dims[0]` is time and must be at least 1.
    pub fn from_raw(dims: Vec<usize>, data: Vec<f32>) -> Result<Self, EpisodeShapeError> {
        if dims.first().is_none_or(|&t| t == 0) {
            return Err(EpisodeShapeError::Empty);
        }
        if dims.iter().product::<usize>() != data.len() {
            return Err(EpisodeShapeError::LengthMismatch {
                dims,
                len: data.len(),
            });
        }
        Ok(Self { dims, data })
    }

    /// Number of frames (the time dimension).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dims[0]
    }

    /// Whether the episode contains no frames. Always false by construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Full tensor dimensions, time first.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Per-frame dimensions (everything after time).
    #[must_use]
    pub fn frame_dims(&self) -> &[usize] {
        &self.dims[1..]
    }

    /// Product of all non-time dimensions: the flattened size of one frame.
    #[must_use]
    pub fn feature_size(&self) -> usize {
        self.frame_dims().iter().product()
    }

    /// The full row-major tensor data.
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Row-major data of the frame at time `t`.
    ///
    /// # Panics
    ///
    /// Panics if `t` is out of range.
    #[must_use]
    pub fn frame(&self, t: usize) -> &[f32] {
        let size = self.feature_size();
        &self.data[t * size..(t + 1) * size]
    }

    /// Reorders a spatial `[time, height, width, channel]` episode into the
    /// `[time, channel, height, width]` layout the pipeline works with.
    ///
    /// Episodes with fewer than four dimensions (pre-encoded representations)
    /// are returned unchanged.
    #[must_use]
    pub fn to_channels_first(&self) -> Self {
        let [t, h, w, c] = *self.dims else {
            return self.clone();
        };
        let mut data = vec![0.0; self.data.len()];
        for ti in 0..t {
            for hi in 0..h {
                for wi in 0..w {
                    for ci in 0..c {
                        let src = ((ti * h + hi) * w + wi) * c + ci;
                        let dst = ((ti * c + ci) * h + hi) * w + wi;
                        data[dst] = self.data[src];
                    }
                }
            }
        }
        Self {
            dims: vec![t, c, h, w],
            data,
        }
    }

    /// Inverse of [`Self::to_channels_first`]: reorders
    /// `[time, channel, height, width]` into `[time, height, width, channel]`
    /// for archival storage. Lower-rank episodes are returned unchanged.
    #[must_use]
    pub fn to_channels_last(&self) -> Self {
        let [t, c, h, w] = *self.dims else {
            return self.clone();
        };
        let mut data = vec![0.0; self.data.len()];
        for ti in 0..t {
            for ci in 0..c {
                for hi in 0..h {
                    for wi in 0..w {
                        let src = ((ti * c + ci) * h + hi) * w + wi;
                        let dst = ((ti * h + hi) * w + wi) * c + ci;
                        data[dst] = self.data[src];
                    }
                }
            }
        }
        Self {
            dims: vec![t, h, w, c],
            data,
        }
    }
}
