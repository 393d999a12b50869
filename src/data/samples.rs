use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::{Result, SgdErr};

/// A borrowed, immutable set of labeled samples.
///
/// `features` holds one sample per row (`n x d`), `labels` holds the class id of each row.
/// The engine never copies nor mutates the underlying buffers.
#[derive(Debug, Clone, Copy)]
pub struct Samples<'a> {
    features: ArrayView2<'a, f32>,
    labels: &'a [u32],
}

impl<'a> Samples<'a> {
    /// Creates a new `Samples` view.
    ///
    /// # Arguments
    /// * `features` - The `n x d` feature matrix.
    /// * `labels` - One class id per row of `features`.
    ///
    /// # Returns
    /// An error if the amount of rows and labels differ or if `d` is zero.
    pub fn new(features: ArrayView2<'a, f32>, labels: &'a [u32]) -> Result<Self> {
        let (rows, ndims) = features.dim();

        if rows != labels.len() {
            return Err(SgdErr::SizeMismatch {
                what: "labels",
                got: labels.len(),
                expected: rows,
            });
        }

        if ndims == 0 {
            return Err(SgdErr::InvalidArgument("features must have at least one dimension"));
        }

        Ok(Self { features, labels })
    }

    /// Creates a new `Samples` view over a flat, row-major buffer.
    ///
    /// # Arguments
    /// * `data` - The features, `ndims` consecutive values per sample.
    /// * `ndims` - The dimension of each feature vector.
    /// * `labels` - One class id per sample.
    ///
    /// # Returns
    /// An error if `data` can't be split in rows of `ndims` values or if the
    /// amount of rows and labels differ.
    pub fn from_slice(data: &'a [f32], ndims: usize, labels: &'a [u32]) -> Result<Self> {
        if ndims == 0 {
            return Err(SgdErr::InvalidArgument("features must have at least one dimension"));
        }

        if data.len() % ndims != 0 {
            return Err(SgdErr::SizeMismatch {
                what: "feature buffer",
                got: data.len(),
                expected: data.len() / ndims * ndims,
            });
        }

        let rows = data.len() / ndims;
        let features =
            ArrayView2::from_shape((rows, ndims), data).map_err(|_| SgdErr::SizeMismatch {
                what: "feature buffer",
                got: data.len(),
                expected: rows * ndims,
            })?;

        Self::new(features, labels)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.features.ncols()
    }

    #[inline]
    pub fn features(&self) -> ArrayView2<'a, f32> {
        self.features
    }

    #[inline]
    pub fn labels(&self) -> &'a [u32] {
        self.labels
    }

    /// Returns the feature vector of the `idx`-th sample (panics if out of bounds).
    #[inline]
    pub fn row(&self, idx: usize) -> ArrayView1<'a, f32> {
        self.features.index_axis_move(Axis(0), idx)
    }

    /// Returns the label of the `idx`-th sample (panics if out of bounds).
    #[inline]
    pub fn label(&self, idx: usize) -> u32 {
        self.labels[idx]
    }

    /// Returns the largest label in the set, `None` if it's empty.
    pub fn max_label(&self) -> Option<u32> {
        self.labels.iter().copied().max()
    }

    /// Checks every label lies in `[0, nclass)`.
    ///
    /// # Arguments
    /// * `nclass` - The amount of classes of the model.
    /// * `set` - The name of this set, used for reporting.
    ///
    /// # Returns
    /// A `LabelOutOfRange` error pointing at the first offending row.
    pub fn check_labels(&self, nclass: usize, set: &'static str) -> Result<()> {
        match self
            .labels
            .iter()
            .position(|&label| label as usize >= nclass)
        {
            Some(index) => Err(SgdErr::LabelOutOfRange {
                set,
                index,
                label: self.labels[index],
                nclass,
            }),
            None => Ok(()),
        }
    }
}
