use ndarray::{Array2, ArrayView1, ArrayView2, Axis, s};

use crate::{Result, SgdErr, data::Samples};

/// The parameters of a linear multi-class classifier.
///
/// A `nclass x (ndims + 1)` matrix, row `k` is the discriminant of class `k` and the
/// last column holds the bias of each class.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMatrix {
    params: Array2<f32>,
}

impl WeightMatrix {
    /// Creates a new zero initialized `WeightMatrix`.
    ///
    /// # Arguments
    /// * `nclass` - The amount of classes.
    /// * `ndims` - The dimension of the feature vectors.
    pub fn zeros(nclass: usize, ndims: usize) -> Self {
        Self {
            params: Array2::zeros((nclass, ndims + 1)),
        }
    }

    /// Wraps an existing `nclass x (ndims + 1)` matrix.
    ///
    /// # Returns
    /// An error if the matrix has no rows or only the bias column.
    pub fn from_array(params: Array2<f32>) -> Result<Self> {
        let (nclass, cols) = params.dim();

        if nclass == 0 || cols < 2 {
            return Err(SgdErr::InvalidArgument(
                "a weight matrix needs at least one class and one feature column plus the bias",
            ));
        }

        Ok(Self { params })
    }

    /// Wraps a matrix whose shape is already known to be valid.
    pub(crate) fn from_parts(params: Array2<f32>) -> Self {
        debug_assert!(params.ncols() >= 1);
        Self { params }
    }

    #[inline]
    pub fn nclass(&self) -> usize {
        self.params.nrows()
    }

    #[inline]
    pub fn ndims(&self) -> usize {
        self.params.ncols() - 1
    }

    /// The whole matrix, bias column included.
    pub fn view(&self) -> ArrayView2<'_, f32> {
        self.params.view()
    }

    /// The weights without the bias column.
    pub fn weights(&self) -> ArrayView2<'_, f32> {
        self.params.slice(s![.., ..self.ndims()])
    }

    pub fn bias(&self) -> ArrayView1<'_, f32> {
        self.params.column(self.ndims())
    }

    pub fn into_array(self) -> Array2<f32> {
        self.params
    }

    /// Whether every parameter is finite.
    pub fn is_finite(&self) -> bool {
        self.params.iter().all(|w| w.is_finite())
    }

    /// Computes the per class scores of every sample, `W · [x; bias_term]`.
    ///
    /// # Arguments
    /// * `samples` - The samples to score.
    /// * `bias_term` - The value appended to every feature vector.
    ///
    /// # Returns
    /// A `n x nclass` matrix, or an error if the samples don't have `ndims` features.
    pub fn scores(&self, samples: &Samples<'_>, bias_term: f32) -> Result<Array2<f32>> {
        if samples.ndims() != self.ndims() {
            return Err(SgdErr::SizeMismatch {
                what: "feature dimension",
                got: samples.ndims(),
                expected: self.ndims(),
            });
        }

        let mut scores = samples.features().dot(&self.weights().t());
        let bias = self.bias().mapv(|b| b * bias_term);
        scores += &bias.insert_axis(Axis(0));
        Ok(scores)
    }

    /// Predicts the class of every sample as the highest scoring one.
    pub fn predict(&self, samples: &Samples<'_>, bias_term: f32) -> Result<Vec<u32>> {
        let scores = self.scores(samples, bias_term)?;
        Ok(scores
            .rows()
            .into_iter()
            .map(|row| argmax(row) as u32)
            .collect())
    }
}

/// Index of the maximum score, the lowest index wins on ties.
pub fn argmax(scores: ArrayView1<'_, f32>) -> usize {
    let mut best = 0;
    let mut best_score = f32::NEG_INFINITY;

    for (k, &score) in scores.iter().enumerate() {
        if score > best_score {
            best = k;
            best_score = score;
        }
    }

    best
}
