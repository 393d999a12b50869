#![allow(dead_code)]

use linear_sgd::Samples;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// An owned, labeled data set for tests.
pub struct Blobs {
    pub features: Vec<f32>,
    pub labels: Vec<u32>,
    pub ndims: usize,
}

impl Blobs {
    pub fn samples(&self) -> Samples<'_> {
        Samples::from_slice(&self.features, self.ndims, &self.labels).unwrap()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }
}

/// Generates `per_class` points per class, uniformly spread in a box of side `spread`
/// around the class center. Class `k` is centered at `4` on axis `k % ndims`, negated
/// for `k >= ndims`, so the classes are linearly separable while `spread` is small.
///
/// Samples are interleaved by class: `labels[i] == i % nclass`.
pub fn blobs(nclass: usize, per_class: usize, ndims: usize, spread: f32, seed: u64) -> Blobs {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(nclass * per_class * ndims);
    let mut labels = Vec::with_capacity(nclass * per_class);

    for _ in 0..per_class {
        for class in 0..nclass {
            let axis = class % ndims;
            let sign = if class < ndims { 1. } else { -1. };

            for d in 0..ndims {
                let center = if d == axis { 4. * sign } else { 0. };
                features.push(center + rng.random_range(-spread / 2.0..spread / 2.0));
            }
            labels.push(class as u32);
        }
    }

    Blobs {
        features,
        labels,
        ndims,
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
