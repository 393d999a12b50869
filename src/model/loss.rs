use serde::{Deserialize, Serialize};

/// The per-example loss optimized by the gradient workers.
///
/// Every kind is expressed as a function of the class scores `s = W · [x; b]`, its
/// gradient with respect to row `k` of `W` is `c_k · [x; b]` with `c_k = dL/ds_k`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LossKind {
    /// Multiclass hinge: `max(0, 1 + s_j - s_y)` where `j` is the top scoring wrong class.
    /// Only rows `y` and `j` are updated.
    #[default]
    Hinge,
    /// Multinomial logistic (softmax cross-entropy). Every row is updated.
    Logistic,
    /// Sum of one binary hinge per class with targets `+1` for `y` and `-1` otherwise.
    OneVsRest,
}

impl LossKind {
    /// Computes the loss of one example and writes `dL/ds_k` into `coefs`.
    ///
    /// # Arguments
    /// * `scores` - The class scores of the example.
    /// * `label` - The true class of the example.
    /// * `coefs` - Where the score gradient is written, same length as `scores`.
    ///
    /// # Returns
    /// The loss value. Non-finite scores yield a non-finite loss.
    pub fn gradient(self, scores: &[f32], label: usize, coefs: &mut [f32]) -> f32 {
        debug_assert_eq!(scores.len(), coefs.len());

        match self {
            LossKind::Hinge => hinge(scores, label, coefs),
            LossKind::Logistic => logistic(scores, label, coefs),
            LossKind::OneVsRest => one_vs_rest(scores, label, coefs),
        }
    }
}

fn hinge(scores: &[f32], label: usize, coefs: &mut [f32]) -> f32 {
    coefs.fill(0.);

    let mut rival = None;
    let mut rival_score = f32::NEG_INFINITY;

    for (k, &score) in scores.iter().enumerate() {
        if k != label && (rival.is_none() || score > rival_score) {
            rival = Some(k);
            rival_score = score;
        }
    }

    let Some(rival) = rival else {
        return 0.;
    };

    let loss = 1. + rival_score - scores[label];
    if loss > 0. {
        coefs[label] = -1.;
        coefs[rival] = 1.;
        loss
    } else if loss.is_nan() {
        loss
    } else {
        0.
    }
}

fn logistic(scores: &[f32], label: usize, coefs: &mut [f32]) -> f32 {
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let mut sum = 0.;
    for (c, &s) in coefs.iter_mut().zip(scores) {
        *c = (s - max).exp();
        sum += *c;
    }

    for c in coefs.iter_mut() {
        *c /= sum;
    }
    coefs[label] -= 1.;

    sum.ln() + max - scores[label]
}

fn one_vs_rest(scores: &[f32], label: usize, coefs: &mut [f32]) -> f32 {
    let mut loss = 0.;

    for (k, (c, &s)) in coefs.iter_mut().zip(scores).enumerate() {
        let target = if k == label { 1. } else { -1. };
        let margin = 1. - target * s;

        if margin > 0. {
            loss += margin;
            *c = -target;
        } else {
            if margin.is_nan() {
                loss = f32::NAN;
            }
            *c = 0.;
        }
    }

    loss
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn hinge_violated_margin() {
        let scores = [0.5, 0.2, 0.9];
        let mut coefs = [9.; 3];

        let loss = LossKind::Hinge.gradient(&scores, 0, &mut coefs);
        assert!((loss - 1.4).abs() < EPS);
        assert_eq!(coefs, [-1., 0., 1.]);
    }

    #[test]
    fn hinge_satisfied_margin() {
        let scores = [2.5, 0.2, 1.0];
        let mut coefs = [9.; 3];

        let loss = LossKind::Hinge.gradient(&scores, 0, &mut coefs);
        assert_eq!(loss, 0.);
        assert_eq!(coefs, [0.; 3]);
    }

    #[test]
    fn hinge_ties_pick_the_lowest_rival() {
        let scores = [0.; 4];
        let mut coefs = [0.; 4];

        let loss = LossKind::Hinge.gradient(&scores, 2, &mut coefs);
        assert_eq!(loss, 1.);
        assert_eq!(coefs, [1., 0., -1., 0.]);
    }

    #[test]
    fn logistic_uniform_scores() {
        let scores = [0.; 4];
        let mut coefs = [0.; 4];

        let loss = LossKind::Logistic.gradient(&scores, 1, &mut coefs);
        assert!((loss - 4f32.ln()).abs() < EPS);
        assert!((coefs[0] - 0.25).abs() < EPS);
        assert!((coefs[1] + 0.75).abs() < EPS);
        assert!(coefs.iter().sum::<f32>().abs() < EPS);
    }

    #[test]
    fn logistic_is_stable_for_large_scores() {
        let scores = [1000., 0.];
        let mut coefs = [0.; 2];

        let loss = LossKind::Logistic.gradient(&scores, 0, &mut coefs);
        assert!(loss.is_finite());
        assert!(loss.abs() < EPS);
        assert!(coefs.iter().all(|c| c.abs() < EPS));
    }

    #[test]
    fn one_vs_rest() {
        let scores = [0.5, -2., 0.];
        let mut coefs = [9.; 3];

        // class 0: 1 - 0.5 = 0.5, class 1: 1 - 2 < 0, class 2: 1 + 0 = 1
        let loss = LossKind::OneVsRest.gradient(&scores, 0, &mut coefs);
        assert!((loss - 1.5).abs() < EPS);
        assert_eq!(coefs, [-1., 0., 1.]);
    }

    #[test]
    fn non_finite_scores() {
        let scores = [f32::NAN, 0.];
        let mut coefs = [0.; 2];

        for kind in [LossKind::Hinge, LossKind::Logistic, LossKind::OneVsRest] {
            assert!(!kind.gradient(&scores, 1, &mut coefs).is_finite(), "{kind:?}");
        }
    }
}
