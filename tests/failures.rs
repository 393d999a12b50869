mod common;

use linear_sgd::{
    ErrorKind, Fixed, Samples, Sequential, SgdErr, Termination, TrainConfig, train,
};

use common::{blobs, init_logger};

#[test]
fn label_equal_to_nclass_is_rejected() {
    let data = [1., 0., 0., 1., 1., 1.];
    let labels = [0, 1, 2];
    let samples = Samples::from_slice(&data, 2, &labels).unwrap();

    let config = TrainConfig {
        nclass: Some(2),
        ..Default::default()
    };

    let err = train(samples, None, &config, &mut Sequential).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(
        err,
        SgdErr::LabelOutOfRange {
            index: 2,
            label: 2,
            nclass: 2,
            ..
        }
    ));
}

#[test]
fn validation_labels_are_checked_too() {
    let data = blobs(2, 5, 2, 1., 1);
    let valid_data = [1., 0.];
    let valid_labels = [3];
    let valid = Samples::from_slice(&valid_data, 2, &valid_labels).unwrap();

    let err = train(data.samples(), Some(valid), &TrainConfig::default(), &mut Sequential)
        .unwrap_err();
    assert!(matches!(
        err,
        SgdErr::LabelOutOfRange {
            set: "validation",
            ..
        }
    ));
}

#[test]
fn invalid_config_is_rejected_before_training() {
    let data = blobs(2, 5, 2, 1., 2);
    let configs = [
        TrainConfig {
            threads: 0,
            ..Default::default()
        },
        TrainConfig {
            epochs: 0,
            ..Default::default()
        },
        TrainConfig {
            eval_freq: 0,
            ..Default::default()
        },
        TrainConfig {
            base_rate: -0.1,
            ..Default::default()
        },
        TrainConfig {
            base_rate: 0.5,
            lambda: 2.,
            ..Default::default()
        },
    ];

    for config in configs {
        let err = train(data.samples(), Some(data.samples()), &config, &mut Sequential)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{config:?}");
    }
}

#[test]
fn broken_ordering_is_rejected_at_its_epoch() {
    let data = blobs(2, 2, 2, 1., 3);
    let mut ordering = Fixed::new(vec![vec![0, 1, 2, 3], vec![0, 1, 2, 7]]).unwrap();

    let err = train(data.samples(), None, &TrainConfig::default(), &mut ordering).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    assert!(matches!(
        err,
        SgdErr::InvalidOrdering {
            epoch: 1,
            reason: "index out of range",
            ..
        }
    ));

    let partial = err.into_partial().unwrap();
    assert_eq!(partial.stats.losses().len(), 1);
    assert_eq!(partial.stats.termination(), Termination::InvalidOrdering { epoch: 1 });

    let mut short = Fixed::new(vec![vec![0, 1]]).unwrap();
    let err = train(data.samples(), None, &TrainConfig::default(), &mut short).unwrap_err();
    assert!(matches!(err, SgdErr::InvalidOrdering { epoch: 0, .. }));
    assert!(err.into_partial().is_none());
}

#[test]
fn nan_feature_fails_with_the_initial_weights() {
    init_logger();
    let data = [f32::NAN, 1., 1., 0., 0., 1.];
    let labels = [0, 1, 0];
    let samples = Samples::from_slice(&data, 2, &labels).unwrap();

    let config = TrainConfig {
        epochs: 3,
        ..Default::default()
    };

    let err = train(samples, None, &config, &mut Sequential).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkerFailure);
    assert!(err.to_string().contains("epoch 0"));
    assert!(matches!(
        err,
        SgdErr::WorkerFailure {
            epoch: 0,
            index: Some(0),
            ..
        }
    ));

    let partial = err.into_partial().unwrap();
    assert_eq!(partial.weights.view().dim(), (2, 3));
    assert!(partial.weights.view().iter().all(|&w| w == 0.));
    assert!(partial.stats.losses().is_empty());
    assert_eq!(partial.stats.termination(), Termination::Diverged { epoch: 0 });
}

#[test]
fn overflowing_features_diverge() {
    init_logger();
    let data = blobs(3, 10, 4, 1., 4);
    let huge: Vec<f32> = data.features.iter().map(|x| x * 1e30).collect();
    let samples = Samples::from_slice(&huge, data.ndims, &data.labels).unwrap();

    for threads in [1, 4] {
        let config = TrainConfig {
            threads,
            base_rate: 1.,
            ..Default::default()
        };

        let err = train(samples, None, &config, &mut Sequential).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::WorkerFailure, "threads: {threads}");

        let partial = err.into_partial().unwrap();
        assert!(partial.weights.is_finite());
        assert!(matches!(
            partial.stats.termination(),
            Termination::Diverged { .. }
        ));
    }
}

#[test]
fn other_errors_carry_no_partial_result() {
    let data = blobs(2, 5, 2, 1., 5);
    let config = TrainConfig {
        threads: 0,
        ..Default::default()
    };

    let err = train(data.samples(), None, &config, &mut Sequential).unwrap_err();
    assert!(err.into_partial().is_none());
}
