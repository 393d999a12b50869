use std::{
    error::Error,
    fmt::{self, Display},
};

use rayon::ThreadPoolBuildError;

use crate::training::Trained;

/// The result type used across the whole crate.
pub type Result<T> = std::result::Result<T, SgdErr>;

/// Coarse classification of an `SgdErr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad shapes, labels, counts or orderings. Detected before the affected work starts.
    InvalidArgument,
    /// An update step produced a non-finite value.
    WorkerFailure,
    /// The runtime couldn't be set up (e.g. the thread pool).
    Runtime,
}

/// The crate's error type.
#[derive(Debug)]
pub enum SgdErr {
    InvalidArgument(&'static str),
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    LabelOutOfRange {
        set: &'static str,
        index: usize,
        label: u32,
        nclass: usize,
    },
    /// The ordering of `epoch` isn't a permutation of the training set.
    ///
    /// `partial` holds the weights and stats of the epochs that ran before it, `None`
    /// if it was the first epoch.
    InvalidOrdering {
        epoch: usize,
        reason: &'static str,
        partial: Option<Box<Trained>>,
    },
    ThreadPool(ThreadPoolBuildError),
    /// A worker diverged during `epoch`. `index` is the offending example, if known.
    ///
    /// `partial` holds the weights as they were after the last fully applied epoch
    /// and the stats recorded up to that point.
    WorkerFailure {
        epoch: usize,
        index: Option<usize>,
        partial: Box<Trained>,
    },
}

impl SgdErr {
    /// Returns the coarse kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SgdErr::InvalidArgument(_)
            | SgdErr::SizeMismatch { .. }
            | SgdErr::LabelOutOfRange { .. }
            | SgdErr::InvalidOrdering { .. } => ErrorKind::InvalidArgument,
            SgdErr::WorkerFailure { .. } => ErrorKind::WorkerFailure,
            SgdErr::ThreadPool(_) => ErrorKind::Runtime,
        }
    }

    /// Consumes the error and returns the partial training result, if it carries one.
    pub fn into_partial(self) -> Option<Trained> {
        match self {
            SgdErr::WorkerFailure { partial, .. } => Some(*partial),
            SgdErr::InvalidOrdering { partial, .. } => partial.map(|p| *p),
            _ => None,
        }
    }
}

impl Display for SgdErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SgdErr::InvalidArgument(msg) => write!(f, "invalid argument: {msg}"),
            SgdErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(f, "size mismatch for {what}: got {got}, expected {expected}"),
            SgdErr::LabelOutOfRange {
                set,
                index,
                label,
                nclass,
            } => write!(
                f,
                "{set} label {label} at row {index} is out of range for {nclass} classes"
            ),
            SgdErr::InvalidOrdering { epoch, reason, .. } => {
                write!(f, "invalid ordering for epoch {epoch}: {reason}")
            }
            SgdErr::ThreadPool(e) => write!(f, "failed to build the worker pool: {e}"),
            SgdErr::WorkerFailure {
                epoch,
                index: Some(index),
                ..
            } => write!(
                f,
                "worker diverged at epoch {epoch} on example {index}: non-finite value"
            ),
            SgdErr::WorkerFailure { epoch, .. } => {
                write!(f, "worker diverged at epoch {epoch}: non-finite weights")
            }
        }
    }
}

impl Error for SgdErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SgdErr::ThreadPool(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ThreadPoolBuildError> for SgdErr {
    fn from(value: ThreadPoolBuildError) -> Self {
        Self::ThreadPool(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(
            SgdErr::InvalidArgument("epochs").kind(),
            ErrorKind::InvalidArgument
        );

        let err = SgdErr::LabelOutOfRange {
            set: "train",
            index: 3,
            label: 4,
            nclass: 4,
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.into_partial().is_none());
    }

    #[test]
    fn display() {
        let err = SgdErr::SizeMismatch {
            what: "labels",
            got: 3,
            expected: 4,
        };
        assert_eq!(err.to_string(), "size mismatch for labels: got 3, expected 4");

        let err = SgdErr::InvalidOrdering {
            epoch: 2,
            reason: "duplicated index",
            partial: None,
        };
        assert_eq!(
            err.to_string(),
            "invalid ordering for epoch 2: duplicated index"
        );
    }
}
