use crate::error::{Error, Result};
use crate::types::Prediction;

/// Running sums from which RMSE and MAE are derived.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ErrorAccumulator {
    sum_of_squared_errors: f64,
    sum_of_absolute_errors: f64,
    count: u64,
}

impl ErrorAccumulator {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn add(&mut self, prediction: &Prediction) {
        let error = prediction.error();
        self.sum_of_squared_errors += error * error;
        self.sum_of_absolute_errors += error.abs();
        self.count += 1;
    }

    /// Combines partial sums, e.g. from different workers.
    pub fn merge(&mut self, other: &ErrorAccumulator) {
        self.sum_of_squared_errors += other.sum_of_squared_errors;
        self.sum_of_absolute_errors += other.sum_of_absolute_errors;
        self.count += other.count;
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn metrics(&self) -> Result<Metrics> {
        if self.count == 0 {
            return Err(Error::EmptyEvaluation)
        }

        let count = self.count as f64;

        Ok(Metrics {
            rmse: (self.sum_of_squared_errors / count).sqrt(),
            mae: self.sum_of_absolute_errors / count,
            num_predictions: self.count,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub rmse: f64,
    pub mae: f64,
    pub num_predictions: u64,
}

/// RMSE and MAE over all predictions, fails on an empty set.
pub fn evaluate(predictions: &[Prediction]) -> Result<Metrics> {
    let mut accumulator = ErrorAccumulator::new();
    for prediction in predictions {
        accumulator.add(prediction);
    }
    accumulator.metrics()
}
