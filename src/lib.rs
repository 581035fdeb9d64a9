extern crate csv;
extern crate fnv;
extern crate scoped_pool;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;

use std::time::Instant;

use scoped_pool::Pool;
use tracing::{debug, info};

pub mod cancel;
pub mod error;
pub mod evaluation;
pub mod index;
pub mod io;
pub mod predict;
pub mod similarity;
pub mod stats;
pub mod types;
pub mod utils;


use cancel::CancellationToken;
use error::{Error, Result};
use evaluation::{ErrorAccumulator, Metrics};
use index::RatingIndex;
use predict::{BatchOutcome, UnknownUserPolicy};
use stats::AverageRatings;
use types::{Prediction, RatingEvent};

#[derive(Debug, Clone)]
pub struct EvaluationConfig {
    /// Number of threads to predict with, one means predicting on the calling thread.
    pub num_workers: usize,
    pub unknown_users: UnknownUserPolicy,
    /// Memoize user similarities per worker.
    pub cache_similarities: bool,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        EvaluationConfig {
            num_workers: 1,
            unknown_users: UnknownUserPolicy::Abort,
            cache_similarities: false,
        }
    }
}

#[derive(Debug)]
pub struct Evaluation {
    /// One prediction per test event, in the order of the test events.
    pub predictions: Vec<Prediction>,
    /// Test events whose user has no training ratings, only non-empty under
    /// `UnknownUserPolicy::Skip`.
    pub skipped: Vec<RatingEvent>,
    pub metrics: Metrics,
}

/// Predicts a rating for every event of the test index from the training index, and measures the
/// accuracy of these predictions.
pub fn evaluate(
    train: &RatingIndex,
    test: &RatingIndex,
    config: &EvaluationConfig,
    token: &CancellationToken,
) -> Result<Evaluation> {

    let start = Instant::now();

    let averages = AverageRatings::from(train);
    debug!("Computed average ratings of {} users", averages.num_users());

    let test_events: Vec<RatingEvent> = test.events().collect();

    let batches = if config.num_workers > 1 && test_events.len() > 1 {
        predict_in_parallel(&test_events, train, &averages, config, token)
    } else {
        vec![predict::predict_batch(&test_events, train, &averages, config.unknown_users,
            config.cache_similarities, token)]
    };

    let mut predictions: Vec<Prediction> = Vec::with_capacity(test_events.len());
    let mut skipped: Vec<RatingEvent> = Vec::new();
    let mut errors = ErrorAccumulator::new();

    for batch in first_failure_or_all(batches)? {
        predictions.extend(batch.predictions);
        skipped.extend(batch.skipped);
        errors.merge(&batch.errors);
    }

    let metrics = errors.metrics()?;

    info!("Predicted {} ratings ({} skipped) in {}ms",
        predictions.len(), skipped.len(), utils::to_millis(start.elapsed()));

    Ok(Evaluation { predictions, skipped, metrics })
}

fn predict_in_parallel(
    test_events: &[RatingEvent],
    train: &RatingIndex,
    averages: &AverageRatings,
    config: &EvaluationConfig,
    token: &CancellationToken,
) -> Vec<Result<BatchOutcome>> {

    let pool = Pool::new(config.num_workers);

    let batch_size = utils::chunk_size(test_events.len(), config.num_workers);
    let chunks: Vec<&[RatingEvent]> = test_events.chunks(batch_size).collect();

    debug!("Predicting {} test events in {} batches on {} workers",
        test_events.len(), chunks.len(), config.num_workers);

    let mut batches: Vec<Option<Result<BatchOutcome>>> = chunks.iter().map(|_| None).collect();

    pool.scoped(|scope| {
        for (chunk, batch) in chunks.iter().zip(batches.iter_mut()) {

            let policy = config.unknown_users;
            let cache_similarities = config.cache_similarities;

            scope.execute(move|| {
                *batch = Some(predict::predict_batch(
                    chunk,
                    train,
                    averages,
                    policy,
                    cache_similarities,
                    token,
                ));
            });
        }
    });

    pool.shutdown();

    batches.into_iter()
        .map(|batch| batch.unwrap_or(Err(Error::Cancelled)))
        .collect()
}

/// Batches are kept in order. A failing batch cancels all others, so we report the first failure
/// that is not a cancellation, if there is one.
fn first_failure_or_all(batches: Vec<Result<BatchOutcome>>) -> Result<Vec<BatchOutcome>> {

    let mut outcomes = Vec::with_capacity(batches.len());
    let mut cancelled = false;

    for batch in batches {
        match batch {
            Ok(outcome) => outcomes.push(outcome),
            Err(Error::Cancelled) => cancelled = true,
            Err(error) => return Err(error),
        }
    }

    if cancelled {
        Err(Error::Cancelled)
    } else {
        Ok(outcomes)
    }
}


#[cfg(test)]
mod tests {

    use std::time::Duration;

    use crate::cancel::CancellationToken;
    use crate::error::Error;
    use crate::index::RatingIndex;
    use crate::predict::UnknownUserPolicy;
    use crate::types::RatingEvent;
    use crate::{evaluate, EvaluationConfig};

    fn index_of(events: &[(i64, i64, f64)]) -> RatingIndex {
        events.iter()
            .map(|&(item, user, rating)| RatingEvent::new(item, user, rating))
            .collect()
    }

    fn training_data() -> RatingIndex {
        let mut events = Vec::new();
        for user in 0..40_i64 {
            for item in 0..25_i64 {
                if (user * 7 + item * 3) % 4 != 0 {
                    let rating = ((user * item + user) % 5 + 1) as f64;
                    events.push((item, user, rating));
                }
            }
        }
        index_of(&events)
    }

    fn test_data() -> RatingIndex {
        let mut events = Vec::new();
        for user in 0..40_i64 {
            for item in 0..30_i64 {
                if (user * 7 + item * 3) % 4 == 0 {
                    events.push((item, user, ((user + item) % 5 + 1) as f64));
                }
            }
        }
        index_of(&events)
    }

    #[test]
    fn end_to_end_example() {
        let train = index_of(&[(1, 10, 4.0), (2, 10, 2.0), (1, 20, 5.0), (2, 20, 1.0)]);
        let test = index_of(&[(1, 10, 4.0)]);

        let evaluation = evaluate(&train, &test, &EvaluationConfig::default(),
            &CancellationToken::new()).unwrap();

        assert_eq!(evaluation.predictions.len(), 1);
        assert!((evaluation.predictions[0].predicted - 4.5).abs() < 0.000_001);
        assert!((evaluation.metrics.rmse - 0.5).abs() < 0.000_001);
        assert!((evaluation.metrics.mae - 0.5).abs() < 0.000_001);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let train = training_data();
        let test = test_data();

        let sequential = evaluate(&train, &test, &EvaluationConfig::default(),
            &CancellationToken::new()).unwrap();

        let config = EvaluationConfig {
            num_workers: 4,
            cache_similarities: true,
            ..Default::default()
        };

        let parallel = evaluate(&train, &test, &config, &CancellationToken::new()).unwrap();

        assert_eq!(sequential.predictions.len(), test.num_ratings());
        assert_eq!(sequential.predictions, parallel.predictions);
        assert!((sequential.metrics.rmse - parallel.metrics.rmse).abs() < 0.000_001);
        assert!((sequential.metrics.mae - parallel.metrics.mae).abs() < 0.000_001);
        assert!(sequential.metrics.rmse >= sequential.metrics.mae);
    }

    #[test]
    fn predictions_follow_test_order() {
        let train = training_data();
        let test = test_data();

        let config = EvaluationConfig { num_workers: 3, ..Default::default() };
        let evaluation = evaluate(&train, &test, &config, &CancellationToken::new()).unwrap();

        let expected: Vec<(i64, i64, f64)> = test.events()
            .map(|event| (event.item, event.user, event.rating))
            .collect();
        let actual: Vec<(i64, i64, f64)> = evaluation.predictions.iter()
            .map(|prediction| (prediction.item, prediction.user, prediction.actual))
            .collect();

        assert_eq!(actual, expected);
    }

    #[test]
    fn unknown_user_aborts_by_default() {
        let train = training_data();
        let test = index_of(&[(1, 1, 3.0), (2, 2, 4.0), (1, 999, 2.0), (3, 3, 5.0)]);

        for &num_workers in &[1, 2] {
            let config = EvaluationConfig { num_workers, ..Default::default() };
            let result = evaluate(&train, &test, &config, &CancellationToken::new());

            assert!(matches!(result, Err(Error::UnknownUser { user: 999, item: 1 })));
        }
    }

    #[test]
    fn unknown_user_skipped_on_request() {
        let train = training_data();
        let test = index_of(&[(1, 1, 3.0), (2, 2, 4.0), (1, 999, 2.0), (3, 3, 5.0)]);

        let config = EvaluationConfig {
            num_workers: 2,
            unknown_users: UnknownUserPolicy::Skip,
            ..Default::default()
        };

        let evaluation = evaluate(&train, &test, &config, &CancellationToken::new()).unwrap();

        assert_eq!(evaluation.predictions.len(), 3);
        assert_eq!(evaluation.skipped, vec![RatingEvent::new(1, 999, 2.0)]);
        assert_eq!(evaluation.metrics.num_predictions, 3);
    }

    #[test]
    fn nothing_to_evaluate() {
        let train = training_data();
        let test = index_of(&[(1, 999, 2.0)]);

        let config = EvaluationConfig {
            unknown_users: UnknownUserPolicy::Skip,
            ..Default::default()
        };

        let result = evaluate(&train, &test, &config, &CancellationToken::new());

        assert!(matches!(result, Err(Error::EmptyEvaluation)));
    }

    #[test]
    fn expired_time_limit() {
        let train = training_data();
        let test = test_data();

        let token = CancellationToken::with_time_limit(Duration::from_secs(0));

        for &num_workers in &[1, 4] {
            let config = EvaluationConfig { num_workers, ..Default::default() };
            let result = evaluate(&train, &test, &config, &token);

            assert!(matches!(result, Err(Error::Cancelled)));
        }
    }
}
