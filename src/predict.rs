use tracing::{debug, warn};

use crate::cancel::CancellationToken;
use crate::error::{Error, Result};
use crate::evaluation::ErrorAccumulator;
use crate::index::RatingIndex;
use crate::similarity::{self, SimilarityCache};
use crate::stats::AverageRatings;
use crate::types::{ItemId, Prediction, Rating, RatingEvent, UserId};

/// What to do with a test event whose user never occurs in the training data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownUserPolicy {
    /// Fail the whole run.
    Abort,
    /// Leave the event out of the predictions and metrics, and report it.
    Skip,
}

impl Default for UnknownUserPolicy {
    fn default() -> Self {
        UnknownUserPolicy::Abort
    }
}

/// Predicts the rating of `user` for `item` from all training users who rated `item`, weighted by
/// their similarity to `user`. Falls back to the user's mean rating if no neighbor carries weight.
///
/// The neighborhood includes `user` itself if it rated `item` in the training data.
pub fn predict(
    user: UserId,
    item: ItemId,
    train: &RatingIndex,
    averages: &AverageRatings,
    mut cache: Option<&mut SimilarityCache>,
) -> Result<Rating> {

    let (user_average, user_profile) = match (averages.get(user), train.user_profile(user)) {
        (Some(user_average), Some(user_profile)) => (user_average, user_profile),
        _ => return Err(Error::UnknownUser { user, item }),
    };

    let neighbors = match train.item_profile(item) {
        Some(neighbors) => neighbors,
        None => return Ok(user_average),
    };

    let mut sum_of_weights = 0.0;
    let mut weighted_deviations = 0.0;

    for &(neighbor, neighbor_rating) in neighbors.iter() {

        let (neighbor_average, neighbor_profile) =
            match (averages.get(neighbor), train.user_profile(neighbor)) {
                (Some(neighbor_average), Some(neighbor_profile)) =>
                    (neighbor_average, neighbor_profile),
                _ => continue,
            };

        let compute = || {
            similarity::similarity(user_profile, neighbor_profile, user_average, neighbor_average)
        };

        let weight = match cache.as_mut() {
            Some(cache) => cache.get_or_compute(user, neighbor, compute),
            None => compute(),
        };

        sum_of_weights += weight.abs();
        weighted_deviations += weight * (neighbor_rating - neighbor_average);
    }

    if sum_of_weights != 0.0 {
        Ok(user_average + weighted_deviations / sum_of_weights)
    } else {
        Ok(user_average)
    }
}

/// Predictions for a consecutive run of test events.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub predictions: Vec<Prediction>,
    pub errors: ErrorAccumulator,
    pub skipped: Vec<RatingEvent>,
}

/// Predicts all given test events in order. The token is checked before every event; under
/// `UnknownUserPolicy::Abort` an unknown user cancels it, so that concurrent batches stop too.
pub fn predict_batch(
    test_events: &[RatingEvent],
    train: &RatingIndex,
    averages: &AverageRatings,
    policy: UnknownUserPolicy,
    cache_similarities: bool,
    token: &CancellationToken,
) -> Result<BatchOutcome> {

    let mut outcome = BatchOutcome {
        predictions: Vec::with_capacity(test_events.len()),
        ..Default::default()
    };

    let mut cache = if cache_similarities { Some(SimilarityCache::new()) } else { None };

    for event in test_events {

        if token.is_cancelled() {
            return Err(Error::Cancelled)
        }

        match predict(event.user, event.item, train, averages, cache.as_mut()) {
            Ok(predicted) => {
                let prediction = Prediction {
                    item: event.item,
                    user: event.user,
                    actual: event.rating,
                    predicted,
                };
                outcome.errors.add(&prediction);
                outcome.predictions.push(prediction);
            },
            Err(Error::UnknownUser { user, item }) if policy == UnknownUserPolicy::Skip => {
                warn!("Skipping item {} for user {}, user has no training ratings", item, user);
                outcome.skipped.push(*event);
            },
            Err(error) => {
                token.cancel();
                return Err(error)
            },
        }
    }

    if let Some(cache) = cache {
        debug!("Similarity cache: {} pairs, {} hits, {} misses",
            cache.len(), cache.hits(), cache.misses());
    }

    Ok(outcome)
}
