/**
 * CoFilter
 * Copyright (C) 2018 Sebastian Schelter
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with this program. If not, see <http://www.gnu.org/licenses/>.
 */

use fnv::FnvHashMap;

use crate::index::RatingProfile;
use crate::types::{Rating, UserId};

/// Correlation of two users over their co-rated items. Deviations are taken from each user's
/// overall mean rating (not from the mean over the co-rated items only), therefore the result is
/// not guaranteed to lie in [-1, 1].
///
/// Returns 0.0 if the users have no items in common, or if the deviations of either user vanish
/// on all co-rated items.
#[inline(always)]
pub fn similarity(
    profile_a: &RatingProfile,
    profile_b: &RatingProfile,
    mean_a: Rating,
    mean_b: Rating,
) -> f64 {

    let mut num_co_rated: usize = 0;
    let mut numerator = 0.0;
    let mut sum_of_squares_a = 0.0;
    let mut sum_of_squares_b = 0.0;

    for (rating_a, rating_b) in profile_a.co_rated(profile_b) {
        let deviation_a = rating_a - mean_a;
        let deviation_b = rating_b - mean_b;

        numerator += deviation_a * deviation_b;
        sum_of_squares_a += deviation_a * deviation_a;
        sum_of_squares_b += deviation_b * deviation_b;
        num_co_rated += 1;
    }

    if num_co_rated == 0 {
        return 0.0
    }

    let denominator = (sum_of_squares_a * sum_of_squares_b).sqrt();

    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Memo table for similarities, keyed by the unordered pair of users. Only valid for a fixed
/// training index and average table, as the key does not capture the profiles or means.
#[derive(Default)]
pub struct SimilarityCache {
    similarities: FnvHashMap<(UserId, UserId), f64>,
    hits: u64,
    misses: u64,
}

impl SimilarityCache {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn get_or_compute<F>(&mut self, user_a: UserId, user_b: UserId, compute: F) -> f64
        where F: FnOnce() -> f64 {

        let key = if user_a <= user_b { (user_a, user_b) } else { (user_b, user_a) };

        if let Some(similarity) = self.similarities.get(&key) {
            self.hits += 1;
            return *similarity
        }

        self.misses += 1;
        let similarity = compute();
        self.similarities.insert(key, similarity);
        similarity
    }

    pub fn len(&self) -> usize {
        self.similarities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.similarities.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
