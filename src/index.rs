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

use std::iter::FromIterator;
use std::slice::Iter;

use fnv::FnvHashMap;

use crate::types::{ItemId, Rating, RatingEvent, UserId};

/// The ratings of a single user (keyed by item) or of a single item (keyed by user). Entries are
/// sorted by key, which gives us binary search lookups and a deterministic merge of two profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct RatingProfile {
    entries: Vec<(i64, Rating)>,
}

impl RatingProfile {

    fn from_map(ratings: FnvHashMap<i64, Rating>) -> Self {
        let mut entries: Vec<(i64, Rating)> = ratings.into_iter().collect();
        entries.sort_unstable_by_key(|&(key, _)| key);
        RatingProfile { entries }
    }

    pub fn get(&self, key: i64) -> Option<Rating> {
        self.entries
            .binary_search_by_key(&key, |&(k, _)| k)
            .ok()
            .map(|position| self.entries[position].1)
    }

    pub fn contains(&self, key: i64) -> bool {
        self.get(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys<'a>(&'a self) -> impl Iterator<Item=i64> + 'a {
        self.entries.iter().map(|&(key, _)| key)
    }

    pub fn ratings<'a>(&'a self) -> impl Iterator<Item=Rating> + 'a {
        self.entries.iter().map(|&(_, rating)| rating)
    }

    pub fn iter(&self) -> Iter<(i64, Rating)> {
        self.entries.iter()
    }

    /// Pairs of ratings for all keys present in both profiles, in ascending key order.
    pub fn co_rated<'a>(&'a self, other: &'a RatingProfile) -> CoRated<'a> {
        CoRated { left: &self.entries, right: &other.entries }
    }
}

/// Merge join over two sorted profiles.
pub struct CoRated<'a> {
    left: &'a [(i64, Rating)],
    right: &'a [(i64, Rating)],
}

impl<'a> Iterator for CoRated<'a> {
    type Item = (Rating, Rating);

    fn next(&mut self) -> Option<Self::Item> {
        while let (Some(&(key_left, rating_left)), Some(&(key_right, rating_right))) =
            (self.left.first(), self.right.first()) {

            if key_left < key_right {
                self.left = &self.left[1..];
            } else if key_right < key_left {
                self.right = &self.right[1..];
            } else {
                self.left = &self.left[1..];
                self.right = &self.right[1..];
                return Some((rating_left, rating_right));
            }
        }
        None
    }
}

/// Read-only by-user and by-item views of a set of ratings. Both views are filled from the same
/// inserts, so one is always the transpose of the other.
#[derive(Debug, Clone)]
pub struct RatingIndex {
    by_user: FnvHashMap<UserId, RatingProfile>,
    by_item: FnvHashMap<ItemId, RatingProfile>,
    events: Vec<(ItemId, UserId)>,
    num_ratings: usize,
}

impl RatingIndex {

    pub fn user_profile(&self, user: UserId) -> Option<&RatingProfile> {
        self.by_user.get(&user)
    }

    pub fn item_profile(&self, item: ItemId) -> Option<&RatingProfile> {
        self.by_item.get(&item)
    }

    pub fn rating(&self, user: UserId, item: ItemId) -> Option<Rating> {
        self.by_user.get(&user).and_then(|profile| profile.get(item))
    }

    pub fn users<'a>(&'a self) -> impl Iterator<Item=(UserId, &'a RatingProfile)> + 'a {
        self.by_user.iter().map(|(user, profile)| (*user, profile))
    }

    pub fn items<'a>(&'a self) -> impl Iterator<Item=(ItemId, &'a RatingProfile)> + 'a {
        self.by_item.iter().map(|(item, profile)| (*item, profile))
    }

    pub fn num_users(&self) -> usize {
        self.by_user.len()
    }

    pub fn num_items(&self) -> usize {
        self.by_item.len()
    }

    /// Number of distinct (user, item) pairs.
    pub fn num_ratings(&self) -> usize {
        self.num_ratings
    }

    /// Distinct (item, user) pairs in the order in which they first occurred in the input,
    /// together with the rating retained for them.
    pub fn events<'a>(&'a self) -> impl Iterator<Item=RatingEvent> + 'a {
        self.events.iter().filter_map(move |&(item, user)| {
            self.rating(user, item).map(|rating| RatingEvent::new(item, user, rating))
        })
    }
}

/// Builds a RatingIndex, a later rating for the same (user, item) pair replaces the earlier one.
#[derive(Default)]
pub struct IndexBuilder {
    by_user: FnvHashMap<UserId, FnvHashMap<ItemId, Rating>>,
    by_item: FnvHashMap<ItemId, FnvHashMap<UserId, Rating>>,
    events: Vec<(ItemId, UserId)>,
}

impl IndexBuilder {

    pub fn new() -> Self {
        Default::default()
    }

    pub fn insert(&mut self, event: RatingEvent) {
        let previous = self.by_user
            .entry(event.user)
            .or_insert_with(|| FnvHashMap::with_capacity_and_hasher(10, Default::default()))
            .insert(event.item, event.rating);

        self.by_item
            .entry(event.item)
            .or_insert_with(|| FnvHashMap::with_capacity_and_hasher(10, Default::default()))
            .insert(event.user, event.rating);

        if previous.is_none() {
            self.events.push((event.item, event.user));
        }
    }

    pub fn build(self) -> RatingIndex {
        let num_ratings = self.events.len();

        let by_user = self.by_user.into_iter()
            .map(|(user, ratings)| (user, RatingProfile::from_map(ratings)))
            .collect();

        let by_item = self.by_item.into_iter()
            .map(|(item, ratings)| (item, RatingProfile::from_map(ratings)))
            .collect();

        RatingIndex { by_user, by_item, events: self.events, num_ratings }
    }
}

impl FromIterator<RatingEvent> for RatingIndex {

    fn from_iter<I: IntoIterator<Item=RatingEvent>>(events: I) -> Self {
        let mut builder = IndexBuilder::new();
        for event in events {
            builder.insert(event);
        }
        builder.build()
    }
}
