use fnv::FnvHashMap;

use crate::index::RatingIndex;
use crate::types::{Rating, UserId};

/// Mean rating per user of a training index, there is exactly one entry per user in the index.
pub struct AverageRatings {
    averages: FnvHashMap<UserId, Rating>,
}

impl AverageRatings {

    pub fn get(&self, user: UserId) -> Option<Rating> {
        self.averages.get(&user).cloned()
    }

    pub fn num_users(&self) -> usize {
        self.averages.len()
    }
}

impl<'a> From<&'a RatingIndex> for AverageRatings {

    fn from(index: &'a RatingIndex) -> Self {

        let mut averages: FnvHashMap<UserId, Rating> =
            FnvHashMap::with_capacity_and_hasher(index.num_users(), Default::default());

        for (user, profile) in index.users() {
            let sum: Rating = profile.ratings().sum();
            // Profiles in an index are never empty
            averages.insert(user, sum / profile.len() as Rating);
        }

        AverageRatings { averages }
    }
}
