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

pub type ItemId = i64;
pub type UserId = i64;
pub type Rating = f64;

/// A single observed rating, in the column order of the input files.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingEvent {
    pub item: ItemId,
    pub user: UserId,
    pub rating: Rating,
}

impl RatingEvent {
    pub fn new(item: ItemId, user: UserId, rating: Rating) -> Self {
        RatingEvent { item, user, rating }
    }
}

/// One line of the predictions output. Field order is the column order of the written file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub item: ItemId,
    pub user: UserId,
    pub actual: Rating,
    pub predicted: Rating,
}

impl Prediction {
    pub fn error(&self) -> f64 {
        self.actual - self.predicted
    }
}
