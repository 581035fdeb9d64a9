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

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use crate::error::{Error, Result};
use crate::evaluation::Metrics;
use crate::index::RatingIndex;
use crate::types::{Prediction, RatingEvent};

/// Name of the predictions file the command line tool writes by default.
pub const PREDICTIONS_FILE: &str = "predictions.txt";

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(b',')
        .trim(csv::Trim::All)
        // We check the number of fields per record ourselves to report malformed records
        .flexible(true);
    builder
}

/// Reads a CSV input file. We expect NO headers, and an item, user, rating triple per line
/// with comma separation.
pub fn csv_reader<P: AsRef<Path>>(path: P) -> Result<csv::Reader<File>> {
    Ok(reader_builder().from_path(path)?)
}

pub fn csv_reader_from<R: Read>(input: R) -> csv::Reader<R> {
    reader_builder().from_reader(input)
}

/// Parses all records of the reader. A single malformed record fails the whole read.
pub fn rating_events_from_csv<R: Read>(reader: &mut csv::Reader<R>) -> Result<Vec<RatingEvent>> {

    let mut events = Vec::new();

    for (position, result) in reader.records().enumerate() {
        let record = result?;
        let record_number = position as u64 + 1;

        if record.len() != 3 {
            return Err(Error::format(
                record_number,
                format!("expected 3 fields (item, user, rating), found {}", record.len())))
        }

        let item = record[0].parse::<i64>()
            .map_err(|_| Error::format(record_number, format!("invalid item id '{}'", &record[0])))?;

        let user = record[1].parse::<i64>()
            .map_err(|_| Error::format(record_number, format!("invalid user id '{}'", &record[1])))?;

        let rating = record[2].parse::<f64>()
            .map_err(|_| Error::format(record_number, format!("invalid rating '{}'", &record[2])))?;

        if !rating.is_finite() {
            return Err(Error::format(record_number, format!("rating '{}' is not finite", rating)))
        }

        events.push(RatingEvent::new(item, user, rating));
    }

    Ok(events)
}

/// Reads a rating file and indexes it.
pub fn read_rating_index<P: AsRef<Path>>(path: P) -> Result<RatingIndex> {
    let mut reader = csv_reader(path)?;
    let events = rating_events_from_csv(&mut reader)?;
    Ok(events.into_iter().collect())
}

/// Writes one comma separated line per prediction: item, user, actual rating, predicted rating.
pub fn write_predictions<W: Write>(predictions: &[Prediction], out: W) -> Result<()> {

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(out);

    for prediction in predictions {
        writer.serialize(prediction)?;
    }

    writer.flush()?;

    Ok(())
}

pub fn write_predictions_to_file<P: AsRef<Path>>(predictions: &[Prediction], path: P) -> Result<()> {
    let file = File::create(path)?;
    write_predictions(predictions, BufWriter::new(file))
}

/// Struct used for the JSON summary of an evaluation run. Field names will be used in JSON.
#[derive(Serialize)]
struct Report<'a> {
    train: &'a str,
    test: &'a str,
    rmse: f64,
    mae: f64,
    num_predictions: u64,
    num_skipped: usize,
}

pub fn write_report<W: Write>(
    train_path: &str,
    test_path: &str,
    metrics: &Metrics,
    num_skipped: usize,
    mut out: W,
) -> Result<()> {

    let report = Report {
        train: train_path,
        test: test_path,
        rmse: metrics.rmse,
        mae: metrics.mae,
        num_predictions: metrics.num_predictions,
        num_skipped,
    };

    serde_json::to_writer_pretty(&mut out, &report)?;
    writeln!(out)?;

    Ok(())
}


#[cfg(test)]
mod tests {

    use crate::error::Error;
    use crate::evaluation::Metrics;
    use crate::io::{csv_reader_from, rating_events_from_csv, write_predictions, write_report};
    use crate::types::{Prediction, RatingEvent};

    fn parse(input: &str) -> Result<Vec<RatingEvent>, Error> {
        let mut reader = csv_reader_from(input.as_bytes());
        rating_events_from_csv(&mut reader)
    }

    fn assert_format_error(input: &str, expected_record: u64) {
        match parse(input) {
            Err(Error::Format { record, .. }) => assert_eq!(record, expected_record),
            other => panic!("Expected a format error, got {:?}", other),
        }
    }

    #[test]
    fn reads_triples() {
        let events = parse("1,10,4.0\n2, 10, 2\n-3,20,4.5\n").unwrap();

        assert_eq!(events, vec![
            RatingEvent::new(1, 10, 4.0),
            RatingEvent::new(2, 10, 2.0),
            RatingEvent::new(-3, 20, 4.5),
        ]);
    }

    #[test]
    fn keeps_duplicates_in_order() {
        let events = parse("1,10,4.0\n1,10,2.0\n").unwrap();

        assert_eq!(events, vec![RatingEvent::new(1, 10, 4.0), RatingEvent::new(1, 10, 2.0)]);
    }

    #[test]
    fn rejects_wrong_field_counts() {
        assert_format_error("1,10,4.0\n1,10\n", 2);
        assert_format_error("1,10,4.0,7\n", 1);
    }

    #[test]
    fn rejects_unparseable_fields() {
        assert_format_error("a,10,4.0\n", 1);
        assert_format_error("1,10,4.0\n1,2.5,4.0\n", 2);
        assert_format_error("1,10,4.0\n2,10,4.0\n3,10,good\n", 3);
        assert_format_error("1,10,NaN\n", 1);
        assert_format_error("1,10,inf\n", 1);
    }

    #[test]
    fn writes_predictions() {
        let predictions = [
            Prediction { item: 1, user: 10, actual: 4.0, predicted: 4.5 },
            Prediction { item: 7, user: 3, actual: 2.5, predicted: 3.0 },
        ];

        let mut out: Vec<u8> = Vec::new();
        write_predictions(&predictions, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "1,10,4.0,4.5\n7,3,2.5,3.0\n");
    }

    #[test]
    fn writes_report() {
        let metrics = Metrics { rmse: 0.5, mae: 0.25, num_predictions: 4 };

        let mut out: Vec<u8> = Vec::new();
        write_report("train.csv", "test.csv", &metrics, 1, &mut out).unwrap();

        let report: serde_json::Value = serde_json::from_slice(&out).unwrap();

        assert_eq!(report["train"], "train.csv");
        assert_eq!(report["test"], "test.csv");
        assert_eq!(report["rmse"], 0.5);
        assert_eq!(report["mae"], 0.25);
        assert_eq!(report["num_predictions"], 4);
        assert_eq!(report["num_skipped"], 1);
    }
}
