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

extern crate cofilter;
extern crate getopts;
extern crate num_cpus;

use std::env;
use std::fs::File;
use std::io::BufWriter;
use std::process;
use std::time::{Duration, Instant};

use getopts::Options;
use tracing::{error, info, Level};

use cofilter::cancel::CancellationToken;
use cofilter::error::Result;
use cofilter::io;
use cofilter::predict::UnknownUserPolicy;
use cofilter::utils;
use cofilter::EvaluationConfig;

struct Arguments {
    train_path: String,
    test_path: String,
    predictions_path: String,
    report_path: Option<String>,
    config: EvaluationConfig,
    time_limit: Option<Duration>,
}

fn main() {

    let args: Vec<String> = env::args().collect();
    let program = args[0].clone();

    let mut opts = Options::new();
    opts.optopt("", "train", "Training data (required). The file must contain an item id, a user \
        id and a rating per line, separated by commas.", "PATH");
    opts.optopt("", "test", "Test data (required), in the same format as the training data.",
        "PATH");
    opts.optopt("o", "output", "Output file for the predictions (optional, defaults to \
        predictions.txt).", "PATH");
    opts.optopt("", "report", "Additionally write the error metrics as JSON to this file \
        (optional).", "PATH");
    opts.optopt("w", "workers", "Number of threads to use for the predictions (optional, \
        defaults to the number of CPUs).", "NUMBER");
    opts.optopt("", "time-limit", "Cancel the predictions after this many seconds (optional).",
        "SECONDS");
    opts.optflag("", "skip-unknown-users", "Skip test ratings of users without training ratings \
        instead of failing.");
    opts.optflag("", "cache-similarities", "Remember user similarities across test ratings.");
    opts.optflag("v", "verbose", "Print debug output");
    opts.optflag("h", "help", "Print this help menu");

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(failure) => {
            let hint = failure.to_string();
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    if matches.opt_present("h") {
        return print_usage_and_exit(&program, opts, None);
    }

    let (train_path, test_path) = match (matches.opt_str("train"), matches.opt_str("test")) {
        (Some(train_path), Some(test_path)) => (train_path, test_path),
        _ => {
            return print_usage_and_exit(
                &program,
                opts,
                Some("Please specify the training and test data via --train and --test."),
            );
        },
    };

    let num_workers: usize = match matches.opt_get_default("workers", num_cpus::get()) {
        Ok(num_workers) if num_workers > 0 => num_workers,
        Ok(_) => return print_usage_and_exit(&program, opts, Some("Need at least one worker.")),
        Err(failure) => {
            let hint = format!("Problem with option 'workers': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let time_limit: Option<Duration> = match matches.opt_get::<u64>("time-limit") {
        Ok(seconds) => seconds.map(Duration::from_secs),
        Err(failure) => {
            let hint = format!("Problem with option 'time-limit': {}", failure.to_string());
            return print_usage_and_exit(&program, opts, Some(&hint))
        },
    };

    let unknown_users = if matches.opt_present("skip-unknown-users") {
        UnknownUserPolicy::Skip
    } else {
        UnknownUserPolicy::Abort
    };

    let log_level = if matches.opt_present("v") { Level::DEBUG } else { Level::INFO };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .init();

    let arguments = Arguments {
        train_path,
        test_path,
        predictions_path: matches.opt_str("o").unwrap_or_else(|| io::PREDICTIONS_FILE.to_owned()),
        report_path: matches.opt_str("report"),
        config: EvaluationConfig {
            num_workers,
            unknown_users,
            cache_similarities: matches.opt_present("cache-similarities"),
        },
        time_limit,
    };

    if let Err(failure) = evaluate_predictions(&arguments) {
        error!("{}", failure);
        process::exit(1);
    }
}

fn print_usage_and_exit(
    program: &str,
    opts: Options,
    hint: Option<&str>
) {

    let brief = format!("Usage: {} --train PATH --test PATH [options]", program);

    match hint {
        Some(hint) => {
            eprintln!("\n{}\n", hint);
            eprint!("{}", opts.usage(&brief));
            process::exit(1);
        },
        None => print!("{}", opts.usage(&brief)),
    }
}

fn evaluate_predictions(arguments: &Arguments) -> Result<()> {

    println!("{} {}", arguments.train_path, arguments.test_path);

    let start = Instant::now();

    info!("Reading training data from {}", arguments.train_path);
    let train = io::read_rating_index(&arguments.train_path)?;

    info!(
        "Found {} training ratings between {} users and {} items.",
        train.num_ratings(),
        train.num_users(),
        train.num_items(),
    );

    info!("Reading test data from {}", arguments.test_path);
    let test = io::read_rating_index(&arguments.test_path)?;

    info!("Found {} test ratings.", test.num_ratings());

    let token = match arguments.time_limit {
        Some(time_limit) => CancellationToken::with_time_limit(time_limit),
        None => CancellationToken::new(),
    };

    let evaluation = cofilter::evaluate(&train, &test, &arguments.config, &token)?;

    info!("Writing predictions to {}", arguments.predictions_path);
    io::write_predictions_to_file(&evaluation.predictions, &arguments.predictions_path)?;

    if let Some(report_path) = &arguments.report_path {
        info!("Writing report to {}", report_path);
        let out = BufWriter::new(File::create(report_path)?);
        io::write_report(&arguments.train_path, &arguments.test_path, &evaluation.metrics,
            evaluation.skipped.len(), out)?;
    }

    println!("RMSE {}", evaluation.metrics.rmse);
    println!("MAE {}", evaluation.metrics.mae);

    if arguments.config.unknown_users == UnknownUserPolicy::Skip {
        println!("Skipped {}", evaluation.skipped.len());
    }

    info!("Done after {}ms", utils::to_millis(start.elapsed()));

    Ok(())
}
