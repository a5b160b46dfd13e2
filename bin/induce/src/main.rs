use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use fsa_induction::prelude::*;

use thiserror::Error;
use tracing::{debug, info, trace};
use tracing_subscriber::{filter, prelude::*};

use clap::{Arg, ArgAction, ArgMatches, Command};

/// Sentences used when neither sentences nor a file are given.
const SAMPLE: [&str; 3] = ["Mary eats pies", "John bakes cakes", "Mary bakes cakes"];

#[derive(Debug, Error)]
enum InduceError {
    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),
    #[error("merging failed: {0}")]
    Invariant(#[from] InvariantViolation),
}

fn cli() -> clap::Command {
    Command::new("induce")
        .about("Builds a prefix automaton from example sentences and generalizes it by merging states")
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .num_args(0..=1)
                .require_equals(true)
                .value_parser(["info", "debug", "trace"])
                .default_missing_value("info"),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_parser(clap::value_parser!(PathBuf))
                .help("read sentences from a file, one per line"),
        )
        .arg(
            Arg::new("keep-empty")
                .long("keep-empty")
                .action(ArgAction::SetTrue)
                .help("treat blank lines of the input file as the empty sentence"),
        )
        .arg(
            Arg::new("steps")
                .short('n')
                .long("steps")
                .value_parser(clap::value_parser!(usize))
                .conflicts_with("fixpoint")
                .help("perform this many merge steps and exit"),
        )
        .arg(
            Arg::new("fixpoint")
                .long("fixpoint")
                .action(ArgAction::SetTrue)
                .help("merge until nothing changes anymore"),
        )
        .arg(
            Arg::new("max-steps")
                .long("max-steps")
                .value_parser(clap::value_parser!(usize))
                .default_value("10000")
                .help("upper bound on the number of steps taken by --fixpoint"),
        )
        .arg(
            Arg::new("sentences")
                .num_args(0..)
                .action(ArgAction::Append)
                .help("sentences to ingest, tokens are separated by whitespace"),
        )
}

fn setup_logging(matches: &ArgMatches) {
    let level = match matches
        .try_get_one::<String>("verbosity")
        .ok()
        .flatten()
        .map(|m| m.as_str())
    {
        Some("trace") => filter::LevelFilter::TRACE,
        Some("debug") => filter::LevelFilter::DEBUG,
        Some("info") => filter::LevelFilter::INFO,
        _ => filter::LevelFilter::WARN,
    };

    let stderr_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(stderr_log.with_filter(level))
        .init();

    trace!("setup {level} logging");
}

fn read_sentences(matches: &ArgMatches) -> Result<Vec<String>, InduceError> {
    let mut sentences: Vec<String> = matches
        .get_many::<String>("sentences")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    if let Some(path) = matches.get_one::<PathBuf>("file") {
        debug!("reading sentences from {}", path.display());
        let keep_empty = matches.get_flag("keep-empty");
        let file = std::io::BufReader::new(std::fs::File::open(path)?);
        for line in file.lines() {
            let line = line?;
            if keep_empty || !line.trim().is_empty() {
                sentences.push(line);
            }
        }
    } else if sentences.is_empty() {
        debug!("no sentences given, using the built-in sample");
        sentences.extend(SAMPLE.iter().map(|s| s.to_string()));
    }
    Ok(sentences)
}

fn print_step(fsa: &Automaton, report: &StepReport) {
    println!("{}", report.show());
    println!("{}", fsa.export_snapshot().show());
}

fn interactive(fsa: &mut Automaton) -> Result<(), InduceError> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("[enter] merge step, [q] quit > ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        if line?.trim() == "q" {
            return Ok(());
        }
        let report = fsa.step_merge()?;
        print_step(fsa, &report);
    }
}

fn run(matches: &ArgMatches) -> Result<(), InduceError> {
    let sentences = read_sentences(matches)?;
    let mut fsa = Automaton::new();
    for sentence in &sentences {
        fsa.ingest(sentence);
    }
    info!(
        "ingested {} sentences into {} nodes and {} edges",
        sentences.len(),
        fsa.size(),
        fsa.edge_count()
    );
    println!("{}", fsa.export_snapshot().show());

    if matches.get_flag("fixpoint") {
        let max_steps = matches
            .get_one::<usize>("max-steps")
            .copied()
            .unwrap_or(10_000);
        let start = std::time::Instant::now();
        let steps = fsa.merge_to_fixpoint(max_steps)?;
        info!(
            "generalization took {steps} steps and {}µs",
            start.elapsed().as_micros()
        );
        println!("{}", fsa.export_snapshot().show());
    } else if let Some(&steps) = matches.get_one::<usize>("steps") {
        for _ in 0..steps {
            let report = fsa.step_merge()?;
            print_step(&fsa, &report);
        }
    } else {
        interactive(&mut fsa)?;
    }
    Ok(())
}

pub fn main() {
    let matches = cli().get_matches();

    setup_logging(&matches);

    if let Err(e) = run(&matches) {
        eprintln!("{e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::cli;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn steps_and_fixpoint_conflict() {
        assert!(cli()
            .try_get_matches_from(["induce", "--steps", "2", "--fixpoint"])
            .is_err());
        let matches = cli()
            .try_get_matches_from(["induce", "-n", "3", "a b", "c"])
            .unwrap();
        assert_eq!(matches.get_one::<usize>("steps"), Some(&3));
        assert_eq!(
            matches
                .get_many::<String>("sentences")
                .unwrap()
                .collect::<Vec<_>>(),
            vec!["a b", "c"]
        );
    }
}
