use stretcher_core::config::StretcherConfig;
use stretcher_core::listgen::ListGen;
use stretcher_core::mutator::Mutator;
use stretcher_core::rulegen::{RuleGen, RuleGenError};
use stretcher_core::wordlist::{WordSource, parse_custom_digits};

use anyhow::Context;
use clap::Parser;
use log::{LevelFilter, debug, info};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "stretcher.toml";

#[derive(Parser, Debug)]
#[clap(author, version, about = "FETCH THE PASSWORD STRETCHER", long_about = None)]
struct Cli {
    /// Wordlist to mangle (default: STDIN)
    #[clap(short, long, value_parser)]
    wordlist: Option<PathBuf>,
    /// Create rules using these digits (file, or comma-separated list)
    #[clap(short, long)]
    digits: Option<String>,
    /// Save individual strings/digits to <SAVE>_words and <SAVE>_digits
    #[clap(short, long, value_parser)]
    save: Option<PathBuf>,
    /// Print string and rule reports
    #[clap(short, long)]
    report: bool,
    /// Maximum lines for each individual report
    #[clap(short, long)]
    limit: Option<usize>,
    /// Emit reports as JSON
    #[clap(long)]
    json: bool,
    /// "Leetspeak" mutations
    #[clap(short = 'L', long)]
    leet: bool,
    /// Common upper/lowercase variations
    #[clap(short = 'c', long)]
    capital: bool,
    /// All possible case combinations
    #[clap(short = 'C', long)]
    capswap: bool,
    /// Max times to combine words (careful! exponential)
    #[clap(short = 'P', long, value_name = "INT")]
    permutations: Option<usize>,
    #[clap(long, value_parser)]
    config_file: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_config(cli: &Cli) -> Result<StretcherConfig, anyhow::Error> {
    let mut config = match &cli.config_file {
        Some(config_path) => {
            info!("Loading configuration from specified path: {config_path:?}");
            StretcherConfig::load_from_file(config_path)?
        }
        None => {
            let default_config_path = PathBuf::from(DEFAULT_CONFIG_FILE);
            if default_config_path.exists() {
                info!("No config file specified, loading default: {default_config_path:?}");
                StretcherConfig::load_from_file(&default_config_path)?
            } else {
                debug!("No config file found, using built-in defaults");
                StretcherConfig::default()
            }
        }
    };

    if let Some(limit) = cli.limit {
        config.report.limit = limit;
    }
    config.mutator.leet |= cli.leet;
    config.mutator.cap |= cli.capital;
    config.mutator.capswap |= cli.capswap;
    if let Some(depth) = cli.permutations {
        config.mutator.perm_depth = depth;
    }

    debug!("Effective configuration: {config:#?}");
    Ok(config)
}

/// Treats a closed stdout (e.g. `| head`) as a normal end of output.
fn ignore_broken_pipe(result: io::Result<()>) -> Result<(), anyhow::Error> {
    match result {
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
            debug!("stdout closed early, stopping output");
            Ok(())
        }
        other => Ok(other?),
    }
}

fn print_reports(
    words: &[Vec<u8>],
    config: &StretcherConfig,
    cli: &Cli,
    custom_digits: Vec<Vec<u8>>,
) -> Result<(), anyhow::Error> {
    let grouper = config.grouper.build();
    let limit = config.report.limit;

    let lists = ListGen::from_words(words, &grouper, !custom_digits.is_empty());
    if let Some(base) = &cli.save {
        for path in lists.write_lists(base)? {
            info!("Wrote {path:?}");
        }
    }
    if !cli.report {
        return Ok(());
    }

    let rules = RuleGen::from_words(words, &grouper, custom_digits);
    let mut out = BufWriter::new(io::stdout().lock());
    ignore_broken_pipe(
        write_reports(&mut out, &lists, &rules, limit, cli.json).and_then(|()| out.flush()),
    )
}

fn write_reports<W: Write>(
    out: &mut W,
    lists: &ListGen,
    rules: &RuleGen,
    limit: usize,
    json: bool,
) -> io::Result<()> {
    if json {
        let list_reports: Vec<_> = lists
            .kinds()
            .into_iter()
            .filter_map(|kind| lists.summary(kind, limit))
            .collect();
        let output = serde_json::json!({
            "lists": list_reports,
            "rules": rules.summary(limit).ok(),
        });
        serde_json::to_writer_pretty(&mut *out, &output)?;
        return writeln!(out);
    }

    writeln!(out, "{}", lists.report(limit))?;
    match rules.report(limit) {
        Ok(text) => writeln!(out, "{text}"),
        Err(e @ RuleGenError::NoRules) => writeln!(out, "\n{e}\n"),
    }
}

fn stream_mutations(words: Vec<Vec<u8>>, config: &StretcherConfig) -> Result<(), anyhow::Error> {
    let mut mutator = Mutator::new(config.mutator.to_config());
    let mut out = BufWriter::new(io::stdout().lock());
    let mut emitted: u64 = 0;
    let result = write_mutations(&mut out, mutator.mutations(words), &mut emitted)
        .and_then(|()| out.flush());
    info!("Emitted {emitted} mutations");
    ignore_broken_pipe(result)
}

fn write_mutations<W, I>(out: &mut W, mutations: I, emitted: &mut u64) -> io::Result<()>
where
    W: Write,
    I: Iterator<Item = Vec<u8>>,
{
    for word in mutations {
        out.write_all(&word)?;
        out.write_all(b"\n")?;
        *emitted += 1;
    }
    Ok(())
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = load_config(&cli)?;

    let source = match &cli.wordlist {
        Some(path) => WordSource::File(path.clone()),
        None => WordSource::Stdin,
    };
    let words = source
        .load()
        .with_context(|| format!("Failed to read wordlist from {source:?}"))?;
    info!("Read {} words", words.len());

    let custom_digits = match &cli.digits {
        Some(arg) => parse_custom_digits(arg).context("Failed to read custom digits")?,
        None => Vec::new(),
    };

    if cli.report || cli.save.is_some() {
        print_reports(&words, &config, &cli, custom_digits)?;
    }

    if config.mutator.any_enabled() {
        stream_mutations(words, &config)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A writer whose reader has gone away after `capacity` bytes.
    struct ClosedPipe {
        capacity: usize,
        written: Vec<u8>,
    }

    impl Write for ClosedPipe {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.written.len() + buf.len() > self.capacity {
                return Err(io::Error::from(io::ErrorKind::BrokenPipe));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn closed_pipe(capacity: usize) -> ClosedPipe {
        ClosedPipe {
            capacity,
            written: Vec::new(),
        }
    }

    fn sample_words() -> Vec<Vec<u8>> {
        vec![b"password1".to_vec(), b"admin2".to_vec()]
    }

    #[test]
    fn broken_pipe_ends_output_quietly() {
        let broken = Err(io::Error::from(io::ErrorKind::BrokenPipe));
        assert!(ignore_broken_pipe(broken).is_ok());
        assert!(ignore_broken_pipe(Ok(())).is_ok());
    }

    #[test]
    fn other_write_errors_are_reported() {
        let denied = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(ignore_broken_pipe(denied).is_err());
    }

    #[test]
    fn reports_into_a_closed_pipe_do_not_fail() {
        let grouper = stretcher_core::Grouper::new();
        let words = sample_words();
        let lists = ListGen::from_words(&words, &grouper, false);
        let rules = RuleGen::from_words(&words, &grouper, Vec::new());

        let mut full = Vec::new();
        write_reports(&mut full, &lists, &rules, 50, false).unwrap();
        let text = String::from_utf8(full).unwrap();
        assert!(text.contains("[string]1"));

        for json in [false, true] {
            let mut pipe = closed_pipe(8);
            let result = write_reports(&mut pipe, &lists, &rules, 50, json);
            assert_eq!(
                result.as_ref().map_err(io::Error::kind).err(),
                Some(io::ErrorKind::BrokenPipe)
            );
            assert!(ignore_broken_pipe(result).is_ok());
        }
    }

    #[test]
    fn mutations_stop_at_a_closed_pipe() {
        let mut mutator = Mutator::new(stretcher_core::MutatorConfig {
            cap: true,
            ..Default::default()
        });
        let mut pipe = closed_pipe(20);
        let mut emitted = 0;
        let result = write_mutations(&mut pipe, mutator.mutations(sample_words()), &mut emitted);
        assert!(ignore_broken_pipe(result).is_ok());
        assert_eq!(emitted, 2, "password1 and PASSWORD1 fit before the pipe closes");
        assert_eq!(pipe.written, b"password1\nPASSWORD1\n");
    }
}
