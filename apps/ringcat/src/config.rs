use clap::{App, Arg, ArgGroup, ArgMatches};
use ringapps_runtime::codec::DEFAULT_CAPACITY;
use ringapps_runtime::runner::DEFAULT_IDLE_TIMEOUT;
use ringapps_runtime::{Error, InjectPolicy};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Frames from the port are framed onto stdout.
    Capture { port: String },
    /// Records from stdin are injected into the port.
    Replay { port: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
    pub buffer_size: usize,
    pub idle: Duration,
    pub max_retries: Option<u32>,
    pub verbosity: u64,
}

impl Config {
    pub fn inject_policy(&self) -> InjectPolicy {
        match self.max_retries {
            Some(max) => InjectPolicy::bounded(max),
            None => InjectPolicy::unbounded(),
        }
    }
}

fn positive<T: std::str::FromStr + PartialOrd + Default>(value: String) -> Result<(), String> {
    match value.parse::<T>() {
        Ok(n) if n > T::default() => Ok(()),
        _ => Err(format!("'{}' is not a positive number", value)),
    }
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("ringcat")
        .version("0.1")
        .author("Ringapps Contributors")
        .about("Captures raw frames to stdout, or replays them from stdin")
        .arg(
            Arg::with_name("input")
                .short("i")
                .value_name("PORT")
                .help("Capture from PORT, writing framed records to stdout")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .value_name("PORT")
                .help("Replay framed records from stdin into PORT")
                .takes_value(true),
        )
        .group(
            ArgGroup::with_name("mode")
                .args(&["input", "output"])
                .required(true),
        )
        .arg(
            Arg::with_name("buffer-size")
                .long("buffer-size")
                .value_name("BYTES")
                .help("Bytes staged before capture output is written [default: 4096]")
                .takes_value(true)
                .validator(positive::<usize>),
        )
        .arg(
            Arg::with_name("idle-ms")
                .long("idle-ms")
                .value_name("MS")
                .help("Flush capture output after this long without traffic [default: 1000]")
                .takes_value(true)
                .validator(positive::<u64>),
        )
        .arg(
            Arg::with_name("max-retries")
                .long("max-retries")
                .value_name("N")
                .help("Give up replay after N attempts at a full transmit path [default: never]")
                .takes_value(true)
                .validator(positive::<u32>),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for per-frame detail"),
        )
}

fn number<T: std::str::FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, Error> {
    matches
        .value_of(name)
        .map(|value| {
            value
                .parse::<T>()
                .map_err(|_| Error::Config(format!("invalid value for --{}: {}", name, value)))
        })
        .transpose()
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config, Error> {
        let mode = match (matches.value_of("input"), matches.value_of("output")) {
            (Some(port), None) => Mode::Capture {
                port: port.to_string(),
            },
            (None, Some(port)) => Mode::Replay {
                port: port.to_string(),
            },
            _ => {
                return Err(Error::Config(
                    "exactly one of -i (capture) or -o (replay) is required".to_string(),
                ))
            }
        };

        Ok(Config {
            mode,
            buffer_size: number(matches, "buffer-size")?.unwrap_or(DEFAULT_CAPACITY),
            idle: number(matches, "idle-ms")?
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_IDLE_TIMEOUT),
            max_retries: number(matches, "max-retries")?,
            verbosity: matches.occurrences_of("verbose"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Config, String> {
        let matches = app()
            .get_matches_from_safe(std::iter::once("ringcat").chain(args.iter().cloned()))
            .map_err(|e| e.message)?;
        Config::from_matches(&matches).map_err(|e| e.to_string())
    }

    #[test]
    fn capture_defaults() {
        let config = parse(&["-i", "eth0"]).unwrap();
        assert_eq!(
            config.mode,
            Mode::Capture {
                port: "eth0".to_string()
            }
        );
        assert_eq!(config.buffer_size, 4096);
        assert_eq!(config.idle, Duration::from_millis(1000));
        assert_eq!(config.max_retries, None);
        assert_eq!(config.inject_policy(), InjectPolicy::unbounded());
    }

    #[test]
    fn replay_with_options() {
        let config = parse(&[
            "-o",
            "eth1",
            "--buffer-size",
            "9000",
            "--idle-ms",
            "250",
            "--max-retries",
            "5",
            "-v",
        ])
        .unwrap();
        assert_eq!(
            config.mode,
            Mode::Replay {
                port: "eth1".to_string()
            }
        );
        assert_eq!(config.buffer_size, 9000);
        assert_eq!(config.idle, Duration::from_millis(250));
        assert_eq!(config.inject_policy().max_attempts, Some(5));
        assert_eq!(config.verbosity, 1);
    }

    #[test]
    fn exactly_one_mode() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["-i", "eth0", "-o", "eth1"]).is_err());
    }

    #[test]
    fn rejects_non_positive_numbers() {
        assert!(parse(&["-i", "eth0", "--buffer-size", "0"]).is_err());
        assert!(parse(&["-i", "eth0", "--idle-ms", "soon"]).is_err());
        assert!(parse(&["-o", "eth0", "--max-retries", "-3"]).is_err());
    }
}
