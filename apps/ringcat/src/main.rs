mod config;

use config::{Config, Mode};
use ringapps_afpacket::AfPacketPort;
use ringapps_runtime::{
    run_capture, run_replay, Error, FrameDecoder, FrameEncoder, FramingError,
};
use std::io::{self, ErrorKind};
use std::process;
use tracing::{error, info, Level};

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    // stdout carries the capture stream, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();
}

fn capture(port: &str, config: &Config) -> Result<(), Error> {
    let mut port = AfPacketPort::open(port)?;
    info!(port = port.name(), buffer_size = config.buffer_size, "capturing to stdout");

    let stdout = io::stdout();
    let mut encoder = FrameEncoder::with_capacity(config.buffer_size, stdout.lock());
    match run_capture(&mut port, &mut encoder, config.idle) {
        // Whoever was reading the capture went away; that is how capture normally ends.
        Err(Error::Framing(FramingError::Io(ref e))) if e.kind() == ErrorKind::BrokenPipe => {
            info!("stdout closed");
            Ok(())
        }
        result => result,
    }
}

fn replay(port: &str, config: &Config) -> Result<(), Error> {
    let mut port = AfPacketPort::open(port)?;
    info!(port = port.name(), "replaying from stdin");

    let stdin = io::stdin();
    let mut decoder = FrameDecoder::new(stdin.lock());
    run_replay(&mut decoder, &mut port, &config.inject_policy()).map(|_| ())
}

fn main() {
    let matches = config::app().get_matches();
    let config = match Config::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, matches.usage());
            process::exit(1);
        }
    };
    init_logging(config.verbosity);

    let result = match &config.mode {
        Mode::Capture { port } => capture(port, &config),
        Mode::Replay { port } => replay(port, &config),
    };
    if let Err(e) = result {
        error!(error = %e, "ringcat stopped");
        process::exit(1);
    }
}
