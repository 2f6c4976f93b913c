mod config;

use config::Config;
use ringapps_afpacket::AfPacketPort;
use ringapps_runtime::{run_responder, Error, LocalIdentity, Responder};
use std::process;
use tracing::{error, info, Level};

fn init_logging(verbosity: u64) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .init();
}

fn run(config: Config) -> Result<(), Error> {
    let mut port = AfPacketPort::open(&config.interface)?;
    let mac = match config.mac {
        Some(mac) => mac,
        None => port
            .hardware_addr()
            .map_err(|source| Error::TransportOpen {
                port: config.interface.clone(),
                source,
            })?,
    };
    let mut responder =
        Responder::new(LocalIdentity::new(config.address, mac)).with_rules(config.rules);
    let (identity, rules) = (responder.identity(), responder.rules());
    info!(
        interface = %port.name(),
        ip = %identity.ipv4,
        mac = %identity.mac,
        arp = rules.arp,
        icmp_echo = rules.icmp_echo,
        "pingd serving"
    );

    run_responder(&mut port, &mut responder)
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

    if let Err(e) = run(config) {
        error!(error = %e, "pingd stopped");
        process::exit(1);
    }
}
