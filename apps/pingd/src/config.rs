use clap::{App, Arg, ArgMatches};
use ringapps_packets::MacAddr;
use ringapps_runtime::{Error, ResponderRules};
use std::net::Ipv4Addr;

/// Everything `pingd` needs to start, parsed from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub interface: String,
    pub address: Ipv4Addr,
    /// `None` means use the interface's own MAC.
    pub mac: Option<MacAddr>,
    pub rules: ResponderRules,
    pub verbosity: u64,
}

fn is_ipv4(value: String) -> Result<(), String> {
    value
        .parse::<Ipv4Addr>()
        .map(|_| ())
        .map_err(|_| format!("'{}' is not a dotted quad IPv4 address", value))
}

fn is_mac(value: String) -> Result<(), String> {
    value
        .parse::<MacAddr>()
        .map(|_| ())
        .map_err(|e| format!("'{}': {}", value, e))
}

pub fn app<'a, 'b>() -> App<'a, 'b> {
    App::new("pingd")
        .version("0.1")
        .author("Ringapps Contributors")
        .about("Answers ARP and ICMP echo requests for one address on a raw interface")
        .arg(
            Arg::with_name("interface")
                .short("i")
                .long("interface")
                .value_name("IFACE")
                .help("Interface to serve on")
                .required(true)
                .takes_value(true),
        )
        .arg(
            Arg::with_name("address")
                .short("a")
                .long("address")
                .value_name("IPV4")
                .help("IPv4 address to answer for")
                .required(true)
                .takes_value(true)
                .validator(is_ipv4),
        )
        .arg(
            Arg::with_name("mac")
                .short("m")
                .long("mac")
                .value_name("MAC")
                .help("MAC address to answer with [default: the interface's own]")
                .takes_value(true)
                .validator(is_mac),
        )
        .arg(
            Arg::with_name("no-arp")
                .long("no-arp")
                .help("Do not answer ARP requests"),
        )
        .arg(
            Arg::with_name("no-icmp")
                .long("no-icmp")
                .help("Do not answer ICMP echo requests"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Log more; repeat for per-frame detail"),
        )
}

impl Config {
    pub fn from_matches(matches: &ArgMatches) -> Result<Config, Error> {
        let interface = matches
            .value_of("interface")
            .ok_or_else(|| Error::Config("an interface is required".to_string()))?
            .to_string();
        let address = matches
            .value_of("address")
            .ok_or_else(|| Error::Config("an address to answer for is required".to_string()))?
            .parse::<Ipv4Addr>()
            .map_err(|_| Error::Config("invalid IPv4 address".to_string()))?;
        let mac = match matches.value_of("mac") {
            Some(mac) => Some(
                mac.parse::<MacAddr>()
                    .map_err(|e| Error::Config(e.to_string()))?,
            ),
            None => None,
        };

        let rules = ResponderRules {
            arp: !matches.is_present("no-arp"),
            icmp_echo: !matches.is_present("no-icmp"),
        };
        if !rules.arp && !rules.icmp_echo {
            return Err(Error::Config(
                "--no-arp and --no-icmp together leave nothing to answer".to_string(),
            ));
        }

        Ok(Config {
            interface,
            address,
            mac,
            rules,
            verbosity: matches.occurrences_of("verbose"),
        })
    }
}
