//! Bounds-checked views over Ethernet, ARP, IPv4 and ICMP bytes, the Internet checksum, and the
//! classifier that decides which frames the responder answers.

mod types;
pub use self::types::*;

pub mod checksum;

mod ethernet;
pub use self::ethernet::*;

mod arp;
pub use self::arp::*;

mod ipv4;
pub use self::ipv4::*;

mod icmp;
pub use self::icmp::*;

mod classify;
pub use self::classify::*;

mod dump;
pub use self::dump::*;
