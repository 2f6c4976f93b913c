//! The packet-handling core shared by `pingd` and `ringcat`.
//!
//! Everything here is driven through the [`Transport`] trait, so it can run against a real
//! `AF_PACKET` port or against a scripted transport in tests.

/// Errors surfaced to the binaries. Unmatched frames are never errors; they are only counted.
pub mod error;

/// The seam between the core and whatever moves raw frames on and off the wire. A transport
/// lends out received frames, waits for readiness, and accepts frames to transmit.
pub mod transport;

/// Stateless ARP and ICMP echo responder. Every reply is built on a private copy of the request,
/// never on the memory the transport lent out.
pub mod responder;

/// Length-prefixed framing used to carry raw frames over a byte stream.
pub mod codec;

/// Bounded retry around a transport's transmit path.
pub mod inject;

/// The single-threaded loops behind each mode, split into step functions so that one cycle can
/// be driven at a time.
pub mod runner;


pub use codec::{FrameDecoder, FrameEncoder};
pub use error::{Error, FramingError, Result};
pub use inject::{inject_frame, InjectPolicy};
pub use responder::{LocalIdentity, Reply, Responder, ResponderRules, ResponderStats};
pub use runner::{
    capture_cycle, responder_cycle, run_capture, run_replay, run_responder, CaptureCycle,
    ReplaySummary,
};
pub use transport::Transport;
