//! This crate connects the `afpacket` crate to the `ringapps-runtime` transport seam.
#![deny(missing_docs)]

#[cfg(target_os = "linux")]
mod port;

#[cfg(target_os = "linux")]
pub use port::{AfPacketPort, BATCH_LEN, RX_BUFFER_LEN};
