use afpacket::{BoundSocket, Socket};
use ringapps_packets::MacAddr;
use ringapps_runtime::{Error, Transport};
use std::{ffi::CString, io, time::Duration};
use tracing::{debug, warn};

/// Receive buffer size. Large enough for any frame the kernel hands a packet socket, including
/// offloaded super-frames on loopback.
pub const RX_BUFFER_LEN: usize = 65536;

/// Most frames handed out per readiness wait, so a busy link cannot starve the loop.
pub const BATCH_LEN: usize = 256;

/// A network interface opened for raw frame capture and injection.
///
/// The socket is non-blocking and promiscuous, and frames that this host transmitted are skipped
/// on receive, so a port never sees its own replies. Promiscuous membership is tied to the socket
/// and ends when the port is dropped.
pub struct AfPacketPort {
    name: String,
    socket: BoundSocket,
    rx: Vec<u8>,
    batch_left: usize,
}

impl AfPacketPort {
    /// Opens `name`. Any failure is reported as `Error::TransportOpen` naming the interface.
    pub fn open(name: &str) -> Result<Self, Error> {
        let open_err = |source| Error::TransportOpen {
            port: name.to_string(),
            source,
        };
        let iface = CString::new(name)
            .map_err(|e| open_err(io::Error::new(io::ErrorKind::InvalidInput, e)))?;

        let mut socket = Socket::new().map_err(open_err)?;
        socket.set_nonblocking(true).map_err(open_err)?;
        let mut socket = socket.bind(&iface).map_err(open_err)?;
        socket.set_promiscuous(true).map_err(open_err)?;
        debug!(port = name, "opened");

        Ok(AfPacketPort {
            name: name.to_string(),
            socket,
            rx: vec![0; RX_BUFFER_LEN],
            batch_left: 0,
        })
    }

    /// Name of the interface.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The interface's own MAC address.
    pub fn hardware_addr(&self) -> io::Result<MacAddr> {
        self.socket.hardware_addr().map(MacAddr::new)
    }
}

/// Length of a received frame, or `None` if it did not fit in a buffer of `capacity` bytes.
fn stored_len(reported: usize, capacity: usize) -> Option<usize> {
    if reported > capacity {
        None
    } else {
        Some(reported)
    }
}

fn is_full(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock || err.raw_os_error() == Some(libc::ENOBUFS)
}

impl Transport for AfPacketPort {
    fn poll_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        let ready = self.socket.poll_readable(timeout)?;
        if ready {
            self.batch_left = BATCH_LEN;
        }
        Ok(ready)
    }

    fn poll_writable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        self.socket.poll_writable(timeout)
    }

    fn next_frame(&mut self) -> io::Result<Option<&[u8]>> {
        if self.batch_left == 0 {
            return Ok(None);
        }
        loop {
            match self.socket.recv(&mut self.rx) {
                Ok((_, addr)) if addr.is_outgoing() => continue,
                Ok((len, _)) => match stored_len(len, self.rx.len()) {
                    Some(len) => {
                        self.batch_left -= 1;
                        return Ok(Some(&self.rx[..len]));
                    }
                    None => {
                        warn!(
                            port = %self.name,
                            len,
                            max = self.rx.len(),
                            "skipping oversized frame"
                        );
                        continue;
                    }
                },
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    self.batch_left = 0;
                    return Ok(None);
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn inject(&mut self, frame: &[u8]) -> io::Result<bool> {
        match self.socket.send(frame) {
            Ok(_) => Ok(true),
            Err(ref e) if is_full(e) => Ok(false),
            Err(e) => Err(e),
        }
    }
}
