#![deny(missing_docs)]

use crate::linux;
use libc;
use std::{
    convert::TryFrom,
    ffi::{CStr, CString},
    io,
    mem::{self, MaybeUninit},
    ptr,
    time::Duration,
};

/// Represents the link-layer address a frame was received from.
pub struct Addr {
    inner: libc::sockaddr_storage,
    _len: libc::socklen_t,
}

impl Addr {
    fn as_ll(&self) -> &libc::sockaddr_ll {
        // sockaddr_storage is large enough and suitably aligned for every socket address type,
        // and the kernel fills it in as a sockaddr_ll for AF_PACKET sockets.
        unsafe { &*(&self.inner as *const libc::sockaddr_storage as *const libc::sockaddr_ll) }
    }

    /// Returns true if the frame was sent by this host rather than received from the wire.
    pub fn is_outgoing(&self) -> bool {
        self.as_ll().sll_pkttype == linux::PACKET_OUTGOING
    }

    /// Index of the interface the frame was seen on.
    pub fn ifindex(&self) -> i32 {
        self.as_ll().sll_ifindex
    }
}

/// Represents an unbound `AF_PACKET` socket.  At this phase of a socket's lifecycle, it can be
/// configured.
pub struct Socket {
    fd: libc::c_int,
}

/// Represents a bound `AF_PACKET` socket. At this phase of a socket's lifecycle, it can be read
/// to/written from.
pub struct BoundSocket {
    fd: libc::c_int,
    iface: CString,
    send_addr: libc::sockaddr_ll,
}

/// Builds an `ifreq` whose name field holds `iface`, rejecting names that do not fit.
fn ifreq_for(iface: &CStr) -> io::Result<linux::ifreq> {
    let name = iface.to_bytes();
    if name.is_empty() || name.len() >= libc::IFNAMSIZ {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "interface name is empty or too long",
        ));
    }
    // Zeroed memory is a valid ifreq; the name is copied without its terminator, which the
    // zeroed tail of the array provides.
    unsafe {
        let mut ifr: linux::ifreq = MaybeUninit::zeroed().assume_init();
        ptr::copy_nonoverlapping(
            name.as_ptr() as *const libc::c_char,
            ifr.ifr_ifrn.ifrn_name.as_mut_ptr(),
            name.len(),
        );
        Ok(ifr)
    }
}

fn poll_fd(fd: libc::c_int, events: libc::c_short, timeout: Option<Duration>) -> io::Result<bool> {
    let timeout_ms = match timeout {
        None => -1,
        Some(t) => libc::c_int::try_from(t.as_millis()).unwrap_or(libc::c_int::MAX),
    };
    let mut pfd = libc::pollfd {
        fd,
        events,
        revents: 0,
    };
    // Resources:
    // man 2 poll
    let ready = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    if ready < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(false);
        }
        return Err(err);
    }
    if pfd.revents & libc::POLLNVAL != 0 {
        return Err(io::Error::from_raw_os_error(libc::EBADF));
    }
    // POLLERR is reported as ready so the following recv/send surfaces the pending error.
    Ok(pfd.revents & (events | libc::POLLERR) != 0)
}

impl Socket {
    /// Creates a new unbound socket.
    pub fn new() -> io::Result<Self> {
        // This block must be marked as unsafe because it uses FFI with C code. We believe the code
        // in this block to be safe because it does not interact with any memory owned by Rust
        // code, nor does it violate the invariant of the Socket type -- namely, that it return an
        // Err if it fails to initialize.
        let fd = unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#socket
            // man 7 packet
            let fd = libc::socket(
                libc::AF_PACKET,
                libc::SOCK_RAW,
                (libc::ETH_P_ALL as u16).to_be() as libc::c_int,
            );
            if fd < 0 {
                return Err(io::Error::last_os_error());
            }
            fd
        };
        Ok(Self { fd })
    }

    /// Binds the socket to a network interface. This function consumes the `Socket` instance, as
    /// no more configuration options may be safely changed.
    pub fn bind(self, iface: impl AsRef<CStr>) -> io::Result<BoundSocket> {
        let iface = iface.as_ref();
        let mut ifr = ifreq_for(iface)?;
        // This block is marked as unsafe because it uses FFI, however, we believe it to be safe
        // because 1) it handles FFI failures in accordance with the bound API's conventions, and
        // 2) the ifreq it hands to the kernel is owned by this stack frame.
        let send_addr = unsafe {
            // ioctl(SIOCGIFINDEX) fills in the index field of the ifreq object
            // Resources:
            // man 7 netdevice
            let err = libc::ioctl(
                self.fd,
                linux::SIOCGIFINDEX as _,
                &mut ifr as *mut linux::ifreq,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }

            // bind the socket
            let mut ll: libc::sockaddr_ll = MaybeUninit::zeroed().assume_init();
            ll.sll_family = libc::AF_PACKET as libc::c_ushort;
            ll.sll_protocol = (libc::ETH_P_ALL as u16).to_be();
            // expanded from `ifr_ifindex` in kernel headers
            ll.sll_ifindex = ifr.ifr_ifru.ifru_ivalue;
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#bind
            // man 7 packet regarding sockaddr_ll
            let err = libc::bind(
                self.fd,
                &ll as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            ll
        };
        let fd = self.fd;
        // This ensures that `self` does not attempt to close the file descriptor, as the file
        // descriptor is transferred to the BoundSocket we're returning. This doesn't cause any
        // resource leaks since the stack-bound `self` is consumed and deallocated in
        // `mem::forget`.
        mem::forget(self);
        Ok(BoundSocket {
            fd,
            iface: iface.to_owned(),
            send_addr,
        })
    }

    /// Configures the socket's non-blocking status.
    pub fn set_nonblocking(&mut self, nonblocking: bool) -> io::Result<()> {
        // This block is marked as unsafe because it uses FFI, however, we assume this code to be
        // safe because we handle fcntl's failures properly. Additionally, we do not borrow any
        // Rust-owned memory.
        // Resources used to write syscall code:
        // https://beej.us/guide/bgnet/html/multi/advanced.html#blocking
        // man 2 fcntl
        unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            let new_flags = if nonblocking {
                flags | libc::O_NONBLOCK
            } else {
                flags & (!libc::O_NONBLOCK)
            };
            let err = libc::fcntl(self.fd, libc::F_SETFL, new_flags);
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
        }
        Ok(())
    }

    /// Returns true if the socket is configured not to block, false otherwise.
    pub fn is_nonblocking(&self) -> io::Result<bool> {
        // See comments on block above (in set_nonblocking).
        let flags = unsafe {
            let flags = libc::fcntl(self.fd, libc::F_GETFL);
            if flags < 0 {
                return Err(io::Error::last_os_error());
            }
            flags
        };
        Ok(flags & libc::O_NONBLOCK == libc::O_NONBLOCK)
    }
}

impl BoundSocket {
    /// Name of the interface this socket is bound to.
    pub fn interface(&self) -> &CStr {
        &self.iface
    }

    /// Returns the interface's hardware address, as reported by `SIOCGIFHWADDR`.
    pub fn hardware_addr(&self) -> io::Result<[u8; 6]> {
        let mut ifr = ifreq_for(&self.iface)?;
        // Same reasoning as the SIOCGIFINDEX call in `bind`.
        unsafe {
            let err = libc::ioctl(
                self.fd,
                linux::SIOCGIFHWADDR as _,
                &mut ifr as *mut linux::ifreq,
            );
            if err < 0 {
                return Err(io::Error::last_os_error());
            }
            let data = ifr.ifr_ifru.ifru_hwaddr.sa_data;
            let mut mac = [0u8; 6];
            for (byte, raw) in mac.iter_mut().zip(data.iter()) {
                *byte = *raw as u8;
            }
            Ok(mac)
        }
    }

    /// Turns promiscuous mode on or off on this NIC. Useful for receiving all packets on an
    /// interface, including those not addressed to the device.
    pub fn set_promiscuous(&mut self, p: bool) -> io::Result<()> {
        let mreq = linux::packet_mreq {
            mr_ifindex: self.send_addr.sll_ifindex,
            mr_type: linux::PACKET_MR_PROMISC,
            mr_alen: 0,
            mr_address: [0; 8],
        };
        let op = if p {
            linux::PACKET_ADD_MEMBERSHIP
        } else {
            linux::PACKET_DROP_MEMBERSHIP
        };
        // Resources:
        // man 7 packet regarding PACKET_ADD_MEMBERSHIP
        let err = unsafe {
            libc::setsockopt(
                self.fd,
                linux::SOL_PACKET,
                op,
                &mreq as *const _ as *const libc::c_void,
                mem::size_of::<linux::packet_mreq>() as libc::socklen_t,
            )
        };
        if err < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Waits until a frame can be received, or `timeout` elapses. `None` waits forever.
    /// Returns false on timeout, and when the wait was interrupted by a signal.
    pub fn poll_readable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        poll_fd(self.fd, libc::POLLIN, timeout)
    }

    /// Waits until a frame can be sent, or `timeout` elapses. `None` waits forever.
    pub fn poll_writable(&self, timeout: Option<Duration>) -> io::Result<bool> {
        poll_fd(self.fd, libc::POLLOUT, timeout)
    }

    /// Sends a frame to the NIC.
    pub fn send(&mut self, frame: &[u8]) -> io::Result<usize> {
        // This block is marked as unsafe because it uses FFI. We believe this code to be safe,
        // because it safely borrows the Rust-owned frame and passes the length of the frame to the
        // libc function, so it should not exhibit any C-side undefined behaviour.
        unsafe {
            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::sendto(
                self.fd,
                frame.as_ptr() as *const _,
                frame.len(),
                0,
                &self.send_addr as *const _ as *const libc::sockaddr,
                mem::size_of::<libc::sockaddr_ll>() as libc::socklen_t,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(bytes as usize)
            }
        }
    }

    /// Receives a frame from the NIC. The returned length is the frame's length on the wire; when
    /// it exceeds `frame.len()` only the first `frame.len()` bytes were stored.
    pub fn recv(&mut self, frame: &mut [u8]) -> io::Result<(usize, Addr)> {
        // Note comment in `send` call.
        unsafe {
            let mut storage = MaybeUninit::<libc::sockaddr_storage>::zeroed();
            let mut addrlen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;

            // Resources:
            // https://beej.us/guide/bgnet/html/multi/syscalls.html#sendtorecv
            let bytes = libc::recvfrom(
                self.fd,
                frame.as_mut_ptr() as *mut _,
                frame.len(),
                // man 7 packet: MSG_TRUNC makes recvfrom report the real length of the frame
                libc::MSG_TRUNC,
                storage.as_mut_ptr() as *mut _,
                &mut addrlen,
            );
            if bytes < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok((
                    bytes as usize,
                    Addr {
                        inner: storage.assume_init(),
                        _len: addrlen,
                    },
                ))
            }
        }
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

impl Drop for BoundSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ifreq_rejects_long_names() {
        let name = CString::new("an-interface-name-longer-than-ifnamsiz").unwrap();
        assert!(ifreq_for(&name).is_err());
        let empty = CString::new("").unwrap();
        assert!(ifreq_for(&empty).is_err());
    }

    #[test]
    fn ifreq_copies_name() {
        let name = CString::new("eth0").unwrap();
        let ifr = ifreq_for(&name).unwrap();
        let stored = unsafe { CStr::from_ptr(ifr.ifr_ifrn.ifrn_name.as_ptr()) };
        assert_eq!(stored, name.as_c_str());
    }
}
