use std::io;
use std::thread;
use std::time::Duration;

/// A source and sink of raw link-layer frames.
///
/// Received frames are borrowed from the transport's own receive memory. The borrow is tied to
/// `&mut self`, so a frame cannot be held across the next receive or inject call; anything that
/// needs to change a frame copies it first.
pub trait Transport {
    /// Waits until at least one frame can be received. `None` waits without a bound.
    /// Returns false if `timeout` elapsed first.
    fn poll_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;

    /// Waits until the transmit path can take a frame. Returns false on timeout.
    fn poll_writable(&mut self, timeout: Option<Duration>) -> io::Result<bool>;

    /// Lends out the next frame of the batch that is ready now, in arrival order. `None` once
    /// that batch is drained; a later `poll_readable` may make more available.
    fn next_frame(&mut self) -> io::Result<Option<&[u8]>>;

    /// Submits a frame for transmission. `Ok(false)` means the transmit path was full and
    /// nothing was sent.
    fn inject(&mut self, frame: &[u8]) -> io::Result<bool>;

    /// Pauses before another inject attempt after the transmit path refused a frame it had
    /// reported room for.
    fn back_off(&mut self, wait: Duration) {
        thread::sleep(wait);
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn poll_readable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        (**self).poll_readable(timeout)
    }

    fn poll_writable(&mut self, timeout: Option<Duration>) -> io::Result<bool> {
        (**self).poll_writable(timeout)
    }

    fn next_frame(&mut self) -> io::Result<Option<&[u8]>> {
        (**self).next_frame()
    }

    fn inject(&mut self, frame: &[u8]) -> io::Result<bool> {
        (**self).inject(frame)
    }

    fn back_off(&mut self, wait: Duration) {
        (**self).back_off(wait)
    }
}
