use crate::error::{Error, Result};
use crate::transport::Transport;
use std::time::Duration;
use tracing::debug;

/// How long to wait for the transmit path, and how many times to try, before giving up on a
/// frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectPolicy {
    /// Upper bound on each wait for write-readiness.
    pub write_timeout: Duration,
    /// `None` keeps retrying for as long as the transmit path stays full.
    pub max_attempts: Option<u32>,
}

impl InjectPolicy {
    pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(1000);

    /// Replies are cheap to lose, so the responder stops after this many attempts and moves on.
    pub const RESPONDER_MAX_ATTEMPTS: u32 = 8;

    /// First pause after the transmit path refuses a frame it reported room for. Each further
    /// refusal doubles it, up to `write_timeout`.
    pub const INITIAL_BACKOFF: Duration = Duration::from_millis(1);

    pub fn unbounded() -> Self {
        InjectPolicy {
            write_timeout: Self::DEFAULT_WRITE_TIMEOUT,
            max_attempts: None,
        }
    }

    pub fn bounded(max_attempts: u32) -> Self {
        InjectPolicy {
            write_timeout: Self::DEFAULT_WRITE_TIMEOUT,
            max_attempts: Some(max_attempts.max(1)),
        }
    }

    pub fn responder() -> Self {
        Self::bounded(Self::RESPONDER_MAX_ATTEMPTS)
    }

    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }
}

impl Default for InjectPolicy {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Waits for the transport to become writable and submits `frame`, retrying while the transmit
/// path is full. Returns the number of attempts it took.
///
/// A transport can report room and still refuse the frame (a full qdisc); the retry after that
/// is delayed by a doubling back-off so it does not spin.
///
/// A full transmit path is never a silent drop: once the policy's attempts are used up this
/// returns `Error::Backpressure`, and the caller decides what losing the frame means.
pub fn inject_frame<T: Transport + ?Sized>(
    transport: &mut T,
    frame: &[u8],
    policy: &InjectPolicy,
) -> Result<u32> {
    let mut attempts = 0;
    let mut backoff = InjectPolicy::INITIAL_BACKOFF.min(policy.write_timeout);
    loop {
        attempts += 1;
        let writable = transport.poll_writable(Some(policy.write_timeout))?;
        if writable && transport.inject(frame)? {
            return Ok(attempts);
        }
        match policy.max_attempts {
            Some(max) if attempts >= max => return Err(Error::Backpressure { attempts }),
            _ => debug!(attempts, len = frame.len(), "transmit path full, retrying"),
        }
        if writable {
            transport.back_off(backoff);
            backoff = (backoff * 2).min(policy.write_timeout);
        }
    }
}
