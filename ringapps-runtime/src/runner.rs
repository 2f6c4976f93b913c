use crate::codec::{FrameDecoder, FrameEncoder};
use crate::error::Result;
use crate::inject::{inject_frame, InjectPolicy};
use crate::responder::Responder;
use crate::transport::Transport;
use ringapps_packets::hex_dump;
use std::io::{Read, Write};
use std::time::Duration;
use tracing::{debug, info, instrument, trace, warn};

/// The responder logs its counters at `debug` each time this many frames have been received.
pub const STATS_LOG_INTERVAL: u64 = 10_000;

/// How long capture waits for traffic before flushing what it has staged.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(1000);

/// Waits for frames, then answers every frame of the ready batch before returning. Returns the
/// number of frames taken from the transport; zero if the wait timed out.
pub fn responder_cycle<T: Transport + ?Sized>(
    transport: &mut T,
    responder: &mut Responder,
    timeout: Option<Duration>,
) -> Result<usize> {
    if !transport.poll_readable(timeout)? {
        return Ok(0);
    }

    let mut frames = 0;
    loop {
        // The borrowed frame must be released before the transport can inject.
        let reply = match transport.next_frame()? {
            Some(frame) => {
                trace!(len = frame.len(), "rx\n{}", hex_dump(frame));
                responder.process(frame)
            }
            None => break,
        };
        frames += 1;

        if let Some(reply) = reply {
            responder.send(transport, reply)?;
        }
        if responder.stats().frames_received % STATS_LOG_INTERVAL == 0 {
            debug!(stats = %responder.stats(), "responder progress");
        }
    }
    Ok(frames)
}

/// Serves until the transport fails. The error is returned after the final counters are logged.
#[instrument(skip(transport, responder))]
pub fn run_responder<T: Transport + ?Sized>(
    transport: &mut T,
    responder: &mut Responder,
) -> Result<()> {
    loop {
        if let Err(e) = responder_cycle(transport, responder, None) {
            info!(stats = %responder.stats(), "responder stopped");
            return Err(e);
        }
    }
}

/// What one capture cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureCycle {
    /// Nothing arrived within the idle timeout; staged records were flushed.
    Idle,
    /// This many frames were staged.
    Captured(usize),
}

/// Waits up to `idle` for frames. On timeout flushes the encoder, otherwise stages every frame
/// of the ready batch.
pub fn capture_cycle<T: Transport + ?Sized, W: Write>(
    transport: &mut T,
    encoder: &mut FrameEncoder<W>,
    idle: Duration,
) -> Result<CaptureCycle> {
    if !transport.poll_readable(Some(idle))? {
        if encoder.buffered() > 0 {
            trace!(bytes = encoder.buffered(), "idle, flushing");
        }
        encoder.flush()?;
        return Ok(CaptureCycle::Idle);
    }

    let mut frames = 0;
    while let Some(frame) = transport.next_frame()? {
        trace!(len = frame.len(), "captured\n{}", hex_dump(frame));
        encoder.push(frame)?;
        frames += 1;
    }
    Ok(CaptureCycle::Captured(frames))
}

/// Captures until the transport or the output fails. Staged records are flushed on the way out
/// when the output still accepts them.
#[instrument(skip(transport, encoder))]
pub fn run_capture<T: Transport + ?Sized, W: Write>(
    transport: &mut T,
    encoder: &mut FrameEncoder<W>,
    idle: Duration,
) -> Result<()> {
    loop {
        if let Err(e) = capture_cycle(transport, encoder, idle) {
            if let Err(flush_err) = encoder.flush() {
                debug!(error = %flush_err, "final flush failed");
            }
            info!(records = encoder.records(), "capture stopped");
            return Err(e);
        }
    }
}

/// Totals for a finished replay.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub frames_injected: u64,
    pub bytes_injected: u64,
}

/// Injects every record of the stream, in order, until it ends.
///
/// A framing error stops the replay; the record it was found in is never injected. Backpressure
/// beyond the policy's limit is also fatal here, since dropping a frame would silently change
/// what gets replayed.
#[instrument(skip(decoder, transport, policy))]
pub fn run_replay<R: Read, T: Transport + ?Sized>(
    decoder: &mut FrameDecoder<R>,
    transport: &mut T,
    policy: &InjectPolicy,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    loop {
        let frame = match decoder.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, injected = summary.frames_injected, "replay stream is corrupt");
                return Err(e.into());
            }
        };
        trace!(len = frame.len(), "replaying\n{}", hex_dump(frame));
        inject_frame(transport, frame, policy)?;
        summary.frames_injected += 1;
        summary.bytes_injected += frame.len() as u64;
    }
    info!(
        frames = summary.frames_injected,
        bytes = summary.bytes_injected,
        "replay finished"
    );
    Ok(summary)
}
