use std::fmt;

/// Running totals for a responder.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ResponderStats {
    pub frames_received: u64,
    pub arp_replies: u64,
    pub echo_replies: u64,
    /// Frames that matched no enabled rule, including malformed ones.
    pub frames_ignored: u64,
    /// Replies abandoned because the transmit path stayed full.
    pub replies_dropped: u64,
}

impl ResponderStats {
    pub fn replies(&self) -> u64 {
        self.arp_replies + self.echo_replies
    }
}

impl fmt::Display for ResponderStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "received={} arp_replies={} echo_replies={} ignored={} dropped={}",
            self.frames_received,
            self.arp_replies,
            self.echo_replies,
            self.frames_ignored,
            self.replies_dropped
        )
    }
}
