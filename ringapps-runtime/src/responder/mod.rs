mod stats;

pub use stats::ResponderStats;

use crate::error::Result;
use crate::inject::{inject_frame, InjectPolicy};
use crate::transport::Transport;
use ringapps_packets::*;
use std::convert::TryFrom;
use std::net::Ipv4Addr;
use tracing::{trace, warn};

/// The address pair this host answers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalIdentity {
    pub ipv4: Ipv4Addr,
    pub mac: MacAddr,
}

impl LocalIdentity {
    pub fn new(ipv4: Ipv4Addr, mac: MacAddr) -> Self {
        LocalIdentity { ipv4, mac }
    }
}

/// Which kinds of request the responder answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponderRules {
    pub arp: bool,
    pub icmp_echo: bool,
}

impl Default for ResponderRules {
    fn default() -> Self {
        ResponderRules {
            arp: true,
            icmp_echo: true,
        }
    }
}

/// A reply frame, ready to inject, tagged with the rule that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Arp(PacketData),
    EchoReply(PacketData),
}

impl Reply {
    pub fn frame(&self) -> &[u8] {
        match self {
            Reply::Arp(frame) | Reply::EchoReply(frame) => frame,
        }
    }

    pub fn into_frame(self) -> PacketData {
        match self {
            Reply::Arp(frame) | Reply::EchoReply(frame) => frame,
        }
    }
}

/// Answers ARP requests and ICMP echo requests addressed to a [`LocalIdentity`].
///
/// Each frame is judged on its own; the only state kept between frames is the counters.
#[derive(Debug, Clone)]
pub struct Responder {
    identity: LocalIdentity,
    rules: ResponderRules,
    policy: InjectPolicy,
    stats: ResponderStats,
}

impl Responder {
    pub fn new(identity: LocalIdentity) -> Self {
        Responder {
            identity,
            rules: ResponderRules::default(),
            policy: InjectPolicy::responder(),
            stats: ResponderStats::default(),
        }
    }

    pub fn with_rules(mut self, rules: ResponderRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_policy(mut self, policy: InjectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn identity(&self) -> &LocalIdentity {
        &self.identity
    }

    pub fn rules(&self) -> ResponderRules {
        self.rules
    }

    pub fn stats(&self) -> &ResponderStats {
        &self.stats
    }

    /// Builds the reply to `frame`, if an enabled rule matches. `frame` itself is never
    /// modified; the reply is assembled on a copy.
    pub fn reply(&self, frame: &[u8]) -> Option<Reply> {
        match classify(frame) {
            Classification::Arp(msg) if self.rules.arp => {
                self.arp_reply(frame, &msg).map(Reply::Arp)
            }
            Classification::IcmpEchoRequest(req) if self.rules.icmp_echo => {
                self.echo_reply(frame, &req).map(Reply::EchoReply)
            }
            _ => None,
        }
    }

    /// `reply`, plus bookkeeping for one received frame.
    pub fn process(&mut self, frame: &[u8]) -> Option<Reply> {
        self.stats.frames_received += 1;
        let reply = self.reply(frame);
        if reply.is_none() {
            self.stats.frames_ignored += 1;
            trace!(len = frame.len(), "no rule matched");
        }
        reply
    }

    /// Injects a reply under the responder's policy. A reply that cannot be sent before the
    /// policy gives up is counted and dropped; only transport failures are returned.
    pub fn send<T: Transport + ?Sized>(&mut self, transport: &mut T, reply: Reply) -> Result<()> {
        match inject_frame(transport, reply.frame(), &self.policy) {
            Ok(_) => {
                match reply {
                    Reply::Arp(_) => self.stats.arp_replies += 1,
                    Reply::EchoReply(_) => self.stats.echo_replies += 1,
                }
                Ok(())
            }
            Err(e) if e.is_backpressure() => {
                self.stats.replies_dropped += 1;
                warn!(error = %e, "dropping reply");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn arp_reply(&self, frame: &[u8], request: &ArpMessage) -> Option<PacketData> {
        if !request.is_request() || request.target_ip != self.identity.ipv4 {
            return None;
        }
        let mut arp = EthernetFrame::copy_from_slice(frame)
            .and_then(ArpFrame::try_from)
            .ok()?;
        arp.frame_mut().return_to_sender(self.identity.mac);
        arp.set_sender_hardware_addr(self.identity.mac);
        arp.set_sender_protocol_addr(self.identity.ipv4);
        arp.set_target_hardware_addr(request.sender_mac);
        arp.set_target_protocol_addr(request.sender_ip);
        arp.set_opcode(ArpOp::Reply as u16);
        trace!(peer = %request.sender_ip, "arp reply");
        Some(arp.frame().into_inner())
    }

    fn echo_reply(&self, frame: &[u8], request: &EchoRequest) -> Option<PacketData> {
        if request.dest_ip != self.identity.ipv4 {
            return None;
        }
        let mut ipv4 = EthernetFrame::copy_from_slice(frame)
            .and_then(Ipv4Packet::try_from)
            .ok()?;
        ipv4.swap_addrs();
        ipv4.set_checksum();

        let mut icmp = IcmpPacket::try_from(ipv4).ok()?;
        icmp.set_msg_type(IcmpType::EchoReply);
        icmp.set_header_checksum();

        let mut reply = Ipv4Packet::try_from(icmp)
            .and_then(EthernetFrame::try_from)
            .ok()?;
        reply.return_to_sender(self.identity.mac);
        trace!(
            peer = %request.src_ip,
            id = request.identifier,
            seq = request.sequence,
            "echo reply"
        );
        Some(reply.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test::frame_generators::*;
    use crate::utils::test::mock_transport::MockTransport;
    use smoltcp::wire;

    fn responder() -> Responder {
        Responder::new(LocalIdentity::new(LOCAL_IP, LOCAL_MAC))
    }

    #[test]
    fn arp_reply_fields() {
        let request = arp_request(LOCAL_IP);
        let reply = match responder().reply(&request) {
            Some(Reply::Arp(frame)) => frame,
            other => panic!("expected an ARP reply, got {:?}", other),
        };
        assert_eq!(reply.len(), request.len());

        let eth = EthernetFrame::from_buffer(reply).unwrap();
        assert_eq!(eth.dest_mac(), PEER_MAC);
        assert_eq!(eth.src_mac(), LOCAL_MAC);
        assert_eq!(eth.ether_type(), ARP_ETHER_TYPE);

        let arp = ArpFrame::try_from(eth).unwrap();
        assert_eq!(arp.opcode(), ArpOp::Reply as u16);
        assert_eq!(arp.sender_mac_addr(), Some(LOCAL_MAC));
        assert_eq!(arp.sender_ipv4_addr(), Some(LOCAL_IP));
        assert_eq!(arp.target_mac_addr(), Some(PEER_MAC));
        assert_eq!(arp.target_ipv4_addr(), Some(PEER_IP));
        assert_eq!(arp.hardware_type(), ArpHardwareType::Ethernet as u16);
        assert_eq!(arp.protocol_type(), IPV4_ETHER_TYPE);
    }

    #[test]
    fn arp_reply_parses_with_smoltcp() {
        let reply = responder().reply(&arp_request(LOCAL_IP)).unwrap();
        let eth = wire::EthernetFrame::new_checked(reply.frame()).unwrap();
        let arp = wire::ArpPacket::new_checked(eth.payload()).unwrap();
        let repr = wire::ArpRepr::parse(&arp).unwrap();
        assert_eq!(
            repr,
            wire::ArpRepr::EthernetIpv4 {
                operation: wire::ArpOperation::Reply,
                source_hardware_addr: wire::EthernetAddress(LOCAL_MAC.bytes),
                source_protocol_addr: wire::Ipv4Address(LOCAL_IP.octets()),
                target_hardware_addr: wire::EthernetAddress(PEER_MAC.bytes),
                target_protocol_addr: wire::Ipv4Address(PEER_IP.octets()),
            }
        );
    }

    #[test]
    fn arp_for_someone_else() {
        let request = arp_request(Ipv4Addr::new(10, 0, 0, 9));
        let copy = request.clone();
        assert_eq!(responder().reply(&request), None);
        assert_eq!(request, copy);
    }

    #[test]
    fn arp_reply_is_not_answered() {
        let mut request = EthernetFrame::from_buffer(arp_request(LOCAL_IP))
            .and_then(ArpFrame::try_from)
            .unwrap();
        request.set_opcode(ArpOp::Reply as u16);
        assert_eq!(responder().reply(&request.frame().data), None);
    }

    #[test]
    fn echo_reply_fields() {
        let payload: Vec<u8> = (0..56).collect();
        let request = echo_request(LOCAL_IP, 0x1234, 7, &payload);
        let reply = match responder().reply(&request) {
            Some(Reply::EchoReply(frame)) => frame,
            other => panic!("expected an echo reply, got {:?}", other),
        };
        assert_eq!(reply.len(), request.len());

        let eth = EthernetFrame::from_buffer(reply).unwrap();
        assert_eq!(eth.dest_mac(), PEER_MAC);
        assert_eq!(eth.src_mac(), LOCAL_MAC);

        let ipv4 = Ipv4Packet::try_from(eth).unwrap();
        assert_eq!(ipv4.src_addr(), LOCAL_IP);
        assert_eq!(ipv4.dest_addr(), PEER_IP);
        assert!(ipv4.validate_checksum());
        assert!(checksum::verify(ipv4.header()));

        let icmp = IcmpPacket::try_from(ipv4).unwrap();
        assert_eq!(icmp.msg_type(), IcmpType::EchoReply as u8);
        assert_eq!(icmp.code(), 0);
        assert_eq!(icmp.identifier(), 0x1234);
        assert_eq!(icmp.sequence(), 7);
        assert_eq!(icmp.payload(), &payload[..]);
        // The checksum only covers the 8 header bytes.
        assert!(checksum::verify(icmp.header()));
    }

    #[test]
    fn echo_reply_parses_with_smoltcp() {
        let request = echo_request(LOCAL_IP, 99, 3, b"abcdefgh");
        let reply = responder().reply(&request).unwrap();

        let eth = wire::EthernetFrame::new_checked(reply.frame()).unwrap();
        assert_eq!(eth.dst_addr(), wire::EthernetAddress(PEER_MAC.bytes));
        assert_eq!(eth.src_addr(), wire::EthernetAddress(LOCAL_MAC.bytes));
        assert_eq!(eth.ethertype(), wire::EthernetProtocol::Ipv4);

        let ip = wire::Ipv4Packet::new_checked(eth.payload()).unwrap();
        assert!(ip.verify_checksum());
        assert_eq!(ip.src_addr(), wire::Ipv4Address(LOCAL_IP.octets()));
        assert_eq!(ip.dst_addr(), wire::Ipv4Address(PEER_IP.octets()));
        assert_eq!(ip.protocol(), wire::IpProtocol::Icmp);

        let icmp = wire::Icmpv4Packet::new_checked(ip.payload()).unwrap();
        assert_eq!(icmp.msg_type(), wire::Icmpv4Message::EchoReply);
        assert_eq!(icmp.echo_ident(), 99);
        assert_eq!(icmp.echo_seq_no(), 3);
        assert_eq!(icmp.data(), b"abcdefgh");
    }

    #[test]
    fn echo_for_someone_else() {
        let request = echo_request(Ipv4Addr::new(10, 0, 0, 9), 1, 1, b"ping");
        let copy = request.clone();
        assert_eq!(responder().reply(&request), None);
        assert_eq!(request, copy);
    }

    #[test]
    fn padded_echo_request_keeps_its_padding() {
        let mut request = echo_request(LOCAL_IP, 1, 1, b"");
        request.resize(60, 0);
        let reply = responder().reply(&request).unwrap();
        assert_eq!(reply.frame().len(), 60);
        assert!(reply.frame()[42..].iter().all(|&b| b == 0));
    }

    #[test]
    fn rules_can_be_disabled() {
        let arp_only = responder().with_rules(ResponderRules {
            arp: true,
            icmp_echo: false,
        });
        assert!(arp_only.reply(&arp_request(LOCAL_IP)).is_some());
        assert!(arp_only.reply(&echo_request(LOCAL_IP, 1, 1, b"")).is_none());

        let icmp_only = responder().with_rules(ResponderRules {
            arp: false,
            icmp_echo: true,
        });
        assert!(icmp_only.reply(&arp_request(LOCAL_IP)).is_none());
        assert!(icmp_only.reply(&echo_request(LOCAL_IP, 1, 1, b"")).is_some());
    }

    #[test]
    fn process_counts_frames() {
        let mut responder = responder();
        assert!(responder.process(&arp_request(LOCAL_IP)).is_some());
        assert!(responder.process(&arp_request(PEER_IP)).is_none());
        assert!(responder.process(&[0u8; 10]).is_none());

        let stats = responder.stats();
        assert_eq!(stats.frames_received, 3);
        assert_eq!(stats.frames_ignored, 2);
        assert_eq!(stats.replies(), 0);
    }

    #[test]
    fn send_counts_by_kind() {
        let mut responder = responder();
        let mut transport = MockTransport::new();

        let arp = responder.reply(&arp_request(LOCAL_IP)).unwrap();
        let echo = responder.reply(&echo_request(LOCAL_IP, 1, 1, b"")).unwrap();
        responder.send(&mut transport, arp.clone()).unwrap();
        responder.send(&mut transport, echo.clone()).unwrap();

        assert_eq!(transport.injected, vec![arp.into_frame(), echo.into_frame()]);
        assert_eq!(responder.stats().arp_replies, 1);
        assert_eq!(responder.stats().echo_replies, 1);
    }

    #[test]
    fn send_drops_on_backpressure() {
        let mut responder = responder().with_policy(InjectPolicy::bounded(2));
        let mut transport = MockTransport::new();
        transport.script_writable(&[false, false]);

        let reply = responder.reply(&arp_request(LOCAL_IP)).unwrap();
        responder.send(&mut transport, reply).unwrap();

        assert!(transport.injected.is_empty());
        assert_eq!(responder.stats().replies_dropped, 1);
        assert_eq!(responder.stats().arp_replies, 0);
    }

    #[test]
    fn send_propagates_transport_errors() {
        let mut responder = responder();
        let mut transport = MockTransport::new();
        transport.fail_writes();

        let reply = responder.reply(&arp_request(LOCAL_IP)).unwrap();
        assert!(responder.send(&mut transport, reply).is_err());
        assert_eq!(responder.stats().replies_dropped, 0);
    }
}
