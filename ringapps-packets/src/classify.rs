//! Sorts raw frames into the kinds of traffic the responder knows how to answer.
//!
//! Classification only looks at bytes, and copies whatever fields it extracts, so it can run
//! directly on memory borrowed from a transport. Short or malformed frames are `Other`.

use crate::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Arp(ArpMessage),
    IcmpEchoRequest(EchoRequest),
    Other,
}

impl Classification {
    pub fn kind(&self) -> &'static str {
        match self {
            Classification::Arp(_) => "arp",
            Classification::IcmpEchoRequest(_) => "icmp-echo-request",
            Classification::Other => "other",
        }
    }
}

pub fn classify(frame: &[u8]) -> Classification {
    // https://en.wikipedia.org/wiki/EtherType
    match ether_type_of(frame) {
        Some(ARP_ETHER_TYPE) => ArpMessage::parse(frame)
            .map(Classification::Arp)
            .unwrap_or(Classification::Other),
        Some(IPV4_ETHER_TYPE) => EchoRequest::parse(frame)
            .map(Classification::IcmpEchoRequest)
            .unwrap_or(Classification::Other),
        _ => Classification::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn arp_request() -> EthernetFrame {
        ArpFrame::request(
            MacAddr::new([1, 2, 3, 4, 5, 6]),
            Ipv4Addr::new(10, 0, 0, 2),
            Ipv4Addr::new(10, 0, 0, 1),
        )
        .frame()
    }

    fn ping(protocol: IpProtocol) -> EthernetFrame {
        let mut ipv4 = Ipv4Packet::encap_icmp(IcmpPacket::echo_request(1, 1, b"ping"));
        ipv4.set_protocol(protocol);
        ipv4.set_src_addr(Ipv4Addr::new(10, 0, 0, 2));
        ipv4.set_dest_addr(Ipv4Addr::new(10, 0, 0, 1));
        ipv4.set_checksum();
        EthernetFrame::encap_ipv4(ipv4)
    }

    #[test]
    fn classifies_arp() {
        match classify(&arp_request().data) {
            Classification::Arp(msg) => assert_eq!(msg.target_ip, Ipv4Addr::new(10, 0, 0, 1)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn classifies_echo_request() {
        match classify(&ping(IpProtocol::ICMP).data) {
            Classification::IcmpEchoRequest(req) => {
                assert_eq!(req.dest_ip, Ipv4Addr::new(10, 0, 0, 1));
                assert_eq!(req.payload_len, 4);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn other_traffic() {
        assert_eq!(classify(&ping(IpProtocol::UDP).data), Classification::Other);

        let mut frame = ping(IpProtocol::ICMP);
        frame.set_ether_type(0x86DD);
        assert_eq!(classify(&frame.data), Classification::Other);
    }

    #[test]
    fn truncated_frames_are_other() {
        let arp = arp_request();
        let icmp = ping(IpProtocol::ICMP);
        for len in 0..arp.data.len() {
            assert_eq!(classify(&arp.data[..len]), Classification::Other);
        }
        for len in 0..icmp.data.len() {
            assert_eq!(classify(&icmp.data[..len]), Classification::Other);
        }
        assert_eq!(classify(&[]), Classification::Other);
    }

    #[test]
    fn kind_names() {
        assert_eq!(classify(&arp_request().data).kind(), "arp");
        assert_eq!(classify(&[0u8; 60]).kind(), "other");
    }
}
