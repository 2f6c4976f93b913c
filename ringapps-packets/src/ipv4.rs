use crate::*;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

/// Length of an IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: usize,
    pub payload_offset: usize,
}

impl Ipv4Packet {
    pub(crate) fn new(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: usize,
    ) -> Result<Ipv4Packet, &'static str> {
        // Header of Ethernet Frame: 14 bytes
        // Header of IPv4 Frame: 20 bytes
        if data.len() < layer3_offset + IPV4_HEADER_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        // Check version number
        let version: u8 = (data[layer3_offset] & 0xF0) >> 4;
        if version != 4 {
            return Err("Packet has incorrect version, is not Ipv4Packet");
        }

        // This is the header length in 32bit words
        let ihl = (data[layer3_offset] & 0x0F) as usize;
        if ihl < 5 {
            return Err("Packet has invalid header length field");
        }
        let payload_offset = layer3_offset + (ihl * 4);

        // TotalLen is the 3rd and 4th byte of the IP Header. Link layers pad short packets, so
        // the data may run past it, but never fall short of it.
        let total_len = u16::from_be_bytes(
            data[layer3_offset + 2..=layer3_offset + 3]
                .try_into()
                .unwrap(),
        ) as usize;
        if total_len < ihl * 4 || data.len() < total_len + layer3_offset {
            return Err("Packet has invalid total length field");
        }

        Ok(Ipv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            payload_offset,
        })
    }

    /// Returns a bare 20 byte header with version, IHL, total length and a TTL of 64 filled in.
    pub fn empty() -> Ipv4Packet {
        let mut data = vec![0; IPV4_HEADER_LEN];
        data[0] = 0x45;
        data[2..4].copy_from_slice(&(IPV4_HEADER_LEN as u16).to_be_bytes());
        data[8] = 64;
        Ipv4Packet::new(data, None, 0).unwrap()
    }

    pub fn src_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 12..self.layer3_offset + 16]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_src_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 12..self.layer3_offset + 16].copy_from_slice(&addr.octets());
    }

    pub fn dest_addr(&self) -> Ipv4Addr {
        let data: [u8; 4] = self.data[self.layer3_offset + 16..self.layer3_offset + 20]
            .try_into()
            .unwrap();
        Ipv4Addr::from(data)
    }

    pub fn set_dest_addr(&mut self, addr: Ipv4Addr) {
        self.data[self.layer3_offset + 16..self.layer3_offset + 20].copy_from_slice(&addr.octets());
    }

    /// Exchanges source and destination. The checksum is left stale; call `set_checksum`.
    pub fn swap_addrs(&mut self) {
        let src = self.src_addr();
        let dest = self.dest_addr();
        self.set_src_addr(dest);
        self.set_dest_addr(src);
    }

    pub fn ihl(&self) -> u8 {
        self.data[self.layer3_offset] & 0x0F
    }

    pub fn header(&self) -> &[u8] {
        &self.data[self.layer3_offset..self.payload_offset]
    }

    /// The bytes covered by the total length field, without any link-layer padding.
    pub fn payload(&self) -> &[u8] {
        let end = self.layer3_offset + self.total_len() as usize;
        &self.data[self.payload_offset..end]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = self.layer3_offset + self.total_len() as usize;
        &mut self.data[self.payload_offset..end]
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        let payload_len = payload.len();

        self.data.truncate(self.payload_offset);

        let total_len = (payload_len as u16 + u16::from(self.ihl() * 4)).to_be_bytes();
        self.data[self.layer3_offset + 2..=self.layer3_offset + 3].copy_from_slice(&total_len);

        self.data.reserve_exact(payload_len);
        self.data.extend(payload);
    }

    pub fn protocol(&self) -> IpProtocol {
        IpProtocol::from(self.data[self.layer3_offset + 9])
    }

    pub fn set_protocol(&mut self, protocol: IpProtocol) {
        self.data[self.layer3_offset + 9] = protocol.into();
    }

    pub fn total_len(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_ttl(&mut self, ttl: u8) {
        self.data[self.layer3_offset + 8] = ttl;
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
                .try_into()
                .unwrap(),
        )
    }

    /// Verifies the IP header checksum.
    pub fn validate_checksum(&self) -> bool {
        checksum::verify(self.header())
    }

    /// Zeroes the checksum field, then fills it in from the current header.
    pub fn set_checksum(&mut self) {
        let offset = self.layer3_offset + 10;
        self.data[offset..offset + 2].copy_from_slice(&[0, 0]);
        let new_checksum = checksum::finalize(checksum::checksum(self.header(), 0));
        self.data[offset..offset + 2].copy_from_slice(&new_checksum.to_be_bytes());
    }
}

/// Ipv4Packets are considered the same if they have the same data from the layer 3
/// header and onward. This function does not consider the data before the start of
/// the IPv4 header.
impl PartialEq for Ipv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer3_offset..] == other.data[other.layer3_offset..]
    }
}

impl Eq for Ipv4Packet {}

/// Returns Ipv4 payload type, reads the header information to get the type
/// of IpProtocol payload is included.
pub fn get_ipv4_payload_type(
    data: &[u8],
    layer3_offset: usize,
) -> Result<IpProtocol, &'static str> {
    if data.len() <= layer3_offset + 9 || (data[layer3_offset] & 0xF0) != 0x40 {
        // Either data isn't big enough, or the version field does not indicate this is
        // an Ipv4 packet.
        return Err("Is not an Ipv4 packet");
    }
    Ok(IpProtocol::from(data[layer3_offset + 9]))
}

impl TryFrom<EthernetFrame> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(frame: EthernetFrame) -> Result<Self, Self::Error> {
        if frame.ether_type() != IPV4_ETHER_TYPE {
            return Err("Frame does not have IPv4 ether type.");
        }
        Ipv4Packet::new(frame.data, Some(0), frame.payload_offset)
    }
}

impl TryFrom<Ipv4Packet> for EthernetFrame {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        if packet.layer2_offset.is_some() {
            EthernetFrame::from_buffer(packet.data)
        } else {
            Err("IPv4 Packet does not contain an Ethernet Frame")
        }
    }
}

impl EthernetFrame {
    pub fn encap_ipv4(ipv4: Ipv4Packet) -> EthernetFrame {
        let mut frame = EthernetFrame::zeroed(0);
        frame.set_payload(&ipv4.data[ipv4.layer3_offset..]);
        frame.set_ether_type(IPV4_ETHER_TYPE);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::vec::Vec;

    fn frame_with(ip_data: &[u8]) -> EthernetFrame {
        let mac_data: Vec<u8> = vec![0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 8, 0];
        let mut frame = EthernetFrame::from_buffer(mac_data).unwrap();
        frame.set_payload(ip_data);
        frame
    }

    #[test]
    fn ipv4_packet() {
        let ip_data: Vec<u8> = vec![
            0x45, 0, 0, 20, 0, 0, 0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1,
        ];

        let packet = Ipv4Packet::try_from(frame_with(&ip_data)).unwrap();

        assert_eq!(packet.src_addr(), Ipv4Addr::new(192, 178, 128, 0));
        assert_eq!(packet.dest_addr(), Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(packet.ihl(), 5);
        assert_eq!(packet.payload().len(), 0);
        assert_eq!(packet.protocol(), IpProtocol::UDP);
        assert_eq!(packet.total_len(), 20);
        assert_eq!(packet.checksum(), 0);
    }

    #[test]
    fn validate_checksum() {
        let invalid_checksum_data: Vec<u8> = vec![
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0x61, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        let packet = Ipv4Packet::try_from(frame_with(&invalid_checksum_data)).unwrap();
        assert!(!packet.validate_checksum());

        let valid_checksum_data: Vec<u8> = vec![
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0xc0, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        let mut frame = EthernetFrame::try_from(packet).unwrap();
        frame.set_payload(&valid_checksum_data);
        let packet = Ipv4Packet::try_from(frame).unwrap();
        assert!(packet.validate_checksum());
    }

    #[test]
    fn set_checksum() {
        let ip_data: Vec<u8> = vec![
            0x45, 0x00, 0x00, 0x14, 0x00, 0x00, 0x40, 0x00, 0x40, 0x11, 0xb8, 0x61, 0xc0, 0xa8,
            0x00, 0x01, 0xc0, 0xa8, 0x00, 0xc7,
        ];
        let mut packet = Ipv4Packet::try_from(frame_with(&ip_data)).unwrap();
        assert!(!packet.validate_checksum());
        packet.set_checksum();
        assert!(packet.validate_checksum());
        assert_eq!(packet.checksum(), 0xb8c0);
    }

    #[test]
    fn swap_addrs() {
        let mut packet = Ipv4Packet::empty();
        packet.set_src_addr(Ipv4Addr::new(10, 0, 0, 1));
        packet.set_dest_addr(Ipv4Addr::new(10, 0, 0, 2));
        packet.swap_addrs();
        assert_eq!(packet.src_addr(), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(packet.dest_addr(), Ipv4Addr::new(10, 0, 0, 1));
    }

    #[test]
    fn padding_is_not_payload() {
        let mut packet = Ipv4Packet::empty();
        packet.set_payload(&[1, 2, 3, 4]);
        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.data.resize(60, 0);

        let packet = Ipv4Packet::try_from(frame).unwrap();
        assert_eq!(packet.payload(), &[1u8, 2, 3, 4][..]);
    }

    #[test]
    fn short_total_len_is_rejected() {
        let mut packet = Ipv4Packet::empty();
        packet.set_payload(&[1, 2, 3, 4]);
        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.data.truncate(frame.data.len() - 1);

        assert!(Ipv4Packet::try_from(frame).is_err());
    }

    #[test]
    fn wrong_ether_type_is_rejected() {
        let mut frame = EthernetFrame::encap_ipv4(Ipv4Packet::empty());
        frame.set_ether_type(ARP_ETHER_TYPE);
        assert!(Ipv4Packet::try_from(frame).is_err());
    }
}
