use crate::*;
use std::convert::{TryFrom, TryInto};

#[derive(Clone, Debug)]
pub struct EthernetFrame {
    pub data: PacketData,
    pub payload_offset: usize,
}

impl EthernetFrame {
    pub fn from_buffer(frame: PacketData) -> Result<EthernetFrame, &'static str> {
        // Ethernet II frames must be at least the header, which is 14bytes
        // 0                    6                    12                      14
        // |---6 byte Dest_MAC--|---6 byte Src_MAC---|--2 Byte EtherType---|
        // 802.1Q tagged frames are not recognised; their ether type reads as 0x8100.

        if frame.len() < ETHERNET_HEADER_LEN {
            return Err("Frame is less than the minimum of 14 bytes");
        }

        Ok(EthernetFrame {
            data: frame,
            payload_offset: ETHERNET_HEADER_LEN,
        })
    }

    /// Copies `bytes` into a new frame. This is how borrowed frames handed out by a transport
    /// become something that can be rewritten.
    pub fn copy_from_slice(bytes: &[u8]) -> Result<EthernetFrame, &'static str> {
        EthernetFrame::from_buffer(bytes.to_vec())
    }

    /// Returns an EthernetFrame with a zeroed header and `payload_len` zeroed payload bytes.
    pub fn zeroed(payload_len: usize) -> EthernetFrame {
        EthernetFrame {
            data: vec![0; ETHERNET_HEADER_LEN + payload_len],
            payload_offset: ETHERNET_HEADER_LEN,
        }
    }

    pub fn dest_mac(&self) -> MacAddr {
        let bytes = <[u8; 6]>::try_from(&self.data[0..6]).unwrap();
        MacAddr::new(bytes)
    }

    pub fn src_mac(&self) -> MacAddr {
        let bytes = <[u8; 6]>::try_from(&self.data[6..12]).unwrap();
        MacAddr::new(bytes)
    }

    pub fn set_dest_mac(&mut self, mac: MacAddr) {
        self.data[..6].copy_from_slice(&mac.bytes[..6]);
    }

    pub fn set_src_mac(&mut self, mac: MacAddr) {
        self.data[6..12].copy_from_slice(&mac.bytes[..6]);
    }

    pub fn ether_type(&self) -> u16 {
        u16::from_be_bytes(self.data[12..=13].try_into().unwrap())
    }

    pub fn set_ether_type(&mut self, ether_type: u16) {
        self.data[12..=13].copy_from_slice(&ether_type.to_be_bytes());
    }

    /// Addresses the frame back to whoever sent it, from `local`.
    pub fn return_to_sender(&mut self, local: MacAddr) {
        let sender = self.src_mac();
        self.set_dest_mac(sender);
        self.set_src_mac(local);
    }

    pub fn payload(&self) -> &[u8] {
        &self.data[self.payload_offset..]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.payload_offset..]
    }

    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
    }

    /// Hands the underlying bytes back to the caller.
    pub fn into_inner(self) -> PacketData {
        self.data
    }
}

/// EthernetFrames are considered the same if they carry the same bytes.
impl PartialEq for EthernetFrame {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for EthernetFrame {}

/// Reads the ether type out of a raw frame without taking ownership of it.
pub fn ether_type_of(frame: &[u8]) -> Option<u16> {
    frame
        .get(12..14)
        .map(|bytes| u16::from_be_bytes([bytes[0], bytes[1]]))
}
