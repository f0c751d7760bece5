use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};
use std::net::Ipv4Addr;

#[derive(Clone, Debug)]
pub struct Ipv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: usize,
    pub payload_offset: usize,
}

impl Packet for Ipv4Packet {}

impl Ipv4Packet {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: usize,
    ) -> Result<Ipv4Packet, &'static str> {
        // Header of Ethernet Frame: 14 bytes
        // Header of IPv4 Frame: 20 bytes
        if data.len() < layer3_offset + IPV4_MIN_HDR_LEN {
            return Err("Data is too short to be an IPv4 Packet");
        }

        // Check version number
        let version: u8 = (data[layer3_offset] & 0xF0) >> 4;
        if version != 4 {
            return Err("Packet has incorrect version, is not Ipv4Packet");
        }

        // This is the header length in 32bit words
        let header_len = ((data[layer3_offset] & 0x0F) as usize) * 4;
        if header_len < IPV4_MIN_HDR_LEN {
            return Err("Packet has invalid header length field");
        }

        // TotalLen is the 3rd and 4th byte of the IP Header. Ethernet pads short frames, so the
        // buffer may run past the end of the datagram, but never stop short of it.
        let total_len = u16::from_be_bytes(
            data[layer3_offset + 2..=layer3_offset + 3]
                .try_into()
                .unwrap(),
        ) as usize;
        if total_len < header_len || data.len() < layer3_offset + total_len {
            return Err("Packet has invalid total length field");
        }

        Ok(Ipv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            payload_offset: layer3_offset + header_len,
        })
    }

    /// Returns a 20 byte header with the version and header length filled in and every other
    /// field zeroed. This function allocates a new array to hold the header.
    pub fn empty() -> Ipv4Packet {
        let mut data = vec![0; IPV4_MIN_HDR_LEN];
        data[0] = 0x45;
        data[3] = IPV4_MIN_HDR_LEN as u8;
        Ipv4Packet {
            data,
            layer2_offset: None,
            layer3_offset: 0,
            payload_offset: IPV4_MIN_HDR_LEN,
        }
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

    pub fn ihl(&self) -> u8 {
        self.data[self.layer3_offset] & 0x0F
    }

    /// Header length in bytes, options included.
    pub fn header_len(&self) -> usize {
        self.payload_offset - self.layer3_offset
    }

    /// Offset one past the last byte of the datagram. Anything after it is link layer padding.
    pub fn end_offset(&self) -> usize {
        self.layer3_offset + self.total_len() as usize
    }

    pub fn header(&self) -> &[u8] {
        &self.data[self.layer3_offset..self.payload_offset]
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..self.end_offset()])
    }

    /// Replaces the payload and updates the total length field. Any link layer padding
    /// is discarded along with the old payload.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);

        let total_len = (payload.len() + self.header_len()) as u16;
        self.set_total_len(total_len);

        self.data.reserve_exact(payload.len());
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

    fn set_total_len(&mut self, total_len: u16) {
        self.data[self.layer3_offset + 2..=self.layer3_offset + 3]
            .copy_from_slice(&total_len.to_be_bytes());
    }

    pub fn ttl(&self) -> u8 {
        self.data[self.layer3_offset + 8]
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

    fn store_checksum(&mut self, checksum: u16) {
        self.data[self.layer3_offset + 10..=self.layer3_offset + 11]
            .copy_from_slice(&checksum.to_be_bytes());
    }

    pub fn dscp(&self) -> u8 {
        self.data[self.layer3_offset + 1] >> 2
    }

    pub fn ecn(&self) -> u8 {
        self.data[self.layer3_offset + 1] & 0x03
    }

    pub fn set_tos(&mut self, tos: u8) {
        self.data[self.layer3_offset + 1] = tos;
    }

    pub fn identification(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer3_offset + 4..=self.layer3_offset + 5]
                .try_into()
                .unwrap(),
        )
    }

    pub fn set_identification(&mut self, identification: u16) {
        self.data[self.layer3_offset + 4..=self.layer3_offset + 5]
            .copy_from_slice(&identification.to_be_bytes());
    }

    pub fn fragment_offset(&self) -> u16 {
        u16::from_be_bytes([
            self.data[self.layer3_offset + 6] & 0x1F,
            self.data[self.layer3_offset + 7],
        ])
    }

    /// Returns tuple of (Don't Fragment, More Fragments)
    pub fn flags(&self) -> (bool, bool) {
        let df = (self.data[self.layer3_offset + 6] & 0x40) != 0;
        let mf = (self.data[self.layer3_offset + 6] & 0x20) != 0;
        (df, mf)
    }

    /// Clears both fragmentation flags and the fragment offset.
    pub fn clear_fragmentation(&mut self) {
        self.data[self.layer3_offset + 6] = 0;
        self.data[self.layer3_offset + 7] = 0;
    }

    /// Verifies the IP header checksum. The sum over a header that still carries a valid
    /// checksum is zero.
    pub fn validate_checksum(&self) -> bool {
        checksum::checksum(self.header()) == 0
    }

    /// Calculates what the checksum should be set to given the current header
    pub fn calculate_checksum(&self) -> u16 {
        let mut header = self.header().to_vec();
        header[10] = 0;
        header[11] = 0;
        checksum::checksum(&header)
    }

    /// Sets checksum field to valid value
    pub fn set_checksum(&mut self) {
        let new_checksum = self.calculate_checksum();
        self.store_checksum(new_checksum);
    }

    /// Decrements the TTL by one and patches the checksum from the changed TTL/protocol word
    /// rather than summing the whole header again. A TTL of 0 is left untouched.
    pub fn decrement_ttl(&mut self) {
        let ttl = self.ttl();
        if ttl == 0 {
            return;
        }
        let protocol = self.data[self.layer3_offset + 9];
        let old_word = u16::from_be_bytes([ttl, protocol]);
        let new_word = u16::from_be_bytes([ttl - 1, protocol]);

        self.set_ttl(ttl - 1);
        let updated = checksum::incremental_update(self.checksum(), old_word, new_word);
        self.store_checksum(updated);
    }

    /// Wraps an ICMP message in a fresh IPv4 header. Addresses, TTL and checksum are left for
    /// the caller to fill in.
    pub fn encap_icmpv4(icmp: Icmpv4Packet) -> Ipv4Packet {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_payload(&icmp.data[icmp.layer4_offset..icmp.end_offset]);
        packet
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
            return Err("Frame does not carry an IPv4 packet");
        }
        Ipv4Packet::from_buffer(frame.data, Some(frame.layer2_offset), frame.payload_offset)
    }
}

impl TryFrom<Icmpv4Packet> for Ipv4Packet {
    type Error = &'static str;

    fn try_from(packet: Icmpv4Packet) -> Result<Self, Self::Error> {
        if let Some(layer3_offset) = packet.layer3_offset {
            Ipv4Packet::from_buffer(packet.data, packet.layer2_offset, layer3_offset)
        } else {
            Err("ICMP Packet does not contain an IP Packet")
        }
    }
}
