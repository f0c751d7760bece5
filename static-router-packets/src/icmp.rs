use crate::*;
use std::borrow::Cow;
use std::convert::{TryFrom, TryInto};

/// ICMPv4 message types handled by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icmpv4Message {
    EchoReply,
    DstUnreachable,
    Redirect,
    EchoRequest,
    TimeExceeded,
    ParamProblem,
    Unknown(u8),
}

impl From<u8> for Icmpv4Message {
    fn from(msg_type: u8) -> Self {
        match msg_type {
            0 => Icmpv4Message::EchoReply,
            3 => Icmpv4Message::DstUnreachable,
            5 => Icmpv4Message::Redirect,
            8 => Icmpv4Message::EchoRequest,
            11 => Icmpv4Message::TimeExceeded,
            12 => Icmpv4Message::ParamProblem,
            other => Icmpv4Message::Unknown(other),
        }
    }
}

impl From<Icmpv4Message> for u8 {
    fn from(msg: Icmpv4Message) -> Self {
        match msg {
            Icmpv4Message::EchoReply => 0,
            Icmpv4Message::DstUnreachable => 3,
            Icmpv4Message::Redirect => 5,
            Icmpv4Message::EchoRequest => 8,
            Icmpv4Message::TimeExceeded => 11,
            Icmpv4Message::ParamProblem => 12,
            Icmpv4Message::Unknown(other) => other,
        }
    }
}

impl Icmpv4Message {
    /// Error messages, as opposed to queries. RFC 1812 forbids answering these with another error.
    pub fn is_error(self) -> bool {
        match self {
            Icmpv4Message::DstUnreachable
            | Icmpv4Message::Redirect
            | Icmpv4Message::TimeExceeded
            | Icmpv4Message::ParamProblem => true,
            _ => false,
        }
    }
}

///
/// ICMPv4 message as described in RFC 792:
/// https://tools.ietf.org/html/rfc792
///
/// 0        1        2                 4                                 8
/// |--type--|--code--|----checksum-----|------rest of header (4 bytes)---|--payload...
///
#[derive(Clone, Debug)]
pub struct Icmpv4Packet {
    pub data: PacketData,
    pub layer2_offset: Option<usize>,
    pub layer3_offset: Option<usize>,
    pub layer4_offset: usize,
    pub payload_offset: usize,
    pub end_offset: usize,
}

impl Packet for Icmpv4Packet {}

impl Icmpv4Packet {
    pub fn from_buffer(
        data: PacketData,
        layer2_offset: Option<usize>,
        layer3_offset: Option<usize>,
        layer4_offset: usize,
    ) -> Result<Icmpv4Packet, &'static str> {
        // Inside an IPv4 packet the message ends where the datagram does, not where the
        // buffer does.
        let end_offset = match layer3_offset {
            Some(layer3_offset) => {
                if get_ipv4_payload_type(&data, layer3_offset)? != IpProtocol::ICMP {
                    return Err("Protocol is incorrect, since it isn't ICMP");
                }
                let total_len = u16::from_be_bytes(
                    data[layer3_offset + 2..=layer3_offset + 3]
                        .try_into()
                        .unwrap(),
                );
                layer3_offset + total_len as usize
            }
            None => data.len(),
        };

        if end_offset > data.len() || end_offset < layer4_offset + ICMP_HDR_LEN {
            return Err("Packet too short to contain an ICMP header");
        }

        Ok(Icmpv4Packet {
            data,
            layer2_offset,
            layer3_offset,
            layer4_offset,
            payload_offset: layer4_offset + ICMP_HDR_LEN,
            end_offset,
        })
    }

    /// Returns an 8 byte, all zero ICMP header with no payload.
    pub fn empty() -> Icmpv4Packet {
        Icmpv4Packet {
            data: vec![0; ICMP_HDR_LEN],
            layer2_offset: None,
            layer3_offset: None,
            layer4_offset: 0,
            payload_offset: ICMP_HDR_LEN,
            end_offset: ICMP_HDR_LEN,
        }
    }

    pub fn msg_type(&self) -> Icmpv4Message {
        Icmpv4Message::from(self.data[self.layer4_offset])
    }

    pub fn set_msg_type(&mut self, msg: Icmpv4Message) {
        self.data[self.layer4_offset] = msg.into();
    }

    pub fn msg_code(&self) -> u8 {
        self.data[self.layer4_offset + 1]
    }

    pub fn set_msg_code(&mut self, code: u8) {
        self.data[self.layer4_offset + 1] = code;
    }

    pub fn checksum(&self) -> u16 {
        u16::from_be_bytes(
            self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
                .try_into()
                .unwrap(),
        )
    }

    /// The 4 message specific bytes following the checksum: identifier and sequence number for
    /// echo messages, unused for time exceeded and destination unreachable.
    pub fn rest_of_header(&self) -> [u8; 4] {
        self.data[self.layer4_offset + 4..self.layer4_offset + 8]
            .try_into()
            .unwrap()
    }

    pub fn set_rest_of_header(&mut self, rest: [u8; 4]) {
        self.data[self.layer4_offset + 4..self.layer4_offset + 8].copy_from_slice(&rest);
    }

    pub fn payload(&self) -> Cow<[u8]> {
        Cow::from(&self.data[self.payload_offset..self.end_offset])
    }

    /// Replaces the payload. Only meaningful for a message that is not yet wrapped in an
    /// IPv4 packet, since the IP total length is not touched.
    pub fn set_payload(&mut self, payload: &[u8]) {
        self.data.truncate(self.payload_offset);
        self.data.reserve_exact(payload.len());
        self.data.extend(payload);
        self.end_offset = self.data.len();
    }

    pub fn validate_checksum(&self) -> bool {
        checksum::checksum(&self.data[self.layer4_offset..self.end_offset]) == 0
    }

    /// Computes the checksum over header and payload and stores it.
    pub fn set_checksum(&mut self) {
        self.data[self.layer4_offset + 2] = 0;
        self.data[self.layer4_offset + 3] = 0;
        let sum = checksum::checksum(&self.data[self.layer4_offset..self.end_offset]);
        self.data[self.layer4_offset + 2..=self.layer4_offset + 3]
            .copy_from_slice(&sum.to_be_bytes());
    }
}

/// Icmpv4Packets are considered the same if they have the same data from the layer 4
/// header and onward.
impl PartialEq for Icmpv4Packet {
    fn eq(&self, other: &Self) -> bool {
        self.data[self.layer4_offset..self.end_offset]
            == other.data[other.layer4_offset..other.end_offset]
    }
}

impl Eq for Icmpv4Packet {}

impl TryFrom<Ipv4Packet> for Icmpv4Packet {
    type Error = &'static str;

    fn try_from(packet: Ipv4Packet) -> Result<Self, Self::Error> {
        Icmpv4Packet::from_buffer(
            packet.data,
            packet.layer2_offset,
            Some(packet.layer3_offset),
            packet.payload_offset,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    // Echo request from 192.168.1.2 to 192.168.1.1, id 0x1234 seq 1, 4 bytes of data
    fn echo_request() -> Vec<u8> {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_ttl(64);
        packet.set_src_addr(Ipv4Addr::new(192, 168, 1, 2));
        packet.set_dest_addr(Ipv4Addr::new(192, 168, 1, 1));

        let mut icmp = Icmpv4Packet::empty();
        icmp.set_msg_type(Icmpv4Message::EchoRequest);
        icmp.set_rest_of_header([0x12, 0x34, 0x00, 0x01]);
        icmp.set_payload(&[0xde, 0xad, 0xbe, 0xef]);
        icmp.set_checksum();

        packet.set_payload(&icmp.data);
        packet.set_checksum();
        EthernetFrame::encap_ipv4(packet).data
    }

    #[test]
    fn icmp_from_ipv4() {
        let frame = EthernetFrame::from_buffer(echo_request(), 0).unwrap();
        let packet = Ipv4Packet::try_from(frame).unwrap();
        let icmp = Icmpv4Packet::try_from(packet).unwrap();

        assert_eq!(icmp.layer2_offset, Some(0));
        assert_eq!(icmp.layer3_offset, Some(14));
        assert_eq!(icmp.layer4_offset, 34);
        assert_eq!(icmp.msg_type(), Icmpv4Message::EchoRequest);
        assert_eq!(icmp.msg_code(), 0);
        assert_eq!(icmp.rest_of_header(), [0x12, 0x34, 0x00, 0x01]);
        assert_eq!(icmp.payload(), vec![0xde, 0xad, 0xbe, 0xef]);
        assert!(icmp.validate_checksum());
    }

    #[test]
    fn ignores_link_padding() {
        let mut data = echo_request();
        data.extend(&[0u8; 10]);
        let frame = EthernetFrame::from_buffer(data, 0).unwrap();
        let icmp = Icmpv4Packet::try_from(Ipv4Packet::try_from(frame).unwrap()).unwrap();
        assert_eq!(icmp.payload().len(), 4);
        assert!(icmp.validate_checksum());
    }

    #[test]
    fn not_icmp() {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::UDP);
        packet.set_payload(&[0; 8]);
        assert_eq!(
            Icmpv4Packet::try_from(packet).unwrap_err(),
            "Protocol is incorrect, since it isn't ICMP"
        );
    }

    #[test]
    fn too_short() {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(IpProtocol::ICMP);
        packet.set_payload(&[8, 0, 0, 0]);
        assert_eq!(
            Icmpv4Packet::try_from(packet).unwrap_err(),
            "Packet too short to contain an ICMP header"
        );
    }

    #[test]
    fn set_checksum() {
        let mut icmp = Icmpv4Packet::empty();
        icmp.set_msg_type(Icmpv4Message::TimeExceeded);
        icmp.set_payload(&[0x45, 0x00, 0x00, 0x1c]);
        assert!(!icmp.validate_checksum());
        icmp.set_checksum();
        assert!(icmp.validate_checksum());
        // 0x0b00 + 0x4500 + 0x001c = 0x501c
        assert_eq!(icmp.checksum(), !0x501c);
    }

    #[test]
    fn error_types() {
        assert!(Icmpv4Message::TimeExceeded.is_error());
        assert!(Icmpv4Message::DstUnreachable.is_error());
        assert!(!Icmpv4Message::EchoRequest.is_error());
        assert!(!Icmpv4Message::EchoReply.is_error());
        assert_eq!(u8::from(Icmpv4Message::TimeExceeded), 11);
        assert_eq!(Icmpv4Message::from(42), Icmpv4Message::Unknown(42));
    }
}
