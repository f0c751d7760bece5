use crate::state::Interface;
use static_router_packets::*;
use std::cmp;
use std::convert::TryFrom;

/// Bytes of the offending datagram's payload quoted after its header in an ICMP error
const QUOTED_PAYLOAD_LEN: usize = 8;

/// The replies the router knows how to originate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcmpReply {
    EchoReply,
    /// TTL exceeded in transit
    TimeExceeded,
    /// Net unreachable
    DestinationUnreachable,
}

impl IcmpReply {
    pub fn message(self) -> Icmpv4Message {
        match self {
            IcmpReply::EchoReply => Icmpv4Message::EchoReply,
            IcmpReply::TimeExceeded => Icmpv4Message::TimeExceeded,
            IcmpReply::DestinationUnreachable => Icmpv4Message::DstUnreachable,
        }
    }

    pub fn code(self) -> u8 {
        0
    }
}

/// Builds complete Ethernet frames carrying ICMP replies to a received datagram.
///
/// The reply goes back the way the datagram came: Ethernet addresses are swapped, the IP
/// destination is the datagram's source and the IP source is the address of the interface
/// the datagram arrived on.
pub struct IcmpResponder {
    ttl: u8,
    identification: u16,
}

impl Default for IcmpResponder {
    fn default() -> Self {
        IcmpResponder::new()
    }
}

impl IcmpResponder {
    pub fn new() -> IcmpResponder {
        IcmpResponder {
            ttl: 64,
            identification: 1,
        }
    }

    /// Create the reply frame for `original`. Return `None` if no reply should be sent and the
    /// datagram should be silently discarded instead: errors about datagrams that must not
    /// trigger errors, an echo reply to something that is not an echo request, or a datagram
    /// that did not arrive in an Ethernet frame.
    ///
    /// # Arguments
    ///
    /// * `original` - The received datagram, still inside the frame it arrived in
    /// * `reply` - Which reply to build
    /// * `interface` - The interface the datagram arrived on
    pub fn generate(
        &self,
        original: &Ipv4Packet,
        reply: IcmpReply,
        interface: &Interface,
    ) -> Option<EthernetFrame> {
        let layer2_offset = original.layer2_offset?;
        let link = EthernetFrame::from_buffer(
            original.data[layer2_offset..layer2_offset + ETHERNET_HDR_LEN].to_vec(),
            0,
        )
        .ok()?;

        let icmp = match reply {
            IcmpReply::EchoReply => self.echo_reply(original)?,
            IcmpReply::TimeExceeded | IcmpReply::DestinationUnreachable => {
                if !self.should_generate_error(original) {
                    return None;
                }
                self.error_message(original, reply)
            }
        };

        let mut packet = Ipv4Packet::encap_icmpv4(icmp);
        packet.set_tos(0);
        packet.clear_fragmentation();
        packet.set_ttl(self.ttl);
        packet.set_identification(self.identification);
        packet.set_src_addr(interface.ipv4_addr);
        packet.set_dest_addr(original.src_addr());
        packet.set_checksum();

        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.set_dest_mac(link.src_mac());
        frame.set_src_mac(link.dest_mac());
        Some(frame)
    }

    // Identifier, sequence number and data come back unchanged
    fn echo_reply(&self, original: &Ipv4Packet) -> Option<Icmpv4Packet> {
        let request = Icmpv4Packet::from_buffer(original.payload().to_vec(), None, None, 0).ok()?;
        if request.msg_type() != Icmpv4Message::EchoRequest {
            return None;
        }

        let mut icmp = Icmpv4Packet::empty();
        icmp.set_msg_type(IcmpReply::EchoReply.message());
        icmp.set_msg_code(IcmpReply::EchoReply.code());
        icmp.set_rest_of_header(request.rest_of_header());
        icmp.set_payload(&request.payload());
        icmp.set_checksum();
        Some(icmp)
    }

    // 4 unused bytes, then the offending header and the start of its payload
    fn error_message(&self, original: &Ipv4Packet, reply: IcmpReply) -> Icmpv4Packet {
        let quoted_len = cmp::min(
            original.header_len() + QUOTED_PAYLOAD_LEN,
            original.total_len() as usize,
        );
        let start = original.layer3_offset;

        let mut icmp = Icmpv4Packet::empty();
        icmp.set_msg_type(reply.message());
        icmp.set_msg_code(reply.code());
        icmp.set_rest_of_header([0; 4]);
        icmp.set_payload(&original.data[start..start + quoted_len]);
        icmp.set_checksum();
        icmp
    }

    /// Performs checks based on RFC 1812 4.3.2.7 (When Not to Send ICMP Errors)
    pub fn should_generate_error(&self, packet: &Ipv4Packet) -> bool {
        // Only the first fragment
        if packet.fragment_offset() != 0 {
            return false;
        }
        // Avoid infinite loops, no errors from errors
        if packet.protocol() == IpProtocol::ICMP {
            match Icmpv4Packet::try_from(packet.clone()) {
                Ok(icmp) if !icmp.msg_type().is_error() => {}
                _ => return false,
            }
        }
        let src = packet.src_addr();
        !(src.is_unspecified() || src.is_broadcast() || src.is_multicast() || src.is_loopback())
    }
}
