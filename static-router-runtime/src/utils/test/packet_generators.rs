use static_router_packets::*;
use std::net::Ipv4Addr;

/// Builds well formed Ethernet/IPv4 frames for feeding the forwarder in tests.
///
/// Every field has a usable default, so a test only names what it cares about:
///
/// ```ignore
/// let frame = FrameGenerator::new().dest_ip(Ipv4Addr::new(10, 0, 1, 5)).ttl(1).udp(b"data");
/// ```
#[derive(Debug, Clone)]
pub struct FrameGenerator {
    src_mac: MacAddr,
    dest_mac: MacAddr,
    src_ip: Ipv4Addr,
    dest_ip: Ipv4Addr,
    ttl: u8,
    identification: u16,
}

impl Default for FrameGenerator {
    fn default() -> Self {
        FrameGenerator::new()
    }
}

impl FrameGenerator {
    pub fn new() -> FrameGenerator {
        FrameGenerator {
            src_mac: MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0xaa]),
            dest_mac: MacAddr::new([0x02, 0x00, 0x00, 0x00, 0x00, 0xbb]),
            src_ip: Ipv4Addr::new(192, 168, 0, 100),
            dest_ip: Ipv4Addr::new(10, 0, 1, 5),
            ttl: 64,
            identification: 0x4242,
        }
    }

    pub fn src_mac(mut self, mac: MacAddr) -> Self {
        self.src_mac = mac;
        self
    }

    pub fn dest_mac(mut self, mac: MacAddr) -> Self {
        self.dest_mac = mac;
        self
    }

    pub fn src_ip(mut self, ip: Ipv4Addr) -> Self {
        self.src_ip = ip;
        self
    }

    pub fn dest_ip(mut self, ip: Ipv4Addr) -> Self {
        self.dest_ip = ip;
        self
    }

    pub fn ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn identification(mut self, identification: u16) -> Self {
        self.identification = identification;
        self
    }

    /// UDP datagram from port 4000 to port 53. The UDP checksum is left at 0, which IPv4
    /// allows.
    pub fn udp(&self, payload: &[u8]) -> Vec<u8> {
        let len = (8 + payload.len()) as u16;
        let mut udp = Vec::with_capacity(len as usize);
        udp.extend(&4000u16.to_be_bytes());
        udp.extend(&53u16.to_be_bytes());
        udp.extend(&len.to_be_bytes());
        udp.extend(&[0, 0]);
        udp.extend(payload);
        self.ipv4(IpProtocol::UDP, &udp)
    }

    pub fn echo_request(&self, identifier: u16, sequence: u16, data: &[u8]) -> Vec<u8> {
        let id = identifier.to_be_bytes();
        let seq = sequence.to_be_bytes();
        self.icmp(
            Icmpv4Message::EchoRequest,
            0,
            [id[0], id[1], seq[0], seq[1]],
            data,
        )
    }

    pub fn icmp(&self, msg: Icmpv4Message, code: u8, rest: [u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut icmp = Icmpv4Packet::empty();
        icmp.set_msg_type(msg);
        icmp.set_msg_code(code);
        icmp.set_rest_of_header(rest);
        icmp.set_payload(payload);
        icmp.set_checksum();
        self.ipv4(IpProtocol::ICMP, &icmp.data)
    }

    /// Wraps `payload` in IPv4 and Ethernet headers with a valid IP checksum.
    pub fn ipv4(&self, protocol: IpProtocol, payload: &[u8]) -> Vec<u8> {
        let mut packet = Ipv4Packet::empty();
        packet.set_protocol(protocol);
        packet.set_ttl(self.ttl);
        packet.set_identification(self.identification);
        packet.set_src_addr(self.src_ip);
        packet.set_dest_addr(self.dest_ip);
        packet.set_payload(payload);
        packet.set_checksum();

        let mut frame = EthernetFrame::encap_ipv4(packet);
        frame.set_src_mac(self.src_mac);
        frame.set_dest_mac(self.dest_mac);
        frame.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryFrom;

    #[test]
    fn generates_valid_frames() {
        let data = FrameGenerator::new().ttl(9).udp(&[1, 2, 3, 4]);
        assert_eq!(data.len(), 14 + 20 + 8 + 4);

        let frame = EthernetFrame::from_buffer(data, 0).unwrap();
        assert_eq!(frame.dest_mac(), MacAddr::new([0x02, 0, 0, 0, 0, 0xbb]));
        let packet = Ipv4Packet::try_from(frame).unwrap();
        assert!(packet.validate_checksum());
        assert_eq!(packet.ttl(), 9);
        assert_eq!(packet.protocol(), IpProtocol::UDP);
        assert_eq!(packet.total_len(), 32);
    }

    #[test]
    fn generates_echo_requests() {
        let data = FrameGenerator::new().echo_request(1, 2, b"abc");
        let frame = EthernetFrame::from_buffer(data, 0).unwrap();
        let icmp = Icmpv4Packet::try_from(Ipv4Packet::try_from(frame).unwrap()).unwrap();
        assert_eq!(icmp.msg_type(), Icmpv4Message::EchoRequest);
        assert_eq!(icmp.rest_of_header(), [0, 1, 0, 2]);
        assert!(icmp.validate_checksum());
    }
}
