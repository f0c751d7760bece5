use crate::processor::Processor;
use static_router_packets::Ipv4Packet;

/// Decrements the TTL of an IPv4 packet and patches the header checksum incrementally.
///
/// Packets that already carry a TTL of 0 pass through untouched; deciding whether a packet may
/// be forwarded at all is up to the caller.
#[derive(Default)]
pub struct DecIpv4HopLimit {}

impl DecIpv4HopLimit {
    pub fn new() -> DecIpv4HopLimit {
        DecIpv4HopLimit {}
    }
}

impl Processor for DecIpv4HopLimit {
    type Input = Ipv4Packet;
    type Output = Ipv4Packet;

    fn process(&mut self, mut packet: Self::Input) -> Option<Self::Output> {
        packet.decrement_ttl();
        Some(packet)
    }
}
