use crate::classifier::{Classifier, ClassifyIp, ClassifyIpType};
use crate::pipeline::{DropReason, Egress, Ingress, Router, Verdict};
use crate::processor::{DecIpv4HopLimit, Processor};
use crate::state::Interface;
use crate::utils::icmp::{IcmpReply, IcmpResponder};
use static_router_packets::*;
use std::convert::TryFrom;
use tracing::{debug, trace};

/// Runs the forwarding decision for one frame at a time.
///
/// The checks happen in a fixed order and the first one that applies settles the frame:
///
/// 1. anything but a well formed IPv4 frame is dropped
/// 2. ICMP to the receiving interface's own address gets an echo reply if it is an echo
///    request, and is dropped otherwise
/// 3. a bad header checksum is dropped
/// 4. a TTL of 1 or less gets a time exceeded error
/// 5. a destination without a route gets a destination unreachable error
/// 6. a next hop missing from the neighbor table is dropped
/// 7. everything else has its MACs rewritten and its TTL decremented and is forwarded
pub struct Forwarder {
    router: Router,
    classify_ip: ClassifyIp,
    dec_ttl: DecIpv4HopLimit,
    icmp: IcmpResponder,
}

impl Forwarder {
    pub fn new(router: Router) -> Forwarder {
        Forwarder {
            router,
            classify_ip: ClassifyIp,
            dec_ttl: DecIpv4HopLimit::new(),
            icmp: IcmpResponder::new(),
        }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn decide(&mut self, ingress: Ingress) -> Verdict {
        let interface = match self.router.interface(ingress.interface) {
            Some(interface) => interface,
            None => return Verdict::Drop(DropReason::UnknownInterface),
        };

        if ingress.frame.len() > MAX_FRAME_LEN {
            return Verdict::Drop(DropReason::Malformed);
        }
        let frame = match EthernetFrame::from_buffer(ingress.frame, 0) {
            Ok(frame) => frame,
            Err(_) => return Verdict::Drop(DropReason::Malformed),
        };
        if let ClassifyIpType::Other(_) = self.classify_ip.classify(&frame) {
            return Verdict::Drop(DropReason::NotIpv4);
        }
        let packet = match Ipv4Packet::try_from(frame) {
            Ok(packet) => packet,
            Err(_) => return Verdict::Drop(DropReason::Malformed),
        };

        if packet.protocol() == IpProtocol::ICMP && packet.dest_addr() == interface.ipv4_addr {
            return match self.icmp.generate(&packet, IcmpReply::EchoReply, interface) {
                Some(frame) => Verdict::Reply(
                    IcmpReply::EchoReply,
                    Egress {
                        interface: interface.id,
                        frame,
                    },
                ),
                None => Verdict::Drop(DropReason::UnhandledLocal),
            };
        }

        if !packet.validate_checksum() {
            return Verdict::Drop(DropReason::BadChecksum);
        }

        if packet.ttl() <= 1 {
            return self.error_reply(&packet, IcmpReply::TimeExceeded, interface);
        }

        let route = match self.router.routes().lookup(packet.dest_addr()) {
            Some(route) => *route,
            None => {
                return self.error_reply(&packet, IcmpReply::DestinationUnreachable, interface)
            }
        };

        let next_hop_mac = match self.router.neighbors().lookup(route.next_hop) {
            Some(mac) => mac,
            None => return Verdict::Drop(DropReason::NoNeighbor),
        };
        let egress_mac = match self.router.interface(route.interface) {
            Some(egress) => egress.mac_addr,
            None => return Verdict::Drop(DropReason::UnknownInterface),
        };

        let packet = match self.dec_ttl.process(packet) {
            Some(packet) => packet,
            None => return Verdict::Drop(DropReason::Malformed),
        };
        let mut frame = match EthernetFrame::try_from(packet) {
            Ok(frame) => frame,
            Err(_) => return Verdict::Drop(DropReason::Malformed),
        };
        frame.set_dest_mac(next_hop_mac);
        frame.set_src_mac(egress_mac);

        Verdict::Forward(Egress {
            interface: route.interface,
            frame,
        })
    }

    fn error_reply(&self, packet: &Ipv4Packet, reply: IcmpReply, interface: &Interface) -> Verdict {
        match self.icmp.generate(packet, reply, interface) {
            Some(frame) => Verdict::Reply(
                reply,
                Egress {
                    interface: interface.id,
                    frame,
                },
            ),
            None => Verdict::Drop(DropReason::IcmpErrorSuppressed),
        }
    }
}

impl Processor for Forwarder {
    type Input = Ingress;
    type Output = Egress;

    fn process(&mut self, ingress: Self::Input) -> Option<Self::Output> {
        let received_on = ingress.interface;
        let verdict = self.decide(ingress);
        match &verdict {
            Verdict::Forward(egress) => {
                trace!(from = received_on, to = egress.interface, "forward");
            }
            Verdict::Reply(reply, _) => {
                debug!(interface = received_on, ?reply, "icmp reply");
            }
            Verdict::Drop(reason) => {
                debug!(interface = received_on, %reason, "drop");
            }
        }
        verdict.into_egress()
    }
}
