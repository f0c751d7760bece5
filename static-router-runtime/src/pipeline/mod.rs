//! # What is it?
//!
//! The forwarding pipeline turns each received frame into exactly one `Verdict`. The `Router` holds everything the
//! decision needs to know, the `Forwarder` walks the decision tree for one frame at a time, and `run` drives a
//! `Transport` until it closes or fails.

use crate::state::{Interface, InterfaceId, NeighborTable, RouteTable};
use crate::utils::icmp::IcmpReply;
use crate::{Result, RouterError};
use static_router_packets::EthernetFrame;
use std::fmt;

mod forwarder;
pub use self::forwarder::*;

mod transport;
pub use self::transport::*;

mod runner;
pub use self::runner::*;

/// Read-only router context: the two static tables and the identity of every interface.
#[derive(Debug, Clone)]
pub struct Router {
    routes: RouteTable,
    neighbors: NeighborTable,
    interfaces: Vec<Interface>,
}

impl Router {
    /// Interfaces must be listed in id order, starting from 0, and every route must leave
    /// through one of them.
    pub fn new(
        routes: RouteTable,
        neighbors: NeighborTable,
        interfaces: Vec<Interface>,
    ) -> Result<Router> {
        for (position, interface) in interfaces.iter().enumerate() {
            if interface.id != position {
                return Err(RouterError::Interface {
                    name: interface.name.clone(),
                    reason: format!("has id {} but is listed at position {}", interface.id, position),
                });
            }
        }

        if let Some(route) = routes.iter().find(|route| route.interface >= interfaces.len()) {
            return Err(RouterError::UnknownInterface {
                prefix: route.prefix,
                mask: route.mask,
                interface: route.interface,
            });
        }

        Ok(Router {
            routes,
            neighbors,
            interfaces,
        })
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn neighbors(&self) -> &NeighborTable {
        &self.neighbors
    }

    pub fn interface(&self, id: InterfaceId) -> Option<&Interface> {
        self.interfaces.get(id)
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }
}

/// A frame as it came off the wire
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingress {
    pub interface: InterfaceId,
    pub frame: Vec<u8>,
}

/// A frame ready to go out on `interface`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Egress {
    pub interface: InterfaceId,
    pub frame: EthernetFrame,
}

/// Why a frame was discarded without any reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Not an IPv4 Ethernet frame
    NotIpv4,
    /// Too short, too long, or an IPv4 header that does not hold together
    Malformed,
    /// Addressed to the router but not an echo request
    UnhandledLocal,
    BadChecksum,
    /// Route found, but the next hop is not in the neighbor table
    NoNeighbor,
    /// An ICMP error was due but RFC 1812 forbids sending it
    IcmpErrorSuppressed,
    /// Arrived on an interface the router does not know
    UnknownInterface,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let reason = match self {
            DropReason::NotIpv4 => "not ipv4",
            DropReason::Malformed => "malformed",
            DropReason::UnhandledLocal => "unhandled local delivery",
            DropReason::BadChecksum => "bad header checksum",
            DropReason::NoNeighbor => "no neighbor for next hop",
            DropReason::IcmpErrorSuppressed => "icmp error suppressed",
            DropReason::UnknownInterface => "unknown interface",
        };
        f.write_str(reason)
    }
}

/// The outcome of processing one frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Forward(Egress),
    Reply(IcmpReply, Egress),
    Drop(DropReason),
}

impl Verdict {
    /// The frame to transmit, if any
    pub fn into_egress(self) -> Option<Egress> {
        match self {
            Verdict::Forward(egress) | Verdict::Reply(_, egress) => Some(egress),
            Verdict::Drop(_) => None,
        }
    }
}
