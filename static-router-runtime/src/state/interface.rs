use static_router_packets::MacAddr;
use std::fmt;
use std::net::Ipv4Addr;

/// Interfaces are numbered by their position in the router configuration.
pub type InterfaceId = usize;

/// Static identity of one router interface, captured once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: InterfaceId,
    pub name: String,
    pub ipv4_addr: Ipv4Addr,
    pub mac_addr: MacAddr,
}

impl Interface {
    pub fn new(id: InterfaceId, name: &str, ipv4_addr: Ipv4Addr, mac_addr: MacAddr) -> Self {
        Interface {
            id,
            name: name.to_owned(),
            ipv4_addr,
            mac_addr,
        }
    }
}

impl fmt::Display for Interface {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}#{} ({}, {})",
            self.name, self.id, self.ipv4_addr, self.mac_addr
        )
    }
}
