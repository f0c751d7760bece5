use static_router_packets::MacAddr;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbor {
    pub ip: Ipv4Addr,
    pub mac: MacAddr,
}

/// Static IP to MAC bindings. Stands in for ARP: an address missing from the table is never
/// resolved on the wire.
#[derive(Debug, Clone, Default)]
pub struct NeighborTable {
    entries: HashMap<Ipv4Addr, MacAddr>,
}

impl NeighborTable {
    /// Builds the table. When an address is listed more than once the first binding is kept.
    pub fn new(neighbors: Vec<Neighbor>) -> NeighborTable {
        let mut entries = HashMap::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match entries.get(&neighbor.ip) {
                Some(existing) => {
                    warn!(ip = %neighbor.ip, kept = %existing, ignored = %neighbor.mac, "duplicate neighbor");
                }
                None => {
                    entries.insert(neighbor.ip, neighbor.mac);
                }
            }
        }
        NeighborTable { entries }
    }

    pub fn lookup(&self, ip: Ipv4Addr) -> Option<MacAddr> {
        self.entries.get(&ip).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<HashMap<Ipv4Addr, MacAddr>> for NeighborTable {
    fn from(entries: HashMap<Ipv4Addr, MacAddr>) -> Self {
        NeighborTable { entries }
    }
}
