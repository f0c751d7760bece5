use afpacket::{self, BoundSocket};
use static_router_packets::MacAddr;
use static_router_runtime::pipeline::Transport;
use static_router_runtime::state::{Interface, InterfaceId};
use static_router_runtime::{Result, RouterError};
use std::collections::VecDeque;
use std::ffi::CString;
use std::io;
use tracing::{debug, info};

/// One `AF_PACKET` socket per router interface.
///
/// Interface ids are the positions of the names passed to `open`. Receiving waits on all
/// sockets at once and serves every socket that `poll` reported before polling again, so a
/// busy interface cannot starve the others.
///
/// Only frames addressed to the interface (unicast to its MAC, broadcast or multicast) are
/// returned. Looped back transmissions and frames for other hosts are skipped.
pub struct AfPacketTransport {
    sockets: Vec<BoundSocket>,
    interfaces: Vec<Interface>,
    ready: VecDeque<InterfaceId>,
}

impl AfPacketTransport {
    /// Opens and binds a socket for each named interface and reads its MAC and IPv4 address.
    /// Fails if any interface does not exist, cannot be opened, or has no IPv4 address.
    pub fn open(names: &[String]) -> Result<AfPacketTransport> {
        let mut sockets = Vec::with_capacity(names.len());
        let mut interfaces = Vec::with_capacity(names.len());

        for (id, name) in names.iter().enumerate() {
            let fail = |reason: String| RouterError::Interface {
                name: name.clone(),
                reason,
            };

            let iface = CString::new(name.as_str())
                .map_err(|_| fail("name contains a NUL byte".to_owned()))?;
            let socket = afpacket::Socket::new()
                .and_then(|socket| socket.bind(&iface))
                .map_err(|e| fail(format!("cannot open socket: {}", e)))?;
            let mac_addr = socket
                .hardware_addr()
                .map_err(|e| fail(format!("cannot read MAC address: {}", e)))?;
            let ipv4_addr = socket
                .ipv4_addr()
                .map_err(|e| fail(format!("cannot read IPv4 address: {}", e)))?;

            let interface = Interface::new(id, name, ipv4_addr, MacAddr::new(mac_addr));
            info!(%interface, "opened interface");
            sockets.push(socket);
            interfaces.push(interface);
        }

        Ok(AfPacketTransport {
            sockets,
            interfaces,
            ready: VecDeque::new(),
        })
    }

    /// Identity of every opened interface, indexed by interface id.
    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }
}

impl Transport for AfPacketTransport {
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<(InterfaceId, usize)>> {
        if self.sockets.is_empty() {
            return Ok(None);
        }
        loop {
            let interface = match self.ready.pop_front() {
                Some(interface) => interface,
                None => {
                    self.ready
                        .extend(afpacket::poll_readable(&self.sockets)?);
                    continue;
                }
            };

            let (len, addr) = self.sockets[interface].recv(buf)?;
            // The kernel also hands us our own transmissions
            if addr.is_outgoing() {
                debug!(interface, len, "skipping outgoing frame");
                continue;
            }
            // Promiscuous interfaces deliver frames meant for other MACs
            if addr.is_other_host() {
                debug!(interface, len, "skipping frame for another host");
                continue;
            }
            return Ok(Some((interface, len)));
        }
    }

    fn transmit(&mut self, interface: InterfaceId, frame: &[u8]) -> io::Result<()> {
        let socket = self.sockets.get_mut(interface).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no socket for interface {}", interface),
            )
        })?;
        socket.send(frame)?;
        Ok(())
    }
}
