use crate::state::InterfaceId;
use std::io;

/// Moves raw Ethernet frames on and off the router's interfaces.
pub trait Transport {
    /// Blocks until a frame arrives on any interface and copies it into `buf`. Returns the
    /// interface it arrived on and its length, or `None` once the transport is closed and no
    /// more frames will come.
    fn receive(&mut self, buf: &mut [u8]) -> io::Result<Option<(InterfaceId, usize)>>;

    /// Sends a complete frame out of `interface`.
    fn transmit(&mut self, interface: InterfaceId, frame: &[u8]) -> io::Result<()>;
}
