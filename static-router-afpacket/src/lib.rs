//! This crate connects the static router's `Transport` to raw `AF_PACKET` sockets from the
//! `afpacket` crate.
#![deny(missing_docs)]

mod transport;

pub use transport::AfPacketTransport;
