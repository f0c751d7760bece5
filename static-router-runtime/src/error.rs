use std::io;
use std::net::Ipv4Addr;

/// Infrastructure failures. Everything that can go wrong with a single frame is a drop or an
/// ICMP reply instead, see `pipeline::Verdict`.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{path}:{line}: {reason}")]
    TableParse {
        path: String,
        line: usize,
        reason: String,
    },

    #[error("invalid route {prefix} mask {mask}: {reason}")]
    InvalidRoute {
        prefix: Ipv4Addr,
        mask: Ipv4Addr,
        reason: &'static str,
    },

    #[error("route {prefix} mask {mask} uses unknown interface {interface}")]
    UnknownInterface {
        prefix: Ipv4Addr,
        mask: Ipv4Addr,
        interface: usize,
    },

    #[error("interface {name}: {reason}")]
    Interface { name: String, reason: String },

    #[error("receive failed: {0}")]
    Receive(io::Error),
}

pub type Result<T> = std::result::Result<T, RouterError>;
