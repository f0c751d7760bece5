mod types;
pub use self::types::*;

pub mod checksum;

mod ethernet;
pub use self::ethernet::*;

mod ipv4;
pub use self::ipv4::*;

mod icmp;
pub use self::icmp::*;
