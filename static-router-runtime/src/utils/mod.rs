/// ICMP reply generation
pub mod icmp;

/// Runs frames through a forwarder and collects what comes out
pub mod runner;

/// Helpers for tests: frame builders and an in-memory transport
pub mod test;
