/// Classifiers look at a packet by reference and sort it into a class, without modifying it. The forwarder uses them for
/// the cheap early decisions, such as whether a frame carries IPv4 at all.
pub mod classifier;

/// Processors are the unit of transformation. A processor takes ownership of a packet, may modify it, and either hands it
/// on or swallows it by returning `None`. Header rewriting such as the TTL decrement lives here, and the forwarder itself
/// is a processor from ingress frames to egress frames.
pub mod processor;

/// The read-only state the router consults for every frame: the route table, the neighbor table and the identity of each
/// interface. All of it is built once at startup and never mutated afterwards.
pub mod state;

/// The forwarding pipeline. `Router` bundles the state, `Forwarder` runs the ordered decision tree for each frame and
/// `Transport` is the boundary to whatever moves frames on and off the wire.
pub mod pipeline;

/// Loaders for the static route and neighbor table files.
pub mod io;

/// Utility module
pub mod utils;

mod error;
pub use self::error::*;
