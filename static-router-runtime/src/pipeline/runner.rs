use crate::pipeline::{Forwarder, Ingress, Transport};
use crate::processor::Processor;
use crate::{Result, RouterError};
use static_router_packets::MAX_FRAME_LEN;
use tracing::{info, trace, warn};

/// Room for the largest frame we handle plus a trailing FCS, should the driver hand one up.
/// Anything longer arrives truncated and is dropped as oversized.
pub const RECV_BUFFER_LEN: usize = MAX_FRAME_LEN + 4;

/// Receives frames from `transport` one at a time and runs each to completion: forward, reply,
/// or drop. Returns once the transport closes, or with the error that made receiving fail.
///
/// Transmit failures only cost the frame in question.
pub fn run<T: Transport>(forwarder: &mut Forwarder, transport: &mut T) -> Result<()> {
    let mut buf = vec![0u8; RECV_BUFFER_LEN];
    loop {
        let (interface, len) = match transport.receive(&mut buf) {
            Ok(Some(received)) => received,
            Ok(None) => {
                info!("transport closed, stopping");
                return Ok(());
            }
            Err(e) => return Err(RouterError::Receive(e)),
        };
        trace!(interface, len, "received frame");

        let ingress = Ingress {
            interface,
            frame: buf[..len].to_vec(),
        };
        if let Some(egress) = forwarder.process(ingress) {
            if let Err(e) = transport.transmit(egress.interface, &egress.frame.data) {
                warn!(interface = egress.interface, error = %e, "transmit failed");
            }
        }
    }
}
