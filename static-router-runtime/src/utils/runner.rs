use crate::pipeline::{run, Forwarder};
use crate::state::InterfaceId;
use crate::utils::test::channel_transport::channel_transport;
use crate::Result;
use static_router_packets::EthernetFrame;

/// Runner is a helper for testing a forwarder end to end.
///
/// Every `(interface, frame)` pair in `frames` is received in order through an in-memory
/// transport by the real run loop. Once the input is exhausted the loop stops, and everything
/// the forwarder transmitted is returned, one `Vec` per interface the router has, in the order
/// it was sent.
pub fn runner(
    forwarder: &mut Forwarder,
    frames: Vec<(InterfaceId, Vec<u8>)>,
) -> Result<Vec<Vec<EthernetFrame>>> {
    let (sender, mut transport, receiver) = channel_transport();
    for frame in frames {
        // The receiver lives in `transport`, so this cannot fail
        let _ = sender.send(frame);
    }
    drop(sender);

    run(forwarder, &mut transport)?;
    drop(transport);

    let mut egress: Vec<Vec<EthernetFrame>> =
        vec![vec![]; forwarder.router().interfaces().len()];
    for (interface, data) in receiver.iter() {
        if let (Some(sent), Ok(frame)) = (egress.get_mut(interface), EthernetFrame::from_buffer(data, 0)) {
            sent.push(frame);
        }
    }
    Ok(egress)
}
