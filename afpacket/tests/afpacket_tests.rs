#![cfg(target_os = "linux")]

use afpacket;
use rand::{self, Rng};
use static_router_packets as packets;
use std::{ffi::CString, net, sync::mpsc, thread, time::Duration};

// These need CAP_NET_RAW, run them with `cargo test -- --ignored` as root.

#[test]
#[ignore]
fn layer2_loopback() {
    // If this takes more than a second to occur, something's definitely wrong.
    let timeout = Duration::from_secs(1);

    let mut rng = rand::thread_rng();

    let iface_name = CString::new("lo").unwrap();

    let side_a = afpacket::Socket::new().unwrap();
    let mut side_a = side_a.bind(&iface_name).unwrap();

    let side_b = afpacket::Socket::new().unwrap();
    let mut side_b = side_b.bind(&iface_name).unwrap();
    side_b.set_promiscuous(true).unwrap();

    let (tx, rx) = mpsc::channel();

    let thread_b = thread::spawn(move || {
        let mut in_buffer = vec![0; 1514];
        // Loopback hands every frame up twice, once outgoing and once incoming
        loop {
            let (len, addr) = side_b.recv(&mut in_buffer).unwrap();
            if !addr.is_outgoing() {
                in_buffer.truncate(len);
                break;
            }
        }
        side_b.set_promiscuous(false).unwrap();

        tx.send(in_buffer).unwrap();
    });

    // now send a packet from side a to side b
    let body = {
        let mut body = vec![0; 64];
        rng.fill(&mut body[..]);
        body
    };
    let mut ipv4_pkt = packets::Ipv4Packet::empty();
    ipv4_pkt.set_protocol(packets::IpProtocol::UDP);
    ipv4_pkt.set_payload(&body);
    ipv4_pkt.set_src_addr(net::Ipv4Addr::new(10, 0, 0, 1));
    ipv4_pkt.set_dest_addr(net::Ipv4Addr::new(10, 0, 0, 2));
    ipv4_pkt.set_ttl(2);
    ipv4_pkt.set_checksum();
    let mut eth_pkt = packets::EthernetFrame::encap_ipv4(ipv4_pkt);
    eth_pkt.set_src_mac(packets::MacAddr::BROADCAST);
    eth_pkt.set_dest_mac(packets::MacAddr::BROADCAST);

    // Give side b a moment to start receiving
    thread::sleep(Duration::from_millis(50));
    side_a.send(&eth_pkt.data).unwrap();

    let in_buffer = rx.recv_timeout(timeout).unwrap();
    assert_eq!(in_buffer, eth_pkt.data);

    thread_b.join().unwrap();
}

#[test]
#[ignore]
fn loopback_identity() {
    let lo = afpacket::Socket::new()
        .unwrap()
        .bind(CString::new("lo").unwrap())
        .unwrap();

    assert_eq!(lo.iface().to_str().unwrap(), "lo");
    assert_eq!(lo.hardware_addr().unwrap(), [0; 6]);
    assert_eq!(lo.ipv4_addr().unwrap(), net::Ipv4Addr::new(127, 0, 0, 1));
}

#[test]
#[ignore]
fn poll_finds_readable_socket() {
    let iface_name = CString::new("lo").unwrap();
    let mut sender = afpacket::Socket::new().unwrap().bind(&iface_name).unwrap();
    let sockets = vec![afpacket::Socket::new().unwrap().bind(&iface_name).unwrap()];

    let mut frame = packets::EthernetFrame::encap_ipv4(packets::Ipv4Packet::empty());
    frame.set_dest_mac(packets::MacAddr::BROADCAST);
    sender.send(&frame.data).unwrap();

    assert_eq!(afpacket::poll_readable(&sockets).unwrap(), vec![0]);
}

#[test]
#[ignore]
fn unknown_interface() {
    let result = afpacket::Socket::new()
        .unwrap()
        .bind(CString::new("nosuchif0").unwrap());
    assert!(result.is_err());
}
