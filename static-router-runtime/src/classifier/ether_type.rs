use crate::classifier::Classifier;
use static_router_packets::{EthernetFrame, IPV4_ETHER_TYPE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifyIpType {
    IPv4,
    Other(u16),
}

/// Classifier that determines whether a frame carries IPv4 via the EtherType field in the
/// EthernetFrame
#[derive(Default)]
pub struct ClassifyIp;

impl Classifier for ClassifyIp {
    type Packet = EthernetFrame;
    type Class = ClassifyIpType;

    fn classify(&self, frame: &Self::Packet) -> Self::Class {
        // https://en.wikipedia.org/wiki/EtherType
        match frame.ether_type() {
            IPV4_ETHER_TYPE => ClassifyIpType::IPv4,
            other => ClassifyIpType::Other(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_ip() {
        let data_v4: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 00, 0x45, 0, 0, 20, 0, 0,
            0, 0, 64, 17, 0, 0, 192, 178, 128, 0, 10, 0, 0, 1,
        ];
        let data_arp: Vec<u8> = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x08, 0x06,
        ];
        let data_v6: Vec<u8> = vec![
            0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 1, 2, 3, 4, 5, 6, 0x86, 0xDD,
        ];

        let classifier = ClassifyIp;
        let frame = EthernetFrame::from_buffer(data_v4, 0).unwrap();
        assert_eq!(classifier.classify(&frame), ClassifyIpType::IPv4);

        let frame = EthernetFrame::from_buffer(data_arp, 0).unwrap();
        assert_eq!(classifier.classify(&frame), ClassifyIpType::Other(0x0806));

        let frame = EthernetFrame::from_buffer(data_v6, 0).unwrap();
        assert_eq!(classifier.classify(&frame), ClassifyIpType::Other(0x86DD));
    }
}
