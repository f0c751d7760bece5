pub mod packet_generators;
