pub mod framing;
pub mod tcp;
pub mod udp;
