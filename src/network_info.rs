use std::net::{Ipv4Addr, SocketAddrV4};

use serde::{Deserialize, Serialize};

/// Reachability info for a participant. May be partially unset before the
/// transport layer has bound a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct NetworkInfo {
    address: Option<Ipv4Addr>,
    port: Option<u16>,
}

impl NetworkInfo {
    pub fn new(address: Ipv4Addr, port: u16) -> Self {
        Self {
            address: Some(address),
            port: Some(port),
        }
    }

    pub fn unset() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.address.is_some() && self.port.is_some()
    }

    pub fn address(&self) -> Option<Ipv4Addr> {
        self.address
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn socket_addr(&self) -> Option<SocketAddrV4> {
        Some(SocketAddrV4::new(self.address?, self.port?))
    }
}

impl From<SocketAddrV4> for NetworkInfo {
    fn from(addr: SocketAddrV4) -> Self {
        Self::new(*addr.ip(), addr.port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_is_invalid() {
        assert!(!NetworkInfo::unset().is_valid());
    }

    #[test]
    fn fully_set_is_valid() {
        let info = NetworkInfo::new(Ipv4Addr::LOCALHOST, 2000);
        assert!(info.is_valid());
        assert_eq!(info.socket_addr().unwrap().port(), 2000);
    }
}
