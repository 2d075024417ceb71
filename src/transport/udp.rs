use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::config::{MULTICAST_ADDRESS, MULTICAST_PORT};
use crate::error::Result;
use crate::messages::Message;

/// Joins the bootstrap multicast group on `bind_addr` and returns the
/// ready-to-use socket. Only already-connected nodes listening for
/// `BootstrapDiscover` need to join the group; a joiner that only sends need
/// not (see `bind_for_send`).
///
/// Grounded on spec.md §6.2 (`224.1.1.1:11999`) and
/// `original_source/minhton/include/minhton/core/constants.h`'s
/// `kMulticastAddress`/`kMulticastPort`.
pub async fn bind_multicast(bind_addr: Ipv4Addr) -> Result<UdpSocket> {
    let socket = UdpSocket::bind((bind_addr, MULTICAST_PORT)).await?;
    let group: Ipv4Addr = MULTICAST_ADDRESS.parse().expect("constant address is valid");
    socket.join_multicast_v4(group, bind_addr)?;
    Ok(socket)
}

/// Binds an ephemeral socket for a joiner that only ever sends discovery
/// packets and never needs to receive on the multicast group itself.
pub async fn bind_for_send(bind_addr: Ipv4Addr) -> Result<UdpSocket> {
    Ok(UdpSocket::bind((bind_addr, 0)).await?)
}

/// Sends a full `Message` envelope (header included) over multicast, so the
/// `event_id` the sender is holding a continuation against survives the UDP
/// hop just like it does over TCP.
pub async fn send_discover(socket: &UdpSocket, message: &Message) -> Result<()> {
    let group: Ipv4Addr = MULTICAST_ADDRESS.parse().expect("constant address is valid");
    let payload = bincode::serialize(message)?;
    socket.send_to(&payload, (group, MULTICAST_PORT)).await?;
    Ok(())
}

pub async fn recv_discover(socket: &UdpSocket) -> Result<(Message, SocketAddr)> {
    let mut buf = [0u8; 4096];
    let (n, from) = socket.recv_from(&mut buf).await?;
    let message: Message = bincode::deserialize(&buf[..n])?;
    Ok((message, from))
}

/// Listens on `socket` for `BootstrapDiscover` broadcasts and forwards each
/// decoded envelope into `sink`, the same channel `tcp::serve` feeds — so
/// the event loop's existing `handle_message` dispatch answers both
/// transports identically. Wired up by whatever harness stands a
/// participant up, alongside `tcp::serve`, not by `Participant` itself.
pub async fn serve_discover(socket: UdpSocket, sink: mpsc::Sender<Message>) -> Result<()> {
    loop {
        let (message, _from) = recv_discover(&socket).await?;
        if sink.send(message).await.is_err() {
            return Ok(());
        }
    }
}
