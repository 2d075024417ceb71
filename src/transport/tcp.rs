use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::messages::Message;
use crate::transport::framing::{encode_frame, FrameDecoder};

/// Serializes and sends a single message over a freshly-opened TCP
/// connection to `addr`.
///
/// Grounded on spec.md §6.1 and the teacher's `comm` field in
/// `states/elder/mod.rs`, which opens a connection per outgoing message
/// rather than multiplexing a persistent one — acceptable here since
/// MINHTON messages are not latency-sensitive streams.
pub async fn send_message(addr: std::net::SocketAddrV4, message: &Message) -> Result<()> {
    let payload = bincode::serialize(message)?;
    let frame = encode_frame(&payload)?;
    let mut stream = TcpStream::connect(addr).await?;
    stream.write_all(&frame).await?;
    stream.flush().await?;
    Ok(())
}

/// Accepts connections on `listener` forever, decoding one message per
/// connection and forwarding it to `sink`. Exits only on a fatal accept
/// error; per-connection errors are logged and the connection dropped.
pub async fn serve(listener: TcpListener, sink: mpsc::Sender<Message>) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let sink = sink.clone();
        tokio::spawn(async move {
            if let Err(err) = handle_connection(stream, &sink).await {
                tracing::warn!(%peer, %err, "dropping inbound connection");
            }
        });
    }
}

async fn handle_connection(mut stream: TcpStream, sink: &mpsc::Sender<Message>) -> Result<()> {
    let mut decoder = FrameDecoder::new();
    let mut read_buf = [0u8; 4096];
    loop {
        if let Some(frame) = decoder.try_decode()? {
            let message: Message = bincode::deserialize(&frame)?;
            sink.send(message)
                .await
                .map_err(|_| Error::TransportFatal("event loop channel closed".into()))?;
            continue;
        }
        let n = stream.read(&mut read_buf).await?;
        if n == 0 {
            return Ok(());
        }
        decoder.feed(&read_buf[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::NodeInfo;
    use crate::messages::header::MessageHeader;
    use crate::messages::join::Join;
    use crate::messages::types::MessageType;
    use crate::messages::variant::MessageVariant;
    use crate::messages::Message;
    use crate::network_info::NetworkInfo;
    use crate::position::LogicalPosition;
    use crate::uuid_gen::Uuid;
    use std::net::Ipv4Addr;

    fn node(tag: u8, port: u16) -> NodeInfo {
        NodeInfo::new(Uuid::from_bytes([tag; 16]), NetworkInfo::new(Ipv4Addr::LOCALHOST, port))
            .with_position(LogicalPosition::root(2).unwrap())
    }

    #[tokio::test]
    async fn sent_message_is_received_intact() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        let (tx, mut rx) = mpsc::channel(8);
        tokio::spawn(serve(listener, tx));

        let header = MessageHeader::new(node(1, 1111), node(2, addr.port()), MessageType::Join, 7);
        let message = Message::new(header, MessageVariant::Join(Join { joiner: node(1, 1111) }));
        send_message(addr, &message).await.unwrap();

        let received = rx.recv().await.expect("message delivered");
        assert_eq!(received.header.event_id(), 7);
    }

    /// S6: a peer that writes fewer than the 4 length-prefix bytes and then
    /// stalls does not wedge the connection — the handler treats the split
    /// prefix as fatal and drops it instead of buffering forever.
    #[tokio::test]
    async fn connection_with_split_length_prefix_is_dropped() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = match listener.local_addr().unwrap() {
            std::net::SocketAddr::V4(v4) => v4,
            _ => unreachable!(),
        };
        let (tx, _rx) = mpsc::channel(8);
        tokio::spawn(serve(listener, tx));

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(&[0u8, 1, 2]).await.unwrap();
        stream.flush().await.unwrap();

        // The handler task observes the fatal split-prefix error and
        // returns; the peer side sees the connection close rather than
        // hang waiting for more of the message.
        let mut buf = [0u8; 1];
        let result = stream.read(&mut buf).await;
        assert!(matches!(result, Ok(0)));
    }
}
