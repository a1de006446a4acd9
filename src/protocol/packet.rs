//! TDS packet structure and I/O.

use crate::error::{Error, Result};
use crate::protocol::constants::*;
use crate::protocol::message::{write_packet_header, Message, HEADER_SIZE};
use bytes::{Bytes, BytesMut};
use std::io::ErrorKind;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

/// A TDS packet.
#[derive(Debug, Clone)]
pub struct Packet {
    /// Packet type.
    pub packet_type: u8,
    /// Status bits.
    pub status: u8,
    /// Packet payload (excluding header).
    pub payload: Bytes,
}

impl Packet {
    /// Whether this packet ends its message.
    pub fn is_end_of_message(&self) -> bool {
        self.status & TDS_STATUS_EOM != 0
    }
}

/// TDS packet reader/writer over any byte stream.
///
/// The stream is usually a TCP (or TLS) connection that has already completed
/// login; tests use an in-memory mock.
pub struct PacketStream<S> {
    stream: S,
    /// Negotiated packet size including the header.
    packet_size: usize,
    /// Sequence number of the next packet sent.
    packet_id: u8,
}

impl<S> PacketStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Create a new packet stream with the default packet size.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            packet_size: TDS_PACKET_SIZE_DEFAULT,
            packet_id: 1,
        }
    }

    /// Set the negotiated packet size.
    pub fn set_packet_size(&mut self, packet_size: usize) -> Result<()> {
        if !(TDS_PACKET_SIZE_MIN..=TDS_PACKET_SIZE_MAX).contains(&packet_size) {
            return Err(Error::invalid_config(
                "packetSize",
                format!(
                    "must be between {} and {}",
                    TDS_PACKET_SIZE_MIN, TDS_PACKET_SIZE_MAX
                ),
            ));
        }
        self.packet_size = packet_size;
        Ok(())
    }

    /// Get the packet size.
    pub fn packet_size(&self) -> usize {
        self.packet_size
    }

    /// Get a mutable reference to the underlying stream.
    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    /// Read a packet from the stream.
    pub async fn read_packet(&mut self) -> Result<Packet> {
        let mut header = [0u8; HEADER_SIZE];
        self.stream
            .read_exact(&mut header)
            .await
            .map_err(closed_on_eof)?;

        let packet_type = header[0];
        let status = header[1];
        let packet_len = u16::from_be_bytes([header[2], header[3]]) as usize;
        if packet_len < HEADER_SIZE {
            return Err(Error::protocol(format!(
                "Invalid packet length {}",
                packet_len
            )));
        }

        let mut payload = BytesMut::zeroed(packet_len - HEADER_SIZE);
        self.stream
            .read_exact(&mut payload)
            .await
            .map_err(closed_on_eof)?;

        Ok(Packet {
            packet_type,
            status,
            payload: payload.freeze(),
        })
    }

    /// Read a complete reply message, joining packets until end of message.
    pub async fn read_message(&mut self) -> Result<Bytes> {
        let mut message = BytesMut::new();
        loop {
            let packet = self.read_packet().await?;
            if packet.packet_type != TDS_PACKET_TYPE_REPLY {
                return Err(Error::UnexpectedPacketType {
                    expected: TDS_PACKET_TYPE_REPLY,
                    actual: packet.packet_type,
                });
            }
            message.extend_from_slice(&packet.payload);
            if packet.is_end_of_message() {
                break;
            }
        }
        trace!(len = message.len(), "received reply");
        Ok(message.freeze())
    }

    /// Send a message, split into packets of the negotiated size.
    ///
    /// Uses the Message trait to serialize the payload in a single allocation.
    pub async fn send_message<M: Message>(&mut self, msg: &M) -> Result<()> {
        let mut payload = Vec::with_capacity(msg.wire_size());
        msg.write_to(&mut payload)?;

        let chunk_size = self.packet_size - HEADER_SIZE;
        let chunk_count = payload.len().div_ceil(chunk_size).max(1);
        let mut buf = Vec::with_capacity(payload.len() + chunk_count * HEADER_SIZE);

        for index in 0..chunk_count {
            let start = index * chunk_size;
            let end = (start + chunk_size).min(payload.len());
            let status = if index + 1 == chunk_count {
                TDS_STATUS_EOM
            } else {
                TDS_STATUS_NORMAL
            };
            let packet_id = self.next_packet_id();
            write_packet_header(
                &mut buf,
                msg.packet_type(),
                status,
                HEADER_SIZE + end - start,
                packet_id,
            );
            buf.extend_from_slice(&payload[start..end]);
        }

        trace!(
            packet_type = msg.packet_type(),
            len = payload.len(),
            packets = chunk_count,
            "sending message"
        );
        self.stream.write_all(&buf).await?;
        self.stream.flush().await?;
        Ok(())
    }

    fn next_packet_id(&mut self) -> u8 {
        let id = self.packet_id;
        self.packet_id = self.packet_id.wrapping_add(1);
        id
    }
}

fn closed_on_eof(e: std::io::Error) -> Error {
    if e.kind() == ErrorKind::UnexpectedEof {
        Error::ConnectionClosed
    } else {
        Error::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::message::WriteExt;
    use tokio_test::io::Builder;

    struct RawMessage(Vec<u8>);

    impl Message for RawMessage {
        fn packet_type(&self) -> u8 {
            TDS_PACKET_TYPE_SQL_BATCH
        }

        fn wire_size(&self) -> usize {
            self.0.len()
        }

        fn write_to(&self, buf: &mut Vec<u8>) -> Result<()> {
            buf.write_bytes(&self.0);
            Ok(())
        }
    }

    fn reply_packet(status: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = Vec::new();
        write_packet_header(
            &mut buf,
            TDS_PACKET_TYPE_REPLY,
            status,
            HEADER_SIZE + payload.len(),
            1,
        );
        buf.extend_from_slice(payload);
        buf
    }

    #[tokio::test]
    async fn test_send_message_splits_packets() {
        // 512-byte packets carry 504 payload bytes
        let payload = vec![0xAB; 600];
        let mut expected = Vec::new();
        write_packet_header(&mut expected, TDS_PACKET_TYPE_SQL_BATCH, 0, 512, 1);
        expected.extend_from_slice(&payload[..504]);
        write_packet_header(&mut expected, TDS_PACKET_TYPE_SQL_BATCH, 1, 8 + 96, 2);
        expected.extend_from_slice(&payload[504..]);

        let mock = Builder::new().write(&expected).build();
        let mut stream = PacketStream::new(mock);
        stream.set_packet_size(512).unwrap();
        stream.send_message(&RawMessage(payload)).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_message_joins_packets() {
        let mock = Builder::new()
            .read(&reply_packet(TDS_STATUS_NORMAL, &[1, 2]))
            .read(&reply_packet(TDS_STATUS_EOM, &[3]))
            .build();
        let mut stream = PacketStream::new(mock);
        let message = stream.read_message().await.unwrap();
        assert_eq!(&message[..], &[1, 2, 3]);
    }

    #[tokio::test]
    async fn test_read_unexpected_packet_type() {
        let mut packet = reply_packet(TDS_STATUS_EOM, &[0]);
        packet[0] = TDS_PACKET_TYPE_SQL_BATCH;
        let mock = Builder::new().read(&packet).build();
        let mut stream = PacketStream::new(mock);
        assert!(matches!(
            stream.read_message().await,
            Err(Error::UnexpectedPacketType { expected: 4, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn test_read_connection_closed() {
        let mock = Builder::new().read(&[TDS_PACKET_TYPE_REPLY, 1, 0]).build();
        let mut stream = PacketStream::new(mock);
        assert!(matches!(
            stream.read_packet().await,
            Err(Error::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_packet_size_limits() {
        let mock = Builder::new().build();
        let mut stream = PacketStream::new(mock);
        assert!(stream.set_packet_size(100).is_err());
        assert!(stream.set_packet_size(8192).is_ok());
        assert_eq!(stream.packet_size(), 8192);
    }
}
