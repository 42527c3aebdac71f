//! The wire framing: one JSON value per line, in both directions.
//!
//! The spec's external interface describes event payloads, not a transport;
//! this gateway speaks newline-delimited JSON over a plain `TcpStream`
//! rather than empath-smtp's byte-position-tracked line scanner, since the
//! SMTP connection's double-buffering and TLS upgrade exist to support a
//! protocol with mixed line- and block-framed sections that this one doesn't
//! have.

use serde::{de::DeserializeOwned, Serialize};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
};

pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
    line: String,
}

impl Connection {
    #[must_use]
    pub fn new(stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
            line: String::new(),
        }
    }

    /// The next line off the wire, or `None` on a clean EOF.
    pub async fn recv_line(&mut self) -> std::io::Result<Option<String>> {
        self.line.clear();
        let read = self.reader.read_line(&mut self.line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(self.line.trim_end_matches(['\r', '\n']).to_string()))
    }

    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> std::io::Result<Option<T>> {
        let Some(line) = self.recv_line().await? else {
            return Ok(None);
        };
        serde_json::from_str(&line)
            .map(Some)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub async fn send_json<T: Serialize>(&mut self, value: &T) -> std::io::Result<()> {
        let mut line = serde_json::to_string(value).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push('\n');
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use tokio::net::TcpListener;

    use super::*;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
    struct Ping {
        seq: u32,
    }

    async fn connected_pair() -> (Connection, Connection) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (Connection::new(server), Connection::new(client))
    }

    #[tokio::test]
    async fn send_json_then_recv_json_round_trips() {
        let (mut server, mut client) = connected_pair().await;
        server.send_json(&Ping { seq: 7 }).await.unwrap();
        let received = client.recv_json::<Ping>().await.unwrap();
        assert_eq!(received, Some(Ping { seq: 7 }));
    }

    #[tokio::test]
    async fn recv_line_returns_none_on_clean_eof() {
        let (server, mut client) = connected_pair().await;
        drop(server);
        assert_eq!(client.recv_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn malformed_json_surfaces_as_an_io_error() {
        let (mut server, mut client) = connected_pair().await;
        server.writer.write_all(b"not json\n").await.unwrap();
        server.writer.flush().await.unwrap();
        let err = client.recv_json::<Ping>().await.unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }
}
