use std::io::Write;
use std::net::Shutdown;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

use crate::error::PktfeedError;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);

/// Destination of a flushed batch.
pub trait Transport: Send + Sync {
    /// Deliver one payload. Each call is an independent attempt.
    fn send(&self, payload: &[u8]) -> Result<(), PktfeedError>;
    /// Human readable peer, used in logs.
    fn peer(&self) -> String;
}

/// Join records into the wire payload, every record is followed by `\n`.
pub fn serialize_batch(records: &[String]) -> Vec<u8> {
    let len = records.iter().map(|r| r.len() + 1).sum();
    let mut payload = Vec::with_capacity(len);
    for r in records {
        payload.extend_from_slice(r.as_bytes());
        payload.push(b'\n');
    }
    payload
}

/// Opens a fresh connection per payload and closes it after the write.
/// No length prefix and no acknowledgement, the peer reads until EOF.
#[derive(Debug, Clone)]
pub struct TcpClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    write_timeout: Duration,
}

impl TcpClient {
    pub fn new(host: &str, port: u16) -> TcpClient {
        let timeout = Duration::from_millis(crate::DEFAULT_NET_TIMEOUT_MS);
        TcpClient {
            host: host.to_string(),
            port,
            connect_timeout: timeout,
            write_timeout: timeout,
        }
    }
    /// Zero is raised to 1ms, std rejects a zero socket timeout.
    pub fn connect_timeout(&mut self, timeout: Duration) {
        self.connect_timeout = timeout.max(MIN_TIMEOUT);
    }
    pub fn write_timeout(&mut self, timeout: Duration) {
        self.write_timeout = timeout.max(MIN_TIMEOUT);
    }
    fn flush_error(&self, e: impl ToString) -> PktfeedError {
        PktfeedError::FlushError {
            addr: self.peer(),
            e: e.to_string(),
        }
    }
    fn connect(&self) -> Result<TcpStream, PktfeedError> {
        let addrs: Vec<SocketAddr> = (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| self.flush_error(e))?
            .collect();
        let mut last_err = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, self.connect_timeout) {
                Ok(stream) => return Ok(stream),
                Err(e) => last_err = Some(e),
            }
        }
        match last_err {
            Some(e) => Err(self.flush_error(e)),
            None => Err(self.flush_error("host resolved to no address")),
        }
    }
}

impl Transport for TcpClient {
    fn send(&self, payload: &[u8]) -> Result<(), PktfeedError> {
        let mut stream = self.connect()?;
        stream
            .set_write_timeout(Some(self.write_timeout))
            .map_err(|e| self.flush_error(e))?;
        stream.write_all(payload).map_err(|e| self.flush_error(e))?;
        stream.flush().map_err(|e| self.flush_error(e))?;
        // the peer may already have closed its side
        let _ = stream.shutdown(Shutdown::Both);
        Ok(())
    }
    fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
