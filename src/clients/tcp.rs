use crate::clients::Exchanger;
use crate::Message;
use std::io;
use std::io::Read;
use std::io::Write;
use std::net::SocketAddr;
use std::net::TcpStream;
use std::net::ToSocketAddrs;
use std::time::Duration;

/// A TCP DNS Client. Used when a UDP answer comes back truncated.
///
/// See <https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.2>
pub struct TcpClient {
    servers: Vec<SocketAddr>,

    connect_timeout: Duration,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl Default for TcpClient {
    fn default() -> Self {
        TcpClient {
            servers: Vec::default(),
            connect_timeout: Duration::new(5, 0),
            read_timeout: Some(Duration::new(5, 0)),
            write_timeout: Some(Duration::new(5, 0)),
        }
    }
}

impl TcpClient {
    /// Creates a new TcpClient bound to the specific servers.
    pub fn new<A: ToSocketAddrs>(servers: A) -> io::Result<Self> {
        let servers: Vec<SocketAddr> = servers.to_socket_addrs()?.collect();
        if servers.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "no servers given",
            ));
        }

        Ok(Self {
            servers,

            ..Default::default()
        })
    }

    /// Applies the same timeout to connecting, reading and writing.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self.read_timeout = Some(timeout);
        self.write_timeout = Some(timeout);
        self
    }
}

impl Exchanger for TcpClient {
    /// Sends the [`Message`] to the first server via TCP and returns the result.
    fn exchange(&self, query: &Message) -> io::Result<Message> {
        let mut stream = TcpStream::connect_timeout(&self.servers[0], self.connect_timeout)?;
        stream.set_nodelay(true)?; // We send discrete packets, so we can send as soon as possible.
        stream.set_read_timeout(self.read_timeout)?;
        stream.set_write_timeout(self.write_timeout)?;

        let message = query.to_vec()?;

        // Two byte length prefix followed by the message.
        let mut req = Vec::with_capacity(message.len() + 2);
        req.extend_from_slice(&(message.len() as u16).to_be_bytes());
        req.extend_from_slice(&message);
        stream.write_all(&req)?;

        // Now receive a two byte length
        let buf = &mut [0; 2];
        stream.read_exact(buf)?;
        let len = u16::from_be_bytes(*buf);

        // and finally the message
        let mut buf = vec![0; len.into()];
        stream.read_exact(&mut buf)?;

        Message::from_slice(&buf)
    }
}
