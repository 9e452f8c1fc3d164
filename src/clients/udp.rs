use crate::clients::Exchanger;
use crate::Message;
use std::io;
use std::net::SocketAddr;
use std::net::ToSocketAddrs;
use std::net::UdpSocket;
use std::time::Duration;

pub const GOOGLE_IPV4_PRIMARY: &str = "8.8.8.8:53";
pub const GOOGLE_IPV4_SECONDARY: &str = "8.8.4.4:53";

pub const GOOGLE: [&str; 2] = [GOOGLE_IPV4_PRIMARY, GOOGLE_IPV4_SECONDARY];

/// A UDP DNS Client.
///
/// # Example
///
/// ```rust,no_run
/// use zonemgr::clients::Exchanger;
/// use zonemgr::clients::UdpClient;
/// use zonemgr::types::*;
///
/// fn main() -> std::io::Result<()> {
///     let mut query = Message::default();
///     query.add_question("example.com", Type::NS, Class::Internet)?;
///
///     let response = UdpClient::new("8.8.8.8:53")?.exchange(&query)?;
///
///     println!("{:?}", response.answers);
///     Ok(())
/// }
/// ```
///
/// See <https://datatracker.ietf.org/doc/html/rfc1035#section-4.2.1>
pub struct UdpClient {
    servers: Vec<SocketAddr>,

    read_timeout: Option<Duration>,
}

impl Default for UdpClient {
    fn default() -> Self {
        UdpClient {
            servers: Vec::default(),
            read_timeout: Some(Duration::new(5, 0)),
        }
    }
}

impl UdpClient {
    /// Creates a new Client bound to the specific servers. The servers
    /// should be IP addresses (with ports), not hostnames.
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

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

impl Exchanger for UdpClient {
    /// Sends the query [`Message`] to the first server via UDP and returns the result.
    fn exchange(&self, query: &Message) -> io::Result<Message> {
        let bind = match self.servers[0] {
            SocketAddr::V4(_) => "0.0.0.0:0",
            SocketAddr::V6(_) => "[::]:0",
        };
        let socket = UdpSocket::bind(bind)?;
        socket.set_read_timeout(self.read_timeout)?;

        // Connect us to the server, meaning recv will only receive directly
        // from the server.
        socket.connect(self.servers.as_slice())?;

        let req = query.to_vec()?;
        socket.send(&req)?;

        let mut buf = [0; 4096];
        let len = socket.recv(&mut buf)?;
        let resp = Message::from_slice(&buf[0..len])?;

        if resp.id != query.id {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("response id {} does not match query id {}", resp.id, query.id),
            ));
        }

        Ok(resp)
    }
}
