//! Resolver collaborators used by the delegation check.

use crate::Message;
use std::io;

#[cfg(all(feature = "udp", feature = "tcp"))]
pub use self::resolver::Resolver;
#[cfg(feature = "tcp")]
pub use self::tcp::TcpClient;
#[cfg(feature = "udp")]
pub use self::udp::UdpClient;

#[cfg(all(feature = "udp", feature = "tcp"))]
mod resolver;
#[cfg(feature = "tcp")]
mod tcp;
#[cfg(feature = "udp")]
pub mod udp;

/// Exchanger takes a query and returns a response.
pub trait Exchanger {
    fn exchange(&self, query: &Message) -> io::Result<Message>;
}

/// Answers "which name servers does the world see for this domain".
///
/// Names are returned as given by the resolver, normally absolute with a
/// trailing dot.
pub trait NsResolver {
    fn query_ns(&self, domain: &str) -> io::Result<Vec<String>>;
}

impl<T: NsResolver + ?Sized> NsResolver for &T {
    fn query_ns(&self, domain: &str) -> io::Result<Vec<String>> {
        (**self).query_ns(domain)
    }
}
