use std::net::{Ipv4Addr, Ipv6Addr};
use std::time::Duration;
use strum_macros::{Display, EnumString};

/// DNS Message, used by the clients to ask a resolver for a zone's name servers.
///
/// # Examples
///
/// ```rust
/// use zonemgr::types::*;
///
/// // Construct a simple query.
/// let mut m = Message::default();
/// m.add_question("example.com", Type::NS, Class::Internet).unwrap();
///
/// // Encode the query as a Vec<u8>.
/// let req = m.to_vec().expect("failed to encode DNS request");
/// assert_eq!(&req[12..25], b"\x07example\x03com\x00");
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Message {
    /// 16-bit identifier assigned by the program that generates any kind of
    /// query. This identifier is copied into the corresponding reply.
    pub id: u16,

    /// Recursion Desired.
    pub rd: bool,

    /// Truncation - specifies that this message was truncated.
    pub tc: bool,

    /// Authoritative Answer.
    pub aa: bool,

    /// Specifies kind of query in this message.
    pub opcode: Opcode,

    /// Specifies whether this message is a query (0), or a response (1).
    pub qr: QR,

    /// Response code.
    pub rcode: Rcode,

    /// Recursion Available.
    pub ra: bool,

    pub questions: Vec<Question>,
    pub answers: Vec<Record>,
    pub authoritys: Vec<Record>,
    pub additionals: Vec<Record>,

    /// Optional EDNS(0) record.
    pub extension: Option<Extension>,
}

/// DNS Question.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Question {
    /// A valid UTF-8 encoded domain name.
    pub name: String,
    pub r#type: Type,
    pub class: Class,
}

/// Resource Record (RR), either read off the wire or produced by
/// processing a zone file.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Absolute name, without the trailing dot.
    pub name: String,
    pub class: Class,

    /// The number of seconds that the resource record may be cached.
    pub ttl: Duration,

    pub resource: Resource,
}

impl Record {
    pub fn new(name: &str, class: Class, ttl: Duration, resource: Resource) -> Record {
        Record {
            name: name.to_string(),
            class,
            ttl,
            resource,
        }
    }
}

/// EDNS(0) extension record as defined in [rfc6891].
///
/// [rfc6891]: https://datatracker.ietf.org/doc/html/rfc6891
#[derive(Clone, Debug, PartialEq)]
pub struct Extension {
    /// Requestor's UDP payload size.
    pub payload_size: u16,

    pub extend_rcode: u8,
    pub version: u8,
    pub dnssec_ok: bool,
}

impl Default for Extension {
    fn default() -> Self {
        Extension {
            payload_size: 512, // The min valid size.
            extend_rcode: 0,
            version: 0,
            dnssec_ok: false,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumString, PartialEq)]
pub enum QR {
    Query = 0,
    Response = 1,
}

impl Default for QR {
    fn default() -> Self {
        QR::Query
    }
}

impl QR {
    pub fn from_bool(b: bool) -> QR {
        match b {
            false => QR::Query,
            true => QR::Response,
        }
    }

    pub fn to_bool(self) -> bool {
        match self {
            QR::Query => false,
            QR::Response => true,
        }
    }
}

/// Specifies kind of query in this message. See [rfc1035].
///
/// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u8)] // Really only 4 bits
pub enum Opcode {
    Query = 0,
    IQuery = 1,
    Status = 2,
    Notify = 4,
    Update = 5,
    DSO = 6,
}

impl Default for Opcode {
    fn default() -> Self {
        Opcode::Query
    }
}

/// Response Codes. See [rfc1035].
///
/// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum Rcode {
    NoError = 0,
    FormErr = 1,
    ServFail = 2,
    NXDomain = 3,
    NotImp = 4,
    Refused = 5,
    YXDomain = 6,
    YXRRSet = 7,
    NXRRSet = 8,
    NotAuth = 9,
    NotZone = 10,
    DSOTYPENI = 11,
}

impl Default for Rcode {
    fn default() -> Self {
        Rcode::NoError
    }
}

/// Resource Record Type, for example, A, CNAME or SOA.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, Eq, Hash, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
#[repr(u16)]
pub enum Type {
    Reserved = 0,
    A = 1,
    NS = 2,
    CNAME = 5,
    SOA = 6,
    PTR = 12,
    MX = 15,
    TXT = 16,
    AAAA = 28,
    SRV = 33,

    /// EDNS(0) Opt type. See [rfc6891].
    ///
    /// [rfc6891]: https://datatracker.ietf.org/doc/html/rfc6891
    OPT = 41,

    /// Any record type. Only valid as a Question Type.
    ANY = 255,
}

impl Default for Type {
    fn default() -> Self {
        Type::A
    }
}

/// Resource Record Class, for example Internet.
#[derive(Copy, Clone, Debug, Display, EnumString, FromPrimitive, PartialEq)]
#[repr(u16)]
pub enum Class {
    Reserved = 0,

    /// (Default) The Internet (IN), see [rfc1035].
    ///
    /// [rfc1035]: https://datatracker.ietf.org/doc/html/rfc1035
    #[strum(serialize = "IN")]
    Internet = 1,

    #[strum(serialize = "CS")]
    CsNet = 2,

    #[strum(serialize = "CH")]
    Chaos = 3,

    #[strum(serialize = "HS")]
    Hesiod = 4,

    None = 254,

    #[strum(serialize = "*")]
    Any = 255,
}

impl Default for Class {
    fn default() -> Self {
        Class::Internet
    }
}

/// Resource data. This should be kept in sync with [`Type`].
#[derive(Clone, Debug, PartialEq)]
#[allow(clippy::upper_case_acronyms)]
pub enum Resource {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),

    CNAME(String),
    NS(String),
    PTR(String),

    TXT(TXT),

    MX(MX),
    SOA(SOA),
    SRV(SRV),

    /// A type we don't model, identified by its mnemonic (e.g. "CAA" or
    /// "TYPE65534"). These are carried through parsing and then ignored.
    Unknown(String),
}

/// Mail EXchange (MX) record.
#[derive(Clone, Debug, PartialEq)]
pub struct MX {
    pub preference: u16,
    pub exchange: String,
}

/// Start of Authority (SOA) record.
#[derive(Clone, Debug, PartialEq)]
pub struct SOA {
    /// The name server that was the original or primary source of data for this zone.
    pub mname: String,

    /// The mailbox of the person responsible for this zone, as a domain name.
    pub rname: String,

    pub serial: u32,
    pub refresh: Duration,
    pub retry: Duration,
    pub expire: Duration,
    pub minimum: Duration,
}

/// Service (SRV) record, see [rfc2782].
///
/// [rfc2782]: https://datatracker.ietf.org/doc/html/rfc2782
#[derive(Clone, Debug, PartialEq)]
pub struct SRV {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,

    /// The target host.
    pub name: String,
}

/// One or more character-strings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TXT(pub Vec<String>);

impl TXT {
    /// Joins all the character-strings into one.
    pub fn joined(&self) -> String {
        self.0.concat()
    }
}

impl From<&str> for TXT {
    fn from(txt: &str) -> Self {
        TXT(vec![txt.to_string()])
    }
}
